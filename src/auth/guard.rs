// ==========================================
// 廢棄物清運聯單管理系統 - 請求授權閘
// ==========================================
// 職責: 從請求標頭還原主體身分，依最低身分組要求放行或重導向
// 約束: 認證（登入/會話）由前置層處理，本層只讀取其注入的標頭：
//       X-Auth-User / X-Auth-Roles（逗號分隔）
// ==========================================

use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::hierarchy::RoleHierarchy;

/// 前置認證層注入的標頭名稱
pub const AUTH_USER_HEADER: &str = "x-auth-user";
pub const AUTH_ROLES_HEADER: &str = "x-auth-roles";

/// 授權失敗時附帶診斷訊息的標頭
pub const MESSAGE_HEADER: &str = "x-message";

/// 已認證主體
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<String>,
}

/// 授權失敗的重導向回應（不視為錯誤，不中斷行程記錄）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    pub location: &'static str,
    pub message: String,
}

impl AuthRedirect {
    fn to_login() -> Self {
        Self {
            location: "/login",
            message: "Not login yet, please log in.".to_string(),
        }
    }

    fn to_main(message: String) -> Self {
        Self {
            location: "/",
            message,
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        response
            .headers_mut()
            .insert(LOCATION, HeaderValue::from_static(self.location));
        // 診斷訊息為 ASCII 固定格式，無法構成合法標頭值時直接省略
        if let Ok(value) = HeaderValue::from_str(&self.message) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(MESSAGE_HEADER), value);
        }
        response
    }
}

/// 從請求標頭還原主體；未認證回傳 None
pub fn extract_principal(headers: &HeaderMap) -> Option<Principal> {
    let username = headers
        .get(AUTH_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?
        .to_string();

    let roles = headers
        .get(AUTH_ROLES_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Principal { username, roles })
}

/// 授權檢查
///
/// # 參數
/// - min_role: 最低身分組要求（依層級比較）
/// - exact_role: 額外要求「實際持有」該身分組（不只層級滿足）
///
/// # 回傳
/// - Ok(Principal): 放行
/// - Err(AuthRedirect): 未登入導向登入頁；權限不足導向首頁，附診斷標頭
pub fn authorize(
    hierarchy: &RoleHierarchy,
    headers: &HeaderMap,
    min_role: &str,
    exact_role: Option<&str>,
) -> Result<Principal, AuthRedirect> {
    let principal = match extract_principal(headers) {
        Some(p) => p,
        None => return Err(AuthRedirect::to_login()),
    };

    if hierarchy.highest_rank(&principal.roles) < hierarchy.rank_of(min_role) {
        return Err(AuthRedirect::to_main(
            "Unauthorized: Insufficient group membership.".to_string(),
        ));
    }

    if let Some(exact) = exact_role {
        if !principal.roles.iter().any(|r| r == exact) {
            return Err(AuthRedirect::to_main(format!(
                "Unauthorized: This view requires '{}' group.",
                exact
            )));
        }
    }

    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_for(user: &str, roles: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_USER_HEADER, HeaderValue::from_str(user).unwrap());
        headers.insert(AUTH_ROLES_HEADER, HeaderValue::from_str(roles).unwrap());
        headers
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let hierarchy = RoleHierarchy::default();
        let headers = HeaderMap::new();
        let err = authorize(&hierarchy, &headers, "importer", None).unwrap_err();
        assert_eq!(err.location, "/login");
    }

    #[test]
    fn test_insufficient_rank_redirects_to_main() {
        let hierarchy = RoleHierarchy::default();
        let headers = headers_for("amy", "importer");
        let err = authorize(&hierarchy, &headers, "moderator", None).unwrap_err();
        assert_eq!(err.location, "/");
        assert!(err.message.contains("Insufficient"));
    }

    #[test]
    fn test_rank_satisfied_passes() {
        let hierarchy = RoleHierarchy::default();
        let headers = headers_for("amy", "moderator,importer");
        let principal = authorize(&hierarchy, &headers, "importer", None).unwrap();
        assert_eq!(principal.username, "amy");
        assert_eq!(principal.roles.len(), 2);
    }

    #[test]
    fn test_exact_role_must_be_held() {
        let hierarchy = RoleHierarchy::default();
        // root 層級足夠，但未實際持有 moderator 身分組
        let headers = headers_for("ray", "root");
        let err = authorize(&hierarchy, &headers, "moderator", Some("moderator")).unwrap_err();
        assert_eq!(err.location, "/");
        assert!(err.message.contains("moderator"));
    }

    #[test]
    fn test_unknown_role_denied_without_panic() {
        let hierarchy = RoleHierarchy::default();
        let headers = headers_for("amy", "ghost");
        assert!(authorize(&hierarchy, &headers, "importer", None).is_err());
    }
}
