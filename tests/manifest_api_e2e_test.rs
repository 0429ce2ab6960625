// ==========================================
// 聯單 API 端到端測試
// ==========================================
// 模擬前端呼叫後端的完整流程: 授權重導向、匯入兩階段衝突解決、
// 批量軟刪除、清單/明細/匯出/自動完成端點
// ==========================================

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use test_helpers::{create_test_db, disposal_csv, test_app};
use waste_manifest_system::logging;

const BOUNDARY: &str = "wms-test-boundary";

/// 組裝 multipart 匯入請求（csv_file + import_type + conflict_resolution）
fn import_request(csv: &str, import_type: &str, resolution: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"import_type\"\r\n\r\n{t}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"conflict_resolution\"\r\n\r\n{r}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"csv_file\"; filename=\"upload.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        t = import_type,
        r = resolution,
        c = csv,
    );
    Request::builder()
        .method("POST")
        .uri("/api/manifests/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header("x-auth-user", "tester")
        .header("x-auth-roles", "importer")
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str, roles: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-auth-user", "tester")
        .header("x-auth-roles", roles)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, roles: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-auth-user", "tester")
        .header("x-auth-roles", roles)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 未認證請求重導向登入頁並附診斷標頭
#[tokio::test]
async fn test_unauthenticated_redirects_to_login() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    let response = app
        .oneshot(Request::builder().uri("/api/manifests").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/login");
    assert!(response.headers().contains_key("x-message"));
}

/// 最低層級身分組存取較高層級端點: 重導向首頁而非錯誤
#[tokio::test]
async fn test_lowest_rank_denied_with_redirect() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/accounts/bob")
        .header("x-auth-user", "amy")
        .header("x-auth-roles", "importer")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");
    let message = response.headers().get("x-message").unwrap().to_str().unwrap();
    assert!(message.contains("Insufficient"));
}

/// 帳號刪除層級規則: 須嚴格大於目標層級，且不得刪除自己
#[tokio::test]
async fn test_account_deletion_rank_rules() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    // moderator 刪除同層級目標: 拒絕
    let request = json_request(
        "DELETE",
        "/api/accounts/bob",
        "moderator",
        &json!({ "roles": ["moderator"] }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // root 刪除 moderator: 放行
    let request = json_request(
        "DELETE",
        "/api/accounts/bob",
        "root",
        &json!({ "roles": ["moderator"] }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 自我刪除: 任何層級皆拒絕
    let request = json_request(
        "DELETE",
        "/api/accounts/tester",
        "root",
        &json!({ "roles": [] }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 匯入兩階段衝突解決: ask 偵測衝突 → 酬載回傳 → resolve 以 replace 提交
#[tokio::test]
async fn test_import_conflict_two_phase_flow() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);
    let csv = disposal_csv(&[("M001", "W01")]);

    // SCANNING: 首次匯入無衝突，直接提交
    let response = app
        .clone()
        .oneshot(import_request(&csv, "disposal", "ask"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["imported"], json!(1));

    // SCANNING → RESOLVING: 相同檔案再次匯入，回傳衝突清單與原始酬載
    let response = app
        .clone()
        .oneshot(import_request(&csv, "disposal", "ask"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["conflict"], json!(true));
    assert_eq!(body["conflicting_records"].as_array().unwrap().len(), 1);
    let import_data = &body["import_data"];
    assert_eq!(import_data["import_type"], json!("disposal"));

    // RESOLVING: 呼叫端帶回酬載並指定 replace
    let resolve = json!({
        "csv_data": import_data["csv_data"],
        "import_type": "disposal",
        "filename": import_data["filename"],
        "conflict_resolution": "replace",
        "apply_to_all": true,
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/manifests/resolve_conflicts", "importer", &resolve))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["imported"], json!(1));

    // 替換後可見列仍唯一
    let response = app
        .oneshot(get_request("/api/manifests?manifest_id=M001", "importer"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total_count"], json!(1));
}

/// 上傳驗證失敗: 不支援的副檔名回 400，不改變任何狀態
#[tokio::test]
async fn test_upload_validation_rejects_bad_extension() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"import_type\"\r\n\r\ndisposal\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"csv_file\"; filename=\"upload.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY,
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/manifests/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header("x-auth-user", "tester")
        .header("x-auth-roles", "importer")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));

    let response = app
        .oneshot(get_request("/api/manifests", "importer"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total_count"], json!(0));
}

/// 批量軟刪除端點: 冪等，重複刪除回報零筆
#[tokio::test]
async fn test_bulk_soft_delete_endpoint_idempotent() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    let response = app
        .clone()
        .oneshot(import_request(&disposal_csv(&[("M001", "W01")]), "disposal", "skip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json!({
        "manifests": [{ "type": "disposal", "manifestId": "M001", "wasteId": "W01" }]
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/manifests/delete", "importer", &payload))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["deleted_count"], json!(1));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/manifests/delete", "importer", &payload))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["deleted_count"], json!(0));

    // 刪除後明細回 404 結構化回應
    let response = app
        .oneshot(get_request("/api/manifests/disposal/M001/W01", "importer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// 明細端點: 可見聯單回傳完整階段子記錄
#[tokio::test]
async fn test_manifest_detail_returns_stages() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    app.clone()
        .oneshot(import_request(&disposal_csv(&[("M001", "W01")]), "disposal", "skip"))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/manifests/disposal/M001/W01", "importer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["company_name"], json!("仁心醫院"));
    assert_eq!(body["carrier_name"], json!("清運一社"));
    assert_eq!(body["processor_name"], json!("處理一廠"));
    assert!(body["report"].is_object());
    assert!(body["disposal_data"].is_object());
    assert!(body["recycling"].is_null());
}

/// 匯出端點: 回傳帶 BOM 的 CSV 附件
#[tokio::test]
async fn test_export_endpoint_returns_csv() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    app.clone()
        .oneshot(import_request(&disposal_csv(&[("M001", "W01")]), "disposal", "skip"))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/manifests/export", "importer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert!(text.contains("M001"));
}

/// 自動完成端點: 子字串匹配，至多 20 筆
#[tokio::test]
async fn test_autocomplete_waste_code() {
    logging::init_test();

    let (_temp, conn) = create_test_db().unwrap();
    let app = test_app(conn);

    app.clone()
        .oneshot(import_request(&disposal_csv(&[("M001", "W01")]), "disposal", "skip"))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/autocomplete/waste_code?q=d-18", "importer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["code"], json!("D-1801"));
}
