// ==========================================
// 廢棄物清運聯單管理系統 - 權限層級表
// ==========================================
// 職責: 身分組全序比較（最高/最低/全部）與帳號刪除權限判定
// 約束: 層級表於啟動時注入，不使用全域可變狀態；
//       未知身分組一律視為層級 0，預設拒絕，不得 panic
// ==========================================

use serde::{Deserialize, Serialize};

/// 查無身分組時回傳的哨兵名稱
pub const UNDEFINED_ROLE: &str = "not-defined";

/// 具名身分組與其層級
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRank {
    pub name: String,
    pub rank: i32,
}

/// 身分組層級表
///
/// 有效授權以持有身分組中的最高層級為準
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    ranks: Vec<RoleRank>,
}

impl RoleHierarchy {
    /// 以給定的 (名稱, 層級) 表建立
    pub fn new(table: Vec<(String, i32)>) -> Self {
        let ranks = table
            .into_iter()
            .map(|(name, rank)| RoleRank { name, rank })
            .collect();
        Self { ranks }
    }

    /// 預設層級表
    ///
    /// registrar 與 importer 同層級，層級比較時視為等價
    pub fn default_table() -> Vec<(String, i32)> {
        vec![
            ("root".to_string(), 40),
            ("moderator".to_string(), 30),
            ("staff".to_string(), 20),
            ("registrar".to_string(), 10),
            ("importer".to_string(), 10),
        ]
    }

    /// 查詢身分組層級；未知身分組回傳 0
    pub fn rank_of(&self, role: &str) -> i32 {
        self.ranks
            .iter()
            .find(|r| r.name == role)
            .map(|r| r.rank)
            .unwrap_or(0)
    }

    /// 持有身分組中的最高層級；無身分組回傳 None
    pub fn highest<'a>(&self, roles: &'a [String]) -> Option<(&'a str, i32)> {
        roles
            .iter()
            .map(|r| (r.as_str(), self.rank_of(r)))
            .max_by_key(|(_, rank)| *rank)
    }

    /// 持有身分組中的最低層級；無身分組回傳 None
    pub fn lowest<'a>(&self, roles: &'a [String]) -> Option<(&'a str, i32)> {
        roles
            .iter()
            .map(|r| (r.as_str(), self.rank_of(r)))
            .min_by_key(|(_, rank)| *rank)
    }

    /// 最高層級的身分組名稱；無身分組回傳哨兵
    pub fn highest_name<'a>(&self, roles: &'a [String]) -> &'a str {
        self.highest(roles).map(|(name, _)| name).unwrap_or(UNDEFINED_ROLE)
    }

    /// 最高層級的數值；無身分組回傳 0
    pub fn highest_rank(&self, roles: &[String]) -> i32 {
        self.highest(roles).map(|(_, rank)| rank).unwrap_or(0)
    }

    /// 持有的全部身分組名稱
    pub fn all<'a>(&self, roles: &'a [String]) -> Vec<&'a str> {
        roles.iter().map(|r| r.as_str()).collect()
    }

    /// 是否滿足指定身分組的最低層級要求
    pub fn satisfies(&self, roles: &[String], min_role: &str) -> bool {
        self.highest_rank(roles) >= self.rank_of(min_role) && self.rank_of(min_role) > 0
    }

    /// 帳號刪除權限：操作者最高層級須「嚴格大於」目標，且不得刪除自己
    pub fn can_delete_account(
        &self,
        actor_roles: &[String],
        target_roles: &[String],
        is_self: bool,
    ) -> bool {
        if is_self {
            return false;
        }
        self.highest_rank(actor_roles) > self.highest_rank(target_roles)
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::new(Self::default_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_of_known_and_unknown() {
        let hierarchy = RoleHierarchy::default();
        assert_eq!(hierarchy.rank_of("root"), 40);
        assert_eq!(hierarchy.rank_of("importer"), 10);
        // 未知身分組不得 panic，層級視為 0
        assert_eq!(hierarchy.rank_of("ghost"), 0);
    }

    #[test]
    fn test_highest_and_lowest() {
        let hierarchy = RoleHierarchy::default();
        let user = roles(&["importer", "moderator"]);
        assert_eq!(hierarchy.highest(&user), Some(("moderator", 30)));
        assert_eq!(hierarchy.lowest(&user), Some(("importer", 10)));
        assert_eq!(hierarchy.highest_name(&user), "moderator");
    }

    #[test]
    fn test_no_roles_is_undefined() {
        let hierarchy = RoleHierarchy::default();
        let user: Vec<String> = vec![];
        assert_eq!(hierarchy.highest(&user), None);
        assert_eq!(hierarchy.highest_name(&user), UNDEFINED_ROLE);
        assert_eq!(hierarchy.highest_rank(&user), 0);
    }

    #[test]
    fn test_satisfies() {
        let hierarchy = RoleHierarchy::default();
        assert!(hierarchy.satisfies(&roles(&["root"]), "moderator"));
        assert!(hierarchy.satisfies(&roles(&["registrar"]), "importer")); // 同層級
        assert!(!hierarchy.satisfies(&roles(&["importer"]), "moderator"));
        // 未知的最低要求層級為 0，預設拒絕
        assert!(!hierarchy.satisfies(&roles(&["root"]), "ghost"));
    }

    #[test]
    fn test_can_delete_account() {
        let hierarchy = RoleHierarchy::default();
        // 嚴格大於才可刪除
        assert!(hierarchy.can_delete_account(&roles(&["root"]), &roles(&["moderator"]), false));
        assert!(!hierarchy.can_delete_account(&roles(&["moderator"]), &roles(&["moderator"]), false));
        assert!(!hierarchy.can_delete_account(&roles(&["importer"]), &roles(&["root"]), false));
        // 任何層級皆不可刪除自己
        assert!(!hierarchy.can_delete_account(&roles(&["root"]), &roles(&["importer"]), true));
    }
}
