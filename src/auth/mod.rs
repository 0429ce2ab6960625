// ==========================================
// 廢棄物清運聯單管理系統 - 授權層
// ==========================================
// 職責: 身分組層級比較 + 請求授權閘
// ==========================================

pub mod guard;
pub mod hierarchy;

pub use guard::{authorize, extract_principal, AuthRedirect, Principal};
pub use hierarchy::{RoleHierarchy, RoleRank, UNDEFINED_ROLE};
