// ==========================================
// 廢棄物清運聯單管理系統 - 領域層
// ==========================================
// 職責: 實體與類型定義，不含資料存取與業務流程
// ==========================================

pub mod manifest;
pub mod party;
pub mod types;

// 重導出核心類型
pub use manifest::{
    DisposalManifestData, ImportHistory, Manifest, ManifestKey, Processing, RawManifestRecord,
    Recycling, Report, ReuseManifestData, Transport,
};
pub use party::{Carrier, Company, Process, Processor, Reuser, Vehicle, WasteSubstance};
pub use types::{
    ConfirmationStatus, ConflictResolution, FilterLogic, ManifestType, OwnerType, SubstanceType,
};
