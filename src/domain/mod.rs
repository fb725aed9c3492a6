// ==========================================
// 批量发货处理引擎 - 领域层
// ==========================================
// 职责: 管道各阶段共享的实体与类型
// 所有权: 除 Schema 外的实体均归属单一上传会话
// ==========================================

pub mod record;
pub mod submission;
pub mod types;

pub use record::{ErrorAnchor, RawRow, RowFields, ValidatedRecord, ValidationError};
pub use submission::{
    OutboundPayload, PriceEstimate, RemoteReference, SubmissionOutcome, SubmissionReport,
};
pub use types::{FieldValue, PrimitiveType, SessionState};
