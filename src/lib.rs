// ==========================================
// 批量发货处理引擎 - 核心库
// ==========================================
// 管道: 摄取 → 校验 → 转换 → 提交 → 对账
// 系统定位: 商户批量上传的后端处理引擎
// （外围仪表盘/鉴权/单票 CRUD 均为外部协作方，不在本库）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 模式层 - 声明式列定义
pub mod schema;

// 摄取层 - 电子表格解析
pub mod importer;

// 校验层 - 类型转换与规则引擎
pub mod validator;

// 转换层 - 外发载荷整形
pub mod transformer;

// 提交层 - 批量外发与回执归集
pub mod submission;

// 对账层 - 行回溯与报表导出
pub mod reconciliation;

// 会话层 - 上传全流程编排
pub mod session;

// 配置层 - 端点与服务身份
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ErrorAnchor, FieldValue, OutboundPayload, PriceEstimate, PrimitiveType, RawRow,
    RemoteReference, RowFields, SessionState, SubmissionOutcome, SubmissionReport,
    ValidatedRecord, ValidationError,
};

// 模式
pub use schema::{shipment_schema, ColumnDefinition, CrossFieldValidator, SchemaRegistry};

// 管道各阶段
pub use importer::{CsvParser, ExcelParser, FileParser, ImportError, UniversalFileParser};
pub use reconciliation::{
    build_error_report, build_failure_report, map_errors_to_rows, CorrelationIndex, RowIndex,
};
pub use submission::{
    BatchSubmitter, HttpBatchSubmitter, HttpPriceEstimator, PriceEstimator, SubmissionError,
};
pub use transformer::PayloadTransformer;
pub use validator::{ValidationEngine, ValidationOutcome};

// 会话与配置
pub use config::SubmitConfig;
pub use session::{SessionError, UploadSession};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "批量发货处理引擎";
