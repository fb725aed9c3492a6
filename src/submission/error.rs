// ==========================================
// 批量发货处理引擎 - 提交层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: 传输类错误 = 任何单条回执确定之前的失败，
//       一律视为"零条已提交"，调用方可原样重试整批
// ==========================================

use thiserror::Error;

/// 提交层错误类型（传输失败；单条业务拒绝不走此通道）
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("连接提交端点失败: {0}")]
    Connect(String),

    #[error("提交请求超时（{0} 秒）")]
    Timeout(u64),

    #[error("提交端点返回 HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("提交响应无法解析: {0}")]
    MalformedResponse(String),

    #[error("提交已取消（按传输失败处理，不假定任何部分成功）")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type SubmissionResult<T> = Result<T, SubmissionError>;
