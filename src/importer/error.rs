// ==========================================
// 批量发货处理引擎 - 摄取层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: ParseError 对会话致命，用户须重新上传；
//       缺少期望列不属于解析错误（归校验层处理）
// ==========================================

use thiserror::Error;

/// 摄取层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 内容结构错误 =====
    #[error("工作簿不含任何工作表")]
    NoWorksheet,

    #[error("文件仅有表头，没有数据行")]
    EmptySheet,

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
