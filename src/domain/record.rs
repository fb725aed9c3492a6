// ==========================================
// 批量发货处理引擎 - 行记录领域模型
// ==========================================
// 原始行 / 校验错误 / 已校验记录
// 红线: 行身份 = 摄取时分配的 row_id，
//       永不随排序/过滤/分页重新编号
// ==========================================

use crate::domain::types::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// RawRow - 原始行
// ==========================================
// 用途: 摄取层产物，按表头标签键控的原始单元格
// 生命周期: 摄取时创建一次，此后不可变；
//           移除文件或开始新上传时整体废弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    /// 物理表格行号（表头为第 1 行，首个数据行为 2）
    pub row_id: u32,
    /// 表头标签 → 原始值；缺失单元格为 ""，绝不缺键
    pub cells: HashMap<String, String>,
}

impl RawRow {
    /// 按表头标签取原始值（缺失按空串处理）
    pub fn cell(&self, source_label: &str) -> &str {
        self.cells.get(source_label).map(String::as_str).unwrap_or("")
    }

    /// 整行是否全空白
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

// ==========================================
// ErrorAnchor - 错误定位
// ==========================================
// 结构性错误锚定在表头，行级错误锚定在 row_id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorAnchor {
    Header,
    Row(u32),
}

impl fmt::Display for ErrorAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorAnchor::Header => write!(f, "Header"),
            ErrorAnchor::Row(id) => write!(f, "{}", id),
        }
    }
}

// ==========================================
// ValidationError - 校验错误
// ==========================================
// 不变式: 每个 (anchor, source_label) 至多保留一条，后写覆盖先写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub anchor: ErrorAnchor,
    /// 出错列的表头标签；结构性错误使用哨兵值 "Header"
    pub source_label: String,
    pub message: String,
}

impl ValidationError {
    pub fn header(message: impl Into<String>) -> Self {
        Self {
            anchor: ErrorAnchor::Header,
            source_label: "Header".to_string(),
            message: message.into(),
        }
    }

    pub fn cell(row_id: u32, source_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            anchor: ErrorAnchor::Row(row_id),
            source_label: source_label.into(),
            message: message.into(),
        }
    }

    /// 可派生键 "{anchor}-{source_label}"，前端高亮与去重口径
    pub fn error_id(&self) -> String {
        format!("{}-{}", self.anchor, self.source_label)
    }

    pub fn is_structural(&self) -> bool {
        self.anchor == ErrorAnchor::Header
    }
}

// ==========================================
// RowFields - 行级尽力转换结果
// ==========================================
// 含错行的部分有效值也保留，供预览回显
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFields {
    pub row_id: u32,
    /// target_key → 转换后的值（无论该单元格是否报错都写入）
    pub fields: HashMap<String, FieldValue>,
    pub error_count: usize,
}

// ==========================================
// ValidatedRecord - 已校验记录
// ==========================================
// 仅零错误行晋升；correlation_id 按原始行序 1..N 连续分配，
// 独立于 row_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub correlation_id: u32,
    pub row_id: u32,
    pub fields: HashMap<String, FieldValue>,
}

impl ValidatedRecord {
    pub fn field(&self, target_key: &str) -> &FieldValue {
        self.fields.get(target_key).unwrap_or(&FieldValue::Empty)
    }
}
