// ==========================================
// 批量发货处理引擎 - 领域类型定义
// ==========================================
// 列类型体系 + 单元格值 + 会话状态机
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 列类型 (Primitive Type)
// ==========================================
// 模板列声明的原始类型，驱动校验阶段的类型转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveType {
    Number,  // 数值（允许千分位分隔符）
    Text,    // 自由文本
    Enum,    // 枚举（取值限定，大小写不敏感匹配）
    Date,    // 日期（规范形式 YYYY-MM-DD）
    Boolean, // 布尔（大小写不敏感 "true"）
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Number => write!(f, "NUMBER"),
            PrimitiveType::Text => write!(f, "TEXT"),
            PrimitiveType::Enum => write!(f, "ENUM"),
            PrimitiveType::Date => write!(f, "DATE"),
            PrimitiveType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

// ==========================================
// 单元格值 (Field Value)
// ==========================================
// 校验阶段类型转换的产物；日期与枚举以规范文本承载
// 序列化: untagged（提交载荷中呈现为 JSON 原生标量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// 必填判定口径：空值 / 空白文本 / NaN 视为缺失
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => n.is_nan(),
            FieldValue::Bool(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

// ==========================================
// 上传会话状态 (Session State)
// ==========================================
// EMPTY 同时是初始态与终止/重置态；
// 校验与提交在同一会话内绝不并发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Empty,              // 无文件
    Loading,            // 解析/校验进行中
    PreviewWithErrors,  // 预览：存在校验错误
    PreviewValid,       // 预览：全部通过
    Submitting,         // 批量提交进行中
    PreviewWithResults, // 预览：已回填提交结果
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Empty => write!(f, "EMPTY"),
            SessionState::Loading => write!(f, "LOADING"),
            SessionState::PreviewWithErrors => write!(f, "PREVIEW_WITH_ERRORS"),
            SessionState::PreviewValid => write!(f, "PREVIEW_VALID"),
            SessionState::Submitting => write!(f, "SUBMITTING"),
            SessionState::PreviewWithResults => write!(f, "PREVIEW_WITH_RESULTS"),
        }
    }
}
