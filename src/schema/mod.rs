// ==========================================
// 批量发货处理引擎 - 列模式注册表
// ==========================================
// 职责: 声明式列定义（必填/类型/校验器三元组即数据）
// 红线: 纯配置，无可变状态；模式畸形属编程错误而非运行时错误
// ==========================================

pub mod shipment;

use crate::domain::record::RawRow;
use crate::domain::types::{FieldValue, PrimitiveType};
use std::collections::HashSet;

pub use shipment::shipment_schema;

// ==========================================
// 跨字段校验器
// ==========================================
// 统一签名: (转换后的值, 完整原始行) -> Ok | 错误消息
// 接收整行，使 "COD 单必须有 COD 金额" 这类规则可察看兄弟列
pub type CrossFieldValidator = fn(&FieldValue, &RawRow) -> Result<(), String>;

// ==========================================
// ColumnDefinition - 列定义
// ==========================================
// 新增字段 = 在声明表中加一行数据，而非新增 if 分支
#[derive(Clone)]
pub struct ColumnDefinition {
    /// 模板表头的精确文本（模式内唯一）
    pub source_label: &'static str,
    /// 下游使用的逻辑字段名
    pub target_key: &'static str,
    pub required: bool,
    pub primitive_type: PrimitiveType,
    /// 枚举允许取值（有序，规范大小写即存储大小写）
    pub enum_options: &'static [&'static str],
    /// 可选数值列的声明默认值（原始值为空时采用）
    pub default_number: Option<f64>,
    pub validator: Option<CrossFieldValidator>,
}

impl std::fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("source_label", &self.source_label)
            .field("target_key", &self.target_key)
            .field("required", &self.required)
            .field("primitive_type", &self.primitive_type)
            .field("enum_options", &self.enum_options)
            .field("default_number", &self.default_number)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

// ==========================================
// SchemaRegistry - 模式注册表
// ==========================================
// 进程级只读配置，可安全跨会话共享
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    columns: Vec<ColumnDefinition>,
}

impl SchemaRegistry {
    /// 由列定义表构造注册表
    ///
    /// # Panics
    /// source_label 重复时 panic（模式畸形属编程错误）
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let mut seen = HashSet::new();
        for col in &columns {
            assert!(
                seen.insert(col.source_label),
                "duplicate source_label in schema: {}",
                col.source_label
            );
        }
        Self { columns }
    }

    /// 有序列定义列表（即模板列序）
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// 必填列的表头标签集合
    pub fn required_labels(&self) -> HashSet<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.source_label)
            .collect()
    }

    /// 按表头标签查列定义；未声明的列返回 None（由后续阶段忽略）
    pub fn column(&self, source_label: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.source_label == source_label)
    }

    /// 日期类型列的标签集合（摄取阶段日期序列号转换使用）
    pub fn date_labels(&self) -> HashSet<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.primitive_type == PrimitiveType::Date)
            .map(|c| c.source_label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_rejects_duplicate_labels() {
        let result = std::panic::catch_unwind(|| {
            SchemaRegistry::new(vec![
                ColumnDefinition {
                    source_label: "A",
                    target_key: "a",
                    required: false,
                    primitive_type: PrimitiveType::Text,
                    enum_options: &[],
                    default_number: None,
                    validator: None,
                },
                ColumnDefinition {
                    source_label: "A",
                    target_key: "a2",
                    required: false,
                    primitive_type: PrimitiveType::Text,
                    enum_options: &[],
                    default_number: None,
                    validator: None,
                },
            ])
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_required_and_date_labels() {
        let schema = shipment_schema();
        let required = schema.required_labels();
        assert!(required.contains("*Warehouse ID"));
        assert!(required.contains("*Customer Phone"));
        assert!(!required.contains("COD Amount"));

        assert!(schema.date_labels().contains("Order Date"));
    }
}
