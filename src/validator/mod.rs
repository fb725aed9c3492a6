// ==========================================
// 批量发货处理引擎 - 校验引擎
// ==========================================
// 职责: 表头完整性 → 逐行逐列类型转换/必填/跨字段校验
// 红线: 表头错误是唯一快速失败路径；
//       行级错误全量累积，绝不因单格失败中断其余单元格/行；
//       每个 (行, 列) 至多保留一条错误，后写覆盖先写
// ==========================================

use crate::domain::record::{ErrorAnchor, RawRow, RowFields, ValidatedRecord, ValidationError};
use crate::domain::types::{FieldValue, PrimitiveType};
use crate::schema::{ColumnDefinition, SchemaRegistry};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// ErrorCollector - 错误累积器
// ==========================================
// (anchor, source_label) 去重，保持首次出现的顺序，后写覆盖内容
struct ErrorCollector {
    order: Vec<ValidationError>,
    index: HashMap<(ErrorAnchor, String), usize>,
}

impl ErrorCollector {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, error: ValidationError) {
        let key = (error.anchor, error.source_label.clone());
        match self.index.get(&key) {
            Some(&pos) => self.order[pos] = error,
            None => {
                self.index.insert(key, self.order.len());
                self.order.push(error);
            }
        }
    }

    fn into_vec(self) -> Vec<ValidationError> {
        self.order
    }
}

// ==========================================
// ValidationOutcome - 校验结果
// ==========================================
// errors 与 records 同时返回：前者供展示/导出，后者供转换提交。
// 每个 RawRow 恰好被计入一次：要么零错误晋升，要么携带 >= 1 条错误
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationError>,
    /// 全部行的尽力转换值（含错行也保留，供预览回显）
    pub rows: Vec<RowFields>,
    /// 零错误行，correlation_id 按原始行序 1..N 连续分配
    pub records: Vec<ValidatedRecord>,
}

impl ValidationOutcome {
    pub fn has_structural_error(&self) -> bool {
        self.errors.iter().any(ValidationError::is_structural)
    }
}

// ==========================================
// ValidationEngine - 校验引擎
// ==========================================
// 纯同步 CPU 计算，不做任何 IO；模式只读共享
pub struct ValidationEngine {
    schema: Arc<SchemaRegistry>,
}

impl ValidationEngine {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// 校验主流程
    ///
    /// 1. 表头完整性（唯一快速失败路径：单条结构性错误 + 零记录）
    /// 2. 逐行逐列：转换 → 必填 → 校验器，单格至多一条错误
    /// 3. 零错误行晋升为 ValidatedRecord
    pub fn validate(&self, rows: &[RawRow]) -> ValidationOutcome {
        // === 步骤 1: 表头完整性 ===
        if let Some(first_row) = rows.first() {
            let missing: Vec<&str> = self
                .schema
                .columns()
                .iter()
                .filter(|c| c.required && !first_row.cells.contains_key(c.source_label))
                .map(|c| c.source_label)
                .collect();

            if !missing.is_empty() {
                info!(missing = ?missing, "表头缺少必填列，跳过行级校验");
                return ValidationOutcome {
                    errors: vec![ValidationError::header(format!(
                        "Missing required columns: {}",
                        missing.join(", ")
                    ))],
                    rows: Vec::new(),
                    records: Vec::new(),
                };
            }
        }

        // === 步骤 2: 逐行逐列校验 ===
        let mut collector = ErrorCollector::new();
        let mut row_fields = Vec::with_capacity(rows.len());
        let mut records = Vec::new();
        let mut next_correlation_id: u32 = 1;

        for row in rows {
            let mut fields = HashMap::with_capacity(self.schema.columns().len());
            let mut error_count = 0usize;

            for column in self.schema.columns() {
                let raw = row.cell(column.source_label);

                // (a) + (b) 类型转换
                let (value, mut cell_error) = coerce_cell(column, raw);

                // (c) 必填检查（已有转换错误的单元格跳过）
                if cell_error.is_none() && column.required && value.is_missing() {
                    cell_error = Some(format!("{} is required.", column.source_label));
                }

                // (d) 校验器（仅在该单元格尚无错误时运行）
                if cell_error.is_none() {
                    if let Some(validator) = column.validator {
                        if let Err(message) = validator(&value, row) {
                            cell_error = Some(message);
                        }
                    }
                }

                // (e) 无论是否报错都写入转换值（尽力预览）
                fields.insert(column.target_key.to_string(), value);

                if let Some(message) = cell_error {
                    error_count += 1;
                    collector.push(ValidationError::cell(row.row_id, column.source_label, message));
                }
            }

            // === 步骤 3: 零错误行晋升 ===
            if error_count == 0 {
                records.push(ValidatedRecord {
                    correlation_id: next_correlation_id,
                    row_id: row.row_id,
                    fields: fields.clone(),
                });
                next_correlation_id += 1;
            }

            row_fields.push(RowFields {
                row_id: row.row_id,
                fields,
                error_count,
            });
        }

        let errors = collector.into_vec();
        debug!(
            rows = rows.len(),
            errors = errors.len(),
            records = records.len(),
            "行级校验完成"
        );

        ValidationOutcome {
            errors,
            rows: row_fields,
            records,
        }
    }
}

// ==========================================
// 单元格类型转换
// ==========================================
// 返回 (转换值, 可选错误)；转换失败时保留原始文本供预览
fn coerce_cell(column: &ColumnDefinition, raw: &str) -> (FieldValue, Option<String>) {
    let trimmed = raw.trim();

    match column.primitive_type {
        PrimitiveType::Number => {
            if trimmed.is_empty() {
                return match column.default_number {
                    Some(default) => (FieldValue::Number(default), None),
                    None => (FieldValue::Empty, None),
                };
            }
            // 去除千分位分隔符后按浮点解析
            let normalized: String = trimmed.chars().filter(|c| *c != ',').collect();
            match normalized.parse::<f64>() {
                Ok(n) if !n.is_nan() => (FieldValue::Number(n), None),
                _ => (
                    FieldValue::Text(trimmed.to_string()),
                    Some("Must be a valid number.".to_string()),
                ),
            }
        }
        PrimitiveType::Boolean => (FieldValue::Bool(trimmed.eq_ignore_ascii_case("true")), None),
        PrimitiveType::Text => {
            if trimmed.is_empty() {
                (FieldValue::Empty, None)
            } else {
                (FieldValue::Text(trimmed.to_string()), None)
            }
        }
        PrimitiveType::Enum => {
            if trimmed.is_empty() {
                return (FieldValue::Empty, None);
            }
            // 大小写不敏感匹配，存储模式声明的规范大小写
            match column
                .enum_options
                .iter()
                .find(|opt| opt.eq_ignore_ascii_case(trimmed))
            {
                Some(canonical) => (FieldValue::Text(canonical.to_string()), None),
                None => (
                    FieldValue::Text(trimmed.to_string()),
                    Some(format!("Must be one of: {}.", column.enum_options.join(", "))),
                ),
            }
        }
        PrimitiveType::Date => {
            if trimmed.is_empty() {
                return (FieldValue::Empty, None);
            }
            match parse_flexible_date(trimmed) {
                Some(date) => (FieldValue::Text(date.format("%Y-%m-%d").to_string()), None),
                None => (
                    FieldValue::Text(trimmed.to_string()),
                    Some("Must be a valid date (YYYY-MM-DD).".to_string()),
                ),
            }
        }
    }
}

/// 日期文本解析：优先规范格式，兼容常见商户手填格式
fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::shipment_schema;

    fn engine() -> ValidationEngine {
        ValidationEngine::new(Arc::new(shipment_schema()))
    }

    /// 构造包含全部表头的合法行；覆盖项以 (标签, 值) 传入
    fn make_row(row_id: u32, overrides: &[(&str, &str)]) -> RawRow {
        let schema = shipment_schema();
        let mut cells: HashMap<String, String> = schema
            .columns()
            .iter()
            .map(|c| (c.source_label.to_string(), String::new()))
            .collect();

        // 基线合法值
        for (label, value) in [
            ("*Order ID", "OD-1001"),
            ("*Warehouse ID", "WH-01"),
            ("*Customer Name", "Asha Rao"),
            ("*Customer Phone", "9876543210"),
            ("*Shipping Address", "12 MG Road"),
            ("*Pincode", "560001"),
            ("*Payment Mode", "Pre-paid"),
            ("*Weight (kg)", "1.25"),
            ("*Product Name", "Steel Bottle"),
        ] {
            cells.insert(label.to_string(), value.to_string());
        }
        for (label, value) in overrides {
            cells.insert(label.to_string(), value.to_string());
        }
        RawRow { row_id, cells }
    }

    #[test]
    fn test_valid_row_promotes_with_correlation_id() {
        let outcome = engine().validate(&[make_row(2, &[]), make_row(3, &[])]);

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].correlation_id, 1);
        assert_eq!(outcome.records[1].correlation_id, 2);
        assert_eq!(outcome.records[0].row_id, 2);
    }

    #[test]
    fn test_missing_required_phone_scenario() {
        // 场景: 缺少客户电话 → 恰好一条错误，行不晋升
        let outcome = engine().validate(&[make_row(2, &[("*Customer Phone", "")])]);

        assert_eq!(outcome.errors.len(), 1);
        let err = &outcome.errors[0];
        assert_eq!(err.anchor, ErrorAnchor::Row(2));
        assert_eq!(err.source_label, "*Customer Phone");
        assert_eq!(err.message, "*Customer Phone is required.");
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.rows[0].error_count, 1);
    }

    #[test]
    fn test_cod_cross_field_scenario() {
        // COD + 空金额 → COD Amount 上报跨字段错误
        let outcome = engine().validate(&[make_row(2, &[("*Payment Mode", "cod")])]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source_label, "COD Amount");
        assert_eq!(outcome.errors[0].message, "Required (>= 1) for COD");

        // Pre-paid + 空金额 → 无错误
        let outcome = engine().validate(&[make_row(2, &[("*Payment Mode", "Pre-paid")])]);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_missing_header_short_circuits() {
        // 场景: 表头缺少 *Warehouse ID → 单条结构性错误，零记录
        let mut row = make_row(2, &[]);
        row.cells.remove("*Warehouse ID");
        let mut row2 = make_row(3, &[]);
        row2.cells.remove("*Warehouse ID");

        let outcome = engine().validate(&[row, row2]);

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].is_structural());
        assert_eq!(
            outcome.errors[0].message,
            "Missing required columns: *Warehouse ID"
        );
        assert!(outcome.records.is_empty());
        assert!(outcome.rows.is_empty());
        assert!(outcome.has_structural_error());
    }

    #[test]
    fn test_number_coercion_rules() {
        // 千分位合法；非数值文本报转换错误且必填检查不再叠加
        let outcome = engine().validate(&[
            make_row(2, &[("*Weight (kg)", "1,250.5")]),
            make_row(3, &[("*Weight (kg)", "heavy")]),
        ]);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].anchor, ErrorAnchor::Row(3));
        assert_eq!(outcome.errors[0].message, "Must be a valid number.");

        // 行 2 晋升且保留解析后的数值
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.records[0].field("weight_kg"),
            &FieldValue::Number(1250.5)
        );
    }

    #[test]
    fn test_enum_case_insensitive_canonical_casing() {
        let outcome = engine().validate(&[make_row(
            2,
            &[("*Payment Mode", "cod"), ("COD Amount", "499")],
        )]);

        assert!(outcome.errors.is_empty());
        // 存储的是模式声明的规范大小写
        assert_eq!(
            outcome.records[0].field("payment_mode"),
            &FieldValue::Text("COD".to_string())
        );
    }

    #[test]
    fn test_enum_invalid_value() {
        let outcome = engine().validate(&[make_row(2, &[("*Payment Mode", "wallet")])]);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message, "Must be one of: COD, Pre-paid.");
    }

    #[test]
    fn test_negative_number_passes_coercion_fails_rule() {
        // 负数通过类型转换，由字段规则拒绝
        let outcome = engine().validate(&[make_row(2, &[("*Weight (kg)", "-2.5")])]);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message, "Must be greater than 0.");
    }

    #[test]
    fn test_quantity_default_applied() {
        let outcome = engine().validate(&[make_row(2, &[])]);
        assert_eq!(
            outcome.records[0].field("quantity"),
            &FieldValue::Number(1.0)
        );
    }

    #[test]
    fn test_date_coercion() {
        let ok = engine().validate(&[make_row(2, &[("Order Date", "15/07/2026")])]);
        assert!(ok.errors.is_empty());
        assert_eq!(
            ok.records[0].field("order_date"),
            &FieldValue::Text("2026-07-15".to_string())
        );

        let bad = engine().validate(&[make_row(2, &[("Order Date", "someday")])]);
        assert_eq!(bad.errors.len(), 1);
        assert_eq!(bad.errors[0].message, "Must be a valid date (YYYY-MM-DD).");
    }

    #[test]
    fn test_boolean_coercion() {
        let outcome = engine().validate(&[make_row(2, &[("Fragile", "TRUE")])]);
        assert_eq!(outcome.records[0].field("fragile"), &FieldValue::Bool(true));

        let outcome = engine().validate(&[make_row(2, &[("Fragile", "yes")])]);
        assert_eq!(outcome.records[0].field("fragile"), &FieldValue::Bool(false));
    }

    #[test]
    fn test_undeclared_columns_ignored() {
        let mut row = make_row(2, &[]);
        row.cells
            .insert("Internal Notes".to_string(), "do not ship before Friday".to_string());

        let outcome = engine().validate(&[row]);

        assert!(outcome.errors.is_empty());
        assert!(!outcome.records[0].fields.contains_key("Internal Notes"));
    }

    #[test]
    fn test_every_row_accounted_exactly_once() {
        // 性质: 含错行数 + 晋升行数 == 总行数
        let rows = vec![
            make_row(2, &[]),
            make_row(3, &[("*Customer Phone", "")]),
            make_row(4, &[("*Weight (kg)", "abc"), ("*Pincode", "12")]),
            make_row(5, &[]),
        ];
        let outcome = engine().validate(&rows);

        let rows_with_errors = outcome.rows.iter().filter(|r| r.error_count > 0).count();
        assert_eq!(rows_with_errors + outcome.records.len(), rows.len());

        // correlation_id 稠密无空洞、单调递增
        let ids: Vec<u32> = outcome.records.iter().map(|r| r.correlation_id).collect();
        assert_eq!(ids, vec![1, 2]);
        // 行 4 两个坏单元格 → 两条错误，但行只计一次
        assert_eq!(outcome.rows[2].error_count, 2);
    }

    #[test]
    fn test_collector_last_write_wins() {
        let mut collector = ErrorCollector::new();
        collector.push(ValidationError::cell(2, "*Pincode", "first"));
        collector.push(ValidationError::cell(2, "*Pincode", "second"));
        collector.push(ValidationError::cell(3, "*Pincode", "other row"));

        let errors = collector.into_vec();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "second");
    }
}
