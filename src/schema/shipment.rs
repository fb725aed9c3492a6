// ==========================================
// 批量发货处理引擎 - 发货单列模式
// ==========================================
// 职责: 批量上传模板的默认列定义表 + 逐列校验规则
// 口径: 表头带 * 前缀者为必填列，与下载模板严格一致
// ==========================================

use crate::domain::record::RawRow;
use crate::domain::types::{FieldValue, PrimitiveType};
use crate::schema::{ColumnDefinition, SchemaRegistry};

// ==========================================
// 列校验器
// ==========================================

/// 电话: 去除空格/连字符后须为 10 位数字
fn validate_phone(value: &FieldValue, _row: &RawRow) -> Result<(), String> {
    let Some(text) = value.as_text() else {
        return Ok(()); // 缺失交由必填检查处理
    };
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Must be a valid 10-digit phone number.".to_string())
    }
}

/// 邮编: 6 位数字
fn validate_pincode(value: &FieldValue, _row: &RawRow) -> Result<(), String> {
    let Some(text) = value.as_text() else {
        return Ok(());
    };
    if text.len() == 6 && text.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Must be a valid 6-digit pincode.".to_string())
    }
}

/// COD 金额: 支付方式为 COD 时必填且 >= 1（跨字段规则）
fn validate_cod_amount(value: &FieldValue, row: &RawRow) -> Result<(), String> {
    let payment_mode = row.cell("*Payment Mode").trim();
    if !payment_mode.eq_ignore_ascii_case("cod") {
        return Ok(());
    }
    match value.as_number() {
        Some(amount) if amount >= 1.0 => Ok(()),
        _ => Err("Required (>= 1) for COD".to_string()),
    }
}

/// 重量: 须为正数（负数能通过类型转换，在此拦截）
fn validate_weight(value: &FieldValue, _row: &RawRow) -> Result<(), String> {
    match value.as_number() {
        Some(kg) if kg > 0.0 => Ok(()),
        Some(_) => Err("Must be greater than 0.".to_string()),
        None => Ok(()),
    }
}

/// 包裹尺寸: 非负
fn validate_dimension(value: &FieldValue, _row: &RawRow) -> Result<(), String> {
    match value.as_number() {
        Some(cm) if cm < 0.0 => Err("Must be non-negative.".to_string()),
        _ => Ok(()),
    }
}

/// 数量: 至少 1 的整数
fn validate_quantity(value: &FieldValue, _row: &RawRow) -> Result<(), String> {
    match value.as_number() {
        Some(qty) if qty >= 1.0 && qty.fract() == 0.0 => Ok(()),
        Some(_) => Err("Must be a whole number of at least 1.".to_string()),
        None => Ok(()),
    }
}

// ==========================================
// 默认发货单模式
// ==========================================
// 声明表：加列 = 加一行数据
pub fn shipment_schema() -> SchemaRegistry {
    SchemaRegistry::new(vec![
        ColumnDefinition {
            source_label: "*Order ID",
            target_key: "order_id",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "*Warehouse ID",
            target_key: "warehouse_id",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "*Customer Name",
            target_key: "customer_name",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "*Customer Phone",
            target_key: "customer_phone",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_phone),
        },
        ColumnDefinition {
            source_label: "*Shipping Address",
            target_key: "shipping_address",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "*Pincode",
            target_key: "pincode",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_pincode),
        },
        ColumnDefinition {
            source_label: "City",
            target_key: "city",
            required: false,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "State",
            target_key: "state",
            required: false,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "*Payment Mode",
            target_key: "payment_mode",
            required: true,
            primitive_type: PrimitiveType::Enum,
            enum_options: &["COD", "Pre-paid"],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "COD Amount",
            target_key: "cod_amount",
            required: false,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_cod_amount),
        },
        ColumnDefinition {
            source_label: "*Weight (kg)",
            target_key: "weight_kg",
            required: true,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_weight),
        },
        ColumnDefinition {
            source_label: "Length (cm)",
            target_key: "length_cm",
            required: false,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_dimension),
        },
        ColumnDefinition {
            source_label: "Width (cm)",
            target_key: "width_cm",
            required: false,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_dimension),
        },
        ColumnDefinition {
            source_label: "Height (cm)",
            target_key: "height_cm",
            required: false,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: None,
            validator: Some(validate_dimension),
        },
        ColumnDefinition {
            source_label: "*Product Name",
            target_key: "product_name",
            required: true,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "Quantity",
            target_key: "quantity",
            required: false,
            primitive_type: PrimitiveType::Number,
            enum_options: &[],
            default_number: Some(1.0),
            validator: Some(validate_quantity),
        },
        ColumnDefinition {
            source_label: "SKU",
            target_key: "sku",
            required: false,
            primitive_type: PrimitiveType::Text,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "Order Date",
            target_key: "order_date",
            required: false,
            primitive_type: PrimitiveType::Date,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
        ColumnDefinition {
            source_label: "Fragile",
            target_key: "fragile",
            required: false,
            primitive_type: PrimitiveType::Boolean,
            enum_options: &[],
            default_number: None,
            validator: None,
        },
    ])
}
