// ==========================================
// 批量发货处理引擎 - 载荷转换器
// ==========================================
// 职责: ValidatedRecord → 外部契约形状的 OutboundPayload
// 口径: 纯函数、全函数（输入已通过校验，构造上无失败路径）；
//       重量 kg → 整数克（× 1000 四舍五入）
// ==========================================

use crate::domain::record::ValidatedRecord;
use crate::domain::submission::OutboundPayload;

pub struct PayloadTransformer;

impl PayloadTransformer {
    /// 将整批已校验记录转换为外发载荷，逐条携带 correlation_id
    pub fn transform(&self, records: &[ValidatedRecord]) -> Vec<OutboundPayload> {
        records.iter().map(Self::to_payload).collect()
    }

    fn to_payload(record: &ValidatedRecord) -> OutboundPayload {
        let weight_kg = record.field("weight_kg").as_number().unwrap_or(0.0);

        OutboundPayload {
            correlation_id: record.correlation_id,

            order_id: required_text(record, "order_id"),
            warehouse_id: required_text(record, "warehouse_id"),

            customer_name: required_text(record, "customer_name"),
            customer_phone: required_text(record, "customer_phone"),
            shipping_address: required_text(record, "shipping_address"),
            pincode: required_text(record, "pincode"),
            city: optional_text(record, "city"),
            state: optional_text(record, "state"),

            payment_mode: required_text(record, "payment_mode"),
            cod_amount: record.field("cod_amount").as_number(),

            weight_grams: (weight_kg * 1000.0).round() as i64,
            length_cm: record.field("length_cm").as_number(),
            width_cm: record.field("width_cm").as_number(),
            height_cm: record.field("height_cm").as_number(),
            fragile: record.field("fragile").as_bool().unwrap_or(false),

            product_name: required_text(record, "product_name"),
            quantity: record.field("quantity").as_number().unwrap_or(1.0) as u32,
            sku: optional_text(record, "sku"),
            order_date: optional_text(record, "order_date"),
        }
    }
}

fn required_text(record: &ValidatedRecord, target_key: &str) -> String {
    record
        .field(target_key)
        .as_text()
        .unwrap_or_default()
        .to_string()
}

fn optional_text(record: &ValidatedRecord, target_key: &str) -> Option<String> {
    record.field(target_key).as_text().map(str::to_string)
}
