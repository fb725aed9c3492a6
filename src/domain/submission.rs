// ==========================================
// 批量发货处理引擎 - 提交领域模型
// ==========================================
// 外发载荷 / 单条回执 / 批次报告
// 红线: 提交结果三分法（传输失败 / 接受子集 / 拒绝子集），
//       未回执的 correlation_id 归入 unresolved，绝不并入成功
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// OutboundPayload - 外发载荷
// ==========================================
// 用途: 已校验记录按外部契约整形后的提交单元
// 口径: 重量以整数克承载（kg × 1000 四舍五入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub correlation_id: u32,

    // ===== 订单与仓库 =====
    pub order_id: String,
    pub warehouse_id: String,

    // ===== 收件人 =====
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub pincode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    // ===== 支付 =====
    pub payment_mode: String, // 规范取值 "COD" / "Pre-paid"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod_amount: Option<f64>,

    // ===== 包裹 =====
    pub weight_grams: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    pub fragile: bool,

    // ===== 货品 =====
    pub product_name: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>, // YYYY-MM-DD
}

// ==========================================
// RemoteReference - 远端标识
// ==========================================
// 接受成功后远端返回的运单/订单标识
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReference {
    pub order_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

// ==========================================
// SubmissionOutcome - 单条提交回执
// ==========================================
// 不变式: 回执中的 correlation_id ⊆ 已发送集合；
//         未发送的 id 绝不出现在回执中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub correlation_id: u32,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_reference: Option<RemoteReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

impl SubmissionOutcome {
    pub fn accepted(correlation_id: u32, remote_reference: RemoteReference) -> Self {
        Self {
            correlation_id,
            succeeded: true,
            remote_reference: Some(remote_reference),
            failure_message: None,
        }
    }

    pub fn rejected(correlation_id: u32, failure_message: impl Into<String>) -> Self {
        Self {
            correlation_id,
            succeeded: false,
            remote_reference: None,
            failure_message: Some(failure_message.into()),
        }
    }
}

// ==========================================
// SubmissionReport - 批次提交报告
// ==========================================
// unresolved: 已发送但 accepted/rejected 均未出现的 id，
// 需显式告警，不得静默计入任何一侧
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub accepted: Vec<SubmissionOutcome>,
    pub rejected: Vec<SubmissionOutcome>,
    pub unresolved: Vec<u32>,
}

impl SubmissionReport {
    pub fn total_resolved(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

// ==========================================
// PriceEstimate - 运费预估
// ==========================================
// 提交前可选协作方的聚合报价；失败不阻塞提交
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    pub total_amount: f64,
    pub currency: String,
    pub item_count: usize,
}
