// ==========================================
// 批量发货处理引擎 - 批量提交协调器
// ==========================================
// 职责: 整批一次外发调用 + 三分法结果归集
// 红线: 不分片、不自动重试、不记忆上次调用；
//       重提交由调用方驱动（只重提 rejected 子集，
//       避免已接受条目被重复创建）
// ==========================================

pub mod error;

pub use error::{SubmissionError, SubmissionResult};

use crate::config::SubmitConfig;
use crate::domain::submission::{
    OutboundPayload, PriceEstimate, RemoteReference, SubmissionOutcome, SubmissionReport,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

// ==========================================
// 线上契约 DTO
// ==========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    items: &'a [OutboundPayload],
    service_id: &'a str,
    vendor_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    #[serde(default)]
    successful_items: Vec<WireAcceptedItem>,
    #[serde(default)]
    failed_items: Vec<WireFailedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAcceptedItem {
    correlation_id: u32,
    order_ref: String,
    #[serde(default)]
    tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFailedItem {
    correlation_id: u32,
    reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceRequest<'a> {
    items: &'a [OutboundPayload],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceResponse {
    total_amount: f64,
    currency: String,
}

// ==========================================
// BatchSubmitter Trait
// ==========================================
// 用途: 批量提交接口；实现者: HttpBatchSubmitter
// 契约: 恰好一次外发调用承载整批；
//       传输失败 = 零条已提交，调用方不得假定部分成功
#[async_trait]
pub trait BatchSubmitter: Send + Sync {
    async fn submit(&self, payloads: &[OutboundPayload]) -> SubmissionResult<SubmissionReport>;
}

// ==========================================
// PriceEstimator Trait
// ==========================================
// 提交前可选协作方；失败只记日志，绝不阻塞提交
#[async_trait]
pub trait PriceEstimator: Send + Sync {
    async fn estimate(&self, payloads: &[OutboundPayload]) -> SubmissionResult<PriceEstimate>;
}

// ==========================================
// 回执归集（纯函数）
// ==========================================
// - 回执 id 必须 ⊆ 已发送集合；未发送的 id 记警告后忽略
// - 同一 id 同时出现在两侧时保留首次归属，其余忽略
// - 已发送但两侧均未出现的 id → unresolved（显式告警类别）
fn build_report(sent: &[OutboundPayload], wire: SubmitResponse) -> SubmissionReport {
    let sent_ids: HashSet<u32> = sent.iter().map(|p| p.correlation_id).collect();
    let mut resolved: HashSet<u32> = HashSet::new();

    let mut accepted = Vec::new();
    for item in wire.successful_items {
        if !sent_ids.contains(&item.correlation_id) {
            warn!(correlation_id = item.correlation_id, "回执包含未发送的 correlation_id，忽略");
            continue;
        }
        if !resolved.insert(item.correlation_id) {
            warn!(correlation_id = item.correlation_id, "correlation_id 在回执中重复出现，忽略后者");
            continue;
        }
        accepted.push(SubmissionOutcome::accepted(
            item.correlation_id,
            RemoteReference {
                order_ref: item.order_ref,
                tracking_number: item.tracking_number,
            },
        ));
    }

    let mut rejected = Vec::new();
    for item in wire.failed_items {
        if !sent_ids.contains(&item.correlation_id) {
            warn!(correlation_id = item.correlation_id, "回执包含未发送的 correlation_id，忽略");
            continue;
        }
        if !resolved.insert(item.correlation_id) {
            warn!(correlation_id = item.correlation_id, "correlation_id 在回执中重复出现，忽略后者");
            continue;
        }
        rejected.push(SubmissionOutcome::rejected(item.correlation_id, item.reason));
    }

    let mut unresolved: Vec<u32> = sent_ids.difference(&resolved).copied().collect();
    unresolved.sort_unstable();
    if !unresolved.is_empty() {
        warn!(ids = ?unresolved, "部分 correlation_id 未在回执中出现，标记为 unresolved");
    }

    SubmissionReport {
        accepted,
        rejected,
        unresolved,
    }
}

// ==========================================
// HttpBatchSubmitter - HTTP 提交实现
// ==========================================
pub struct HttpBatchSubmitter {
    client: reqwest::Client,
    config: SubmitConfig,
}

impl HttpBatchSubmitter {
    pub fn new(config: SubmitConfig) -> SubmissionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("构建 HTTP 客户端失败")?;
        Ok(Self { client, config })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SubmissionError {
        if err.is_timeout() {
            SubmissionError::Timeout(self.config.timeout_secs)
        } else {
            SubmissionError::Connect(err.to_string())
        }
    }
}

#[async_trait]
impl BatchSubmitter for HttpBatchSubmitter {
    async fn submit(&self, payloads: &[OutboundPayload]) -> SubmissionResult<SubmissionReport> {
        info!(
            items = payloads.len(),
            endpoint = %self.config.endpoint_url,
            "开始批量提交"
        );

        let request = SubmitRequest {
            items: payloads,
            service_id: &self.config.service_id,
            vendor_id: &self.config.vendor_id,
        };

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let wire: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;

        let report = build_report(payloads, wire);
        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            unresolved = report.unresolved.len(),
            "批量提交完成"
        );
        Ok(report)
    }
}

// ==========================================
// HttpPriceEstimator - 运费预估实现
// ==========================================
pub struct HttpPriceEstimator {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpPriceEstimator {
    pub fn new(endpoint_url: String, timeout_secs: u64) -> SubmissionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("构建 HTTP 客户端失败")?;
        Ok(Self {
            client,
            endpoint_url,
        })
    }
}

#[async_trait]
impl PriceEstimator for HttpPriceEstimator {
    async fn estimate(&self, payloads: &[OutboundPayload]) -> SubmissionResult<PriceEstimate> {
        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&PriceRequest { items: payloads })
            .send()
            .await
            .map_err(|e| SubmissionError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let wire: PriceResponse = response
            .json()
            .await
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;

        Ok(PriceEstimate {
            total_amount: wire.total_amount,
            currency: wire.currency,
            item_count: payloads.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(correlation_id: u32) -> OutboundPayload {
        OutboundPayload {
            correlation_id,
            order_id: format!("OD-{}", correlation_id),
            warehouse_id: "WH-01".to_string(),
            customer_name: "Asha Rao".to_string(),
            customer_phone: "9876543210".to_string(),
            shipping_address: "12 MG Road".to_string(),
            pincode: "560001".to_string(),
            city: None,
            state: None,
            payment_mode: "Pre-paid".to_string(),
            cod_amount: None,
            weight_grams: 500,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            fragile: false,
            product_name: "Steel Bottle".to_string(),
            quantity: 1,
            sku: None,
            order_date: None,
        }
    }

    fn accepted_item(id: u32) -> WireAcceptedItem {
        WireAcceptedItem {
            correlation_id: id,
            order_ref: format!("R-{}", id),
            tracking_number: Some(format!("AWB{}", id)),
        }
    }

    #[test]
    fn test_report_partitions_accepted_and_rejected() {
        // 场景: 3 条提交，远端拒绝 id=2 → accepted=[1,3], rejected=[2]
        let sent = vec![payload(1), payload(2), payload(3)];
        let wire = SubmitResponse {
            successful_items: vec![accepted_item(1), accepted_item(3)],
            failed_items: vec![WireFailedItem {
                correlation_id: 2,
                reason: "Pincode unserviceable".to_string(),
            }],
        };

        let report = build_report(&sent, wire);

        assert_eq!(
            report.accepted.iter().map(|o| o.correlation_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].correlation_id, 2);
        assert_eq!(
            report.rejected[0].failure_message.as_deref(),
            Some("Pincode unserviceable")
        );
        assert!(report.unresolved.is_empty());
        assert_eq!(report.total_resolved(), 3);
    }

    #[test]
    fn test_report_flags_unresolved_ids() {
        // 已发送但两侧均未回执的 id 归入 unresolved，绝不静默吞掉
        let sent = vec![payload(1), payload(2), payload(3)];
        let wire = SubmitResponse {
            successful_items: vec![accepted_item(1)],
            failed_items: vec![],
        };

        let report = build_report(&sent, wire);

        assert_eq!(report.accepted.len(), 1);
        assert!(report.rejected.is_empty());
        assert_eq!(report.unresolved, vec![2, 3]);
        assert!(report.has_unresolved());
    }

    #[test]
    fn test_report_ignores_ids_never_sent() {
        let sent = vec![payload(1)];
        let wire = SubmitResponse {
            successful_items: vec![accepted_item(1), accepted_item(99)],
            failed_items: vec![WireFailedItem {
                correlation_id: 42,
                reason: "phantom".to_string(),
            }],
        };

        let report = build_report(&sent, wire);

        assert_eq!(report.accepted.len(), 1);
        assert!(report.rejected.is_empty());
        assert!(report.unresolved.is_empty());
    }

    #[test]
    fn test_report_keeps_first_occurrence_on_duplicate() {
        let sent = vec![payload(1)];
        let wire = SubmitResponse {
            successful_items: vec![accepted_item(1)],
            failed_items: vec![WireFailedItem {
                correlation_id: 1,
                reason: "also failed?".to_string(),
            }],
        };

        let report = build_report(&sent, wire);

        assert_eq!(report.accepted.len(), 1);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_wire_response_deserialization() {
        let json = r#"{
            "successfulItems": [
                {"correlationId": 1, "orderRef": "R-1", "trackingNumber": "AWB1"}
            ],
            "failedItems": [
                {"correlationId": 2, "reason": "COD limit exceeded"}
            ]
        }"#;

        let wire: SubmitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(wire.successful_items.len(), 1);
        assert_eq!(wire.successful_items[0].correlation_id, 1);
        assert_eq!(wire.failed_items[0].reason, "COD limit exceeded");
    }

    #[test]
    fn test_submit_request_wire_shape() {
        let items = vec![payload(1)];
        let request = SubmitRequest {
            items: &items,
            service_id: "bulk-upload",
            vendor_id: "vendor-7",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["serviceId"], "bulk-upload");
        assert_eq!(json["vendorId"], "vendor-7");
        assert_eq!(json["items"][0]["correlationId"], 1);
    }
}
