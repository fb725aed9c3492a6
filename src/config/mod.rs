// ==========================================
// 批量发货处理引擎 - 配置层
// ==========================================
// 职责: 提交端点与服务身份配置
// 来源: 环境变量（部署期注入），缺省值用于本地联调
// ==========================================

use serde::{Deserialize, Serialize};

/// 提交端点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// 批量提交端点（一次调用承载整批）
    pub endpoint_url: String,
    /// 运费预估端点（可选协作方；失败不阻塞提交）
    pub price_endpoint_url: Option<String>,
    /// 服务标识（随载荷一起提交）
    pub service_id: String,
    /// 商户/供应商标识
    pub vendor_id: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:8080/api/v1/shipments/bulk".to_string(),
            price_endpoint_url: None,
            service_id: "bulk-upload".to_string(),
            vendor_id: "default-vendor".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SubmitConfig {
    /// 从环境变量读取配置，未设置的项取缺省值
    ///
    /// # 环境变量
    /// - BULK_SUBMIT_ENDPOINT: 批量提交端点 URL
    /// - BULK_PRICE_ENDPOINT: 运费预估端点 URL（可选）
    /// - BULK_SERVICE_ID / BULK_VENDOR_ID: 服务/商户标识
    /// - BULK_SUBMIT_TIMEOUT_SECS: 请求超时（秒）
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint_url: std::env::var("BULK_SUBMIT_ENDPOINT").unwrap_or(defaults.endpoint_url),
            price_endpoint_url: std::env::var("BULK_PRICE_ENDPOINT").ok(),
            service_id: std::env::var("BULK_SERVICE_ID").unwrap_or(defaults.service_id),
            vendor_id: std::env::var("BULK_VENDOR_ID").unwrap_or(defaults.vendor_id),
            timeout_secs: std::env::var("BULK_SUBMIT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}
