// ==========================================
// 批量发货处理引擎 - 命令行入口
// ==========================================
// 用途: 对单个上传文件跑通完整管道（联调/排障）
// 用法: bulk-shipment-engine <文件.xlsx|.csv> [错误报表输出.csv]
// ==========================================

use bulk_shipment_engine::{
    logging, session::UploadSession, shipment_schema, HttpBatchSubmitter, SubmitConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", bulk_shipment_engine::APP_NAME);
    tracing::info!("系统版本: {}", bulk_shipment_engine::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        anyhow::bail!("用法: bulk-shipment-engine <文件.xlsx|.csv> [错误报表输出.csv]");
    };
    let report_path = args.next();

    let config = SubmitConfig::from_env();
    tracing::info!(endpoint = %config.endpoint_url, "提交端点");

    let submitter = Arc::new(HttpBatchSubmitter::new(config)?);
    let mut session = UploadSession::new(Arc::new(shipment_schema()), submitter);

    // === 摄取 + 校验 ===
    session.load_path(std::path::Path::new(&file_path)).await?;
    tracing::info!(
        state = %session.state(),
        rows = session.raw_rows().len(),
        errors = session.errors().len(),
        records = session.validated_records().len(),
        "文件加载完成"
    );

    for error in session.errors() {
        tracing::warn!(
            row = %error.anchor,
            column = %error.source_label,
            "{}",
            error.message
        );
    }

    // === 错误报表导出 ===
    if let Some(path) = &report_path {
        std::fs::write(path, session.error_report()?)?;
        tracing::info!(path = %path, "错误报表已导出");
    }

    // === 提交 ===
    if session.validated_records().is_empty() {
        tracing::warn!("零条记录通过校验，跳过提交");
        return Ok(());
    }

    if let Some(estimate) = session.price_estimate().await {
        tracing::info!(
            amount = estimate.total_amount,
            currency = %estimate.currency,
            "运费预估"
        );
    }

    match session.submit().await {
        Ok(report) => {
            tracing::info!(
                accepted = report.accepted.len(),
                rejected = report.rejected.len(),
                unresolved = report.unresolved.len(),
                "批量提交完成"
            );
            for outcome in &report.rejected {
                tracing::warn!(
                    correlation_id = outcome.correlation_id,
                    reason = outcome.failure_message.as_deref().unwrap_or(""),
                    "条目被拒"
                );
            }
            for id in &report.unresolved {
                tracing::warn!(correlation_id = id, "条目未回执（unresolved）");
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "提交失败，零条已提交，可原样重试");
            return Err(err.into());
        }
    }

    Ok(())
}
