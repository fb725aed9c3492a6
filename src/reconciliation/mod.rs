// ==========================================
// 批量发货处理引擎 - 对账与报表
// ==========================================
// 职责: 错误/回执 → 原始行的 O(1) 回溯 + CSV 报表导出
// 红线: 行定位按 row_id / correlation_id 哈希索引，
//       与展示层的排序/过滤/分页无关，绝不按屏幕位置线性扫描；
//       报表是纯函数，任何时刻可离线重新生成，且字节幂等
// ==========================================

use crate::domain::record::{ErrorAnchor, RawRow, ValidatedRecord, ValidationError};
use crate::domain::submission::{OutboundPayload, SubmissionOutcome};
use anyhow::{Context, Result};
use std::collections::HashMap;

// ==========================================
// RowIndex - 行索引
// ==========================================
// row_id → RawRow 下标；对展示顺序的任何置换不变
pub struct RowIndex<'a> {
    rows: &'a [RawRow],
    by_id: HashMap<u32, usize>,
}

impl<'a> RowIndex<'a> {
    pub fn new(rows: &'a [RawRow]) -> Self {
        let by_id = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.row_id, idx))
            .collect();
        Self { rows, by_id }
    }

    pub fn resolve(&self, row_id: u32) -> Option<&'a RawRow> {
        self.by_id.get(&row_id).map(|&idx| &self.rows[idx])
    }
}

// ==========================================
// CorrelationIndex - 回执索引
// ==========================================
// correlation_id → row_id；提交结果高亮回原始行的依据
pub struct CorrelationIndex {
    by_correlation: HashMap<u32, u32>,
}

impl CorrelationIndex {
    pub fn new(records: &[ValidatedRecord]) -> Self {
        let by_correlation = records
            .iter()
            .map(|r| (r.correlation_id, r.row_id))
            .collect();
        Self { by_correlation }
    }

    pub fn row_id_of(&self, correlation_id: u32) -> Option<u32> {
        self.by_correlation.get(&correlation_id).copied()
    }

    /// 单条回执 → 其原始行
    pub fn resolve_outcome<'a>(
        &self,
        outcome: &SubmissionOutcome,
        rows: &RowIndex<'a>,
    ) -> Option<&'a RawRow> {
        self.row_id_of(outcome.correlation_id)
            .and_then(|row_id| rows.resolve(row_id))
    }
}

// ==========================================
// 错误 → 行映射
// ==========================================
// 结构性（表头）错误没有对应数据行，映射为 None
pub fn map_errors_to_rows<'a>(
    errors: &'a [ValidationError],
    index: &RowIndex<'a>,
) -> Vec<(&'a ValidationError, Option<&'a RawRow>)> {
    errors
        .iter()
        .map(|error| {
            let row = match error.anchor {
                ErrorAnchor::Header => None,
                ErrorAnchor::Row(row_id) => index.resolve(row_id),
            };
            (error, row)
        })
        .collect()
}

// ==========================================
// 错误报表
// ==========================================
// 每条校验错误一行；"Excel Row" 采用物理表格行号
// （即 row_id 本身，表头 = 1），展示与导出口径统一
pub fn build_error_report(errors: &[ValidationError]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Excel Row", "Field Name", "Error Reason"])
        .context("写入错误报表表头失败")?;

    for error in errors {
        writer
            .write_record([
                error.anchor.to_string(),
                error.source_label.clone(),
                error.message.clone(),
            ])
            .context("写入错误报表行失败")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("导出错误报表失败: {}", e))
}

// ==========================================
// 失败报表
// ==========================================
// 按 correlation_id 将每条拒绝回执联回其外发载荷，
// 附加远端给出的失败原因
pub fn build_failure_report(
    rejected: &[SubmissionOutcome],
    payloads: &[OutboundPayload],
) -> Result<Vec<u8>> {
    let by_correlation: HashMap<u32, &OutboundPayload> =
        payloads.iter().map(|p| (p.correlation_id, p)).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Correlation ID",
            "Order ID",
            "Customer Name",
            "Failure Reason",
        ])
        .context("写入失败报表表头失败")?;

    for outcome in rejected {
        let payload = by_correlation.get(&outcome.correlation_id);
        writer
            .write_record([
                outcome.correlation_id.to_string(),
                payload.map(|p| p.order_id.clone()).unwrap_or_default(),
                payload.map(|p| p.customer_name.clone()).unwrap_or_default(),
                outcome.failure_message.clone().unwrap_or_default(),
            ])
            .context("写入失败报表行失败")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("导出失败报表失败: {}", e))
}
