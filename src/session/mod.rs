// ==========================================
// 批量发货处理引擎 - 上传会话
// ==========================================
// 职责: 单次上传的全流程编排与状态机
// 流程: 解析 → 校验 → 转换 → 提交 → 对账
// 状态机: EMPTY → LOADING → {PREVIEW_WITH_ERRORS | PREVIEW_VALID}
//         → SUBMITTING → PREVIEW_WITH_RESULTS；
//         任意状态可经 remove_file 回到 EMPTY
// 红线: 会话即单写者，整套上传态随会话移交；
//       解析/校验在阻塞工作线程上执行，不占用调用方事件循环；
//       提交取消一律按传输失败处理，不假定部分成功
// ==========================================

use crate::domain::record::{RawRow, RowFields, ValidatedRecord, ValidationError};
use crate::domain::submission::{OutboundPayload, PriceEstimate, SubmissionReport};
use crate::domain::types::SessionState;
use crate::importer::{ImportError, UniversalFileParser};
use crate::reconciliation;
use crate::schema::SchemaRegistry;
use crate::submission::{BatchSubmitter, PriceEstimator, SubmissionError};
use crate::transformer::PayloadTransformer;
use crate::validator::{ValidationEngine, ValidationOutcome};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// 会话错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("当前状态 {state} 不允许执行 {action}")]
    InvalidState {
        state: SessionState,
        action: &'static str,
    },

    #[error("没有可提交的记录（零条通过校验）")]
    NothingToSubmit,

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("后台解析任务失败: {0}")]
    TaskJoin(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

// ==========================================
// UploadSession - 上传会话
// ==========================================
// 除模式（只读共享）外，全部上传态归本会话独占；
// 会话重置后任何实体都不保留
pub struct UploadSession {
    session_id: Uuid,
    schema: Arc<SchemaRegistry>,
    submitter: Arc<dyn BatchSubmitter>,
    price_estimator: Option<Arc<dyn PriceEstimator>>,

    state: SessionState,
    raw_rows: Vec<RawRow>,
    outcome: Option<ValidationOutcome>,
    payloads: Vec<OutboundPayload>,
    report: Option<SubmissionReport>,

    // 提交取消信号（组件卸载/用户离开时由持有者触发）
    cancel_notify: Arc<Notify>,
}

impl UploadSession {
    pub fn new(schema: Arc<SchemaRegistry>, submitter: Arc<dyn BatchSubmitter>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            schema,
            submitter,
            price_estimator: None,
            state: SessionState::Empty,
            raw_rows: Vec::new(),
            outcome: None,
            payloads: Vec::new(),
            report: None,
            cancel_notify: Arc::new(Notify::new()),
        }
    }

    pub fn with_price_estimator(mut self, estimator: Arc<dyn PriceEstimator>) -> Self {
        self.price_estimator = Some(estimator);
        self
    }

    // ===== 只读访问器 =====

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn raw_rows(&self) -> &[RawRow] {
        &self.raw_rows
    }

    pub fn errors(&self) -> &[ValidationError] {
        self.outcome.as_ref().map(|o| o.errors.as_slice()).unwrap_or(&[])
    }

    pub fn preview_rows(&self) -> &[RowFields] {
        self.outcome.as_ref().map(|o| o.rows.as_slice()).unwrap_or(&[])
    }

    pub fn validated_records(&self) -> &[ValidatedRecord] {
        self.outcome
            .as_ref()
            .map(|o| o.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn payloads(&self) -> &[OutboundPayload] {
        &self.payloads
    }

    pub fn submission_report(&self) -> Option<&SubmissionReport> {
        self.report.as_ref()
    }

    /// 提交取消句柄；在提交前克隆，由另一任务触发
    pub fn cancel_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.cancel_notify)
    }

    // ===== 加载 =====

    /// 加载并校验一份上传文件
    ///
    /// 解析 + 校验是 CPU 密集的同步计算，整体移交阻塞工作线程。
    /// 开始新的加载即废弃上一份上传的全部状态；调用方丢弃本
    /// future（新文件顶替旧文件）时，旧任务的结果被自然丢弃。
    ///
    /// # 返回
    /// - Ok(()): 进入 PREVIEW_VALID 或 PREVIEW_WITH_ERRORS
    /// - Err(Import): 解析失败（会话回到 EMPTY，用户须重新上传）
    pub async fn load_file(&mut self, bytes: Vec<u8>, extension: &str) -> SessionResult<()> {
        let started = Instant::now();
        self.reset_upload_state();
        self.state = SessionState::Loading;
        info!(session_id = %self.session_id, size = bytes.len(), "开始加载上传文件");

        let schema = Arc::clone(&self.schema);
        let extension = extension.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            let rows = UniversalFileParser.parse_bytes(&bytes, &extension, &schema)?;
            let outcome = ValidationEngine::new(schema).validate(&rows);
            Ok::<_, ImportError>((rows, outcome))
        });

        let joined = handle
            .await
            .map_err(|e| SessionError::TaskJoin(e.to_string()))?;
        let (rows, outcome) = match joined {
            Ok(parsed) => parsed,
            Err(err) => {
                // 解析失败对会话致命
                self.state = SessionState::Empty;
                return Err(err.into());
            }
        };

        self.payloads = PayloadTransformer.transform(&outcome.records);
        self.state = if outcome.errors.is_empty() {
            SessionState::PreviewValid
        } else {
            SessionState::PreviewWithErrors
        };
        info!(
            session_id = %self.session_id,
            rows = rows.len(),
            errors = outcome.errors.len(),
            records = outcome.records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "文件加载完成"
        );

        self.raw_rows = rows;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// 从磁盘路径加载（命令行驱动入口）
    pub async fn load_path(&mut self, path: &std::path::Path) -> SessionResult<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let bytes = std::fs::read(path).map_err(ImportError::from)?;
        self.load_file(bytes, &extension).await
    }

    /// 移除文件：任意状态回到 EMPTY，丢弃全部上传态
    pub fn remove_file(&mut self) {
        info!(session_id = %self.session_id, from = %self.state, "移除文件，会话重置");
        self.reset_upload_state();
    }

    fn reset_upload_state(&mut self) {
        self.state = SessionState::Empty;
        self.raw_rows.clear();
        self.outcome = None;
        self.payloads.clear();
        self.report = None;
    }

    // ===== 运费预估 =====

    /// 提交前的聚合报价；协作方失败只记警告，绝不阻塞提交
    pub async fn price_estimate(&self) -> Option<PriceEstimate> {
        let estimator = self.price_estimator.as_ref()?;
        if self.payloads.is_empty() {
            return None;
        }
        match estimator.estimate(&self.payloads).await {
            Ok(estimate) => Some(estimate),
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "运费预估失败，继续提交流程");
                None
            }
        }
    }

    // ===== 提交 =====

    /// 将通过校验的记录整批提交
    ///
    /// 从任一预览态进入 SUBMITTING；传输失败或取消时回到原预览态，
    /// 零条视为已提交；成功后进入 PREVIEW_WITH_RESULTS
    pub async fn submit(&mut self) -> SessionResult<&SubmissionReport> {
        let preview_state = match self.state {
            SessionState::PreviewValid | SessionState::PreviewWithErrors => self.state,
            state => {
                return Err(SessionError::InvalidState {
                    state,
                    action: "submit",
                })
            }
        };
        if self.payloads.is_empty() {
            return Err(SessionError::NothingToSubmit);
        }

        self.state = SessionState::Submitting;
        let result = self.run_submission(&self.payloads).await;

        match result {
            Ok(report) => {
                info!(
                    session_id = %self.session_id,
                    accepted = report.accepted.len(),
                    rejected = report.rejected.len(),
                    unresolved = report.unresolved.len(),
                    "提交回执已归集"
                );
                self.state = SessionState::PreviewWithResults;
                Ok(self.report.insert(report))
            }
            Err(err) => {
                // 传输失败/取消: 零条已提交，回到提交前的预览态
                warn!(session_id = %self.session_id, error = %err, "提交未完成，按零条已提交处理");
                self.state = preview_state;
                Err(err.into())
            }
        }
    }

    /// 重提交被拒子集（调用方驱动的重试：只重提 rejected，
    /// 避免重复创建已接受条目）
    pub async fn resubmit_rejected(&mut self) -> SessionResult<&SubmissionReport> {
        if self.state != SessionState::PreviewWithResults {
            return Err(SessionError::InvalidState {
                state: self.state,
                action: "resubmit_rejected",
            });
        }
        let Some(mut report) = self.report.take() else {
            return Err(SessionError::InvalidState {
                state: self.state,
                action: "resubmit_rejected",
            });
        };
        let rejected_ids: Vec<u32> = report.rejected.iter().map(|o| o.correlation_id).collect();
        if rejected_ids.is_empty() {
            self.report = Some(report);
            return Err(SessionError::NothingToSubmit);
        }

        let subset: Vec<OutboundPayload> = self
            .payloads
            .iter()
            .filter(|p| rejected_ids.contains(&p.correlation_id))
            .cloned()
            .collect();

        self.state = SessionState::Submitting;
        let result = self.run_submission(&subset).await;
        self.state = SessionState::PreviewWithResults;

        match result {
            Ok(retry_report) => {
                // 被拒条目按本次回执重新归类；accepted 侧只增不减
                report
                    .rejected
                    .retain(|o| !rejected_ids.contains(&o.correlation_id));
                report.accepted.extend(retry_report.accepted);
                report.rejected.extend(retry_report.rejected);
                report.unresolved.extend(retry_report.unresolved);
                report.unresolved.sort_unstable();
                report.unresolved.dedup();
                Ok(self.report.insert(report))
            }
            Err(err) => {
                self.report = Some(report);
                Err(err.into())
            }
        }
    }

    async fn run_submission(
        &self,
        payloads: &[OutboundPayload],
    ) -> Result<SubmissionReport, SubmissionError> {
        let cancel = Arc::clone(&self.cancel_notify);
        tokio::select! {
            result = self.submitter.submit(payloads) => result,
            _ = cancel.notified() => {
                debug!(session_id = %self.session_id, "提交被取消");
                Err(SubmissionError::Cancelled)
            }
        }
    }

    // ===== 报表导出 =====
    // 纯函数包装：任意时刻可由内存态重新生成，不回触后端

    pub fn error_report(&self) -> anyhow::Result<Vec<u8>> {
        reconciliation::build_error_report(self.errors())
    }

    pub fn failure_report(&self) -> anyhow::Result<Vec<u8>> {
        let rejected = self
            .report
            .as_ref()
            .map(|r| r.rejected.as_slice())
            .unwrap_or(&[]);
        reconciliation::build_failure_report(rejected, &self.payloads)
    }
}
