//! Export-Job Engine
//!
//! `submit` stores an `in_progress` record and hands the job to a detached
//! task. Tasks queue on a semaphore sized by [`ExportConfig::workers`]; the
//! record's TTL is the only bound on a task's lifetime. Jobs of one session
//! are independent and may finish in any order.

use std::sync::Arc;

use gateway::HistoryFilter;
use kernel::id::{FileId, SessionId};
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};

use crate::application::config::ExportConfig;
use crate::application::render::{render_financial_workbook, render_workbook};
use crate::application::report_service::ReportService;
use crate::domain::file::{CsvRows, ExportFile, FilePayload, FileStatus, FileSummary, FileType};
use crate::domain::report::{Grouping, ReportKind};
use crate::domain::repository::FileRepository;
use crate::error::{ReportError, ReportResult};

/// One export request, already scoped and validated
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub report: ReportKind,
    pub format: FileType,
    pub filter: HistoryFilter,
}

/// Frame pushed to status subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusFrame {
    pub id: FileId,
    pub status: FileStatus,
    pub error: Option<String>,
}

impl StatusFrame {
    pub fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}

impl From<&ExportFile> for StatusFrame {
    fn from(file: &ExportFile) -> Self {
        Self {
            id: file.id,
            status: file.status,
            error: file.error_message().map(str::to_string),
        }
    }
}

pub struct ExportEngine<F> {
    files: Arc<F>,
    reports: ReportService,
    permits: Arc<Semaphore>,
    config: Arc<ExportConfig>,
}

impl<F> Clone for ExportEngine<F> {
    fn clone(&self) -> Self {
        Self {
            files: self.files.clone(),
            reports: self.reports.clone(),
            permits: self.permits.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F> ExportEngine<F> {
    pub fn new(files: Arc<F>, reports: ReportService, config: ExportConfig) -> Self {
        let workers = config.workers.max(1);
        Self {
            files,
            reports,
            permits: Arc::new(Semaphore::new(workers)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Configured worker count
    pub fn capacity(&self) -> usize {
        self.config.workers.max(1)
    }

    /// Workers not running a job right now
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}

impl<F> ExportEngine<F>
where
    F: FileRepository + Send + Sync + 'static,
{
    /// Record the job and start it; returns before any work is done
    pub async fn submit(&self, session: SessionId, job: ExportJob) -> ReportResult<FileId> {
        let file = ExportFile::pending(job.report, job.format);
        self.files
            .insert_file(session, &file, self.config.file_ttl)
            .await?;

        tracing::info!(
            session_id = %session,
            file_id = %file.id,
            report = %job.report,
            format = job.format.extension(),
            "Export submitted"
        );

        let id = file.id;
        let engine = self.clone();
        tokio::spawn(async move {
            engine.run(session, file, job).await;
        });
        Ok(id)
    }

    async fn run(&self, session: SessionId, file: ExportFile, job: ExportJob) {
        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(file_id = %file.id, error = %e, "Export pool closed");
                return;
            }
        };

        let id = file.id;
        let finished = match self.produce(&job).await {
            Ok(payload) => file.ready(payload),
            Err(e) => {
                tracing::error!(file_id = %id, error = %e, "Export failed");
                file.failed(e.to_string())
            }
        };

        match self.files.update_file(session, &finished).await {
            Ok(true) => tracing::info!(
                file_id = %id,
                status = %finished.status,
                "Export finished"
            ),
            Ok(false) => tracing::warn!(
                session_id = %session,
                file_id = %id,
                "Export record missing, result discarded"
            ),
            Err(e) => tracing::error!(file_id = %id, error = %e, "Export record update failed"),
        }
    }

    async fn produce(&self, job: &ExportJob) -> ReportResult<FilePayload> {
        let mut filter = job.filter.clone();
        filter.limit = self.config.row_limit;
        filter.offset = 0;

        let reports = &self.reports;
        let payload = match (job.report, job.format) {
            (ReportKind::Financial, FileType::Csv) => FilePayload::Csv {
                rows: CsvRows::Financial(vec![reports.financial(&filter).await?]),
            },
            (ReportKind::Financial, FileType::Xlsx) => {
                let (summary, spins) =
                    tokio::try_join!(reports.financial(&filter), reports.spins(&filter))?;
                FilePayload::Xlsx {
                    data: render_financial_workbook(
                        &filter.convert_currency,
                        &summary,
                        &spins.items,
                    )?,
                }
            }
            (ReportKind::Spins, format) => {
                let rows = reports.spins(&filter).await?.items;
                match format {
                    FileType::Csv => FilePayload::Csv {
                        rows: CsvRows::Spin(rows),
                    },
                    FileType::Xlsx => FilePayload::Xlsx {
                        data: render_workbook(&rows)?,
                    },
                }
            }
            (ReportKind::Sessions, format) => {
                let rows = reports.sessions(&filter).await?.items;
                match format {
                    FileType::Csv => FilePayload::Csv {
                        rows: CsvRows::GamingSession(rows),
                    },
                    FileType::Xlsx => FilePayload::Xlsx {
                        data: render_workbook(&rows)?,
                    },
                }
            }
            (ReportKind::AggregatedByGame, format) => {
                let rows = reports.aggregated(Grouping::Game, &filter).await?;
                match format {
                    FileType::Csv => FilePayload::Csv {
                        rows: CsvRows::AggregatedByGame(rows),
                    },
                    FileType::Xlsx => FilePayload::Xlsx {
                        data: render_workbook(&rows)?,
                    },
                }
            }
            (ReportKind::AggregatedByCountry, format) => {
                let rows = reports.aggregated(Grouping::Country, &filter).await?;
                match format {
                    FileType::Csv => FilePayload::Csv {
                        rows: CsvRows::AggregatedByCountry(rows),
                    },
                    FileType::Xlsx => FilePayload::Xlsx {
                        data: render_workbook(&rows)?,
                    },
                }
            }
        };
        Ok(payload)
    }

    /// Newest first
    pub async fn files(&self, session: SessionId) -> ReportResult<Vec<FileSummary>> {
        let mut files = self.files.list_files(session).await?;
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files.iter().map(FileSummary::from).collect())
    }

    pub async fn file(&self, session: SessionId, id: FileId) -> ReportResult<ExportFile> {
        self.files
            .find_file(session, id)
            .await?
            .ok_or(ReportError::FileNotFound)
    }

    pub async fn status(&self, session: SessionId, id: FileId) -> ReportResult<StatusFrame> {
        Ok(StatusFrame::from(&self.file(session, id).await?))
    }

    /// Status for a subscriber; a failed lookup is reported as a terminal error frame
    pub async fn frame(&self, session: SessionId, id: FileId) -> StatusFrame {
        match self.status(session, id).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(file_id = %id, error = %e, "Status lookup failed");
                StatusFrame {
                    id,
                    status: FileStatus::Error,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Send a frame every poll interval until one is final or `tx` is closed
    pub async fn watch(&self, session: SessionId, id: FileId, tx: mpsc::Sender<StatusFrame>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            let frame = self.frame(session, id).await;
            let last = frame.is_final();
            if tx.send(frame).await.is_err() || last {
                break;
            }
        }
    }
}
