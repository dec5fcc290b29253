//! Repository Traits

use std::time::Duration;

use kernel::id::{FileId, OrganizationId, SessionId};

use crate::domain::file::ExportFile;
use crate::error::ReportResult;

/// Export job records, scoped by session
#[trait_variant::make(FileRepository: Send)]
pub trait LocalFileRepository {
    async fn insert_file(&self, session: SessionId, file: &ExportFile, ttl: Duration)
    -> ReportResult<()>;

    /// `false` when the record has expired or was removed
    async fn update_file(&self, session: SessionId, file: &ExportFile) -> ReportResult<bool>;

    async fn find_file(&self, session: SessionId, id: FileId) -> ReportResult<Option<ExportFile>>;

    async fn list_files(&self, session: SessionId) -> ReportResult<Vec<ExportFile>>;
}

/// Game names a provider owns, for report scoping
#[trait_variant::make(GameDirectory: Send)]
pub trait LocalGameDirectory {
    async fn provider_games(&self, provider: OrganizationId) -> ReportResult<Vec<String>>;
}
