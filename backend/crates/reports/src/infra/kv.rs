//! Key/Value Export Store
//!
//! `file:{login}:{id}` → ExportFile JSON, keyed by the session's login id so
//! records survive a token refresh. The TTL is set on insert and
//! kept by updates, so a finished job never outlives its submission window.

use std::time::Duration;

use kernel::id::{FileId, SessionId};
use platform::kv::KvStore;

use crate::domain::file::ExportFile;
use crate::domain::repository::FileRepository;
use crate::error::ReportResult;

#[derive(Clone)]
pub struct KvFileStore {
    kv: KvStore,
}

impl KvFileStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn session_prefix(session: SessionId) -> String {
        format!("file:{}:", session)
    }

    fn file_key(session: SessionId, id: FileId) -> String {
        format!("{}{}", Self::session_prefix(session), id)
    }
}

impl FileRepository for KvFileStore {
    async fn insert_file(
        &self,
        session: SessionId,
        file: &ExportFile,
        ttl: Duration,
    ) -> ReportResult<()> {
        self.kv
            .set_json(&Self::file_key(session, file.id), file, ttl)
            .await?;
        Ok(())
    }

    async fn update_file(&self, session: SessionId, file: &ExportFile) -> ReportResult<bool> {
        Ok(self
            .kv
            .replace_json(&Self::file_key(session, file.id), file)
            .await?)
    }

    async fn find_file(&self, session: SessionId, id: FileId) -> ReportResult<Option<ExportFile>> {
        Ok(self.kv.get_json(&Self::file_key(session, id)).await?)
    }

    async fn list_files(&self, session: SessionId) -> ReportResult<Vec<ExportFile>> {
        let keys = self.kv.keys_with_prefix(&Self::session_prefix(session)).await?;
        let mut files = Vec::with_capacity(keys.len());
        for key in keys {
            // expired between SCAN and GET
            if let Some(file) = self.kv.get_json::<ExportFile>(&key).await? {
                files.push(file);
            }
        }
        Ok(files)
    }
}
