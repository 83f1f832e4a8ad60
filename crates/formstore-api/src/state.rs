use std::sync::Arc;

use formstore_db::{Database, FsResourceStore};
use formstore_export::WriterRegistry;

use crate::config::{Settings, StorageSettings};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<Database>,
    pub settings: Arc<StorageSettings>,
    pub writers: Arc<WriterRegistry>,
}

impl ApiState {
    pub fn new(db: Database, settings: StorageSettings, writers: WriterRegistry) -> Self {
        Self {
            db: Arc::new(db),
            settings: Arc::new(settings),
            writers: Arc::new(writers),
        }
    }

    /// Connect the database, create the schema and register the default writers.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let resources = Arc::new(FsResourceStore::new(&settings.resources.root));
        let db = Database::with_max_connections(
            &settings.database.url,
            settings.database.max_connections,
            resources,
        )
        .await?;
        db.init_schema().await?;

        Ok(Self::new(
            db,
            settings.storage.clone(),
            WriterRegistry::with_defaults(),
        ))
    }
}
