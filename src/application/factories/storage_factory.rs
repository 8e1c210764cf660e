use crate::adapters::outbound::filesystem::LocalObjectStore;
use crate::adapters::outbound::network::{
    ClickHouseSettings, ClickHouseSink, S3ObjectStore, S3Settings,
};
use crate::ports::outbound::{AnalyticalSink, ObjectStore};
use crate::shared::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Validated object-store settings
#[derive(Debug, Clone)]
pub enum ObjectStoreSettings {
    S3(S3Settings),
    /// Directory-backed store for offline runs
    Local { root: PathBuf },
}

/// Factory for the storage adapters: object store and analytical sink
pub struct StorageFactory;

impl StorageFactory {
    pub fn create_object_store(settings: &ObjectStoreSettings) -> Result<Arc<dyn ObjectStore>> {
        Ok(match settings {
            ObjectStoreSettings::S3(s3) => Arc::new(S3ObjectStore::new(s3.clone())?),
            ObjectStoreSettings::Local { root } => Arc::new(LocalObjectStore::new(root.clone())),
        })
    }

    /// Creates the sink when one is configured
    pub fn create_sink(
        settings: Option<&ClickHouseSettings>,
    ) -> Result<Option<Arc<dyn AnalyticalSink>>> {
        settings
            .map(|clickhouse| {
                ClickHouseSink::new(clickhouse.clone())
                    .map(|sink| Arc::new(sink) as Arc<dyn AnalyticalSink>)
            })
            .transpose()
    }
}
