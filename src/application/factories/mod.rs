mod provider_factory;
mod storage_factory;

pub use provider_factory::{ProviderFactory, ProviderSettings};
pub use storage_factory::{ObjectStoreSettings, StorageFactory};
