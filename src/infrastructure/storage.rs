use crate::config::StorageConfig;
use crate::services::storage::SupabaseStorage;
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup_storage(config: &StorageConfig) -> Arc<SupabaseStorage> {
    info!(
        "☁️  Storage: {} (invoices: '{}', logos: '{}')",
        config.url, config.invoice_bucket, config.logo_bucket
    );

    if config.service_key.is_empty() {
        warn!("⚠️  STORAGE_SERVICE_KEY is empty, storage requests will be anonymous");
    }

    Arc::new(SupabaseStorage::from_config(config))
}
