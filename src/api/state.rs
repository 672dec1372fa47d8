use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::AppConfig;
use crate::fetch::{RemoteClient, SourceError};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub config: Arc<AppConfig>,
    pub remote: Arc<RemoteClient>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogStore>, config: Arc<AppConfig>) -> Result<Self, SourceError> {
        let remote = RemoteClient::new(config.remote_source())?;
        Ok(Self {
            catalog,
            config,
            remote: Arc::new(remote),
        })
    }
}
