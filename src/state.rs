use crate::config::Config;
use crate::storage::drive::DriveClient;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no token cache is configured; the Drive copy is then
    /// skipped entirely.
    pub uploader: Option<Arc<DriveClient>>,
}
