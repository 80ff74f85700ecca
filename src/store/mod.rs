pub mod api;
pub mod http;
pub mod local;
pub mod memory;
pub mod project_store;
pub mod task_store;

use std::path::Path;
use std::sync::Arc;

use crate::model::{Backend, RemoteConfig};

pub use api::{ApiError, Remote};
pub use project_store::ProjectStore;
pub use task_store::{Snapshot, StoreError, TaskStore};

/// Build the backend named by `[remote] backend`. The local backend keeps
/// its data in `board_dir`.
pub fn open_remote(remote: &RemoteConfig, board_dir: &Path) -> Result<Arc<dyn Remote>, ApiError> {
    match remote.backend {
        Backend::Local => {
            tracing::debug!(dir = %board_dir.display(), "using local board file");
            Ok(Arc::new(local::LocalApi::new(board_dir)))
        }
        Backend::Http => {
            tracing::debug!(url = %remote.base_url, "using http backend");
            Ok(Arc::new(http::HttpApi::from_config(remote)?))
        }
    }
}
