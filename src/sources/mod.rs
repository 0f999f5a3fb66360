use crate::extension::Extension;
use crate::http_client::Transport;
use std::sync::Arc;

// JSON API sources
pub mod mangadex;

pub use mangadex::MangaDex;

/// One instance of every built-in adapter, all sharing `transport`.
pub fn builtin_extensions(transport: Arc<dyn Transport>) -> Vec<Arc<dyn Extension>> {
    vec![Arc::new(MangaDex::new(transport))]
}
