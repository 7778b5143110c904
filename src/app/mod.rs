pub mod background;
pub mod input;
pub mod messages;
pub mod navigation;
pub mod runtime;

pub use messages::BackgroundMessage;
pub use runtime::run_tui;

use crate::api::ApiClient;
use crate::branch::BranchContext;
use crate::config::Config;
use std::path::PathBuf;
use std::sync::mpsc;

/// Everything the loop hands to input and effect handlers
pub struct RuntimeContext<'a> {
    pub api: &'a ApiClient,
    pub tx: &'a mpsc::Sender<BackgroundMessage>,
    pub branches: &'a BranchContext,
    pub config: &'a Config,
    pub download_dir: &'a PathBuf,
}
