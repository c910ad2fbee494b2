use std::path::PathBuf;

use crate::{api::ApiContext, hub::BroadcastHub};
use shared::protocol::ClientCommand;
use tokio::sync::mpsc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) hub: BroadcastHub,
    pub(crate) commands: mpsc::Sender<ClientCommand>,
    pub(crate) static_dir: PathBuf,
}
