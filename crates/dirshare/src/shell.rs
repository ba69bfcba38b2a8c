//! Interface to the user-facing shell that drives a serving session.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};

/// Details of a listener that just started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServingInfo {
    pub port: u16,
    pub address: SocketAddr,
    pub path: PathBuf,
    pub ip: Option<Ipv4Addr>,
}

impl ServingInfo {
    /// URL other machines on the network can use, when an address is known.
    pub fn remote_url(&self) -> Option<String> {
        self.ip.map(|ip| format!("http://{}:{}/", ip, self.port))
    }

    pub fn local_url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }
}

/// A titled message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Callbacks the serving core makes into its UI.
pub trait Shell: Send + Sync {
    fn serving_started(&self, info: &ServingInfo);

    fn serving_stopped(&self);

    fn error(&self, notice: &Notice);

    fn info(&self, _notice: &Notice) {}

    /// Ask the user for a new port. `None` means the prompt was cancelled.
    fn prompt_for_port(&self, _current: u16) -> Option<String> {
        None
    }
}

/// Shell that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingShell;

impl Shell for TracingShell {
    fn serving_started(&self, info: &ServingInfo) {
        info!(
            "Serving {} on {}{}",
            info.path.display(),
            info.local_url(),
            info.remote_url()
                .map(|url| format!(" and {url}"))
                .unwrap_or_default()
        );
    }

    fn serving_stopped(&self) {
        info!("Server closed");
    }

    fn error(&self, notice: &Notice) {
        error!("{}: {}", notice.title, notice.message);
    }

    fn info(&self, notice: &Notice) {
        info!("{}: {}", notice.title, notice.message);
    }
}
