//! Share a local directory over HTTP.
//!
//! A [`ServingSession`] exposes one directory at a time: `GET /` lists it,
//! deeper paths stream files or list sub-directories. The session remembers
//! recently served directories in a persisted [`ConfigStore`] and reports what
//! it does to a [`Shell`], which can be a desktop UI or the bundled CLI.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod network;
pub mod recency;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod shell;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

pub use config::{ConfigStore, Configuration, Theme};
pub use error::{ConfigError, ServeError, SessionError};
pub use listing::{DirectoryEntry, HtmlListingRenderer, ListingPayload, ListingRenderer};
pub use recency::RecencyList;
pub use session::{ServingSession, SessionOptions};
pub use shell::{Notice, ServingInfo, Shell, TracingShell};

/// State shared by the handlers of one listener.
///
/// Built fresh for every start, so the root never changes under a request.
#[derive(Clone)]
pub struct ServeState {
    /// Canonical directory (or file) being served
    pub root: Arc<PathBuf>,
    /// Port the listener is bound to
    pub port: u16,
    /// Address advertised for remote access
    pub ip: Option<Ipv4Addr>,
    pub renderer: Arc<dyn ListingRenderer>,
    pub shell: Arc<dyn Shell>,
}

impl ServeState {
    /// Create state with the built-in HTML renderer and a logging shell.
    pub fn new(root: PathBuf, port: u16) -> Self {
        Self {
            root: Arc::new(root),
            port,
            ip: None,
            renderer: Arc::new(HtmlListingRenderer),
            shell: Arc::new(TracingShell),
        }
    }
}
