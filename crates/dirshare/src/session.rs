//! The serving session: one listener, one served root.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ServeState;
use crate::config::{self, ConfigStore, Configuration, Theme};
use crate::error::{ConfigError, SessionError};
use crate::listing::{HtmlListingRenderer, ListingRenderer};
use crate::network;
use crate::routes;
use crate::shell::{Notice, ServingInfo, Shell};

/// How long a closing listener may take to finish in-flight requests.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Settings that come from the process environment rather than the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Port that takes precedence over the configured one. `0` binds an ephemeral port.
    pub port_override: Option<u16>,
    /// Interface address to bind
    pub bind_ip: IpAddr,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            port_override: None,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

struct ActiveListener {
    info: ServingInfo,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Owns the HTTP listener and the directory it exposes.
///
/// At most one listener is open at a time; starting again closes the
/// previous one before binding. Every outcome is also reported to the
/// [`Shell`].
pub struct ServingSession {
    store: ConfigStore,
    options: SessionOptions,
    shell: Arc<dyn Shell>,
    renderer: Arc<dyn ListingRenderer>,
    active: Option<ActiveListener>,
}

impl ServingSession {
    pub fn new(store: ConfigStore, shell: Arc<dyn Shell>, options: SessionOptions) -> Self {
        Self {
            store,
            options,
            shell,
            renderer: Arc::new(HtmlListingRenderer),
            active: None,
        }
    }

    /// Load the config at `config_path`, falling back to bundled defaults if it is unreadable.
    pub fn open(
        config_path: impl Into<PathBuf>,
        shell: Arc<dyn Shell>,
        options: SessionOptions,
    ) -> Self {
        let config_path = config_path.into();
        let store = match ConfigStore::open(&config_path) {
            Ok(store) => store,
            Err(err) => {
                shell.error(&Notice::new(
                    "Error",
                    format!("There was an error opening the configuration: {err}"),
                ));
                ConfigStore::with_defaults(config_path)
            }
        };
        Self::new(store, shell, options)
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ListingRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn is_serving(&self) -> bool {
        self.active.is_some()
    }

    pub fn served_root(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.info.path.as_path())
    }

    pub fn serving_info(&self) -> Option<&ServingInfo> {
        self.active.as_ref().map(|active| &active.info)
    }

    /// Port the next start will bind.
    pub fn port(&self) -> u16 {
        self.options.port_override.unwrap_or(self.store.config().port)
    }

    pub fn ip(&self) -> Option<Ipv4Addr> {
        network::primary_ipv4()
    }

    /// Recently served directories, most recent first.
    pub fn recent(&self) -> &[String] {
        self.store.config().recently_opened.list()
    }

    pub fn config(&self) -> &Configuration {
        self.store.config()
    }

    /// Serve `root`, replacing whatever is currently served.
    pub async fn start(&mut self, root: impl AsRef<Path>) -> Result<ServingInfo, SessionError> {
        let result = self.try_start(root.as_ref()).await;
        if let Err(err) = &result {
            self.shell.error(&Notice::new(
                "Error",
                format!("There was an error starting the server: {err}"),
            ));
        }
        result
    }

    async fn try_start(&mut self, root: &Path) -> Result<ServingInfo, SessionError> {
        let root = validate_root(root).await?;

        let was_serving = self.close_active().await;
        let port = self.port();
        let addr = SocketAddr::new(self.options.bind_ip, port);

        let bound = match TcpListener::bind(addr).await {
            Ok(listener) => listener.local_addr().map(|address| (listener, address)),
            Err(err) => Err(err),
        };
        let (listener, address) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                if was_serving {
                    self.shell.serving_stopped();
                }
                return Err(SessionError::BindFailure { port, source });
            }
        };

        let ip = network::primary_ipv4();
        let state = ServeState {
            root: Arc::new(root.clone()),
            port: address.port(),
            ip,
            renderer: self.renderer.clone(),
            shell: self.shell.clone(),
        };
        let app = routes::router(state);

        // Dropping the sender (e.g. with the session) also triggers shutdown.
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
        });

        let info = ServingInfo {
            port: address.port(),
            address,
            path: root,
            ip,
        };
        info!("Serving {} on {}", info.path.display(), info.address);

        self.active = Some(ActiveListener {
            info: info.clone(),
            shutdown,
            task,
        });

        self.remember(&info.path);
        self.shell.serving_started(&info);

        Ok(info)
    }

    /// Stop serving. Returns whether a listener was open.
    pub async fn stop(&mut self) -> bool {
        let was_serving = self.close_active().await;
        if was_serving {
            self.shell.serving_stopped();
        }
        was_serving
    }

    /// Validate and persist a new port, restarting on it when serving.
    ///
    /// Invalid input is rejected before anything changes. Returns the new
    /// listener details when a restart happened.
    pub async fn set_port(&mut self, input: &str) -> Result<Option<ServingInfo>, SessionError> {
        let port = match config::parse_port(input) {
            Ok(port) => port,
            Err(err) => {
                self.shell.error(&Notice::new(
                    "Error",
                    format!("Port numbers can only contain digits (1-65535): {input:?}"),
                ));
                return Err(err.into());
            }
        };

        if let Err(err) = self.store.update(|config| config.port = port) {
            self.report_save_error(&err);
        }
        self.shell.info(&Notice::new(
            "Success",
            format!("Successfully changed port to {port}"),
        ));

        if let Some(override_port) = self.options.port_override {
            warn!(
                "Port {} is overridden by the environment; still listening on {}",
                port, override_port
            );
        }

        let Some(root) = self.served_root().map(Path::to_path_buf) else {
            return Ok(None);
        };
        self.start(root).await.map(Some)
    }

    /// Ask the shell for a port and apply it. A cancelled prompt changes nothing.
    pub async fn prompt_port_change(&mut self) -> Result<Option<ServingInfo>, SessionError> {
        match self.shell.prompt_for_port(self.store.config().port) {
            Some(input) => self.set_port(input.trim()).await,
            None => Ok(None),
        }
    }

    /// Store the theme preference; the shell applies it.
    pub fn set_theme(&mut self, mode: &str) -> Result<Theme, SessionError> {
        let theme = match mode.parse::<Theme>() {
            Ok(theme) => theme,
            Err(err) => {
                self.shell
                    .error(&Notice::new("Failed", format!("There is no such mode: {mode}")));
                return Err(err.into());
            }
        };

        if self.store.config().theme != theme
            && let Err(err) = self.store.update(|config| config.theme = theme)
        {
            self.report_save_error(&err);
        }
        Ok(theme)
    }

    fn remember(&mut self, root: &Path) {
        let path = root.display().to_string();
        if let Err(err) = self
            .store
            .update(|config| config.recently_opened.record_access(&path))
        {
            self.report_save_error(&err);
        }
    }

    fn report_save_error(&self, err: &ConfigError) {
        warn!("Keeping unsaved configuration in memory: {}", err);
        self.shell.error(&Notice::new(
            "Error",
            format!("There was an error saving the configuration: {err}"),
        ));
    }

    /// Close the active listener and wait for its socket to be released.
    async fn close_active(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        let ActiveListener {
            info,
            shutdown,
            mut task,
        } = active;
        let _ = shutdown.send(());

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => debug!("Closed listener on {}", info.address),
            Ok(Ok(Err(err))) => warn!("Listener on {} exited with error: {}", info.address, err),
            Ok(Err(err)) => warn!("Listener task on {} failed: {}", info.address, err),
            Err(_) => {
                warn!(
                    "Listener on {} still busy after {:?}, aborting",
                    info.address, SHUTDOWN_GRACE
                );
                task.abort();
                let _ = task.await;
            }
        }

        info!("Stopped serving {}", info.path.display());
        true
    }
}

/// Check that `root` is a readable directory or a regular file, and canonicalize it.
async fn validate_root(root: &Path) -> Result<PathBuf, SessionError> {
    let metadata = fs::metadata(root)
        .await
        .map_err(|e| access_error(root, e))?;

    if !metadata.is_dir() && !metadata.is_file() {
        return Err(SessionError::InvalidTarget(root.to_path_buf()));
    }

    let canonical = fs::canonicalize(root)
        .await
        .map_err(|e| access_error(root, e))?;

    if metadata.is_dir() {
        fs::read_dir(&canonical)
            .await
            .map_err(|e| access_error(&canonical, e))?;
    }

    Ok(canonical)
}

fn access_error(path: &Path, source: std::io::Error) -> SessionError {
    match source.kind() {
        ErrorKind::NotFound => SessionError::NotFound(path.to_path_buf()),
        _ => SessionError::NotAccessible {
            path: path.to_path_buf(),
            source,
        },
    }
}
