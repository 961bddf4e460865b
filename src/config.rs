//! Configuration and wiring of the shared container.
//!
//! Every cooperating process agrees on one root directory. It holds the
//! optional `config.json`, the companion socket and one directory per store
//! namespace:
//!
//! ```text
//! <root>/
//! ├── config.json
//! ├── cube.json
//! ├── companion.sock
//! └── group.com.swayam.pomodoro/
//!     ├── timer.json
//!     ├── widget_timeline.json
//!     └── activities/<id>.json
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::clock::{Clock, SystemClock};
use crate::companion::{UnixCompanionChannel, SOCKET_FILE_NAME};
use crate::control::{TimerChange, TimerController, DEFAULT_DURATION_SECS};
use crate::faces::{CubeMode, FaceCatalog};
use crate::fanout::FanOut;
use crate::live::{LiveActivityManager, DEFAULT_ACTIVITY_NAME};
use crate::poller::{Poller, DEFAULT_POLL_INTERVAL_MS};
use crate::store::{FileStore, StoreError};
use crate::widget::{TimelineFileHost, IDLE_REFRESH_SECS, TIMELINE_FILE_NAME};

/// Environment variable overriding the root directory.
pub const HOME_ENV: &str = "POMODORO_CUBE_HOME";

/// Config file name inside the root.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Cube settings file name inside the root.
pub const CUBE_FILE_NAME: &str = "cube.json";

/// Root directory name under the user's home.
const DEFAULT_ROOT_DIR_NAME: &str = ".pomodoro-cube";

/// Store namespace shared by every surface.
pub const DEFAULT_NAMESPACE: &str = "group.com.swayam.pomodoro";

// ============================================================================
// ConfigError
// ============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ホームディレクトリが見つかりません（{HOME_ENV} を設定してください）")]
    NoHomeDir,

    #[error("設定ファイルを読み込めません ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("設定ファイルの形式が不正です ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("設定ファイルを保存できません ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and parses a JSON file; `None` when it does not exist.
fn read_json<T: serde::de::DeserializeOwned>(path: PathBuf) -> Result<Option<T>, ConfigError> {
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "設定ファイルがないため既定値を使用します");
            return Ok(None);
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ConfigError::Parse { path, source })
}

// ============================================================================
// SyncConfig
// ============================================================================

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_live_activities_enabled() -> bool {
    true
}

fn default_activity_name() -> String {
    DEFAULT_ACTIVITY_NAME.to_string()
}

fn default_duration_secs() -> f64 {
    DEFAULT_DURATION_SECS
}

fn default_widget_refresh_secs() -> i64 {
    IDLE_REFRESH_SECS
}

/// User-tunable settings, read from `<root>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Store namespace directory name
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Foreground poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Whether lock-screen live activities are shown
    #[serde(default = "default_live_activities_enabled")]
    pub live_activities_enabled: bool,

    /// Title of live activities
    #[serde(default = "default_activity_name")]
    pub activity_name: String,

    /// Companion socket path; `<root>/companion.sock` when unset
    #[serde(default)]
    pub companion_socket: Option<PathBuf>,

    /// Start-last duration before any fresh start was recorded
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: f64,

    /// Widget refresh horizon while not running
    #[serde(default = "default_widget_refresh_secs")]
    pub widget_refresh_secs: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            poll_interval_ms: default_poll_interval_ms(),
            live_activities_enabled: default_live_activities_enabled(),
            activity_name: default_activity_name(),
            companion_socket: None,
            default_duration_secs: default_duration_secs(),
            widget_refresh_secs: default_widget_refresh_secs(),
        }
    }
}

impl SyncConfig {
    /// Loads `<root>/config.json`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(root: &Path) -> Result<Self, ConfigError> {
        Ok(read_json(root.join(CONFIG_FILE_NAME))?.unwrap_or_default())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ============================================================================
// CubeSettings
// ============================================================================

/// Cube choices that outlive a single process: the active preset set and
/// the custom face's duration.
///
/// Kept in `<root>/cube.json`, apart from the timer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CubeSettings {
    #[serde(default)]
    pub mode: CubeMode,

    /// Custom face duration in minutes; the preset default when unset
    #[serde(default)]
    pub custom_minutes: Option<u32>,
}

impl CubeSettings {
    /// Loads `<root>/cube.json`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(root: &Path) -> Result<Self, ConfigError> {
        Ok(read_json(root.join(CUBE_FILE_NAME))?.unwrap_or_default())
    }

    /// Writes `<root>/cube.json` through a temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, root: &Path) -> Result<(), ConfigError> {
        let path = root.join(CUBE_FILE_NAME);
        let tmp_path = root.join(format!(".{}.{}.tmp", CUBE_FILE_NAME, uuid::Uuid::new_v4()));

        let result = (|| {
            std::fs::create_dir_all(root)?;
            let json = serde_json::to_vec_pretty(self)?;
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, &path)
        })();

        if let Err(source) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(ConfigError::Write { path, source });
        }

        tracing::debug!(mode = self.mode.as_str(), custom_minutes = ?self.custom_minutes, "キューブ設定を保存しました");
        Ok(())
    }

    /// The faces of the active mode with the custom duration applied.
    pub fn catalog(&self) -> FaceCatalog {
        let mut catalog = FaceCatalog::new(self.mode);
        if let Some(minutes) = self.custom_minutes {
            catalog.update_custom_duration(minutes);
        }
        catalog
    }
}

/// Resolves the root directory from the environment.
///
/// # Errors
///
/// Returns an error if neither the override nor a home directory is available.
pub fn resolve_root() -> Result<PathBuf, ConfigError> {
    root_from(std::env::var_os(HOME_ENV), dirs::home_dir())
}

fn root_from(env: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match env {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => home
            .map(|home| home.join(DEFAULT_ROOT_DIR_NAME))
            .ok_or(ConfigError::NoHomeDir),
    }
}

// ============================================================================
// AppGroup
// ============================================================================

/// Production sinks wired to the shared container.
pub type SystemFanOut =
    FanOut<TimelineFileHost<FileStore, SystemClock>, LiveActivityManager, UnixCompanionChannel>;

/// The shared container: root directory plus its configuration.
///
/// Builds the store, controller, fan-out and poller every process uses.
#[derive(Debug, Clone)]
pub struct AppGroup {
    root: PathBuf,
    config: SyncConfig,
}

impl AppGroup {
    /// Opens the container at the resolved root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be resolved or the config is malformed.
    pub fn open() -> Result<Self, ConfigError> {
        Self::at(resolve_root()?)
    }

    /// Opens the container at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = SyncConfig::load_from(&root)?;
        Ok(Self { root, config })
    }

    pub fn with_config(root: impl Into<PathBuf>, config: SyncConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns an error if the configured namespace is not a valid directory name.
    pub fn store(&self) -> Result<FileStore, StoreError> {
        FileStore::open(&self.root, &self.config.namespace)
    }

    /// # Errors
    ///
    /// Returns an error if `cube.json` exists but cannot be read or parsed.
    pub fn cube_settings(&self) -> Result<CubeSettings, ConfigError> {
        CubeSettings::load_from(&self.root)
    }

    /// # Errors
    ///
    /// Returns an error if `cube.json` cannot be written.
    pub fn save_cube_settings(&self, settings: &CubeSettings) -> Result<(), ConfigError> {
        settings.save_to(&self.root)
    }

    pub fn companion_socket(&self) -> PathBuf {
        self.config
            .companion_socket
            .clone()
            .unwrap_or_else(|| self.root.join(SOCKET_FILE_NAME))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn controller(
        &self,
        change_tx: mpsc::UnboundedSender<TimerChange>,
    ) -> Result<TimerController<FileStore, SystemClock>, StoreError> {
        Ok(TimerController::new(self.store()?, SystemClock, change_tx)
            .with_default_duration(self.config.default_duration_secs))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn widget_host<C: Clock>(
        &self,
        clock: C,
    ) -> Result<TimelineFileHost<FileStore, C>, StoreError> {
        let store = self.store()?;
        let path = store.dir().join(TIMELINE_FILE_NAME);
        Ok(TimelineFileHost::new(store, clock, path)
            .with_idle_refresh_secs(self.config.widget_refresh_secs))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn live_display(&self) -> Result<LiveActivityManager, StoreError> {
        let store = self.store()?;
        Ok(LiveActivityManager::new(store.dir())
            .with_timer_name(self.config.activity_name.clone())
            .with_enabled(self.config.live_activities_enabled))
    }

    pub fn companion_channel(&self) -> UnixCompanionChannel {
        UnixCompanionChannel::new(self.companion_socket())
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn fanout(&self) -> Result<SystemFanOut, StoreError> {
        Ok(FanOut::new(
            self.widget_host(SystemClock)?,
            self.live_display()?,
            self.companion_channel(),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn poller(&self) -> Result<Poller<FileStore, SystemClock>, StoreError> {
        Ok(Poller::new(self.store()?, SystemClock))
    }
}

// ============================================================================
// Tests
// ============================================================================
