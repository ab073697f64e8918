//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::{DEFAULT_END_MARKER, DEFAULT_START_MARKER, Markers};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".bookmarklet/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub watch: Watch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Paths {
    #[serde(default)]
    input: Option<PathBuf>,
    #[serde(default)]
    output: Option<PathBuf>,
}

impl Paths {
    fn default_input() -> PathBuf {
        PathBuf::from("bookmarklet-uncompiled.js")
    }

    fn default_output() -> PathBuf {
        PathBuf::from("bookmarklet.js")
    }

    pub fn input(&self) -> PathBuf {
        self.input.clone().unwrap_or_else(Self::default_input)
    }

    pub fn output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(Self::default_output)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MarkerConfig {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

impl MarkerConfig {
    pub fn markers(&self) -> Markers {
        Markers::new(
            self.start.as_deref().unwrap_or(DEFAULT_START_MARKER),
            self.end.as_deref().unwrap_or(DEFAULT_END_MARKER),
        )
    }
}

/// What the watch loop does after a failed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Watch {
    #[serde(default)]
    interval_secs: Option<u64>,
    #[serde(default)]
    error_backoff_ms: Option<u64>,
    #[serde(default)]
    on_error: Option<OnError>,
}

impl Watch {
    fn default_interval_secs() -> u64 {
        1
    }

    fn default_error_backoff_ms() -> u64 {
        1000
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
            .unwrap_or_else(Self::default_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(
            self.error_backoff_ms
                .unwrap_or_else(Self::default_error_backoff_ms),
        )
    }

    pub fn on_error(&self) -> OnError {
        self.on_error.unwrap_or_default()
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    watch_interval: Option<u64>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self> {
        let watch_interval = match env::var("BOOKMARKLET_WATCH_INTERVAL") {
            Ok(value) => Some(value.trim().parse().with_context(|| {
                format!("BOOKMARKLET_WATCH_INTERVAL must be a whole number of seconds, got '{value}'")
            })?),
            Err(_) => None,
        };
        Ok(Self {
            input: env::var_os("BOOKMARKLET_INPUT").map(PathBuf::from),
            output: env::var_os("BOOKMARKLET_OUTPUT").map(PathBuf::from),
            watch_interval,
        })
    }

    #[cfg(test)]
    fn for_tests(input: &str, output: &str, watch_interval: u64) -> Self {
        Self {
            input: Some(PathBuf::from(input)),
            output: Some(PathBuf::from(output)),
            watch_interval: Some(watch_interval),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env()?;
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            paths: Paths {
                input: other.paths.input.or(self.paths.input),
                output: other.paths.output.or(self.paths.output),
            },
            markers: MarkerConfig {
                start: other.markers.start.or(self.markers.start),
                end: other.markers.end.or(self.markers.end),
            },
            watch: Watch {
                interval_secs: other.watch.interval_secs.or(self.watch.interval_secs),
                error_backoff_ms: other.watch.error_backoff_ms.or(self.watch.error_backoff_ms),
                on_error: other.watch.on_error.or(self.watch.on_error),
            },
        }
    }

    /// Apply command line values on top of every configured layer.
    pub fn with_cli(
        mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        watch_interval: Option<u64>,
    ) -> Self {
        if input.is_some() {
            self.paths.input = input;
        }
        if output.is_some() {
            self.paths.output = output;
        }
        if watch_interval.is_some() {
            self.watch.interval_secs = watch_interval;
        }
        self
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("bookmarklet/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(input) = env.input {
        config.paths.input = Some(input);
    }
    if let Some(output) = env.output {
        config.paths.output = Some(output);
    }
    if let Some(interval) = env.watch_interval {
        config.watch.interval_secs = Some(interval);
    }
    config
}
