use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = ".airline_sentiment";
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Looked up in the working directory before the per-user config.
pub const PROJECT_CONFIG_FILE_NAME: &str = "airline-sentiment.toml";
/// Overrides `model` from any config file.
pub const MODEL_ENV_VAR: &str = "AIRLINE_SENTIMENT_MODEL";

pub const DEFAULT_MODEL: &str = "fine-tuned-airline-model";
pub const DEFAULT_MAX_LENGTH: usize = 512;

pub const DEFAULT_EXAMPLES: [&str; 3] = [
    "Loved the service on my recent Airline flight! Crew was amazing!",
    "Worst experience ever with Airline. Delayed flight and rude staff.",
    "Currently waiting at the airport lounge.",
];

/// Where inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSetting {
    /// CUDA device 0 when available, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
}

impl FromStr for DeviceSetting {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "auto" => Ok(DeviceSetting::Auto),
            "cpu" => Ok(DeviceSetting::Cpu),
            "cuda" | "gpu" => Ok(DeviceSetting::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(index) => index
                    .parse()
                    .map(DeviceSetting::Cuda)
                    .with_context(|| format!("Invalid CUDA device index in `{other}`")),
                None => {
                    anyhow::bail!("Unknown device `{other}` (expected auto, cpu or cuda:<index>)")
                }
            },
        }
    }
}

impl TryFrom<String> for DeviceSetting {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceSetting> for String {
    fn from(value: DeviceSetting) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DeviceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSetting::Auto => write!(f, "auto"),
            DeviceSetting::Cpu => write!(f, "cpu"),
            DeviceSetting::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local model directory, or `hf:<repo>[@<revision>]` for the hub.
    pub model: String,
    pub device: DeviceSetting,
    /// Tokens kept per tweet before truncation.
    pub max_length: usize,
    /// Extra raw label → sentiment name entries, on top of `LABEL_0..2`.
    pub labels: BTreeMap<String, String>,
    pub examples: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            device: DeviceSetting::Auto,
            max_length: DEFAULT_MAX_LENGTH,
            labels: BTreeMap::new(),
            examples: DEFAULT_EXAMPLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load settings the way the binary does: explicit path, project file,
    /// user file, then defaults; the model env var is applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Cannot resolve working directory")?;
        let user_dir = dirs::home_dir().map(|home| home.join(APP_DIR_NAME));
        let env_model = std::env::var(MODEL_ENV_VAR).ok();
        Self::load_with(explicit, &cwd, user_dir.as_deref(), env_model.as_deref())
    }

    /// `env_model` is the value of [`MODEL_ENV_VAR`], if set.
    pub fn load_with(
        explicit: Option<&Path>,
        project_root: &Path,
        user_dir: Option<&Path>,
        env_model: Option<&str>,
    ) -> Result<Self> {
        let mut settings = match resolve_config_path(explicit, project_root, user_dir)? {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("no config file found, using defaults");
                Self::default()
            }
        };
        if let Some(model) = env_model {
            settings.apply_model_override(model);
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config TOML at {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(settings)
    }

    /// Replace the model source unless `model` is blank.
    pub fn apply_model_override(&mut self, model: &str) {
        let model = model.trim();
        if !model.is_empty() {
            self.model = model.to_string();
        }
    }
}

/// An explicit path must exist; the implicit locations are optional.
fn resolve_config_path(
    explicit: Option<&Path>,
    project_root: &Path,
    user_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let project = project_root.join(PROJECT_CONFIG_FILE_NAME);
    if project.exists() {
        return Ok(Some(project));
    }

    Ok(user_dir
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists()))
}
