//! Locating the files of a fine-tuned classifier.
//!
//! A classifier is a directory with a `config.json`, a `tokenizer.json` and
//! one weights file. The directory is either on disk already (the usual case,
//! a model exported after fine-tuning) or a Hugging Face Hub repository that
//! gets downloaded into the local hub cache.
//!
//! - [`ModelSource`] - where the files live
//! - [`ModelFiles`] - resolved paths of the three files
//! - [`HfLoader`] - single hub file download with retry

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use tokenizers::{Tokenizer, TruncationParams};

use crate::core::ModelOptions;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Candidate weight files in order of preference.
pub const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

const HUB_PREFIX: &str = "hf:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub {
        repo: String,
        revision: Option<String>,
    },
}

impl FromStr for ModelSource {
    type Err = anyhow::Error;

    /// `hf:<repo>[@<revision>]` selects the hub; anything else is a directory.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("Model source is empty");
        }

        let Some(spec) = s.strip_prefix(HUB_PREFIX) else {
            return Ok(ModelSource::Local(PathBuf::from(s)));
        };

        let (repo, revision) = match spec.split_once('@') {
            Some((repo, revision)) if !revision.is_empty() => (repo, Some(revision.to_string())),
            Some((repo, _)) => (repo, None),
            None => (spec, None),
        };
        if repo.is_empty() {
            anyhow::bail!("Hub model source `{s}` has no repository name");
        }

        Ok(ModelSource::Hub {
            repo: repo.to_string(),
            revision,
        })
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Local(dir) => write!(f, "{}", dir.display()),
            ModelSource::Hub {
                repo,
                revision: Some(revision),
            } => write!(f, "{HUB_PREFIX}{repo}@{revision}"),
            ModelSource::Hub { repo, revision: None } => write!(f, "{HUB_PREFIX}{repo}"),
        }
    }
}

impl ModelOptions for ModelSource {
    fn cache_key(&self) -> String {
        match self {
            // Canonicalize so `./model` and `model` share a cache slot.
            ModelSource::Local(dir) => std::fs::canonicalize(dir)
                .unwrap_or_else(|_| dir.clone())
                .display()
                .to_string(),
            hub => hub.to_string(),
        }
    }
}

/// Paths of everything needed to build a classifier.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    pub async fn resolve(source: &ModelSource) -> anyhow::Result<Self> {
        match source {
            ModelSource::Local(dir) => Self::from_dir(dir),
            ModelSource::Hub { repo, revision } => {
                let fetch = |filename: &str| {
                    HfLoader::new(repo, filename).with_revision(revision.clone())
                };

                let config = fetch(CONFIG_FILE).load().await?;
                let tokenizer = fetch(TOKENIZER_FILE).load().await?;

                let weights = first_weights_file(repo, |candidate| {
                    let loader = fetch(candidate);
                    async move { loader.load().await }
                })
                .await?;

                Ok(Self {
                    config,
                    tokenizer,
                    weights,
                })
            }
        }
    }

    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Model directory {} does not exist", dir.display());
        }

        let required = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(anyhow::anyhow!("Missing {name} in model directory {}", dir.display()))
            }
        };

        let config = required(CONFIG_FILE)?;
        let tokenizer = required(TOKENIZER_FILE)?;
        let weights = WEIGHT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Model weights not found in {}. Expected one of {WEIGHT_FILES:?}",
                    dir.display()
                )
            })?;

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

/// First of [`WEIGHT_FILES`] that `fetch` can provide. When none can, the
/// error of the last attempt is kept as the cause.
async fn first_weights_file<F, Fut>(repo: &str, mut fetch: F) -> anyhow::Result<PathBuf>
where
    F: FnMut(&'static str) -> Fut,
    Fut: Future<Output = anyhow::Result<PathBuf>>,
{
    let mut last_error = None;
    for candidate in WEIGHT_FILES {
        match fetch(candidate).await {
            Ok(path) => return Ok(path),
            Err(e) => {
                tracing::debug!(repo = %repo, candidate, error = %e, "weights file unavailable");
                last_error = Some(e);
            }
        }
    }

    let message =
        format!("Model weights not found in repo `{repo}`. Expected one of {WEIGHT_FILES:?}");
    Err(match last_error {
        Some(e) => e.context(message),
        None => anyhow::anyhow!(message),
    })
}

/// Download of a single file from a hub repository.
#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
    pub revision: Option<String>,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    pub async fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = hf_hub::api::tokio::ApiBuilder::new()
            .with_chunk_size(None)
            .build()?;
        let repo = match &self.revision {
            Some(revision) => hf_hub::Repo::with_revision(
                self.repo.clone(),
                hf_hub::RepoType::Model,
                revision.clone(),
            ),
            None => hf_hub::Repo::model(self.repo.clone()),
        };
        let hf_repo = hf_api.repo(repo);

        // Concurrent downloads of the same repo can race on the cache lock.
        let max_retries = 3;
        let mut attempt = 0;
        loop {
            match hf_repo.get(self.filename.as_str()).await {
                Ok(path) => return Ok(path),
                Err(e)
                    if e.to_string().contains("Lock acquisition failed")
                        && attempt < max_retries - 1 =>
                {
                    let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                    tracing::warn!(
                        repo = %self.repo,
                        file = %self.filename,
                        ?wait_time,
                        "hub lock busy, retrying"
                    );
                    tokio::time::sleep(wait_time).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to fetch {} from {}", self.filename, self.repo)))
                }
            }
        }
    }
}

/// Load a tokenizer that truncates to `max_length` tokens.
pub fn load_tokenizer(path: &Path, max_length: usize) -> anyhow::Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Failed to load tokenizer {}", path.display()))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(anyhow::Error::msg)?;

    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_and_hub_sources() {
        assert_eq!(
            "fine-tuned-airline-model".parse::<ModelSource>().unwrap(),
            ModelSource::Local(PathBuf::from("fine-tuned-airline-model"))
        );
        assert_eq!(
            "hf:org/airline".parse::<ModelSource>().unwrap(),
            ModelSource::Hub {
                repo: "org/airline".into(),
                revision: None
            }
        );
        assert_eq!(
            "hf:org/airline@v2".parse::<ModelSource>().unwrap(),
            ModelSource::Hub {
                repo: "org/airline".into(),
                revision: Some("v2".into())
            }
        );
        assert!("hf:".parse::<ModelSource>().is_err());
        assert!("  ".parse::<ModelSource>().is_err());
    }

    #[test]
    fn hub_source_displays_as_parsed() {
        for s in ["hf:org/airline", "hf:org/airline@main"] {
            assert_eq!(s.parse::<ModelSource>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn local_dir_requires_all_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILE), "{}").unwrap();

        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("weights"));

        std::fs::write(dir.path().join("pytorch_model.bin"), b"").unwrap();
        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert!(files.weights.ends_with("pytorch_model.bin"));

        std::fs::write(dir.path().join("model.safetensors"), b"").unwrap();
        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert!(files.weights.ends_with("model.safetensors"));
    }

    #[test]
    fn missing_tokenizer_is_named() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains(TOKENIZER_FILE));
    }

    #[tokio::test]
    async fn falls_back_to_second_weights_file() {
        let path = first_weights_file("org/airline", |candidate| async move {
            match candidate {
                "pytorch_model.bin" => Ok(PathBuf::from(candidate)),
                _ => Err(anyhow::anyhow!("404 Not Found")),
            }
        })
        .await
        .unwrap();
        assert_eq!(path, PathBuf::from("pytorch_model.bin"));
    }

    #[tokio::test]
    async fn missing_weights_keep_the_fetch_error() {
        let err = first_weights_file("org/airline", |_| async {
            Err::<PathBuf, _>(anyhow::anyhow!("401 Unauthorized"))
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Model weights not found in repo `org/airline`"));
        assert!(format!("{err:#}").contains("401 Unauthorized"));
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelFiles::from_dir(&dir.path().join("absent")).is_err());
    }
}
