use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::ArtifactKind;
use crate::recommend::{DEFAULT_ALPHA, DEFAULT_TOP_N};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub recommend: RecommendConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactsConfig {
    pub catalog_path: PathBuf,
    pub rules_path: PathBuf,
    pub neighbors_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendConfig {
    pub top_n: usize,
    pub alpha: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Directory holding all three artifacts under their default file names
    pub artifacts_dir: Option<PathBuf>,
    pub top_n: Option<usize>,
    pub alpha: Option<f64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl ArtifactsConfig {
    /// Artifact paths for a directory using the default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            catalog_path: dir.join(ArtifactKind::Catalog.default_file_name()),
            rules_path: dir.join(ArtifactKind::Rules.default_file_name()),
            neighbors_path: dir.join(ArtifactKind::Neighbors.default_file_name()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig::in_dir("artifacts"),
            recommend: RecommendConfig { top_n: DEFAULT_TOP_N, alpha: DEFAULT_ALPHA },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("basket.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(artifacts) = patch.artifacts {
            if let Some(dir) = artifacts.dir {
                self.artifacts = ArtifactsConfig::in_dir(dir);
            }
            if let Some(catalog_path) = artifacts.catalog_path {
                self.artifacts.catalog_path = catalog_path;
            }
            if let Some(rules_path) = artifacts.rules_path {
                self.artifacts.rules_path = rules_path;
            }
            if let Some(neighbors_path) = artifacts.neighbors_path {
                self.artifacts.neighbors_path = neighbors_path;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(top_n) = recommend.top_n {
                self.recommend.top_n = top_n;
            }
            if let Some(alpha) = recommend.alpha {
                self.recommend.alpha = alpha;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BASKET_ARTIFACTS_DIR") {
            self.artifacts = ArtifactsConfig::in_dir(value);
        }
        if let Some(value) = read_env("BASKET_ARTIFACTS_CATALOG_PATH") {
            self.artifacts.catalog_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("BASKET_ARTIFACTS_RULES_PATH") {
            self.artifacts.rules_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("BASKET_ARTIFACTS_NEIGHBORS_PATH") {
            self.artifacts.neighbors_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("BASKET_RECOMMEND_TOP_N") {
            self.recommend.top_n = parse_usize("BASKET_RECOMMEND_TOP_N", &value)?;
        }
        if let Some(value) = read_env("BASKET_RECOMMEND_ALPHA") {
            self.recommend.alpha = parse_f64("BASKET_RECOMMEND_ALPHA", &value)?;
        }

        let log_level = read_env("BASKET_LOGGING_LEVEL").or_else(|| read_env("BASKET_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BASKET_LOGGING_FORMAT").or_else(|| read_env("BASKET_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.artifacts_dir {
            self.artifacts = ArtifactsConfig::in_dir(dir);
        }
        if let Some(top_n) = overrides.top_n {
            self.recommend.top_n = top_n;
        }
        if let Some(alpha) = overrides.alpha {
            self.recommend.alpha = alpha;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_artifacts(&self.artifacts)?;
        validate_recommend(&self.recommend)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    if let Some(path) = read_env("BASKET_CONFIG") {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    [PathBuf::from("basket.toml"), PathBuf::from("config/basket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_artifacts(artifacts: &ArtifactsConfig) -> Result<(), ConfigError> {
    for (key, path) in [
        ("artifacts.catalog_path", &artifacts.catalog_path),
        ("artifacts.rules_path", &artifacts.rules_path),
        ("artifacts.neighbors_path", &artifacts.neighbors_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.top_n == 0 {
        return Err(ConfigError::Validation(
            "recommend.top_n must be greater than zero".to_string(),
        ));
    }

    if !recommend.alpha.is_finite() || recommend.alpha < 0.0 {
        return Err(ConfigError::Validation(
            "recommend.alpha must be a finite, non-negative number".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    artifacts: Option<ArtifactsPatch>,
    recommend: Option<RecommendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactsPatch {
    dir: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    rules_path: Option<PathBuf>,
    neighbors_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    top_n: Option<usize>,
    alpha: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
