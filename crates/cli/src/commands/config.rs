use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use basket_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct FieldSpec {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
    /// Set when `artifacts.dir` (file, env or flag) also controls this field.
    follows_dir: bool,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = SourceLookup {
        options,
        doc: config_file_doc.as_ref(),
        path: config_file_path.as_deref(),
    };

    let fields = [
        field(
            "artifacts.catalog_path",
            &["BASKET_ARTIFACTS_CATALOG_PATH"],
            config.artifacts.catalog_path.display().to_string(),
            true,
        ),
        field(
            "artifacts.rules_path",
            &["BASKET_ARTIFACTS_RULES_PATH"],
            config.artifacts.rules_path.display().to_string(),
            true,
        ),
        field(
            "artifacts.neighbors_path",
            &["BASKET_ARTIFACTS_NEIGHBORS_PATH"],
            config.artifacts.neighbors_path.display().to_string(),
            true,
        ),
        field("recommend.top_n", &["BASKET_RECOMMEND_TOP_N"], config.recommend.top_n.to_string(), false),
        field("recommend.alpha", &["BASKET_RECOMMEND_ALPHA"], config.recommend.alpha.to_string(), false),
        field(
            "logging.level",
            &["BASKET_LOGGING_LEVEL", "BASKET_LOG_LEVEL"],
            config.logging.level.clone(),
            false,
        ),
        field(
            "logging.format",
            &["BASKET_LOGGING_FORMAT", "BASKET_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            false,
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for spec in &fields {
        lines.push(render_line(spec.key_path, &spec.value, source.field_source(spec)));
    }

    lines.join("\n")
}

fn field(
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
    follows_dir: bool,
) -> FieldSpec {
    FieldSpec { key_path, env_keys, value, follows_dir }
}

struct SourceLookup<'a> {
    options: &'a LoadOptions,
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    /// Mirrors `AppConfig::load`: flag, then env (a directory env var
    /// replaces file paths), then file, then default.
    fn field_source(&self, spec: &FieldSpec) -> String {
        if spec.follows_dir && self.options.overrides.artifacts_dir.is_some() {
            return "flag (--artifacts-dir)".to_string();
        }

        if let Some(env_key) = spec.env_keys.iter().find(|key| env_is_set(key)) {
            return format!("env ({env_key})");
        }

        if spec.follows_dir && env_is_set("BASKET_ARTIFACTS_DIR") {
            return "env (BASKET_ARTIFACTS_DIR)".to_string();
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, spec.key_path) {
                return format!("file ({})", self.file_label());
            }
            if spec.follows_dir && contains_path(doc, "artifacts.dir") {
                return format!("file ({}, artifacts.dir)", self.file_label());
            }
        }

        "default".to_string()
    }

    fn file_label(&self) -> String {
        self.path.map(|path| path.display().to_string()).unwrap_or_else(|| "config file".to_string())
    }
}

/// Blank values are ignored by the loader, so they do not count as set.
fn env_is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    if env_is_set("BASKET_CONFIG") {
        let path = env::var_os("BASKET_CONFIG").map(PathBuf::from)?;
        return path.exists().then_some(path);
    }

    ["basket.toml", "config/basket.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc = "[recommend]\ntop_n = 5\n".parse::<Value>().unwrap();
        assert!(contains_path(&doc, "recommend.top_n"));
        assert!(!contains_path(&doc, "recommend.alpha"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn artifacts_dir_flag_wins_for_artifact_paths() {
        let mut options = LoadOptions::default();
        options.overrides.artifacts_dir = Some(PathBuf::from("data"));
        let lookup = SourceLookup { options: &options, doc: None, path: None };

        let spec = field("artifacts.rules_path", &[], "data/rules.json".to_string(), true);
        assert_eq!(lookup.field_source(&spec), "flag (--artifacts-dir)");

        let spec = field("recommend.alpha", &[], "0.7".to_string(), false);
        assert_eq!(lookup.field_source(&spec), "default");
    }
}
