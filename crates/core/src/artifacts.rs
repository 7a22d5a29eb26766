//! Startup artifact loading
//!
//! The offline pipeline publishes three JSON documents: the product catalog,
//! the mined association rules, and the item-item neighbor lists. They are
//! read and validated once; any problem is fatal and no recommender is built.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ProductCatalog;
use crate::config::ArtifactsConfig;
use crate::domain::product::{Product, ProductIndex};
use crate::neighbors::{NeighborEdge, NeighborTable};
use crate::rules::{RawRule, RuleTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Catalog,
    Rules,
    Neighbors,
}

impl ArtifactKind {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog.json",
            Self::Rules => "rules.json",
            Self::Neighbors => "neighbors.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Catalog => "catalog",
            Self::Rules => "rules",
            Self::Neighbors => "neighbors",
        })
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read {kind} artifact `{path}`: {source}")]
    ReadFile { kind: ArtifactKind, path: PathBuf, source: std::io::Error },
    #[error("could not parse {kind} artifact `{path}`: {source}")]
    ParseFile { kind: ArtifactKind, path: PathBuf, source: serde_json::Error },
    #[error("could not write {kind} artifact `{path}`: {source}")]
    WriteFile { kind: ArtifactKind, path: PathBuf, source: std::io::Error },
    #[error("invalid {kind} artifact: {message}")]
    Invalid { kind: ArtifactKind, message: String },
}

/// On-disk shape of the catalog artifact
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<Product>,
}

/// On-disk shape of the rules artifact
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesFile {
    pub rules: Vec<RawRule>,
}

/// On-disk shape of the neighbors artifact
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborsFile {
    pub neighbors: Vec<NeighborRecord>,
}

/// Neighbor list for one source product, as `[neighbor, similarity]` pairs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub source: ProductIndex,
    pub edges: Vec<(ProductIndex, f64)>,
}

/// Counts describing a loaded bundle
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub products: usize,
    pub rules: usize,
    pub antecedents: usize,
    pub neighbor_sources: usize,
    pub neighbor_edges: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Validated, immutable tables shared by every recommendation call
#[derive(Clone, Debug)]
pub struct ArtifactBundle {
    pub catalog: ProductCatalog,
    pub rules: RuleTable,
    pub neighbors: NeighborTable,
    pub loaded_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Read, validate, and index the three artifact files.
    pub fn load(paths: &ArtifactsConfig) -> Result<Self, ArtifactError> {
        let catalog: CatalogFile = read_json(ArtifactKind::Catalog, &paths.catalog_path)?;
        let rules: RulesFile = read_json(ArtifactKind::Rules, &paths.rules_path)?;
        let neighbors: NeighborsFile = read_json(ArtifactKind::Neighbors, &paths.neighbors_path)?;

        let bundle = Self::from_parts(catalog.products, rules.rules, neighbors.neighbors)?;

        tracing::info!(
            event_name = "artifacts.loaded",
            catalog_path = %paths.catalog_path.display(),
            rules_path = %paths.rules_path.display(),
            neighbors_path = %paths.neighbors_path.display(),
            products = bundle.catalog.len(),
            rules = bundle.rules.len(),
            neighbor_sources = bundle.neighbors.len(),
            "recommendation artifacts loaded"
        );

        Ok(bundle)
    }

    /// Validate in-memory artifact records and build the tables.
    pub fn from_parts(
        products: Vec<Product>,
        rules: Vec<RawRule>,
        neighbors: Vec<NeighborRecord>,
    ) -> Result<Self, ArtifactError> {
        let catalog = ProductCatalog::new(products).map_err(|error| ArtifactError::Invalid {
            kind: ArtifactKind::Catalog,
            message: error.to_string(),
        })?;

        for (position, rule) in rules.iter().enumerate() {
            validate_rule(&catalog, rule).map_err(|message| ArtifactError::Invalid {
                kind: ArtifactKind::Rules,
                message: format!("rule #{position}: {message}"),
            })?;
        }

        for record in &neighbors {
            validate_neighbors(&catalog, record).map_err(|message| ArtifactError::Invalid {
                kind: ArtifactKind::Neighbors,
                message: format!("source {}: {message}", record.source),
            })?;
        }

        let rules = RuleTable::build(rules);
        let neighbors = neighbors
            .into_iter()
            .map(|record| {
                let edges: Vec<NeighborEdge> =
                    record.edges.into_iter().map(NeighborEdge::from).collect();
                (record.source, edges)
            })
            .collect::<NeighborTable>();

        Ok(Self { catalog, rules, neighbors, loaded_at: Utc::now() })
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            products: self.catalog.len(),
            rules: self.rules.len(),
            antecedents: self.rules.antecedent_count(),
            neighbor_sources: self.neighbors.len(),
            neighbor_edges: self.neighbors.edge_count(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Write artifact documents to the configured paths, creating parent
/// directories as needed.
pub fn write_artifacts(
    paths: &ArtifactsConfig,
    catalog: &CatalogFile,
    rules: &RulesFile,
    neighbors: &NeighborsFile,
) -> Result<(), ArtifactError> {
    write_json(ArtifactKind::Catalog, &paths.catalog_path, catalog)?;
    write_json(ArtifactKind::Rules, &paths.rules_path, rules)?;
    write_json(ArtifactKind::Neighbors, &paths.neighbors_path, neighbors)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ArtifactError::ReadFile { kind, path: path.to_path_buf(), source })?;

    serde_json::from_str(&raw)
        .map_err(|source| ArtifactError::ParseFile { kind, path: path.to_path_buf(), source })
}

fn write_json<T: Serialize>(kind: ArtifactKind, path: &Path, value: &T) -> Result<(), ArtifactError> {
    let write_error = |source: std::io::Error| ArtifactError::WriteFile { kind, path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let body = serde_json::to_string_pretty(value).map_err(|error| ArtifactError::Invalid {
        kind,
        message: format!("serialization failed: {error}"),
    })?;
    fs::write(path, body).map_err(write_error)
}

fn validate_rule(catalog: &ProductCatalog, rule: &RawRule) -> Result<(), String> {
    if rule.antecedent.is_empty() {
        return Err("antecedent must not be empty".to_string());
    }
    if rule.consequent.is_empty() {
        return Err("consequent must not be empty".to_string());
    }
    if let Some(index) =
        rule.antecedent.iter().chain(&rule.consequent).find(|&&index| !catalog.contains(index))
    {
        return Err(format!("product index {index} is not in the catalog"));
    }
    if let Some(index) = rule.consequent.iter().find(|&&index| rule.antecedent.contains(&index)) {
        return Err(format!("product index {index} appears on both sides of the rule"));
    }

    for (name, value) in
        [("support", rule.support), ("confidence", rule.confidence), ("lift", rule.lift)]
    {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be a finite, non-negative number (got {value})"));
        }
    }

    Ok(())
}

fn validate_neighbors(catalog: &ProductCatalog, record: &NeighborRecord) -> Result<(), String> {
    if !catalog.contains(record.source) {
        return Err("source index is not in the catalog".to_string());
    }

    for &(neighbor, similarity) in &record.edges {
        if !catalog.contains(neighbor) {
            return Err(format!("neighbor index {neighbor} is not in the catalog"));
        }
        if !similarity.is_finite() {
            return Err(format!("similarity to {neighbor} must be finite (got {similarity})"));
        }
    }

    Ok(())
}
