use basket_core::artifacts::write_artifacts;
use basket_core::config::LoadOptions;
use basket_core::fixtures::{sample_catalog, sample_neighbors, sample_rules};
use uuid::Uuid;

use crate::commands::{load_config, CommandResult, EXIT_ARTIFACT_WRITE};

pub fn run(options: &LoadOptions, force: bool) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let config = match load_config("seed", options, &correlation_id) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let paths = &config.artifacts;
    let existing = [&paths.catalog_path, &paths.rules_path, &paths.neighbors_path]
        .into_iter()
        .filter(|path| path.exists())
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>();
    if !existing.is_empty() && !force {
        return CommandResult::failure(
            "seed",
            "artifacts_exist",
            format!("refusing to overwrite {} (pass --force to replace)", existing.join(", ")),
            EXIT_ARTIFACT_WRITE,
        );
    }

    let catalog = sample_catalog();
    let rules = sample_rules();
    let neighbors = sample_neighbors();
    if let Err(error) = write_artifacts(paths, &catalog, &rules, &neighbors) {
        return CommandResult::failure("seed", "artifact_write", error.to_string(), EXIT_ARTIFACT_WRITE);
    }

    tracing::info!(
        event_name = "cli.seed.completed",
        catalog_path = %paths.catalog_path.display(),
        products = catalog.products.len(),
        rules = rules.rules.len(),
        neighbor_sources = neighbors.neighbors.len(),
        "demo artifacts written"
    );

    CommandResult::success(
        "seed",
        format!(
            "wrote demo artifacts: {} products, {} rules, {} neighbor lists to {}",
            catalog.products.len(),
            rules.rules.len(),
            neighbors.neighbors.len(),
            paths.catalog_path.parent().map(|dir| dir.display().to_string()).unwrap_or_default()
        ),
    )
}
