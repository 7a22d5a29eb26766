use basket_core::config::LoadOptions;
use basket_core::{ArtifactSummary, Product};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::{load_recommender, serialize_json, CommandResult};

#[derive(Debug, Serialize)]
struct CatalogOutput<'a> {
    command: &'static str,
    status: &'static str,
    summary: ArtifactSummary,
    products: Vec<&'a Product>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let (_, recommender) = match load_recommender("catalog", options, &correlation_id) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let summary = recommender.artifacts().summary();
    let products = recommender.catalog().products().collect::<Vec<_>>();

    if json_output {
        return serialize_json(
            "catalog",
            &CatalogOutput { command: "catalog", status: "ok", summary, products },
        );
    }

    let mut lines = vec![format!(
        "catalog: {} products, {} rules over {} antecedents, {} neighbor lists ({} edges)",
        summary.products,
        summary.rules,
        summary.antecedents,
        summary.neighbor_sources,
        summary.neighbor_edges
    )];
    for product in products {
        lines.push(format!("{:>5}  {}  {}", product.index, product.id, product.name));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}
