use basket_core::config::LoadOptions;
use basket_core::errors::{ApplicationError, DomainError};
use basket_core::{Recommendation, RecommendRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::{load_recommender, serialize_json, CommandResult, EXIT_INVALID_ARGUMENT};

#[derive(Debug, Clone)]
pub struct RecommendArgs {
    pub items: Vec<String>,
    pub top_n: Option<usize>,
    pub alpha: Option<f64>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RecommendOutput<'a> {
    command: &'static str,
    status: &'static str,
    correlation_id: &'a str,
    cart: Vec<String>,
    dropped_items: &'a [String],
    top_n: usize,
    alpha: f64,
    recommendations: &'a [Recommendation],
}

pub fn run(options: &LoadOptions, args: &RecommendArgs) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let (config, recommender) = match load_recommender("recommend", options, &correlation_id) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let request = RecommendRequest::new(args.items.iter().cloned())
        .with_top_n(args.top_n.unwrap_or(config.recommend.top_n))
        .with_alpha(args.alpha.unwrap_or(config.recommend.alpha));

    let (cart, recommendations) = match recommender.recommend_request_with_cart(&request) {
        Ok(scored) => scored,
        Err(error) => return domain_failure(error, &correlation_id),
    };

    let cart_names = cart
        .items()
        .iter()
        .filter_map(|&index| recommender.catalog().name_of(index).ok())
        .map(str::to_owned)
        .collect::<Vec<_>>();

    tracing::info!(
        event_name = "cli.recommend.completed",
        correlation_id = %correlation_id,
        cart_items = request.cart_items.len(),
        dropped_items = cart.dropped().len(),
        returned = recommendations.len(),
        "recommendations computed"
    );

    if args.json {
        return serialize_json(
            "recommend",
            &RecommendOutput {
                command: "recommend",
                status: "ok",
                correlation_id: &correlation_id,
                cart: cart_names,
                dropped_items: cart.dropped(),
                top_n: request.top_n,
                alpha: request.alpha,
                recommendations: &recommendations,
            },
        );
    }

    CommandResult {
        exit_code: 0,
        output: render_human(&cart_names, cart.dropped(), &recommendations),
    }
}

fn domain_failure(error: DomainError, correlation_id: &str) -> CommandResult {
    let (error_class, exit_code) = match error {
        DomainError::InvalidArgument(_) => ("invalid_argument", EXIT_INVALID_ARGUMENT),
        DomainError::InvalidIndex { .. } | DomainError::InvariantViolation(_) => ("internal", 1),
    };

    CommandResult::interface_failure(
        "recommend",
        error_class,
        ApplicationError::from(error),
        correlation_id,
        exit_code,
    )
}

fn render_human(cart: &[String], dropped: &[String], recommendations: &[Recommendation]) -> String {
    let mut lines = vec![format!("cart: {}", if cart.is_empty() { "<empty>".to_string() } else { cart.join(", ") })];

    if !dropped.is_empty() {
        lines.push(format!("ignored (not in catalog): {}", dropped.join(", ")));
    }

    if recommendations.is_empty() {
        lines.push("No recommendations found for this combination of products.".to_string());
        return lines.join("\n");
    }

    lines.push("recommended products:".to_string());
    for (rank, recommendation) in recommendations.iter().enumerate() {
        lines.push(format!(
            "{:>3}. {} score={:.4} [{}] {}",
            rank + 1,
            recommendation.product,
            recommendation.score,
            recommendation.signal,
            recommendation.reason
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use basket_core::SignalType;

    use super::*;

    #[test]
    fn human_output_lists_ranked_products() {
        let output = render_human(
            &["bread".to_string(), "milk".to_string()],
            &["caviar".to_string()],
            &[Recommendation {
                product: "butter".to_string(),
                score: 1.0,
                reason: "rule: bread → butter".to_string(),
                signal: SignalType::RuleBased,
            }],
        );

        assert!(output.contains("cart: bread, milk"));
        assert!(output.contains("ignored (not in catalog): caviar"));
        assert!(output.contains("  1. butter score=1.0000 [Rule-based] rule: bread → butter"));
    }

    #[test]
    fn empty_result_is_reported_not_failed() {
        let output = render_human(&[], &[], &[]);
        assert!(output.contains("No recommendations found"));
    }

    #[test]
    fn invalid_argument_maps_to_its_exit_code() {
        let result =
            domain_failure(DomainError::InvalidArgument("top_n must be greater than zero".into()), "req-9");

        assert_eq!(result.exit_code, EXIT_INVALID_ARGUMENT);
        let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(payload["error_class"], "invalid_argument");
        assert_eq!(payload["correlation_id"], "req-9");
        assert_eq!(payload["message"], "bad request: top_n must be greater than zero");
        assert_eq!(
            payload["hint"],
            "The request could not be processed. Check inputs and try again."
        );
    }
}
