use basket_core::config::{AppConfig, ArtifactsConfig, LoadOptions};
use basket_core::{ArtifactBundle, Recommender};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.push(check_artifact_files(&config.artifacts));

            match ArtifactBundle::load(&config.artifacts) {
                Ok(bundle) => {
                    let summary = bundle.summary();
                    checks.push(DoctorCheck::pass(
                        "artifact_load",
                        format!(
                            "{} products, {} rules, {} neighbor lists",
                            summary.products, summary.rules, summary.neighbor_sources
                        ),
                    ));
                    checks.push(check_smoke_recommendation(&config, Recommender::from(bundle)));
                }
                Err(error) => {
                    checks.push(DoctorCheck::fail("artifact_load", error.to_string()));
                    checks.push(DoctorCheck::skipped(
                        "smoke_recommendation",
                        "artifacts did not load",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["artifact_files", "artifact_load", "smoke_recommendation"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_artifact_files(paths: &ArtifactsConfig) -> DoctorCheck {
    let missing = [&paths.catalog_path, &paths.rules_path, &paths.neighbors_path]
        .into_iter()
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>();

    if missing.is_empty() {
        DoctorCheck::pass("artifact_files", "catalog, rules and neighbors files present")
    } else {
        DoctorCheck::fail(
            "artifact_files",
            format!("missing: {} (run `basket seed` for demo data)", missing.join(", ")),
        )
    }
}

fn check_smoke_recommendation(config: &AppConfig, recommender: Recommender) -> DoctorCheck {
    let Some(first) = recommender.catalog().products().next() else {
        return DoctorCheck::fail("smoke_recommendation", "catalog is empty");
    };
    let probe = first.id.as_str();

    match recommender.recommend(&[probe], config.recommend.top_n, config.recommend.alpha) {
        Ok(results) => DoctorCheck::pass(
            "smoke_recommendation",
            format!("cart [{probe}] produced {} recommendations", results.len()),
        ),
        Err(error) => DoctorCheck::fail("smoke_recommendation", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
