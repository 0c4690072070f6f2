//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::commands::load_blueprint;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    vehicle_count: usize,
    traffic_count: usize,
    pixel_threshold: u64,
    duration_sec: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    vehicle_count: blueprint.vehicles.len(),
                    traffic_count: blueprint.traffic.count,
                    pixel_threshold: blueprint.stop.pixel_threshold,
                    duration_sec: blueprint.run.duration_sec,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::ScenarioBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.traffic.count == 0 {
        warnings.push("No NPC traffic configured - the map will be empty".to_string());
    }

    if blueprint.run.duration_sec > 120.0 {
        warnings.push(format!(
            "Run window is {:.0}s - the scenario holds actors that long",
            blueprint.run.duration_sec
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid: {}", result.config_path);
        if let Some(summary) = &result.summary {
            println!(
                "  {} vehicle(s), {} traffic spawn(s), threshold {}, window {:.1}s",
                summary.vehicle_count,
                summary.traffic_count,
                summary.pixel_threshold,
                summary.duration_sec
            );
        }
        if let Some(warnings) = &result.warnings {
            for warning in warnings {
                println!("  warning: {}", warning);
            }
        }
    } else {
        println!("Configuration is INVALID: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("  error: {}", error);
        }
    }
}
