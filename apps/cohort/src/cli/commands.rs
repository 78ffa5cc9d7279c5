//! # CLI Command Implementations

use super::{ModeArg, RosterArgs};
use crate::api::{self, PartitionResponse, ServerSettings, ValidateResponse};
use crate::config::{Config, PopulationConfig};
use crate::error::AppError;
use crate::roster_io::{load_roster, save_roster_json};
use crate::service;
use crate::template::{self, TemplateOptions};
use cohort_core::{
    FairnessOutcome, Plan, PopulationOutcome, PopulationPlan, PopulationSpec, Roster,
};
use serde::Serialize;
use std::path::Path;

// =============================================================================
// INPUTS
// =============================================================================

/// Load the config (if any), overlay `--population` flags, load the roster.
fn load_inputs(args: &RosterArgs) -> Result<(Roster, Config, Vec<PopulationSpec>), AppError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if !args.populations.is_empty() {
        config.populations = args
            .populations
            .iter()
            .map(|arg| PopulationConfig::parse_arg(arg))
            .collect::<Result<_, _>>()?;
    }

    let specs = config.population_specs()?;
    let roster = load_roster(&args.roster)?;
    Ok((roster, config, specs))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// PARTITION COMMAND
// =============================================================================

pub fn cmd_partition(args: &RosterArgs, mode: Option<ModeArg>, json: bool) -> Result<(), AppError> {
    let (roster, config, specs) = load_inputs(args)?;
    let mode = mode.map_or(config.mode, Into::into);

    let plan = service::plan_roster(&roster, &specs, mode, None)?;

    if json {
        return print_json(&PartitionResponse::from(plan));
    }

    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("Cohort Plan ({:?})", plan.mode);
    println!("==================");

    for outcome in &plan.populations {
        println!();
        match outcome {
            PopulationOutcome::Grouped(population) => print_population(population),
            PopulationOutcome::Infeasible { name, sizes } => {
                println!("{name}: no grouping into [{sizes}] keeps every group connected");
            }
        }
    }
}

fn print_population(population: &PopulationPlan) {
    println!("{} [{}]", population.name, population.sizes);
    println!(
        "  Satisfied weight: {} of {}",
        population.score.intra,
        population.score.total()
    );
    match population.fairness {
        FairnessOutcome::NotRequested => {}
        FairnessOutcome::NothingToBoost => println!("  Fairness: nothing to boost"),
        FairnessOutcome::Exhausted { rounds } => {
            println!("  Fairness: no different grouping after {rounds} rounds");
        }
        FairnessOutcome::Improved { multiplier, rounds } => {
            println!("  Fairness: regrouped at multiplier {multiplier} (round {rounds})");
        }
    }

    for (index, (group, color)) in population
        .partition
        .groups()
        .iter()
        .zip(&population.colors)
        .enumerate()
    {
        let members: Vec<String> = group.iter().map(ToString::to_string).collect();
        println!("  Group {} ({}): {}", index + 1, color, members.join(", "));
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Print every issue; fail when there is at least one.
pub fn cmd_validate(args: &RosterArgs, json: bool) -> Result<(), AppError> {
    let (roster, _, specs) = load_inputs(args)?;
    let report = roster.validate(&specs);

    if json {
        print_json(&ValidateResponse {
            valid: report.is_ok(),
            records: roster.len(),
            issues: report.issues().to_vec(),
        })?;
    } else if report.is_ok() {
        println!("Roster OK: {} records in {} populations", roster.len(), specs.len());
    } else {
        println!("Roster has {} issue(s):", report.issues().len());
        for issue in report.issues() {
            println!("  - {issue}");
        }
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(AppError::Validation(report))
    }
}

// =============================================================================
// TEMPLATE COMMAND
// =============================================================================

#[derive(Serialize)]
struct TemplateSummary<'a> {
    roster: &'a Path,
    config: &'a Path,
    records: usize,
    seed: u64,
}

pub fn cmd_template(
    output: &Path,
    config_output: &Path,
    seed: u64,
    json: bool,
) -> Result<(), AppError> {
    let demo = template::generate(&TemplateOptions {
        seed,
        ..TemplateOptions::default()
    })?;

    save_roster_json(output, &demo.roster)?;
    std::fs::write(config_output, demo.config.to_toml()?)
        .map_err(|e| AppError::io(config_output, e))?;

    tracing::info!(
        roster = %output.display(),
        config = %config_output.display(),
        records = demo.roster.len(),
        "template written"
    );

    if json {
        return print_json(&TemplateSummary {
            roster: output,
            config: config_output,
            records: demo.roster.len(),
            seed,
        });
    }

    println!("Wrote {} records to {}", demo.roster.len(), output.display());
    println!("Wrote config to {}", config_output.display());
    println!();
    println!(
        "Try: cohort partition --roster {} --config {}",
        output.display(),
        config_output.display()
    );
    Ok(())
}

// =============================================================================
// PALETTE COMMAND
// =============================================================================

pub fn cmd_palette(count: usize, json: bool) -> Result<(), AppError> {
    let colors = cohort_core::colors(count);

    if json {
        return print_json(&colors);
    }

    for (index, color) in colors.iter().enumerate() {
        println!("{:>3}  {}", index + 1, color);
    }
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Startup text, built from the settings the server will actually run with.
fn startup_summary(addr: &str, settings: &ServerSettings) -> String {
    let mut out = String::new();
    out.push_str("Cohort Server Starting...\n\n");
    out.push_str("Configuration:\n");
    out.push_str(&format!("  Address:        {addr}\n"));
    out.push_str(&format!("  Default mode:   {:?}\n", settings.default_mode));
    out.push_str(&format!(
        "  Search timeout: {} ms\n",
        settings.search_timeout.as_millis()
    ));
    out.push_str(&format!(
        "  Auth:           {}\n\n",
        if settings.api_key.is_some() { "bearer key" } else { "disabled" }
    ));
    out.push_str("Endpoints:\n");
    out.push_str("  POST /partition - Group a roster\n");
    out.push_str("  POST /validate  - Validate a roster\n");
    out.push_str("  GET  /palette   - Group colours\n");
    out.push_str("  GET  /health    - Health check\n\n");
    out.push_str("Press Ctrl+C to stop\n\n");
    out
}

pub async fn cmd_server(host: &str, port: u16, config: Option<&Path>) -> Result<(), AppError> {
    let config = match config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = ServerSettings::from_env(&config);
    let addr = format!("{host}:{port}");

    print!("{}", startup_summary(&addr, &settings));

    api::run_server(&addr, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(roster: PathBuf, populations: &[&str]) -> RosterArgs {
        RosterArgs {
            roster,
            config: None,
            populations: populations.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn template_then_partition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = dir.path().join("roster.json");
        let config = dir.path().join("cohort.toml");

        cmd_template(&roster, &config, 46, true).expect("template");

        let with_config = RosterArgs {
            config: Some(config),
            ..args(roster, &[])
        };
        cmd_validate(&with_config, true).expect("validate");
        cmd_partition(&with_config, Some(ModeArg::Primary), true).expect("partition");
    }

    #[test]
    fn population_flags_replace_the_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = dir.path().join("roster.json");
        let config = dir.path().join("cohort.toml");
        cmd_template(&roster, &config, 3, true).expect("template");

        let narrowed = RosterArgs {
            config: Some(config),
            ..args(roster, &["male=1-14:7,7"])
        };
        let (_, loaded, specs) = load_inputs(&narrowed).expect("inputs");
        assert_eq!(specs.len(), 1);
        assert_eq!(loaded.populations[0].sizes, "7,7");

        // The female records now fall outside every range.
        assert!(matches!(
            cmd_validate(&narrowed, true),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn startup_summary_reports_the_running_timeout() {
        let mut settings = ServerSettings::from_config(&Config {
            search_timeout_ms: 2500,
            ..Config::default()
        });
        assert!(startup_summary("127.0.0.1:8080", &settings).contains("Search timeout: 2500 ms"));

        settings.search_timeout = std::time::Duration::from_millis(750);
        let summary = startup_summary("127.0.0.1:8080", &settings);
        assert!(summary.contains("Search timeout: 750 ms"));
        assert!(summary.contains("Address:        127.0.0.1:8080"));
    }

    #[test]
    fn malformed_population_flag_is_reported() {
        let err = load_inputs(&args(PathBuf::from("roster.json"), &["male:1-14"]))
            .expect_err("malformed");
        assert!(matches!(err, AppError::PopulationArg(_)));
    }
}
