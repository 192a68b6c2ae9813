// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::SourceRuntime;
use sawit_app::{
    AppState, DashboardSummary, MonthlyYield, PlotProgress, PlotYield, RecordTables,
    monthly_yield, plot_progress, summarize, yield_by_plot,
};
use sawit_data::{DataOrigin, MockSource, RecordSource};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use time::{Date, OffsetDateTime};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `sawit --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_dir = config.log_dir()?;
    logging::init(&log_dir, config.log_level()).with_context(|| {
        format!(
            "initialize logging in {}; set [log].dir or {} to fix",
            log_dir.display(),
            logging::LOG_ENV
        )
    })?;

    let origin = resolve_origin(&config, &options);
    let today = OffsetDateTime::now_utc().date();
    tracing::info!(
        config = %options.config_path.display(),
        origin = %origin.describe(),
        %today,
        "starting"
    );

    let mut source = MockSource::new(origin, today);
    if options.summary {
        let tables = source.load_tables()?;
        let report = SummaryReport::build(origin, today, &tables);
        let json = serde_json::to_string_pretty(&report).context("encode summary as JSON")?;
        println!("{json}");
        return Ok(());
    }

    if options.check_only {
        source
            .load_tables()
            .context("generate record tables for --check")?;
        return Ok(());
    }

    let mut state = AppState {
        active_view: config.start_view(),
        ..AppState::default()
    };
    let mut runtime = SourceRuntime::new(source, today);
    sawit_tui::run_app(&mut state, &mut runtime)
}

/// `--seed` implies `--random`; `--random` alone keeps the configured seed
/// and plot count.
fn resolve_origin(config: &Config, options: &CliOptions) -> DataOrigin {
    if options.seed.is_none() && !options.random {
        return config.data_origin();
    }
    DataOrigin::Random {
        seed: options.seed.unwrap_or_else(|| config.seed()),
        plots: config.plots(),
    }
}

#[derive(Debug, Serialize)]
struct SummaryReport {
    origin: String,
    reference_date: String,
    summary: DashboardSummary,
    monthly_yield: Vec<MonthlyYield>,
    yield_by_plot: Vec<PlotYield>,
    plots: Vec<PlotProgress>,
}

impl SummaryReport {
    fn build(origin: DataOrigin, today: Date, tables: &RecordTables) -> Self {
        Self {
            origin: origin.describe(),
            reference_date: today.to_string(),
            summary: summarize(&tables.plantings, &tables.harvests),
            monthly_yield: monthly_yield(&tables.harvests),
            yield_by_plot: yield_by_plot(&tables.plantings, &tables.harvests),
            plots: tables
                .plantings
                .iter()
                .map(|record| plot_progress(record, today))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    random: bool,
    seed: Option<u64>,
    summary: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        random: false,
        seed: None,
        summary: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--random" => {
                options.random = true;
            }
            "--seed" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--seed requires a non-negative integer"))?;
                let seed = value.as_ref().parse::<u64>().with_context(|| {
                    format!("--seed requires a non-negative integer, got {:?}", value.as_ref())
                })?;
                options.seed = Some(seed);
                options.random = true;
            }
            "--summary" => {
                options.summary = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("sawit: oil-palm planting and harvest dashboard");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --random                 Use seeded random data instead of the fixed plots");
    println!("  --seed <n>               Seed for random data (implies --random)");
    println!("  --summary                Print the dashboard summary as JSON and exit");
    println!("  --check                  Validate config and data generation, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, SummaryReport, parse_cli_args, resolve_origin};
    use crate::config::Config;
    use anyhow::Result;
    use sawit_data::{DataOrigin, fixed_tables};
    use std::path::PathBuf;
    use time::macros::date;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/sawit-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                random: false,
                seed: None,
                summary: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--seed"], default_options_path())
            .expect_err("missing seed should fail");
        assert!(error.to_string().contains("--seed requires"));
    }

    #[test]
    fn parse_cli_args_rejects_negative_seed() {
        let error = parse_cli_args(vec!["--seed", "-4"], default_options_path())
            .expect_err("negative seed should fail");
        assert!(error.to_string().contains("non-negative integer"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_summary_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--summary",
                "--check",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.summary);
        assert!(options.check_only);
        assert!(!options.random);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn seed_flag_implies_random_origin() -> Result<()> {
        let options = parse_cli_args(vec!["--seed", "99"], default_options_path())?;
        assert!(options.random);
        assert_eq!(
            resolve_origin(&Config::default(), &options),
            DataOrigin::Random { seed: 99, plots: 8 }
        );
        Ok(())
    }

    #[test]
    fn random_flag_keeps_configured_seed() -> Result<()> {
        let options = parse_cli_args(vec!["--random"], default_options_path())?;
        assert_eq!(
            resolve_origin(&Config::default(), &options),
            DataOrigin::Random { seed: 42, plots: 8 }
        );

        let plain = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(resolve_origin(&Config::default(), &plain), DataOrigin::Fixed);
        Ok(())
    }

    #[test]
    fn summary_report_serializes_fixed_totals() -> Result<()> {
        let today = date!(2026 - 10 - 16);
        let report = SummaryReport::build(DataOrigin::Fixed, today, &fixed_tables());
        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert_eq!(json["origin"], "fixed");
        assert_eq!(json["reference_date"], "2026-10-16");
        assert_eq!(json["summary"]["total_yield_kg"], 59_500);
        assert_eq!(json["summary"]["mean_yield_kg"], 11_900.0);
        assert_eq!(json["yield_by_plot"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["plots"][0]["status"], "ReadyToHarvest");
        Ok(())
    }

    #[test]
    fn summary_report_encodes_missing_mean_as_null() -> Result<()> {
        let mut tables = fixed_tables();
        tables.harvests.clear();
        let report = SummaryReport::build(DataOrigin::Fixed, date!(2026 - 10 - 16), &tables);
        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert!(json["summary"]["mean_yield_kg"].is_null());
        assert_eq!(json["monthly_yield"].as_array().map(Vec::len), Some(0));
        Ok(())
    }
}
