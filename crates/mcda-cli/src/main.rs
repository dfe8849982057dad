// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use mcda_cli::{
    CliError, CsvOptions, EstimatorSpec, PipelineSpec, load_csv_dataset, run_ncd, run_pipeline,
};
use mcda_cluster::{CutPolicy, Linkage};
use mcda_core::{McdaError, ReproMode};
use mcda_ncd::NcdResult;
use mcda_pareto::Direction;
use mcda_select::{Metric, SearchStrategy};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Multi-criteria analysis: NCD distances, consensus tree, FS-OPA feature
/// selection and Pareto front.
#[derive(Parser, Debug)]
#[command(name = "mcda", version, about, long_about = None)]
struct Cli {
    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and emit a JSON report.
    Analyze(AnalyzeArgs),
    /// Compute only the record NCD matrix.
    Ncd(NcdArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Headered CSV table, one record per row.
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Column used as record labels instead of an attribute.
    #[arg(long)]
    label_column: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Auto,
    Greedy,
    Exhaustive,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// JSON pipeline spec; flags below override its fields.
    #[arg(long)]
    pipeline: Option<PathBuf>,

    #[arg(long)]
    k: Option<usize>,

    #[arg(long, value_parser = parse_linkage)]
    linkage: Option<Linkage>,

    /// Cut the consensus tree into this many clusters.
    #[arg(long, conflicts_with = "threshold")]
    clusters: Option<usize>,

    /// Cut the consensus tree at this merge height.
    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    #[arg(long, value_parser = parse_metric)]
    metric: Option<Metric>,

    /// Pareto objective; repeat for several. Defaults to the selected features.
    #[arg(long = "objective")]
    objectives: Vec<String>,

    /// Objective to minimize; repeat for several.
    #[arg(long)]
    minimize: Vec<String>,

    /// Objective to maximize; repeat for several.
    #[arg(long)]
    maximize: Vec<String>,

    /// Run every stage on the calling thread.
    #[arg(long)]
    strict: bool,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct NcdArgs {
    #[command(flatten)]
    input: InputArgs,

    /// zlib compression level.
    #[arg(long, conflicts_with = "length")]
    level: Option<u32>,

    /// Use raw byte length instead of compressed length.
    #[arg(long)]
    length: bool,

    #[arg(long)]
    strict: bool,

    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_linkage(raw: &str) -> Result<Linkage, McdaError> {
    raw.parse()
}

fn parse_metric(raw: &str) -> Result<Metric, McdaError> {
    raw.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit_structured_error(&err);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Ncd(args) => handle_ncd(args),
    }
}

fn csv_options(args: &InputArgs) -> Result<CsvOptions, CliError> {
    if !args.delimiter.is_ascii() {
        return Err(CliError::invalid_input(format!(
            "--delimiter must be an ASCII character; got '{}'",
            args.delimiter
        )));
    }
    Ok(CsvOptions {
        delimiter: args.delimiter as u8,
        label_column: args.label_column.clone(),
    })
}

fn load_pipeline_spec(path: &Path) -> Result<PipelineSpec, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    serde_json::from_str(&raw).map_err(|source| {
        CliError::json(
            format!("invalid pipeline JSON in '{}'", path.display()),
            source,
        )
    })
}

fn build_analyze_spec(args: &AnalyzeArgs) -> Result<PipelineSpec, CliError> {
    let mut spec = match &args.pipeline {
        Some(path) => load_pipeline_spec(path)?,
        None => PipelineSpec::default(),
    };

    if let Some(k) = args.k {
        spec.k = k;
    }
    if let Some(linkage) = args.linkage {
        spec.linkage = linkage;
    }
    if let Some(count) = args.clusters {
        spec.cut = Some(CutPolicy::ClusterCount(count));
    }
    if let Some(threshold) = args.threshold {
        spec.cut = Some(CutPolicy::DistanceThreshold(threshold));
    }
    if let Some(strategy) = args.strategy {
        spec.selection.strategy = match strategy {
            StrategyArg::Auto => SearchStrategy::default(),
            StrategyArg::Greedy => SearchStrategy::Greedy,
            StrategyArg::Exhaustive => SearchStrategy::Exhaustive,
        };
    }
    if let Some(metric) = args.metric {
        spec.selection.metric = metric;
    }
    if !args.objectives.is_empty() {
        spec.objectives = Some(args.objectives.clone());
    }
    if let Some(name) = args.minimize.iter().find(|name| args.maximize.contains(name)) {
        return Err(CliError::invalid_input(format!(
            "'{name}' given to both --minimize and --maximize"
        )));
    }
    for name in &args.minimize {
        spec.directions.overrides.insert(name.clone(), Direction::Minimize);
    }
    for name in &args.maximize {
        spec.directions.overrides.insert(name.clone(), Direction::Maximize);
    }
    if args.strict {
        spec.repro_mode = ReproMode::Strict;
    }

    spec.validate()?;
    Ok(spec)
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let spec = build_analyze_spec(&args)?;
    let dataset = load_csv_dataset(&args.input.input, &csv_options(&args.input)?)?;
    let report = run_pipeline(&dataset, &spec)?;
    write_json_output(&report, args.output.as_deref())
}

#[derive(Serialize)]
struct NcdOutput<'a> {
    labels: &'a [String],
    #[serde(flatten)]
    result: NcdResult,
}

fn handle_ncd(args: NcdArgs) -> Result<(), CliError> {
    let spec = PipelineSpec {
        estimator: if args.length {
            EstimatorSpec::Length
        } else {
            match args.level {
                Some(level) => EstimatorSpec::Zlib { level },
                None => EstimatorSpec::default(),
            }
        },
        repro_mode: if args.strict {
            ReproMode::Strict
        } else {
            ReproMode::Balanced
        },
        ..PipelineSpec::default()
    };
    let dataset = load_csv_dataset(&args.input.input, &csv_options(&args.input)?)?;
    let result = run_ncd(&dataset, &spec)?;
    write_json_output(
        &NcdOutput {
            labels: dataset.labels(),
            result,
        },
        args.output.as_deref(),
    )
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    match serde_json::to_string_pretty(&err.envelope()) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, build_analyze_spec};
    use clap::Parser;
    use mcda_cluster::{CutPolicy, Linkage};
    use mcda_core::ReproMode;
    use mcda_pareto::Direction;
    use mcda_select::SearchStrategy;

    fn analyze(args: &[&str]) -> super::AnalyzeArgs {
        let cli = Cli::try_parse_from(args).expect("arguments parse");
        match cli.command {
            Command::Analyze(args) => args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn analyze_flags_override_defaults() {
        let args = analyze(&[
            "mcda",
            "analyze",
            "--input",
            "data.csv",
            "--k",
            "4",
            "--linkage",
            "upgma",
            "--threshold",
            "0.3",
            "--strategy",
            "greedy",
            "--minimize",
            "cost",
            "--objective",
            "cost",
            "--objective",
            "gain",
            "--strict",
        ]);
        let spec = build_analyze_spec(&args).expect("spec");
        assert_eq!(spec.k, 4);
        assert_eq!(spec.linkage, Linkage::Average);
        assert_eq!(spec.cut, Some(CutPolicy::DistanceThreshold(0.3)));
        assert_eq!(spec.selection.strategy, SearchStrategy::Greedy);
        assert_eq!(
            spec.objectives,
            Some(vec!["cost".to_string(), "gain".to_string()])
        );
        assert_eq!(spec.directions.direction_for("cost"), Direction::Minimize);
        assert_eq!(spec.repro_mode, ReproMode::Strict);
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        assert!(
            Cli::try_parse_from([
                "mcda",
                "analyze",
                "--input",
                "d.csv",
                "--clusters",
                "2",
                "--threshold",
                "0.5"
            ])
            .is_err()
        );

        let args = analyze(&[
            "mcda",
            "analyze",
            "--input",
            "d.csv",
            "--minimize",
            "x",
            "--maximize",
            "x",
        ]);
        assert_eq!(
            build_analyze_spec(&args).expect_err("both directions").code(),
            "invalid_input"
        );

        let args = analyze(&["mcda", "analyze", "--input", "d.csv", "--k", "3"]);
        assert_eq!(
            build_analyze_spec(&args).expect_err("k=3").code(),
            "invalid_k"
        );
    }

    #[test]
    fn unknown_linkage_fails_to_parse() {
        assert!(
            Cli::try_parse_from(["mcda", "analyze", "--input", "d.csv", "--linkage", "ward"])
                .is_err()
        );
    }

    #[test]
    fn ncd_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "mcda",
            "--log-format",
            "json",
            "ncd",
            "--input",
            "d.csv",
            "--level",
            "9",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Command::Ncd(ref args) if args.level == Some(9)));
    }
}
