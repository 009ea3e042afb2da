use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use overlay_match_core::{
    CardinalityPolicy, Comparators, MatchAnnotation, MatchContext, Node, Truthiness,
};
use overlay_match_doc::{Document, MatchRequest, REQUEST_LABEL, RunOptions, run_request};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod builtins;

use builtins::builtin_functions;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "overlay-match")]
#[command(about = "Match overlay entries against a base YAML document")]
struct Cli {
    /// Log filter (e.g. `warn`, `overlay_match_core=debug`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Match every request entry against the base document and print a report.
    Match(MatchArgs),
    /// Resolve every entry's match options without reading a base document.
    Resolve(ResolveArgs),
    /// List the predicate functions usable with `!fn`.
    Functions,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Base YAML document.
    #[arg(long)]
    base: PathBuf,
    /// Match request YAML file.
    #[arg(long)]
    request: PathBuf,
    /// Dotted path of the mapping to match against (overrides the request).
    #[arg(long)]
    target: Option<String>,
    /// Only accept bool results from predicate functions.
    #[arg(long)]
    strict_bool: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Match request YAML file.
    #[arg(long)]
    request: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Serialize)]
struct ResolvedEntry {
    key: String,
    matcher: String,
    policy: CardinalityPolicy,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Match(args) => run_match(args),
        Command::Resolve(args) => run_resolve(args),
        Command::Functions => run_functions(),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_match(args: MatchArgs) -> Result<(), String> {
    let document = Document::load(&args.base)
        .map_err(|err| format!("Failed to load base '{}': {err}", args.base.display()))?;
    let request = MatchRequest::load(&args.request)
        .map_err(|err| format!("Failed to load request '{}': {err}", args.request.display()))?;

    let truthiness = if args.strict_bool {
        Truthiness::Strict
    } else {
        Truthiness::Loose
    };
    let evaluator = builtin_functions(truthiness);
    let comparators = Comparators::new().with_map_key_fallback();
    let ctx = MatchContext::new(&evaluator, &comparators);

    debug!(
        base = %args.base.display(),
        request = %args.request.display(),
        entries = request.entries.len(),
        strict_bool = args.strict_bool,
        "Running match"
    );
    let options = RunOptions {
        target: args.target,
    };
    let report = run_request(&document, &request, &ctx, &options).map_err(|e| e.to_string())?;

    let raw = match args.format {
        CliOutputFormat::Json => report.to_json(),
        CliOutputFormat::Yaml => report.to_yaml(),
    }
    .map_err(|err| format!("Failed to serialize report: {err}"))?;
    println!("{raw}");

    match report.failure_count() {
        0 => Ok(()),
        n => Err(format!("{n} of {} entries failed to match", report.outcomes.len())),
    }
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let request = MatchRequest::load(&args.request)
        .map_err(|err| format!("Failed to load request '{}': {err}", args.request.display()))?;
    let defaults = request.match_defaults().map_err(|e| e.to_string())?;
    debug!(
        request = %args.request.display(),
        entries = request.entries.len(),
        "Resolving match request"
    );

    let mut resolved = Vec::with_capacity(request.entries.len());
    for (index, entry) in request.entries.iter().enumerate() {
        let new_entry = entry.to_entry(REQUEST_LABEL, index).map_err(|e| e.to_string())?;
        let key = match new_entry.key {
            Node::String(s) => s,
            other => other.to_string(),
        };
        let annotation = entry.annotation().map_err(|e| e.to_string())?;
        let annotation = MatchAnnotation::resolve(&annotation, &defaults)
            .map_err(|err| format!("entry '{key}': {err}"))?;
        resolved.push(ResolvedEntry {
            key,
            matcher: annotation.matcher.to_string(),
            policy: annotation.policy,
        });
    }

    info!(entries = resolved.len(), "Resolved match options");
    let raw = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&resolved).map_err(|e| e.to_string()),
        CliOutputFormat::Yaml => serde_yaml::to_string(&resolved).map_err(|e| e.to_string()),
    }?;
    println!("{raw}");
    Ok(())
}

fn run_functions() -> Result<(), String> {
    let table = builtin_functions(Truthiness::Loose);
    for name in table.names() {
        println!("{name}");
    }
    Ok(())
}
