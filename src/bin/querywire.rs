//! Binary entry point for the querywire CLI.
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use querywire::error::QueryErrorWithCode;
use querywire::query::{parse_expr, parse_predicate, Dynamic, ProjectionSpec, SelectQuery};
use querywire::{Result, Source, SourceConfig};
use serde_json::{json, Value as JsonValue};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "querywire",
    version,
    about = "Render and run table/where/select queries against a remote endpoint",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "QUERYWIRE_CONFIG",
        help = "Source config file (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "QUERYWIRE_ENDPOINT",
        help = "Override the base endpoint"
    )]
    endpoint: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the query text for the deepest stage given.
    Render(RenderCmd),
    /// Execute a query and print the decoded rows.
    Fetch(FetchCmd),
}

#[derive(Args, Debug)]
struct RenderCmd {
    #[arg(long, help = "Table name")]
    table: String,

    #[arg(long = "where", value_name = "EXPR", help = "Predicate, e.g. 'ID == 123'")]
    predicate: Option<String>,

    #[arg(
        long,
        value_name = "FIELD[:ALIAS]",
        value_delimiter = ',',
        requires = "predicate",
        help = "Comma-separated projection"
    )]
    select: Vec<String>,
}

#[derive(Args, Debug)]
struct FetchCmd {
    #[arg(long, help = "Table name")]
    table: String,

    #[arg(long = "where", value_name = "EXPR", help = "Predicate, e.g. 'ID == 123'")]
    predicate: String,

    #[arg(
        long,
        value_name = "FIELD[:ALIAS]",
        value_delimiter = ',',
        required = true,
        help = "Comma-separated projection"
    )]
    select: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", QueryErrorWithCode(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("querywire=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = SourceConfig::load(cli.config)?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    let source = Source::from_config(&config)?;
    debug!(endpoint = %source.endpoint(), "cli.source_ready");

    match cli.command {
        Command::Render(cmd) => {
            let text = render(&source, cmd)?;
            match cli.format {
                OutputFormat::Text => println!("{text}"),
                OutputFormat::Json => println!("{}", json!({ "query": text })),
            }
        }
        Command::Fetch(cmd) => {
            let query = build_select(&source, &cmd.table, &cmd.predicate, &cmd.select)?;
            let rows = query.fetch_all()?;
            match cli.format {
                OutputFormat::Text => {
                    for row in &rows {
                        println!("{row}");
                    }
                }
                OutputFormat::Json => println!("{:#}", JsonValue::Array(rows)),
            }
        }
    }
    Ok(())
}

fn render(source: &Source, cmd: RenderCmd) -> Result<String> {
    let Some(predicate) = cmd.predicate else {
        return Ok(source.table::<Dynamic>(cmd.table)?.render());
    };
    if cmd.select.is_empty() {
        let filter = source
            .table::<Dynamic>(cmd.table)?
            .r#where(parse_predicate(&predicate)?);
        return filter.render();
    }
    build_select(source, &cmd.table, &predicate, &cmd.select)?.render()
}

fn build_select(
    source: &Source,
    table: &str,
    predicate: &str,
    select: &[String],
) -> Result<SelectQuery<Dynamic, JsonValue>> {
    let specs = select
        .iter()
        .map(|item| projection_spec(item.as_str()))
        .collect::<Result<Vec<_>>>()?;
    Ok(source
        .table::<Dynamic>(table)?
        .r#where(parse_predicate(predicate)?)
        .select(specs))
}

fn projection_spec(item: &str) -> Result<ProjectionSpec> {
    match item.split_once(':') {
        Some((expr, alias)) => Ok(ProjectionSpec::from((parse_expr(expr)?, alias.trim()))),
        None => Ok(ProjectionSpec::from(parse_expr(item)?)),
    }
}
