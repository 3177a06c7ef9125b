use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use litegate_core::{ColumnDeclaration, ColumnType, EngineConfig, classify};
use litegate_sqlite::{Database, QueryOutcome, TypeHint, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "litegate")]
#[command(about = "SQLite access with automatic write batching and additive migration")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// YAML engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Engine setting override, e.g. `--set cache_size=10000`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print whether a statement is a READ or a WRITE.
    Classify(ClassifyArgs),
    /// Run one statement and print its rows as JSON.
    Query(QueryArgs),
    /// Print the live columns and indices of a table as JSON.
    Schema(SchemaArgs),
    /// Add the given columns (and their indices) to a table.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    /// SQL statement.
    sql: String,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Database path; the file is `<dir>/<stem>.sqlite3`.
    #[arg(long)]
    db: PathBuf,
    /// SQL statement.
    sql: String,
    /// Bind parameter `target=value[:hint]`; a numeric target is positional.
    #[arg(long = "param", value_name = "TARGET=VALUE[:HINT]")]
    params: Vec<String>,
    /// Run the statement without collecting rows; prints the change count.
    #[arg(long)]
    no_rows: bool,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Database path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// Database path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Column `name:type[:not-null][:index][:unique]`. Repeatable.
    #[arg(long = "column", value_name = "SPEC", required = true)]
    columns: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Classify(ref args) => run_classify(args),
        Command::Query(ref args) => load_config(&cli).and_then(|config| run_query(args, config)),
        Command::Schema(ref args) => load_config(&cli).and_then(|config| run_schema(args, config)),
        Command::Migrate(ref args) => {
            load_config(&cli).and_then(|config| run_migrate(args, config))
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the engine configuration from `--config` and `--set`.
fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => EngineConfig::default(),
    };

    let overrides = cli
        .overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let applied = config.apply_overrides(overrides);
    debug!(applied, "engine overrides applied");
    Ok(config)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_classify(args: &ClassifyArgs) -> Result<(), String> {
    println!("{}", classify(&args.sql));
    Ok(())
}

fn run_query(args: &QueryArgs, config: EngineConfig) -> Result<(), String> {
    let params = args
        .params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut db = Database::new(&args.db, config).map_err(|e| e.to_string())?;
    let outcome = db
        .query(&args.sql, !args.no_rows, &params)
        .map_err(|e| e.to_string())?;
    db.close().map_err(|e| e.to_string())?;

    let json = match outcome {
        QueryOutcome::Rows(rows) => serde_json::to_string_pretty(&rows),
        QueryOutcome::Executed {
            changes,
            last_insert_rowid,
        } => serde_json::to_string_pretty(&serde_json::json!({
            "changes": changes,
            "last_insert_rowid": last_insert_rowid,
        })),
    }
    .map_err(|e| format!("Failed to serialize result: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_schema(args: &SchemaArgs, config: EngineConfig) -> Result<(), String> {
    let mut db = Database::new(&args.db, config).map_err(|e| e.to_string())?;
    db.set_table_name(&args.table).map_err(|e| e.to_string())?;
    let columns = db.columns().map_err(|e| e.to_string())?;
    let indices = db.indices().map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "table": args.table,
        "columns": columns,
        "indices": indices,
    }))
    .map_err(|e| format!("Failed to serialize schema: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_migrate(args: &MigrateArgs, config: EngineConfig) -> Result<(), String> {
    let columns = args
        .columns
        .iter()
        .map(|raw| parse_column(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut db = Database::new(&args.db, config).map_err(|e| e.to_string())?;
    db.set_table_name(&args.table).map_err(|e| e.to_string())?;
    for column in columns {
        db.register(column).map_err(|e| e.to_string())?;
    }
    let report = db
        .migrate()
        .map_err(|e| format!("Migration failed: {e}"))?;
    db.close().map_err(|e| e.to_string())?;

    println!("Migration complete for table '{}':", report.table);
    println!(
        "  Table created: {}",
        if report.created_table { "yes" } else { "no" }
    );
    println!("  Columns added: {}", join_or_none(&report.columns_added));
    println!("  Indices created: {}", join_or_none(&report.indices_created));
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parses `key=value` into an engine override.
fn parse_override(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid override '{raw}': expected KEY=VALUE"))?;
    Ok((
        key.trim().to_string(),
        serde_json::Value::String(value.trim().to_string()),
    ))
}

/// Parses `target=value[:hint]` into a bind tuple.
///
/// The trailing `:hint` is only split off when it names a known hint, so
/// values containing colons pass through unchanged.
fn parse_param(raw: &str) -> Result<Vec<Value>, String> {
    let (target, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid param '{raw}': expected TARGET=VALUE[:HINT]"))?;

    let target = match target.trim().parse::<i64>() {
        Ok(index) => Value::Integer(index),
        Err(_) => Value::from(target.trim()),
    };

    match rest.rsplit_once(':') {
        Some((value, hint)) if hint.parse::<TypeHint>().is_ok() => {
            Ok(vec![target, Value::from(value), Value::from(hint)])
        }
        _ => Ok(vec![target, Value::from(rest)]),
    }
}

/// Parses `name:type[:not-null][:index][:unique]` into a column declaration.
fn parse_column(raw: &str) -> Result<ColumnDeclaration, String> {
    let mut parts = raw.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(format!("Invalid column '{raw}': missing name"));
    }
    let column_type: ColumnType = parts
        .next()
        .ok_or_else(|| format!("Invalid column '{raw}': missing type"))?
        .parse()
        .map_err(|e| format!("Invalid column '{raw}': {e}"))?;

    let mut column = ColumnDeclaration::new(name, column_type);
    let mut indexed = false;
    let mut unique = false;
    for flag in parts {
        match flag.trim() {
            "not-null" | "notnull" => column = column.not_null(),
            "index" => indexed = true,
            "unique" => unique = true,
            "optional" => column = column.post_required(false),
            other => return Err(format!("Invalid column '{raw}': unknown flag '{other}'")),
        }
    }
    if indexed || unique {
        column = column.indexed(unique);
    }
    Ok(column)
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
