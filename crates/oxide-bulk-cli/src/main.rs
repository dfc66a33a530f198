//! oxide-bulk CLI
//!
//! Renders single-statement bulk UPDATE and DELETE commands from a filtered
//! SELECT, optionally runs them, and routes command text to sharded tables.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_bulk::{Connection, Executor};
use oxide_bulk_core::{
    ColumnAssignment, CompiledQuery, Dialect, IgnoreSet, MutationBuilder, ShardingTag, SqlValue,
    TableNameRewriter, TranspileConfig,
};

/// Single-round-trip bulk UPDATE/DELETE.
#[derive(Parser)]
#[command(name = "oxide-bulk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target engine (sqlserver, mysql, postgresql, or a provider name).
    #[arg(short, long, env = "OXIDE_BULK_DIALECT", default_value = "sqlserver")]
    dialect: String,

    /// JSON file with transpiler settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL, used with --execute. Its scheme overrides --dialect.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the UPDATE for a SELECT.
    RenderUpdate {
        #[command(flatten)]
        base: BaseArgs,

        /// Column assignment as `column=value` (value parsed as JSON, else text).
        #[arg(short = 's', long = "set", required = true)]
        assignments: Vec<String>,

        /// Column never to assign.
        #[arg(short, long)]
        ignore: Vec<String>,
    },

    /// Render the DELETE for a SELECT.
    RenderDelete {
        #[command(flatten)]
        base: BaseArgs,
    },

    /// Route command text to physical tables.
    Rewrite {
        /// Command text.
        #[arg(long)]
        sql: String,

        /// Explicit tag as `logical:physical`; annotations in the text are
        /// used when none is given.
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

/// The filtered SELECT a mutation is built from.
#[derive(Args)]
struct BaseArgs {
    /// SELECT text with native markers.
    #[arg(long)]
    sql: String,

    /// Table the mutation targets.
    #[arg(short, long)]
    table: String,

    /// Key column projected by the SELECT.
    #[arg(short, long, default_value = "id")]
    key: String,

    /// Bound value of the SELECT as `marker=value`.
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Run the statement against --database-url.
    #[arg(long)]
    execute: bool,
}

impl BaseArgs {
    fn query(&self) -> anyhow::Result<CompiledQuery> {
        let mut query = CompiledQuery::new(self.sql.as_str(), self.table.as_str()).key(&self.key);
        for param in &self.params {
            let (marker, value) = split_pair(param, '=')?;
            query = query.parameter(marker, parse_value(value));
        }
        Ok(query)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    let execute = match &cli.command {
        Commands::RenderUpdate { base, .. } | Commands::RenderDelete { base } => base.execute,
        Commands::Rewrite { .. } => false,
    };
    let connection = if execute {
        let Some(url) = cli.database_url.as_deref() else {
            bail!("--execute needs --database-url or DATABASE_URL");
        };
        Some(Connection::connect(url).await?)
    } else {
        None
    };
    let dialect = connection
        .as_ref()
        .map_or_else(|| Dialect::from_provider(&cli.dialect), |c| c.dialect());

    let builder = MutationBuilder::new(config.clone());
    let rewriter = TableNameRewriter::new(config);

    let (sql, parameters) = match cli.command {
        Commands::RenderUpdate {
            base,
            assignments,
            ignore,
        } => {
            let assignments = assignments
                .iter()
                .map(|a| {
                    let (column, value) = split_pair(a, '=')?;
                    Ok(ColumnAssignment::literal(column, parse_value(value)))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let ignore: IgnoreSet = ignore.into_iter().collect();
            let statement =
                builder.build_update(&base.query()?, &assignments, &ignore, &dialect)?;
            statement.into_parts()
        }
        Commands::RenderDelete { base } => {
            builder.build_delete(&base.query()?, &dialect)?.into_parts()
        }
        Commands::Rewrite { sql, tags } => {
            let routed = if tags.is_empty() {
                rewriter.intercept(&sql, &dialect)?
            } else {
                let tags = tags
                    .iter()
                    .map(|t| split_pair(t, ':').map(|(l, p)| ShardingTag::new(l, p)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                rewriter.rewrite(&sql, &rewriter.tags(tags)?, &dialect)
            };
            println!("{routed}");
            return Ok(());
        }
    };
    let sql = rewriter.intercept(&sql, &dialect)?;

    let mut output = json!({
        "dialect": dialect.name(),
        "sql": sql,
        "parameters": serde_json::to_value(&parameters)?,
    });

    if let Some(connection) = connection {
        let rows = connection
            .execute(&sql, &parameters)
            .await
            .context("statement failed")?;
        info!(rows, "statement executed");
        output["rows"] = json!(rows);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<TranspileConfig> {
    let Some(path) = path else {
        return Ok(TranspileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid config file {}", path.display()))
}

fn split_pair(text: &str, separator: char) -> anyhow::Result<(&str, &str)> {
    match text.split_once(separator) {
        Some((left, right)) if !left.trim().is_empty() => Ok((left.trim(), right)),
        _ => bail!("expected `name{separator}value`, got `{text}`"),
    }
}

/// Reads a command-line value: JSON scalars keep their type, anything else is
/// text.
fn parse_value(text: &str) -> SqlValue {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => SqlValue::Null,
        Ok(Value::Bool(b)) => SqlValue::Bool(b),
        Ok(Value::Number(n)) => n.as_i64().map_or_else(
            || n.as_f64().map_or_else(|| SqlValue::Text(n.to_string()), SqlValue::Float),
            SqlValue::Int,
        ),
        Ok(Value::String(s)) => SqlValue::Text(s),
        Ok(_) | Err(_) => SqlValue::Text(String::from(text)),
    }
}
