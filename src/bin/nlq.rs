//! Compile a natural-language question against a JSON schema document
//!
//! Run with: cargo run --bin nlq -- "average age of students" --schema schema.json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nlq_engine::schema::{SchemaCache, SchemaDocument, StaticIntrospector};
use nlq_engine::{Dialect, EngineConfig, QueryCompiler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputDialect {
    Sql,
    Document,
    Both,
}

#[derive(Parser)]
#[command(name = "nlq")]
#[command(about = "Translate natural-language questions into SQL and document queries")]
struct Args {
    /// The question in natural language
    question: String,

    /// JSON schema document; without it the built-in example schema is used
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Database to query (defaults to the configured default database)
    #[arg(short, long)]
    database: Option<String>,

    /// JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which query language to print
    #[arg(long, value_enum, default_value = "sql")]
    dialect: OutputDialect,

    /// Print the full compile result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .apply_env()?;

    let introspector = match &args.schema {
        Some(path) => StaticIntrospector::from_file(path)
            .with_context(|| format!("loading schema from {}", path.display()))?,
        None => StaticIntrospector::new(SchemaDocument::default()),
    };

    let cache = Arc::new(SchemaCache::new(Arc::new(introspector), &config));
    let compiler = QueryCompiler::new(&config, cache);

    info!("Question: {}", args.question);
    let result = compiler.compile(&args.question, args.database.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.is_success() {
        println!("{}", result.error_message.as_deref().unwrap_or("No query generated"));
        return Ok(());
    }

    // External generator output has no plan to re-render
    let Some(ast) = &result.ast else {
        if let Some(query) = &result.generated_query {
            println!("{}", query);
        }
        return Ok(());
    };

    let dialects: &[Dialect] = match args.dialect {
        OutputDialect::Sql => &[Dialect::Sql],
        OutputDialect::Document => &[Dialect::Document],
        OutputDialect::Both => &[Dialect::Sql, Dialect::Document],
    };
    for dialect in dialects {
        let query = compiler.generator().generate(ast, *dialect)?;
        if dialects.len() > 1 {
            println!("{}: {}", dialect, query);
        } else {
            println!("{}", query);
        }
    }

    Ok(())
}
