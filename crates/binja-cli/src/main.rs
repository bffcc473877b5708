//! binja - Render text templates from binary and JSON sources
//!
//! Each transform subcommand reads one source file, renders one template
//! against it and writes the result as UTF-8 text.

use anyhow::{Context, Result};
use binja_core::template::{object_context, read_json};
use binja_core::{
    decode, ByteBuffer, JsonPathQuery, LookupService, Operation, TemplateConfig, TemplateRunner,
};
use clap::{Args, Parser, Subcommand};
use minijinja::context;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Render text templates from binary and JSON sources
#[derive(Parser, Debug)]
#[command(name = "binja")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Render undefined template variables as empty text instead of failing
    #[arg(long, global = true)]
    lenient: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode fields of a binary file with readInt, readString, ... functions
    Binary(Paths),

    /// Expose the keys of a JSON object as template variables
    Json(Paths),

    /// Bind a JSON document to `data` and add lookup, convert and format
    Functions {
        #[command(flatten)]
        paths: Paths,

        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Query a JSON document with the jsonPath function
    Jsonpath(Paths),

    /// Evaluate a single decode operation and print the value
    Decode {
        /// Binary file to read
        source: PathBuf,

        /// Operation name, e.g. readInt or readString
        operation: String,

        /// Operation arguments (offset, length, encoding, bit position)
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct Paths {
    /// Template file
    template: PathBuf,

    /// Source file
    source: PathBuf,

    /// Destination file
    target: PathBuf,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// JSON object mapping lookup keys to values
    #[arg(long, env = "BINJA_LOOKUP_TABLE")]
    lookup_table: Option<PathBuf>,

    /// Value returned for keys missing from the lookup table
    #[arg(long, env = "BINJA_LOOKUP_FALLBACK", default_value = "Unknown Device")]
    lookup_fallback: String,

    /// Maximum number of cached lookup results
    #[arg(long, env = "BINJA_LOOKUP_CAPACITY", default_value = "100")]
    lookup_capacity: u64,

    /// Seconds before a cached lookup result expires
    #[arg(long, env = "BINJA_LOOKUP_TTL_SECS", default_value = "600")]
    lookup_ttl_secs: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = TemplateConfig::new().strict_undefined(!cli.lenient);

    match &cli.command {
        Command::Binary(paths) => transform_binary(paths, config),
        Command::Json(paths) => transform_json(paths, config),
        Command::Functions { paths, lookup } => transform_functions(paths, lookup, config),
        Command::Jsonpath(paths) => transform_jsonpath(paths, config),
        Command::Decode {
            source,
            operation,
            args,
        } => decode_one(source, operation, args),
    }
}

/// Render a template over the decode catalogue of a binary file
fn transform_binary(paths: &Paths, config: TemplateConfig) -> Result<()> {
    let buffer = ByteBuffer::from_file(&paths.source)
        .with_context(|| format!("Failed to read binary source: {}", paths.source.display()))?;
    debug!("Read {} bytes from {}", buffer.len(), paths.source.display());

    let output = open_template(&paths.template, config)?
        .with_decoders(&buffer)
        .render(context! {})
        .with_context(|| format!("Failed to render template: {}", paths.template.display()))?;

    write_output(paths, &output)
}

/// Render a template with the top-level keys of a JSON object as variables
fn transform_json(paths: &Paths, config: TemplateConfig) -> Result<()> {
    let document = load_json(&paths.source)?;
    let context = object_context(&document)
        .with_context(|| format!("Unusable JSON source: {}", paths.source.display()))?;

    let output = open_template(&paths.template, config)?
        .render(context)
        .with_context(|| format!("Failed to render template: {}", paths.template.display()))?;

    write_output(paths, &output)
}

/// Render a template with the JSON document as `data` plus helper functions
fn transform_functions(paths: &Paths, args: &LookupArgs, config: TemplateConfig) -> Result<()> {
    let document = load_json(&paths.source)?;
    let data = object_context(&document)
        .with_context(|| format!("Unusable JSON source: {}", paths.source.display()))?;

    let config = config
        .lookup_capacity(args.lookup_capacity)
        .lookup_ttl(Duration::from_secs(args.lookup_ttl_secs))
        .lookup_fallback(args.lookup_fallback.clone());

    let lookup = match &args.lookup_table {
        Some(table) => LookupService::from_json_file(table, &config)
            .with_context(|| format!("Failed to load lookup table: {}", table.display()))?,
        None => LookupService::new(HashMap::new(), &config),
    };

    let output = open_template(&paths.template, config)?
        .with_helpers(lookup)
        .render(context! { data })
        .with_context(|| format!("Failed to render template: {}", paths.template.display()))?;

    write_output(paths, &output)
}

/// Render a template with a jsonPath function over the JSON source
fn transform_jsonpath(paths: &Paths, config: TemplateConfig) -> Result<()> {
    let document = load_json(&paths.source)?;

    let output = open_template(&paths.template, config)?
        .with_json_path(JsonPathQuery::new(document))
        .render(context! {})
        .with_context(|| format!("Failed to render template: {}", paths.template.display()))?;

    write_output(paths, &output)
}

/// Decode one field and print it
fn decode_one(source: &Path, operation: &str, args: &[String]) -> Result<()> {
    let operation: Operation = operation.parse()?;
    let buffer = ByteBuffer::from_file(source)
        .with_context(|| format!("Failed to read binary source: {}", source.display()))?;

    let value = decode(&buffer, operation, args)
        .with_context(|| format!("{} failed on {}", operation, source.display()))?;
    println!("{}", value);

    Ok(())
}

fn open_template(path: &Path, config: TemplateConfig) -> Result<TemplateRunner> {
    TemplateRunner::open(path, config)
        .with_context(|| format!("Failed to load template: {}", path.display()))
}

fn load_json(path: &Path) -> Result<serde_json::Value> {
    read_json(path).with_context(|| format!("Failed to read JSON source: {}", path.display()))
}

/// Write the rendered text, creating parent directories as needed
fn write_output(paths: &Paths, output: &str) -> Result<()> {
    if let Some(parent) = paths.target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(&paths.target, output.as_bytes())
        .with_context(|| format!("Failed to write file: {}", paths.target.display()))?;

    info!("Wrote {} bytes to {}", output.len(), paths.target.display());
    println!(
        "Transformed {} -> {}",
        paths.source.display(),
        paths.target.display()
    );

    Ok(())
}
