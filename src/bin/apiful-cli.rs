use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use apiful::{
    ApifulConfig, ClientOptions, DEFAULT_CONFIG_FILE, RequestOptions, Schema, TypeScriptCompiler,
    Untyped, create_client, generate_type_from_schema, infer_schema, merge_schemas, openapi,
};
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "apiful-cli",
    version,
    about = "Call OpenAPI services and generate types from JSON samples"
)]
struct Cli {
    /// Base URL for requests. Overrides the service's configured URL.
    #[arg(long, env = "APIFUL_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Raw access token sent as a bearer Authorization header.
    #[arg(long, env = "APIFUL_ACCESS_TOKEN", global = true)]
    access_token: Option<String>,

    /// Configuration file listing services.
    #[arg(long, env = "APIFUL_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long, global = true)]
    compact: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Infer a schema from JSON sample files and print TypeScript types.
    Infer(InferArgs),
    /// Compile a JSON Schema file to TypeScript types.
    Types(TypesArgs),
    /// List services from the configuration file.
    Services,
    /// Send a request through an OpenAPI-extended client.
    Request(RequestArgs),
}

#[derive(Debug, Args)]
struct InferArgs {
    /// JSON sample files; their schemas are merged into one.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Name of the generated type.
    #[arg(long, default_value = "Root")]
    name: String,

    /// Print the merged JSON Schema instead of TypeScript.
    #[arg(long)]
    json_schema: bool,
}

#[derive(Debug, Args)]
struct TypesArgs {
    /// JSON Schema document.
    schema: PathBuf,

    /// Name of the generated type.
    #[arg(long, default_value = "Root")]
    name: String,
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...).
    method: String,

    /// Path template (for example: /pets/{id}).
    path: String,

    /// Service from the configuration file whose base URL is used.
    #[arg(long)]
    service: Option<String>,

    /// Path parameter in form key=value. Repeat as needed.
    #[arg(long = "path-param", value_name = "KEY=VALUE")]
    path_param: Vec<String>,

    /// Query parameter in form key=value. Repeat as needed.
    #[arg(long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    /// Header in form key=value. Repeat as needed.
    #[arg(long = "header", value_name = "KEY=VALUE")]
    header: Vec<String>,

    #[command(flatten)]
    body: BodyInput,
}

#[derive(Debug, Args)]
struct BodyInput {
    /// JSON request body literal.
    #[arg(long, conflicts_with = "body_file")]
    body_json: Option<String>,

    /// Path to a file containing a JSON request body.
    #[arg(long, value_name = "PATH", conflicts_with = "body_json")]
    body_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Infer(args) => {
            let output = infer_types(args)?;
            print!("{output}");
        }
        Command::Types(args) => {
            let output = compile_schema_file(&args.schema, &args.name)?;
            print!("{output}");
        }
        Command::Services => print_services(&cli.config)?,
        Command::Request(args) => {
            let output = send_request(&cli, args)
                .await
                .with_context(|| format!("request failed: {} {}", args.method, args.path))?;
            print_json(&output, cli.compact)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Infers and merges the schemas of every sample file.
fn infer_types(args: &InferArgs) -> Result<String> {
    let schemas = args
        .files
        .iter()
        .map(|path| read_json(path).map(|value| infer_schema(&value)))
        .collect::<Result<Vec<_>>>()?;
    info!(samples = schemas.len(), "inferred sample schemas");
    let schema = merge_schemas(schemas);

    if args.json_schema {
        let rendered = serde_json::to_string_pretty(&schema).context("Failed to render JSON")?;
        return Ok(format!("{rendered}\n"));
    }

    generate_type_from_schema(&TypeScriptCompiler, &schema, &args.name)
        .with_context(|| format!("failed to generate type '{}'", args.name))
}

fn compile_schema_file(path: &Path, name: &str) -> Result<String> {
    let document = read_json(path)?;
    let schema = Schema::from_value(&document)
        .with_context(|| format!("unsupported schema in '{}'", path.display()))?;
    generate_type_from_schema(&TypeScriptCompiler, &schema, name)
        .with_context(|| format!("failed to generate type '{name}'"))
}

fn print_services(config_path: &Path) -> Result<()> {
    let config = ApifulConfig::load(config_path)
        .with_context(|| format!("failed to load config '{}'", config_path.display()))?;

    let name_width = config.services.keys().map(String::len).max().unwrap_or(0);
    for (name, service) in &config.services {
        println!(
            "{name:<name_width$}  {}  {}",
            service.schema.display(),
            service.base_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Builds a client from flags and configuration, extends it with the
/// `OpenAPI` handler and invokes it once.
async fn send_request(cli: &Cli, args: &RequestArgs) -> Result<Value> {
    // Validate method eagerly so CLI errors are explicit before any network call.
    let method = Method::from_str(&args.method)
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;

    let mut options = match &args.service {
        Some(service) => {
            let config = ApifulConfig::load(&cli.config)
                .with_context(|| format!("failed to load config '{}'", cli.config.display()))?;
            config
                .service(service)
                .with_context(|| format!("unknown service '{service}'"))?
                .client_options()
        }
        None => ClientOptions::new(),
    };
    if let Some(url) = &cli.base_url {
        options.base_url = Some(url.clone());
    }
    if let Some(token) = &cli.access_token {
        options = options.with_authorization_token(token.clone());
    }

    let mut request = RequestOptions::new().method(method);
    for (key, value) in parse_pairs(&args.path_param, "--path-param")? {
        request = request.path_param(key, value);
    }
    for (key, value) in parse_pairs(&args.query, "--query")? {
        request = request.query(key, value);
    }
    for (key, value) in parse_pairs(&args.header, "--header")? {
        request = request.header(key, value);
    }
    if let Some(body) = parse_body(&args.body).context("failed to parse request body input")? {
        request = request.json(body);
    }

    let client = create_client(options)
        .try_with(openapi::<Untyped>())
        .context("failed to configure OpenAPI handler")?;
    Ok(client.invoke(args.path.clone(), request).await?)
}

/// Parses repeated `key=value` arguments into owned key/value pairs.
///
/// Returns an error when a value does not include `=` or has an empty key.
fn parse_pairs(values: &[String], flag_name: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(values.len());
    for item in values {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid {flag_name} value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid {flag_name} value '{item}': empty key");
        }
        pairs.push((key.to_owned(), value.to_owned()));
    }
    Ok(pairs)
}

/// Parses an optional JSON body from inline text or a file path.
fn parse_body(body: &BodyInput) -> Result<Option<Value>> {
    match (&body.body_json, &body.body_file) {
        (Some(raw), None) => serde_json::from_str(raw)
            .context("failed to parse JSON from --body-json")
            .map(Some),
        (None, Some(path)) => read_json(path).map(Some),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => bail!("use only one of --body-json or --body-file"),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse JSON in '{}'", path.display()))
}

/// Prints a JSON value either compact or pretty-formatted.
fn print_json(value: &Value, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
