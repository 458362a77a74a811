//! Variant Schema CLI
//!
//! Command-line interface for generating, inspecting, validating and linting
//! entity variants.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use variant_schema::{
    build_variant, emit_artifacts, generate, lint, load_entities_auto, validate, ArtifactSink,
    DirSink, EntitySchema, Emitter, FileStatus, GenerateOptions, JsonEmitter, KotlinEmitter,
    TypeResolver, ValidateError, VariantKind, WriterSink,
};

const DEFAULT_LOG_FILTER: &str = "variant_schema=warn";

#[derive(Parser)]
#[command(name = "variant-schema")]
#[command(about = "Generate Partial/Create/Update/Dto variants from entity definitions")]
#[command(version)]
struct Cli {
    /// Log generation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Kotlin,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every requested variant of every entity
    Generate {
        /// Entity definition sources: file paths or URLs (http:// or https://)
        #[arg(required = true)]
        sources: Vec<String>,

        /// Output directory (stdout if not specified)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "kotlin")]
        format: Format,

        /// Strict mode: override type names must resolve to a known type
        #[arg(long)]
        strict: bool,

        /// Fully qualified type reachable at emission time besides the generated ones (repeatable)
        #[arg(long = "known-type", value_name = "NAME")]
        known_types: Vec<String>,

        /// Extra type mapping applied during resolution, FROM=TO (repeatable)
        #[arg(long = "map-type", value_name = "FROM=TO", value_parser = parse_mapping)]
        map_types: Vec<(String, String)>,
    },

    /// Print one resolved variant as JSON
    Resolve {
        /// Entity definition source: file path or URL
        source: String,

        /// Entity to resolve
        #[arg(long)]
        entity: String,

        /// Variant kind (e.g., Create, Update, Dto, Partial)
        #[arg(long, short)]
        kind: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a JSON payload against a variant
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Entity definition source: file path or URL
        #[arg(long)]
        entities: String,

        /// Entity the payload belongs to
        #[arg(long)]
        entity: String,

        /// Variant kind the payload should match
        #[arg(long, short)]
        kind: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Strict mode: reject fields outside the variant (default: false)
        #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
        strict: bool,
    },

    /// Lint entity definition files for errors
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            sources,
            out,
            format,
            strict,
            known_types,
            map_types,
        } => run_generate(GenerateArgs {
            sources,
            out,
            format,
            strict,
            known_types,
            map_types,
        }),

        Commands::Resolve {
            source,
            entity,
            kind,
            pretty,
        } => run_resolve(&source, &entity, &kind, pretty),

        Commands::Validate {
            payload,
            entities,
            entity,
            kind,
            json,
            strict,
        } => run_validate(&payload, &entities, &entity, &kind, json, strict),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("variant_schema=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => Err(format!("expected FROM=TO, got \"{}\"", s)),
    }
}

struct GenerateArgs {
    sources: Vec<String>,
    out: Option<PathBuf>,
    format: Format,
    strict: bool,
    known_types: Vec<String>,
    map_types: Vec<(String, String)>,
}

fn run_generate(args: GenerateArgs) -> Result<(), u8> {
    let mut entities = Vec::new();
    for source in &args.sources {
        let loaded = load_entities_auto(source).map_err(|e| {
            eprintln!("Error: {}: {}", source, e);
            e.exit_code() as u8
        })?;
        entities.extend(loaded);
    }

    let resolver = args
        .map_types
        .into_iter()
        .fold(TypeResolver::default(), |r, (from, to)| r.with_mapping(from, to));
    let options = args
        .known_types
        .into_iter()
        .fold(GenerateOptions::new().strict(args.strict), |o, name| {
            o.known_type(name)
        })
        .type_resolver(resolver);

    let report = generate(&entities, &options);
    for failure in &report.failures {
        eprintln!("Error: {}", failure.error);
    }

    let emitter: &dyn Emitter = match args.format {
        Format::Kotlin => &KotlinEmitter,
        Format::Json => &JsonEmitter,
    };
    let mut dir_sink;
    let mut stdout_sink;
    let sink: &mut dyn ArtifactSink = match &args.out {
        Some(dir) => {
            dir_sink = DirSink::new(dir);
            &mut dir_sink
        }
        None => {
            stdout_sink = WriterSink::new(std::io::stdout());
            &mut stdout_sink
        }
    };

    emit_artifacts(&report.artifacts, emitter, sink).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if report.is_ok() {
        Ok(())
    } else {
        Err(2)
    }
}

fn find_entity(source: &str, name: &str) -> Result<EntitySchema, String> {
    let entities = load_entities_auto(source).map_err(|e| e.to_string())?;
    entities
        .into_iter()
        .find(|e| e.name == name)
        .ok_or_else(|| format!("entity \"{}\" not found in {}", name, source))
}

fn resolve_variant(
    source: &str,
    entity_name: &str,
    kind: &str,
) -> Result<variant_schema::VariantSchema, String> {
    let entity = find_entity(source, entity_name)?;
    let kind = VariantKind::parse(kind);
    let include_to_partial = kind != VariantKind::Partial && entity.requests(&VariantKind::Partial);
    build_variant(&entity, &kind, include_to_partial, &TypeResolver::default())
        .map_err(|e| e.to_string())
}

fn run_resolve(source: &str, entity: &str, kind: &str, pretty: bool) -> Result<(), u8> {
    let variant = resolve_variant(source, entity, kind).map_err(|msg| {
        eprintln!("Error: {}", msg);
        2u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&variant)
    } else {
        serde_json::to_string(&variant)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", json_output);
    Ok(())
}

fn run_validate(
    payload_path: &Path,
    entities: &str,
    entity: &str,
    kind: &str,
    json_output: bool,
    strict: bool,
) -> Result<(), u8> {
    let payload = read_payload(payload_path).map_err(|(code, msg)| {
        report_error(json_output, &msg);
        code
    })?;

    let variant = resolve_variant(entities, entity, kind).map_err(|msg| {
        report_error(json_output, &msg);
        2u8
    })?;

    match validate(&payload, &variant, strict) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn read_payload(path: &Path) -> Result<serde_json::Value, (u8, String)> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| (3, format!("loading payload {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| (2, format!("loading payload {}: {}", path.display(), e)))
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    use variant_schema::Severity;

    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
