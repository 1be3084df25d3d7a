//! `tessera`: load a model registry from JSON and work with it.
//!
//! Usage:
//!   tessera check models.json
//!   tessera codegen models.json --target loopback --out generated
//!   tessera sample models.json org.acme.Vehicle --id V-1

use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tessera::{
    Error, ErrorKind, load_models,
    build::writer::FsFileWriter,
    config::{DEFAULT_CONFIG_FILE, TesseraConfig},
    core::serialize::{JsonSerializer, Serializer},
    prelude::*,
    schema::node::split_fully_qualified_name,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tessera", version = tessera::VERSION)]
#[command(about = "Domain model registry, sample data and code generation")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate a model registry
    Check {
        /// JSON array of model file definitions
        models: PathBuf,
    },

    /// Generate artifacts for one or more targets
    Codegen {
        models: PathBuf,

        /// Target name; repeat for several (defaults to `codegen.targets`)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Output directory (defaults to `codegen.out_dir`)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Report artifact names without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a generated sample instance as JSON
    Sample {
        models: PathBuf,

        /// Fully qualified type name, e.g. `org.acme.Vehicle`
        type_name: String,

        /// Identifier; transactions get a ULID when omitted
        #[arg(long)]
        id: Option<String>,

        /// Seed for reproducible output (overrides `generator.seed`)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TesseraConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = %e.kind, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

// RUST_LOG wins over the configured filter
fn init_tracing(config: &TesseraConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: &TesseraConfig) -> Result<(), Error> {
    match command {
        Command::Check { models } => check(&models),
        Command::Codegen {
            models,
            targets,
            out,
            dry_run,
        } => codegen(config, &models, &targets, out, dry_run),
        Command::Sample {
            models,
            type_name,
            id,
            seed,
        } => sample(config, &models, &type_name, id.as_deref(), seed),
    }
}

fn read_models(path: &Path) -> Result<ModelManager, Error> {
    let json = fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorKind::Io,
            format!("failed to read '{}': {e}", path.display()),
        )
    })?;

    let manager = load_models(&json)?;
    tracing::info!(path = %path.display(), "model registry loaded");

    Ok(manager)
}

fn check(models: &Path) -> Result<(), Error> {
    let manager = read_models(models)?;

    for file in manager.model_files() {
        println!("{} ({} declarations)", file.namespace(), file.declarations().count());
    }

    Ok(())
}

fn codegen(
    config: &TesseraConfig,
    models: &Path,
    targets: &[String],
    out: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Error> {
    let manager = read_models(models)?;

    let names = if targets.is_empty() {
        config.codegen.targets.as_slice()
    } else {
        targets
    };
    let targets = names
        .iter()
        .map(|name| name.parse::<Target>())
        .collect::<Result<Vec<_>, _>>()?;

    let out_dir = out.unwrap_or_else(|| config.codegen.out_dir.clone());
    let mut writer = FsFileWriter::new(out_dir);

    for target in targets {
        let sink: Option<&mut dyn FileWriter> = if dry_run { None } else { Some(&mut writer) };
        for artifact in generate(&manager, target, sink)? {
            println!("{target}: {artifact}");
        }
    }

    Ok(())
}

fn sample(
    config: &TesseraConfig,
    models: &Path,
    fqn: &str,
    id: Option<&str>,
    seed: Option<u64>,
) -> Result<(), Error> {
    let manager = read_models(models)?;

    let (namespace, type_name) = split_fully_qualified_name(fqn).ok_or_else(|| {
        Error::new(
            ErrorKind::MalformedInput,
            format!("'{fqn}' is not a fully qualified type name"),
        )
    })?;

    let mut generator = config.generator;
    if seed.is_some() {
        generator.seed = seed;
    }
    let factory = Factory::new(&manager).with_generator_config(generator);
    let options = InstanceOptions::generated();

    let decl = manager.resolve(namespace, type_name)?;
    let resource = match decl.kind {
        DeclarationKind::Transaction => factory.new_transaction(namespace, type_name, id, options)?,
        DeclarationKind::Concept => factory.new_concept(namespace, type_name, options)?,
        _ => {
            let id = id.ok_or_else(|| Error::new(ErrorKind::MalformedInput, "--id not specified"))?;
            factory.new_instance(namespace, type_name, id, options)?
        }
    };

    let json = JsonSerializer::new(&manager).to_json(&resource)?;
    println!("{}", serde_json::to_string_pretty(&json)?);

    Ok(())
}

///
/// TESTS
///
