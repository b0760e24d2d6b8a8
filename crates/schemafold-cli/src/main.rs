use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemafold_convert::{LogicalSchema, SchemaConverter};
use schemafold_core::{Config, OperationalMigration, SchemaState};
use schemafold_engine::{load_migrations, write_migration, SchemaProcessor, SqlGenerator};

const DEFAULT_CONFIG_FILE: &str = "schemafold.toml";

/// SchemaFold - logical schemas to SQLite DDL through migrations
#[derive(Parser)]
#[command(name = "schemafold")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemafold.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a logical schema JSON file into the initial migration
    Convert {
        /// Logical schema JSON file
        schema: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,

        /// Directory to write the migration into (default: paths.migrations_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Fold a migration directory and write the SQLite DDL
    Generate {
        /// Migration directory (default: paths.migrations_dir)
        #[arg(short, long)]
        migrations: Option<PathBuf>,

        /// DDL output file (default: paths.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert, fold and generate in one step
    Build {
        /// Logical schema JSON file
        schema: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,

        /// DDL output file (default: paths.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the folded schema state as JSON
    State {
        /// Migration directory (default: paths.migrations_dir)
        #[arg(short, long)]
        migrations: Option<PathBuf>,
    },
}

/// Table naming flags; either one overrides `use_plural` from the config
#[derive(Args, Debug, Clone, Copy, Default)]
struct NamingArgs {
    /// Pluralize table names
    #[arg(long, overrides_with = "no_plural")]
    plural: bool,

    /// Keep table names singular
    #[arg(long, overrides_with = "plural")]
    no_plural: bool,
}

impl NamingArgs {
    fn use_plural(&self, config: &Config) -> bool {
        match (self.plural, self.no_plural) {
            (true, _) => true,
            (_, true) => false,
            _ => config.use_plural,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Convert {
            schema,
            naming,
            out_dir,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| config.migrations_dir());
            convert_command(&schema, naming.use_plural(&config), &out_dir, cli.verbose)
        }
        Commands::Generate { migrations, output } => {
            let migrations = migrations.unwrap_or_else(|| config.migrations_dir());
            let output = output.unwrap_or_else(|| config.output_path());
            generate_command(&config, &migrations, &output, cli.verbose)
        }
        Commands::Build {
            schema,
            naming,
            output,
        } => {
            let output = output.unwrap_or_else(|| config.output_path());
            build_command(&config, &schema, naming.use_plural(&config), &output, cli.verbose)
        }
        Commands::State { migrations } => {
            let migrations = migrations.unwrap_or_else(|| config.migrations_dir());
            state_command(&config, &migrations)
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(explicit: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = explicit {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    Ok(config)
}

fn read_logical_schema(path: &Path) -> Result<LogicalSchema> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read logical schema {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid logical schema {}", path.display()))
}

fn convert_schema(schema_path: &Path, use_plural: bool) -> Result<OperationalMigration> {
    let tables = read_logical_schema(schema_path)?;
    let converter = SchemaConverter::new(use_plural);
    Ok(converter.convert(&tables))
}

fn fold(config: &Config, migrations: &[OperationalMigration]) -> Result<SchemaState> {
    let mut processor = SchemaProcessor::new().atomic(config.processor.atomic);
    processor.apply_migrations(migrations)?;
    Ok(processor.into_state())
}

fn write_ddl(config: &Config, state: &SchemaState, output: &Path) -> Result<()> {
    let sql = SqlGenerator::with_title(config.generator.title.as_str()).generate_schema(state);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, sql + "\n")
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(())
}

/// Convert command - logical schema to initial migration file
fn convert_command(
    schema_path: &Path,
    use_plural: bool,
    out_dir: &Path,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Converting".cyan(), schema_path.display());
    }

    let migration = convert_schema(schema_path, use_plural)?;
    let path = write_migration(out_dir, &migration)?;

    eprintln!(
        "{} {} ({} operations)",
        "Wrote migration:".green(),
        path.display(),
        migration.operations.len()
    );
    Ok(())
}

/// Generate command - fold migration history into DDL
fn generate_command(config: &Config, migrations_dir: &Path, output: &Path, verbose: bool) -> Result<()> {
    let migrations = load_migrations(migrations_dir)?;

    if verbose {
        eprintln!(
            "{} {} migrations from {}",
            "Loaded".cyan(),
            migrations.len(),
            migrations_dir.display()
        );
    }
    if migrations.is_empty() {
        eprintln!(
            "{} {}",
            "No migrations found in".yellow(),
            migrations_dir.display()
        );
    }

    let state = fold(config, &migrations)?;
    write_ddl(config, &state, output)?;

    eprintln!(
        "{} {} ({} tables)",
        "Schema written to:".green(),
        output.display(),
        state.tables.len()
    );
    Ok(())
}

/// Build command - convert, fold and generate without touching the migration directory
fn build_command(
    config: &Config,
    schema_path: &Path,
    use_plural: bool,
    output: &Path,
    verbose: bool,
) -> Result<()> {
    let migration = convert_schema(schema_path, use_plural)?;

    if verbose {
        eprintln!(
            "{} {} ({} operations)",
            "Converted".cyan(),
            migration.name,
            migration.operations.len()
        );
    }

    let state = fold(config, std::slice::from_ref(&migration))?;
    write_ddl(config, &state, output)?;

    eprintln!(
        "{} {} ({} tables)",
        "Schema written to:".green(),
        output.display(),
        state.tables.len()
    );
    Ok(())
}

/// State command - print the folded schema state
fn state_command(config: &Config, migrations_dir: &Path) -> Result<()> {
    let migrations = load_migrations(migrations_dir)?;
    let state = fold(config, &migrations)?;

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
