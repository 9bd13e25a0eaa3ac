//! `dlink` - compile pipeline jobs and browse connections from the terminal

mod logging;

#[cfg(test)]
mod cli_tests;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use dlink_connectors::ConnectorLoader;
use dlink_core::{LinkConfig, Parameter, TableConnector, linked_providers};
use dlink_pipeline::{Compiler, ConnectionCatalog, JobDescriptor, StaticCatalog};

#[derive(Debug, Parser)]
#[command(name = "dlink", version, about = "Connector runtime and pipeline compiler")]
struct Cli {
    /// Config file; defaults to <config dir>/dlink/config.toml when present
    #[arg(long, global = true, env = "DLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// A connection from a metadata catalog
#[derive(Debug, Args)]
struct ConnectionArgs {
    /// JSON catalog with connections, descriptors and virtual tables
    #[arg(long, env = "DLINK_CATALOG")]
    catalog: PathBuf,

    /// Connection id
    #[arg(long)]
    connection: i64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a job into a pipeline document and print it as JSON
    Compile {
        #[arg(long, env = "DLINK_CATALOG")]
        catalog: PathBuf,

        /// Job descriptor (JSON)
        #[arg(long)]
        job: PathBuf,

        #[arg(long)]
        pretty: bool,
    },
    /// Check that a connection can be opened
    TestConnection {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// List databases of a table connection
    Databases {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// List tables of a database
    Tables {
        #[command(flatten)]
        conn: ConnectionArgs,

        #[arg(long)]
        database: String,

        /// SQL LIKE pattern
        #[arg(long)]
        pattern: Option<String>,
    },
    /// List columns of a table
    Columns {
        #[command(flatten)]
        conn: ConnectionArgs,

        #[arg(long)]
        database: String,

        #[arg(long)]
        table: String,

        #[arg(long)]
        pattern: Option<String>,
    },
    /// List files of a file connection
    Files {
        #[command(flatten)]
        conn: ConnectionArgs,

        #[arg(long, default_value = ".")]
        dir: String,

        /// Glob matched against file names
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        recursive: bool,
    },
    /// Show linked connectors and installed connector directories
    Connectors,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = LinkConfig::load(cli.config.as_deref())?;
    let logging_config = if cli.verbose {
        logging::LoggingConfig::development()
    } else if config.logging.json {
        logging::LoggingConfig::production()
    } else {
        logging::LoggingConfig::default()
    };
    let _guard = logging::init(logging_config.with_settings(&config.logging))?;

    match cli.command {
        Command::Compile {
            catalog,
            job,
            pretty,
        } => compile(&config, &catalog, &job, pretty),
        Command::TestConnection { conn } => {
            let param = parameter(&conn)?;
            let loader = ConnectorLoader::from_config(&config);
            if loader.test_connectivity(&param) {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("failed");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Databases { conn } => {
            let mut connector = open_table(&config, &conn)?;
            let databases = connector.list_databases();
            close_table(&mut connector);
            print_names("Database", databases?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Tables {
            conn,
            database,
            pattern,
        } => {
            let mut connector = open_table(&config, &conn)?;
            let tables = connector.list_tables_matching(&database, pattern.as_deref());
            close_table(&mut connector);
            print_names("Table", tables?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Columns {
            conn,
            database,
            table,
            pattern,
        } => {
            let mut connector = open_table(&config, &conn)?;
            let columns = connector.list_columns_matching(&database, &table, pattern.as_deref());
            close_table(&mut connector);

            let mut out = Table::new();
            out.load_preset(UTF8_FULL)
                .set_header(vec!["Column", "Type", "Nullable", "Primary key"]);
            for column in columns? {
                out.add_row(vec![
                    column.name,
                    column.data_type,
                    yes_no(column.nullable).to_string(),
                    yes_no(column.primary_key).to_string(),
                ]);
            }
            println!("{out}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Files {
            conn,
            dir,
            pattern,
            recursive,
        } => {
            let param = parameter(&conn)?;
            let loader = ConnectorLoader::from_config(&config);
            let mut connector = loader
                .file_connector(&param)
                .with_context(|| format!("Failed to open connection {}", conn.connection))?;
            let files = connector.list_files_recursive(&dir, pattern.as_deref(), recursive);
            if let Err(e) = connector.close() {
                tracing::warn!(error = %e, "failed to close file connector");
            }
            print_names("File", files?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Connectors => {
            list_connectors(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn compile(config: &LinkConfig, catalog: &Path, job: &Path, pretty: bool) -> Result<ExitCode> {
    let catalog = Arc::new(
        StaticCatalog::load(catalog)
            .with_context(|| format!("Failed to load catalog: {:?}", catalog))?,
    );
    let contents = std::fs::read_to_string(job)
        .with_context(|| format!("Failed to read job file: {:?}", job))?;
    let job: JobDescriptor = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid job file: {:?}", job))?;

    let compiler = Compiler::new(config.compiler.clone()).with_virtual_tables(catalog.clone());
    let document = compiler
        .compile_job(&*catalog, &job)
        .with_context(|| format!("Failed to compile job {}", job.id))?;
    let rendered = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json()?
    };
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}

/// Build the connector parameter for a catalog connection
fn parameter(conn: &ConnectionArgs) -> Result<Parameter> {
    let catalog = StaticCatalog::load(&conn.catalog)
        .with_context(|| format!("Failed to load catalog: {:?}", conn.catalog))?;
    let connection = catalog.connection(conn.connection)?;
    let descriptor = catalog.descriptor(&connection.connector)?;
    Ok(connection.to_parameter(&descriptor))
}

fn open_table(config: &LinkConfig, conn: &ConnectionArgs) -> Result<impl TableConnector> {
    let param = parameter(conn)?;
    let loader = ConnectorLoader::from_config(config);
    loader
        .table_connector(&param)
        .with_context(|| format!("Failed to open connection {}", conn.connection))
}

fn close_table(connector: &mut impl TableConnector) {
    if let Err(e) = connector.close() {
        tracing::warn!(connector = %connector.name(), error = %e, "failed to close connector");
    }
}

fn list_connectors(config: &LinkConfig) -> Result<()> {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL)
        .set_header(vec!["Connector", "Kind", "Location"]);

    let mut linked = dlink_connectors::file::providers();
    for provider in linked_providers() {
        if !linked.iter().any(|p| p.matches(provider.name)) {
            linked.push(provider);
        }
    }
    for provider in linked {
        let kind = if provider.is_file() { "file" } else { "table" };
        out.add_row(vec![provider.name, kind, "linked"]);
    }

    let root = config.connector_root();
    if root.is_dir() {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&root)
            .with_context(|| format!("Failed to read connector directory: {:?}", root))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        for dir in dirs {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.add_row(vec![name, "table".to_string(), dir.display().to_string()]);
        }
    } else {
        tracing::warn!(dir = %root.display(), "connector directory does not exist");
    }

    println!("{out}");
    Ok(())
}

fn print_names(header: &str, names: Vec<String>) {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL).set_header(vec![header]);
    for name in names {
        out.add_row(vec![name]);
    }
    println!("{out}");
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
