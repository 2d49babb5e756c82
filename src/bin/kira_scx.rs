use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_sc_expression::app::{App, ImportOptions, ImportResult};
use kira_sc_expression::config::{ConfigLoader, ResolvedConfig};
use kira_sc_expression::domain::{GeneticProfileId, ImportSpecifier};
use kira_sc_expression::error::KiraError;
use kira_sc_expression::output::{ConsoleProgress, JsonOutput, OutputMode};
use kira_sc_expression::store::Store;

#[derive(Parser)]
#[command(name = "kira-scx")]
#[command(about = "Import single-cell gene expression files into a cBioPortal-style database")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true, help = "SQLite database path")]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create the store tables if they do not exist")]
    Init(InitArgs),
    #[command(about = "Import a single-cell expression file (or every import in the config)")]
    Import(ImportArgs),
}

#[derive(Args)]
struct InitArgs {
    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct ImportArgs {
    file: Option<String>,

    #[arg(long, help = "Genetic profile id the rows belong to")]
    profile: Option<String>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Resolve every row but write nothing")]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::MissingConfig
        | KiraError::ConfigRead(_)
        | KiraError::ConfigParse(_)
        | KiraError::NothingToImport
        | KiraError::InvalidImportSpecifier(_)
        | KiraError::InvalidProfileId(_)
        | KiraError::MissingHeader(_)
        | KiraError::MissingColumns(_)
        | KiraError::ProfileNotFound(_) => 2,
        KiraError::Database(_) => 3,
        KiraError::NothingImported { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Init(args) => {
            let config = load_optional_config(args.config.as_deref())?;
            let store = open_store(cli.db.as_deref(), config.as_ref())?;
            run_init(App::new(store), output_mode)
        }
        Commands::Import(args) => {
            let specifier = build_specifier(args.file.as_deref(), args.profile.as_deref())?;
            let config = if specifier.is_none() {
                Some(ConfigLoader::resolve(args.config.as_deref())?)
            } else {
                load_optional_config(args.config.as_deref())?
            };
            let store = open_store(cli.db.as_deref(), config.as_ref())?;
            let options = ImportOptions {
                dry_run: args.dry_run,
            };
            run_import(App::new(store), specifier, config, options, output_mode)
        }
    }
}

fn load_optional_config(path: Option<&str>) -> miette::Result<Option<ResolvedConfig>> {
    match ConfigLoader::resolve(path) {
        Ok(config) => Ok(Some(config)),
        Err(KiraError::MissingConfig) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn open_store(db: Option<&str>, config: Option<&ResolvedConfig>) -> miette::Result<Store> {
    let path = match (db, config.and_then(|config| config.database.clone())) {
        (Some(db), _) => Utf8PathBuf::from(db),
        (None, Some(path)) => path,
        (None, None) => Store::default_path()?,
    };
    Ok(Store::open(&path)?)
}

fn build_specifier(
    file: Option<&str>,
    profile: Option<&str>,
) -> miette::Result<Option<ImportSpecifier>> {
    match (file, profile) {
        (Some(file), Some(profile)) => Ok(Some(ImportSpecifier {
            profile_id: profile.parse::<GeneticProfileId>()?,
            file: Utf8PathBuf::from(file),
        })),
        (Some(_), None) => Err(miette::Report::msg(
            "--profile is required when a file is given",
        )),
        (None, Some(_)) => Err(miette::Report::msg(
            "--profile needs a file (imports from the config carry their own profile)",
        )),
        (None, None) => Ok(None),
    }
}

fn run_init(app: App, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.init(&JsonOutput)?;
            JsonOutput::print_init(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let progress = ConsoleProgress;
            let result = app.init(&progress)?;
            progress.finish();
            let location = result.database.as_deref().unwrap_or("in-memory database");
            println!("\x1b[32mInitialized tables in {location}\x1b[0m");
        }
    }
    Ok(())
}

fn run_import(
    mut app: App,
    specifier: Option<ImportSpecifier>,
    config: Option<ResolvedConfig>,
    options: ImportOptions,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.import(specifier, config.as_ref(), options, &JsonOutput)?;
            JsonOutput::print_import(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let progress = ConsoleProgress;
            let result = app.import(specifier, config.as_ref(), options, &progress);
            progress.finish();
            print_import_summary(&result?);
        }
    }
    Ok(())
}

fn print_import_summary(result: &ImportResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-SCX summary{reset}");
    for item in &result.items {
        let mode = if item.dry_run { " (dry run)" } else { "" };
        println!(
            "{green}{} -> profile {}{mode}: {} imported, profile now holds {}{reset}",
            item.file, item.profile_id, item.accepted, item.profile_total
        );
        if item.skipped > 0 {
            println!(
                "{yellow}   {} of {} data lines skipped{reset}",
                item.skipped, item.data_lines
            );
            for row in &item.skipped_rows {
                println!("{yellow}   line {:>6}: {}{reset}", row.line, row.reason);
            }
        }
    }
}
