use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{debug, trace, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use orbit::backup::BackupManager;
use orbit::commands::{self, Console};
use orbit::notifications::{ConsoleNotifier, Notifier};
use orbit::{AdapterRegistry, OrbitConfig, OrbitManager, ProcessInvoker, SourceKind};

/// Manage applications across APT, DNF, Pacman, Flatpak, Snap and AppImage from one place.
#[derive(Parser)]
#[clap(author, version = clap::crate_version!(), max_term_width = 100, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Increase logging level (-v: info, -vv: debug, -vvv: trace)
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (defaults to ~/.config/orbit/config.toml)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists installed packages from every enabled source
    List {
        /// Only show packages from this source
        #[clap(short, long, value_parser = parse_source)]
        source: Option<SourceKind>,

        /// Only show applications installed from more than one source
        #[clap(long)]
        conflicts: bool,

        #[clap(long)]
        json: bool,
    },
    /// Searches the catalogs of the enabled sources
    Search {
        query: String,

        #[clap(short, long, value_parser = parse_source)]
        source: Option<SourceKind>,

        #[clap(long)]
        json: bool,
    },
    /// Installs a package from a source
    Install {
        id: String,

        /// Defaults to the configured preferred source
        #[clap(short, long, value_parser = parse_source)]
        source: Option<SourceKind>,
    },
    /// Updates a single package
    Update {
        id: String,

        #[clap(short, long, value_parser = parse_source)]
        source: SourceKind,
    },
    /// Updates every package with a pending update
    UpdateAll {
        /// Do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
    /// Removes one or more packages from a source
    Remove {
        #[clap(required = true)]
        ids: Vec<String>,

        #[clap(short, long, value_parser = parse_source)]
        source: SourceKind,

        /// Do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
    /// Shows details of an installed package
    Info {
        id: String,

        #[clap(short, long, value_parser = parse_source)]
        source: Option<SourceKind>,
    },
    /// Prints package counts per source
    Stats {
        #[clap(long)]
        json: bool,
    },
    /// Reports which sources are usable on this system
    Doctor,
    /// Manage package list backups
    #[clap(subcommand)]
    Backup(BackupCommands),
    /// Prints the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// Writes the installed package list to a backup file
    Export {
        /// File name inside the backup directory (no path separators)
        #[clap(long)]
        name: Option<String>,
    },
    /// Lists backups, newest first
    List,
    /// Shows the packages recorded in a backup
    Import { path: PathBuf },
    /// Deletes a backup file
    Delete {
        path: PathBuf,

        /// Do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

fn parse_source(value: &str) -> Result<SourceKind, String> {
    SourceKind::from_name(value).ok_or_else(|| {
        let known: Vec<String> = SourceKind::ALL.iter().map(|kind| kind.to_string()).collect();
        format!("unknown source '{value}' (expected one of: {})", known.join(", "))
    })
}

fn init_tracing(verbose: u8, configured: &str) -> Result<(), anyhow::Error> {
    let log_level = match verbose {
        0 => configured
            .parse::<Level>()
            .with_context(|| format!("Invalid log_level '{configured}'"))?,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn load_config(path: Option<&PathBuf>) -> Result<OrbitConfig, anyhow::Error> {
    match path {
        Some(path) => OrbitConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => OrbitConfig::load().context("Failed to load config"),
    }
}

fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "orbit", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    init_tracing(cli.verbose, &config.log_level)?;
    debug!("Argument parsing complete.");
    trace!("{:?}", config);

    let invoker = Arc::new(ProcessInvoker::new()?.with_timeout(config.command_timeout()));
    let registry = AdapterRegistry::with_defaults(&config, invoker);
    let mut manager = OrbitManager::new(registry);
    let backups = BackupManager::new(&config.backup_location);

    let console_notifier = ConsoleNotifier;
    let notifier: Option<&dyn Notifier> = config
        .show_notifications
        .then_some(&console_notifier as &dyn Notifier);
    let update_notifier = notifier.filter(|_| config.auto_update_check);

    let mut stdout = std::io::stdout().lock();
    let assume_yes = match &cli.command {
        Commands::UpdateAll { yes } | Commands::Remove { yes, .. } => *yes,
        Commands::Backup(BackupCommands::Delete { yes, .. }) => *yes,
        _ => false,
    };
    let mut console = Console::new(&mut stdout, assume_yes);

    let success = match &cli.command {
        Commands::List {
            source,
            conflicts,
            json,
        } => {
            debug!("orbit list");
            commands::list_command(
                &mut manager,
                &mut console,
                update_notifier,
                *source,
                *conflicts,
                *json,
            )?;
            true
        }
        Commands::Search {
            query,
            source,
            json,
        } => {
            commands::search_command(&manager, &mut console, query, *source, *json)?;
            true
        }
        Commands::Install { id, source } => {
            let source = source.unwrap_or(config.preferred_source);
            commands::install_command(&manager, &mut console, id, source)?
        }
        Commands::Update { id, source } => {
            commands::update_command(&manager, &mut console, id, *source)?
        }
        Commands::UpdateAll { .. } => {
            commands::update_all_command(&mut manager, &mut console, notifier)?
        }
        Commands::Remove { ids, source, .. } => {
            commands::remove_command(&manager, &mut console, ids, *source)?
        }
        Commands::Info { id, source } => {
            commands::info_command(&mut manager, &mut console, id, *source)?
        }
        Commands::Stats { json } => {
            commands::stats_command(&mut manager, &mut console, *json)?;
            true
        }
        Commands::Doctor => {
            commands::doctor_command(&manager, &mut console)?;
            true
        }
        Commands::Backup(BackupCommands::Export { name }) => {
            commands::backup_export_command(&mut manager, &backups, &mut console, name.as_deref())?;
            true
        }
        Commands::Backup(BackupCommands::List) => {
            commands::backup_list_command(&backups, &mut console)?;
            true
        }
        Commands::Backup(BackupCommands::Import { path }) => {
            commands::backup_import_command(&backups, &mut console, path)?;
            true
        }
        Commands::Backup(BackupCommands::Delete { path, .. }) => {
            commands::backup_delete_command(&backups, &mut console, path)?
        }
        Commands::Config => {
            commands::config_command(&config, &mut console)?;
            true
        }
        Commands::Completions { .. } => {
            unreachable!("Completions are handled before configuration is loaded")
        }
    };

    console.out.flush()?;
    if !success {
        bail!("operation did not complete");
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
