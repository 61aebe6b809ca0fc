//! Point d'entrée CLI pour communes-zones

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage (ZONAGE_DATA_DIR, RUST_LOG)
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Affecter les communes françaises aux zones d'intervention
#[derive(Parser)]
#[command(name = "communes-zones")]
#[command(author, version)]
#[command(about = "Affecter les communes aux zones d'intervention 1, 2 et 3")]
#[command(long_about = "Classe chaque commune dans la zone la plus prioritaire qui la contient (Zone 1 > Zone 2 > Zone 3), sinon 'Hors zone'.\n\nLes chemins relatifs de la configuration sont résolus depuis --data-dir ou ZONAGE_DATA_DIR.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Classify {
            input,
            output,
            output_delimiter,
            classified_only,
            report,
        } => {
            info!(config = %input.config, output = %output.display(), "Classification");
            cli::cmd_classify(
                &input,
                &output,
                output_delimiter,
                classified_only,
                report.as_deref(),
            )?;
        }
        Commands::Zones { input, output } => {
            info!(config = %input.config, output = %output.display(), "Export des zones");
            cli::cmd_zones(&input, &output)?;
        }
        Commands::Lookup {
            input,
            selections,
            list,
            markers,
        } => {
            cli::cmd_lookup(&input, &selections, list, markers.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
