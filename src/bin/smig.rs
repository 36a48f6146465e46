//! CLI entry point for the `smig` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use splitmigrate::cli::commands;

#[derive(Parser)]
#[command(
    name = "smig",
    about = "splitmigrate CLI — migrate a draft/published legacy course dump into a versioned store"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a legacy dump file
    Info {
        /// Path to the dump file
        file: PathBuf,
    },
    /// Migrate the course in a dump file into a fresh versioned store
    Migrate {
        /// Path to the dump file
        file: PathBuf,
        /// Explicit target course id (defaults to org.course.name)
        #[arg(long)]
        course_id: Option<String>,
        /// User the migration is attributed to
        #[arg(long, default_value = "migrator")]
        user: String,
        /// Also print the migrated course index and branch structures
        #[arg(long)]
        emit_course: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let result = match cli.command {
        Commands::Info { file } => commands::cmd_info(&file, json),
        Commands::Migrate {
            file,
            course_id,
            user,
            emit_course,
        } => commands::cmd_migrate(&file, &user, course_id.as_deref(), emit_course, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
