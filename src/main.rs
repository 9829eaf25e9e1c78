use clap::Parser;
use chronicle::cli::{
    handle_beat, handle_chapter, handle_character, handle_export, handle_import, handle_init,
    handle_location, handle_scene, handle_stats, handle_user, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::User { name } => handle_user(name),
        Commands::Beat(cmd) => handle_beat(cmd.action),
        Commands::Scene(cmd) => handle_scene(cmd.action),
        Commands::Character(cmd) => handle_character(cmd.action),
        Commands::Location(cmd) => handle_location(cmd.action),
        Commands::Chapter(cmd) => handle_chapter(cmd.action),
        Commands::Stats { json } => handle_stats(json),
        Commands::Export { file } => handle_export(&file),
        Commands::Import { file } => handle_import(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
