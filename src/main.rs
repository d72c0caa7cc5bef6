use clap::Parser;
use dayplan::cli::commands::Cli;
use dayplan::cli::handlers;
use dayplan::io::{DataPaths, config_io};
use dayplan::logging;

fn main() {
    let cli = Cli::parse();

    // Logging is best effort; a broken config surfaces from the command itself
    if let Ok(paths) = DataPaths::resolve(cli.data_dir.as_deref()) {
        let log = config_io::load_config(&paths)
            .map(|c| c.log)
            .unwrap_or_default();
        logging::init(&paths, &log);
    }

    let result = match cli.command {
        // No subcommand → launch TUI
        None => dayplan::tui::run(cli.data_dir.as_deref(), cli.date),
        Some(_) => handlers::dispatch(cli),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
