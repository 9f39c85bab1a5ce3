use clap::{Parser, Subcommand};

mod commands;
mod logging;
#[cfg(feature = "speaker")]
mod speaker;
mod terminal;

#[derive(Parser)]
#[command(name = "chimeclock-cli", version, about = "chimeclock CLI")]
struct Cli {
    /// Log more (debug for chimeclock crates)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live clock with tick and alarm
    Run(commands::run::RunArgs),
    /// Replay a stretch of time on a simulated clock and print the events
    Simulate(commands::simulate::SimulateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
