mod force_update;
mod validate;

use clap::{ArgAction, Parser, Subcommand};
use console::style;

use force_update::ForceUpdateArgs;
use validate::ValidateArgs;

#[derive(Parser, Debug)]
#[command(name = "lockstep")]
#[command(author, version, about = "Force a locked dependency to an exact version", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update one package to an exact version, unlocking what stands in the way
    #[command(name = "force-update")]
    ForceUpdate(ForceUpdateArgs),

    /// Check that the manifest and lock parse and agree with each other
    Validate(ValidateArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::ForceUpdate(args) => force_update::execute(args),
        Commands::Validate(args) => validate::execute(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
