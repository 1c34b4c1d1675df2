mod cli;

use clap::{Parser, Subcommand};

use cli::LowerArgs;

#[derive(Parser)]
#[command(name = "stencilc", version, about = "Stencil-pipeline lowering compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lower a pipeline description to a flat statement tree
    Lower(LowerArgs),
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Lower(args) => cli::cmd_lower(args),
    }
}
