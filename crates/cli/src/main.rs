use clap::{Parser, Subcommand};

mod cluster;
mod config;
mod offering;
mod sh;
mod spinner;

#[derive(Parser, Debug)]
#[command(name = "saltctl")]
#[command(about = "Provision a Salt master/minion cluster on a CloudStack cloud")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the salt master and both minions
    Deploy,
    /// List all nodes in the account
    List,
    /// Destroy a managed node by name
    Destroy {
        /// The node name (salt, minion1 or minion2)
        name: String,
    },
}

fn main() {
    let args = Args::parse();

    match args.command {
        Commands::Deploy => {
            if let Err(e) = cluster::handle_deploy() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::List => {
            if let Err(e) = cluster::handle_list() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Destroy { name } => {
            if let Err(e) = cluster::handle_destroy(&name) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
