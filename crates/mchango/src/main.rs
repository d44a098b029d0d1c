// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mchango - a WhatsApp savings-group (chama) bot.
//!
//! This is the binary entry point for the Mchango bot.

mod serve;
mod status;
mod store;

use clap::{Parser, Subcommand};

/// Mchango - a WhatsApp savings-group (chama) bot.
#[derive(Parser, Debug)]
#[command(name = "mchango", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot: poller, outbound queue, and admin surface.
    Serve,
    /// Query a running bot's health endpoint.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match mchango_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            for err in &errors {
                eprintln!("mchango: {err}");
            }
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(mchango_core::MchangoError::Internal(format!(
                    "failed to render config: {e}"
                ))),
            }
        }
        None => {
            println!("mchango: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("mchango: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config = mchango_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "mchango");
        assert_eq!(config.queue.per_minute_limit, 30);
    }
}
