// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pixora - back end for personalised image generation.
//!
//! This is the binary entry point.

mod credits;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pixora_config::PixoraConfig;

/// Pixora - train personal image models and generate with them.
#[derive(Parser, Debug)]
#[command(name = "pixora", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Manage user credit balances.
    Credits {
        #[command(subcommand)]
        action: CreditsCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Load and validate the configuration, then print a summary.
    Check,
}

#[derive(Subcommand, Debug)]
enum CreditsCommands {
    /// Add credits to a user's balance.
    Grant {
        /// Profile id of the user.
        user_id: String,
        /// Number of credits to add.
        amount: i64,
    },
}

fn load_config(path: Option<&PathBuf>) -> PixoraConfig {
    let result = match path {
        Some(path) => pixora_config::load_and_validate_path(path),
        None => pixora_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            pixora_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn print_config_summary(config: &PixoraConfig) {
    let set = |value: &Option<String>| if value.is_some() { "set" } else { "missing" };
    println!("pixora: configuration OK");
    println!("  listen           {}:{}", config.server.host, config.server.port);
    println!("  site_url         {}", config.server.site_url);
    println!("  database         {}", config.storage.database_path);
    println!("  replicate token  {}", set(&config.replicate.api_token));
    println!("  supabase key     {}", set(&config.supabase.service_role_key));
    println!("  webhook secret   {}", set(&config.webhook.signing_secret));
    println!(
        "  email            {}",
        if config.email.enabled { set(&config.email.api_key) } else { "disabled" }
    );
    println!("  paypal client    {}", set(&config.paypal.client_id));
    println!("  training cost    {} credits", config.credits.training_cost);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config {
            action: ConfigCommands::Check,
        } => {
            print_config_summary(&config);
            Ok(())
        }
        Commands::Credits {
            action: CreditsCommands::Grant { user_id, amount },
        } => credits::run_grant(&config, &user_id, amount)
            .await
            .map(|balance| println!("{user_id}: {balance} credits")),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
