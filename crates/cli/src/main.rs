//! Dharma CLI - database migrations, catalog seeding and browsing.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! dharma migrate
//!
//! # Seed categories and products from YAML
//! dharma seed --file catalog.yaml
//!
//! # Browse a running storefront
//! dharma browse --category electronics --price 2 --load-more 2
//!
//! # Add a product from the listing to the cart, then show the cart
//! dharma browse --add-to-cart digital-multimeter
//! dharma cart
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog from a YAML file
//! - `browse` - Browse the catalog through the storefront API
//! - `cart` - Show the locally persisted cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dharma")]
#[command(author, version, about = "Dharma storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Browse the catalog of a running storefront
    Browse {
        /// Category slug to check (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Price range id (0-5)
        #[arg(short, long)]
        price: Option<u8>,

        /// Number of times to click "load more"
        #[arg(short, long, default_value_t = 0)]
        load_more: u32,

        /// Product slug to add to the cart (repeatable)
        #[arg(short, long = "add-to-cart")]
        add_to_cart: Vec<String>,
    },
    /// Show the locally persisted cart
    Cart,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dharma_cli=info,dharma_client=warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Browse {
            categories,
            price,
            load_more,
            add_to_cart,
        } => {
            commands::browse::run(commands::browse::BrowseOptions {
                categories,
                price,
                load_more,
                add_to_cart,
            })
            .await?;
        }
        Commands::Cart => commands::browse::show_cart()?,
    }
    Ok(())
}
