//! GoMarket CLI - inspect and edit the stored cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cart show
//!
//! # Add a product
//! gm-cart add --id 1 --title "Cadeira Rivatti" --image-url https://cdn/1.png --price 1400
//!
//! # Change quantities
//! gm-cart increment 1
//! gm-cart decrement 1
//! ```
//!
//! # Commands
//!
//! - `show` - Print the stored cart
//! - `add` - Add a product or one more unit of it
//! - `increment` - Add one unit of a product already in the cart
//! - `decrement` - Remove one unit, dropping the line at zero

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use gomarket_core::{NewCartItem, Price, ProductId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "GoMarket cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored cart
    Show,
    /// Add a product, or one more unit if it is already in the cart
    Add {
        /// Product identifier
        #[arg(long)]
        id: ProductId,

        /// Product title
        #[arg(short, long)]
        title: String,

        /// Product image URL
        #[arg(short, long, default_value = "")]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(short, long)]
        price: Price,
    },
    /// Add one unit of a product already in the cart
    Increment {
        /// Product identifier
        id: ProductId,
    },
    /// Remove one unit of a product, dropping it at zero
    Decrement {
        /// Product identifier
        id: ProductId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gomarket_cart=info,gomarket_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);
    init_tracing();
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CliConfig) -> Result<(), commands::cart::CommandError> {
    let cart = match cli.command {
        Commands::Show => commands::cart::show(config).await?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => {
            let item = NewCartItem {
                id,
                title,
                image_url,
                price,
            };
            commands::cart::add(config, item).await?
        }
        Commands::Increment { id } => commands::cart::increment(config, &id).await?,
        Commands::Decrement { id } => commands::cart::decrement(config, &id).await?,
    };
    commands::cart::print(&cart);
    Ok(())
}
