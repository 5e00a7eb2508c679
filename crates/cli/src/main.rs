//! Cartwheel CLI - command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Log in and persist the credential locally
//! cw-cli login -e jo@example.com -p 'hunter2!A'
//!
//! # Browse and fill the cart
//! cw-cli products
//! cw-cli cart add 6645f2a1
//! cw-cli cart adjust 6645f2a1 --delta -1
//! cw-cli cart show
//!
//! # Place and watch orders (10s cancellation window)
//! cw-cli order place 6645f2a1
//! cw-cli order watch
//! cw-cli order cancel 662ab90f
//! ```
//!
//! # Environment
//!
//! - `CARTWHEEL_API_URL` - base URL of the remote commerce API (required)
//! - `CARTWHEEL_STATE_FILE` - local state file (default: `.cartwheel/state.json`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(author, version, about = "Cartwheel storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the credential locally
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Drop the stored credential
    Logout,
    /// List the product catalog
    Products,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the reconciled cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: String,
    },
    /// Adjust a line's quantity by a signed delta
    Adjust {
        /// Product ID
        product_id: String,

        /// Signed quantity change (e.g. -1)
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    /// Remove a line regardless of quantity
    Remove {
        /// Product ID
        product_id: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order for the given cart products
    Place {
        /// Product IDs to order
        product_ids: Vec<String>,
    },
    /// List orders with their status and remaining cancellation window
    List,
    /// Watch pending orders: tick the countdown once per second until all
    /// windows resolve
    Watch,
    /// Cancel a pending order inside its grace window
    Cancel {
        /// Order ID
        order_id: String,
    },
    /// Review a product from a successful order
    Review {
        /// Order ID
        order_id: String,

        /// Product ID within the order
        product_id: String,

        /// Star rating, 1-5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long, default_value = "")]
        text: String,

        /// Submit without attaching the reviewer's name
        #[arg(long)]
        anonymous: bool,
    },
}

#[tokio::main]
async fn main() {
    // .env is optional; ignore a missing file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&email, &password).await?,
        Commands::Logout => commands::auth::logout()?,
        Commands::Products => commands::products::list().await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add { product_id } => commands::cart::add(&product_id).await?,
            CartAction::Adjust { product_id, delta } => {
                commands::cart::adjust(&product_id, delta).await?;
            }
            CartAction::Remove { product_id } => commands::cart::remove(&product_id).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place { product_ids } => commands::orders::place(&product_ids).await?,
            OrderAction::List => commands::orders::list().await?,
            OrderAction::Watch => commands::orders::watch().await?,
            OrderAction::Cancel { order_id } => commands::orders::cancel(&order_id).await?,
            OrderAction::Review {
                order_id,
                product_id,
                rating,
                text,
                anonymous,
            } => commands::orders::review(&order_id, &product_id, rating, text, anonymous).await?,
        },
    }
    Ok(())
}
