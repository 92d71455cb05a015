//! Techshop CLI - database migrations, seeding and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! techshop-cli migrate
//!
//! # Seed demo categories, brands and products (safe to re-run)
//! techshop-cli seed
//!
//! # Add catalog entries
//! techshop-cli category add "Smartphones"
//! techshop-cli brand add "Apple"
//! techshop-cli product add --name "iPhone 15" --category smartphones --brand apple --price 999
//!
//! # Move an order through fulfillment
//! techshop-cli order set-status 42 shipped
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::catalog::ProductArgs;

#[derive(Parser)]
#[command(name = "techshop-cli")]
#[command(author, version, about = "Techshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the demo catalog
    Seed,
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: NamedAction,
    },
    /// Manage brands
    Brand {
        #[command(subcommand)]
        action: NamedAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum NamedAction {
    /// Add (or rename) an entry
    Add {
        /// Display name
        name: String,

        /// URL slug; derived from the name when omitted
        #[arg(short, long)]
        slug: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a new product
    Add {
        #[arg(short, long)]
        name: String,

        /// URL slug; derived from the name when omitted
        #[arg(long)]
        slug: Option<String>,

        /// Category slug
        #[arg(short, long)]
        category: String,

        /// Brand slug
        #[arg(short, long)]
        brand: String,

        /// Base price before discount
        #[arg(short, long)]
        price: Decimal,

        /// Whole-percent discount (0-100)
        #[arg(short, long, default_value_t = 0)]
        discount: i64,

        /// black, white, gray, silver or gold
        #[arg(long, default_value = "black")]
        color: String,

        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Change an order's status (new, processing, shipped, completed, canceled)
    SetStatus { order_id: i32, status: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Category {
            action: NamedAction::Add { name, slug },
        } => commands::catalog::add_category(&name, slug.as_deref()).await?,
        Commands::Brand {
            action: NamedAction::Add { name, slug },
        } => commands::catalog::add_brand(&name, slug.as_deref()).await?,
        Commands::Product {
            action:
                ProductAction::Add {
                    name,
                    slug,
                    category,
                    brand,
                    price,
                    discount,
                    color,
                    description,
                },
        } => {
            commands::catalog::add_product(ProductArgs {
                name,
                slug,
                category,
                brand,
                price,
                discount,
                color,
                description,
            })
            .await?;
        }
        Commands::Order {
            action: OrderAction::SetStatus { order_id, status },
        } => commands::orders::set_status(order_id, &status).await?,
    }
    Ok(())
}
