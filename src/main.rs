//! CLI entry point for folio-rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio-rs")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "Markdown blog pipeline: listings, excerpts and article pages", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a page of the article listing
    #[command(alias = "l")]
    List {
        /// Page number; out-of-range values are clamped
        #[arg(short, long, allow_hyphen_values = true)]
        page: Option<String>,

        /// Use the blog listing instead of the index listing
        #[arg(short, long)]
        blog: bool,
    },

    /// Print the rendered HTML of an article
    Show {
        /// Article slug
        slug: String,
    },

    /// Start the HTTP server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to `server.port`)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to `server.ip`)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio_rs=debug,info"
    } else {
        "folio_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::List { page, blog } => {
            let site = folio_rs::Blog::new(&base_dir)?;
            folio_rs::commands::list::run(&site, page.as_deref(), blog)?;
        }

        Commands::Show { slug } => {
            let site = folio_rs::Blog::new(&base_dir)?;
            folio_rs::commands::show::run(&site, &slug)?;
        }

        Commands::Serve { port, ip } => {
            let site = folio_rs::Blog::new(&base_dir)?;
            let port = port.unwrap_or(site.config.server.port);
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());

            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio_rs::server::start(&site, &ip, port).await?;
        }

        Commands::Version => {
            println!("folio-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
