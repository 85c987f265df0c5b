//! CLI entry point for spacetraveling

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacetraveling::client::InMemoryClient;
use spacetraveling::Blog;

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog renderer backed by the Prismic headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Read documents from a local JSON file instead of the Prismic API
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-render the index and every post
    #[command(alias = "g")]
    Generate,

    /// Start a local server that renders pages on demand
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List posts in index order
    List {
        /// Number of "load more" pages to follow (all when omitted)
        #[arg(short, long)]
        pages: Option<usize>,
    },

    /// Print a single post
    Show {
        /// Post uid
        uid: String,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

fn open_blog(base_dir: &Path, fixtures: Option<&Path>) -> Result<Blog> {
    match fixtures {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            tracing::info!("Using fixture documents from {:?}", path);
            let config = Blog::load_config(base_dir)?;
            let client = InMemoryClient::from_file(&path)?;
            Blog::with_client(base_dir, config, Arc::new(client))
        }
        None => Blog::new(base_dir),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
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
        None => std::env::current_dir()?,
    };
    let fixtures = cli.fixtures.as_deref();

    match cli.command {
        Commands::Generate => {
            let blog = open_blog(&base_dir, fixtures)?;
            tracing::info!("Generating static files...");
            blog.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Serve { port, ip } => {
            let blog = open_blog(&base_dir, fixtures)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&blog, &ip, port).await?;
        }

        Commands::List { pages } => {
            let blog = open_blog(&base_dir, fixtures)?;
            spacetraveling::commands::list::run(&blog, pages).await?;
        }

        Commands::Show { uid } => {
            let blog = open_blog(&base_dir, fixtures)?;
            spacetraveling::commands::show::run(&blog, &uid).await?;
        }

        Commands::Clean => {
            let blog = open_blog(&base_dir, fixtures)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
