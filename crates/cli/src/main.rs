use std::path::PathBuf;

use anyhow::Context;
use bookshelf_authz::{BcryptHasher, PasswordHasher};
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Bookshelf - books and users REST service
#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(about = "Bookshelf - books and users REST service")]
#[command(version)]
struct Cli {
    /// Environment overlay to load (local, staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding base.toml and the environment overlays
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Port for the HTTP server (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve,
    /// Print the effective configuration as JSON
    Config,
    /// Print a bcrypt hash of PLAINTEXT using the configured cost
    HashPassword {
        /// Password to hash
        plaintext: String,
    },
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = if self.env.is_none() && self.config_dir.is_none() {
            Settings::load()
        } else {
            let environment = match &self.env {
                Some(env) => env.clone(),
                None => std::env::var("BOOKSHELF_ENV").unwrap_or_else(|_| "local".to_string()),
            };
            let config_dir = match &self.config_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()
                    .context("unable to resolve current directory")?
                    .join("config"),
            };
            Settings::load_from(&config_dir, &environment)
        }
        .context("failed to load bookshelf settings")?;

        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Commands::Serve => bookshelf_app::run(settings).await,
        Commands::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
        Commands::HashPassword { plaintext } => {
            let hasher = BcryptHasher::new(settings.auth.bcrypt_cost);
            println!("{}", hasher.hash(&plaintext)?);
            Ok(())
        }
    }
}
