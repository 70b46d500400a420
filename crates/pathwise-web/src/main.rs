//! Pathwise web server.

use anyhow::Result;
use clap::Parser;
use pathwise_web::{routes, AppState, Config};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pathwise-web")]
#[command(about = "Pathwise - track learning progress over a prerequisite graph")]
struct Cli {
    /// Config file (default: pathwise.toml in this or a parent directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Directory containing one sub-directory per subject
    #[arg(short, long)]
    subjects: Option<PathBuf>,

    /// Directory for rendered graph images
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Graphviz dot executable
    #[arg(long)]
    dot: Option<String>,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(subjects) = self.subjects {
            config.storage.subjects_dir = subjects;
        }
        if let Some(static_dir) = self.static_dir {
            config.storage.static_dir = static_dir;
        }
        if let Some(dot) = self.dot {
            config.layout.dot_binary = dot;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let config = cli.apply(config);

    std::fs::create_dir_all(&config.storage.static_dir)?;
    let addr = config.bind_addr();
    info!(
        subjects = %config.storage.subjects_dir.display(),
        static_dir = %config.storage.static_dir.display(),
        "starting Pathwise"
    );
    println!("Open http://{} in your browser", addr);

    let state = AppState::new(&config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
