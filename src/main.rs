use clap::Parser;
use formgen_gateway::app::App;
use formgen_gateway::config::{Config, RuntimeMode};
use std::net::SocketAddr;

#[derive(Debug, Parser)]
#[command(name = "formgen-gateway", version, about = "CORS gateway for LLM, forms, email and Netlify")]
struct Args {
    /// Listen address, overrides GATEWAY_BIND.
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// SQLite database path, overrides DATABASE_PATH.
    #[arg(long)]
    database: Option<String>,
    /// Development mode: skip the origin allow-list.
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("formgen-gateway: {}", err);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if args.dev {
        config.mode = RuntimeMode::Development;
    }

    let result = match App::initialize(config) {
        Ok(app) => app.serve().await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        eprintln!("formgen-gateway: {}", err);
        std::process::exit(1);
    }
}
