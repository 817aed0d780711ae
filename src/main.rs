use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idgate::auth::TokenManager;
use idgate::cli::{self, Commands, TokenCommands};
use idgate::config::{self, Config, LogFormat};
use idgate::models::user::User;
use idgate::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let cfg = config::load()?;
    init_tracing(cfg.log_format);

    let result = match args.command {
        Some(Commands::Serve { port }) => run_server(cfg, port).await,
        Some(Commands::Token { command }) => handle_token_command(command, &cfg),
        None => run_server(cfg, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "idgate=debug,tower_http=debug".into()),
    );

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn run_server(cfg: Config, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(cfg.port);
    let ip = cfg
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid IDGATE_HOST: {}", cfg.host))?;

    tracing::info!(
        token_ttl_secs = cfg.token_ttl_secs,
        workers = cfg.provisioning.workers,
        "Starting services..."
    );
    let state = Arc::new(AppState::new(&cfg));
    let app = api::router(state);

    let addr = SocketAddr::new(ip, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("idgate listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn handle_token_command(cmd: TokenCommands, cfg: &Config) -> anyhow::Result<()> {
    let tokens = TokenManager::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl_secs);

    match cmd {
        TokenCommands::Issue {
            user_id,
            name,
            role,
        } => {
            let user = User {
                id: user_id,
                name,
                password: String::new(),
                role,
                first_name: None,
                last_name: None,
                age: None,
            };
            let token = tokens.issue(&user)?;
            println!(
                "Token issued (valid {}s):\n  Use:   Authorization: Bearer {}",
                tokens.ttl_secs(),
                token
            );
        }
        TokenCommands::Verify { token } => {
            let identity = tokens.verify(&token)?;
            println!(
                "Token valid:\n  User ID: {}\n  Name:    {}\n  Role:    {}",
                identity.user_id, identity.name, identity.role
            );
        }
    }
    Ok(())
}
