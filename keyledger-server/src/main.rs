use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use keyledger_common::error::Error;
use keyledger_common::traits::notify_traits::NotificationSink;
use keyledger_common::traits::repository_traits::{
    AdminCredentialRepository, PurchaseRepository, RedeemableCodeRepository,
};
use keyledger_core::Database;
use keyledger_core::http::DefaultHttpClient;
use keyledger_core::repositories::postgres::{
    PostgresAdminCredentialRepository, PostgresPurchaseRepository,
    PostgresRedeemableCodeRepository,
};
use keyledger_core::services::{
    CredentialService, DiscordWebhookSink, NullSink, PurchaseService, RedemptionService,
};

use keyledger_server::api;

#[derive(Parser, Debug, Clone)]
#[command(name = "keyledger")]
#[command(author, version, about = "Key-gated purchase validation and premium code ledger")]
struct Args {
    /// Address to which the HTTP API will bind
    #[arg(long, default_value = "0.0.0.0:8787")]
    server_addr: String,

    /// Postgres connection URL; the DATABASE_URL env var overrides it
    #[arg(long, default_value = "postgres://keyledger@localhost:5432/keyledger")]
    db_url: String,

    /// Page size for pending purchase listings
    #[arg(long, default_value = "100")]
    pending_page_size: i64,

    /// Mint a fresh active code whenever one is redeemed (supply refill)
    #[arg(long, default_value = "false")]
    mint_replacement_on_redeem: bool,

    /// Timeout in seconds for outbound webhook calls
    #[arg(long, default_value = "5")]
    webhook_timeout_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("keyledger=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "keyledger starting. addr={}, page_size={}, replacement_on_redeem={}",
        args.server_addr, args.pending_page_size, args.mint_replacement_on_redeem
    );

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    // 1) Connect to Postgres and migrate.
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| args.db_url.clone());
    info!("Using Postgres DB URL: {}", db_url);
    let db = Database::new(&db_url).await?;
    db.migrate().await?;

    // 2) Repositories.
    let credential_repo: Arc<dyn AdminCredentialRepository> =
        Arc::new(PostgresAdminCredentialRepository::new(db.pool().clone()));
    let code_repo: Arc<dyn RedeemableCodeRepository> =
        Arc::new(PostgresRedeemableCodeRepository::new(db.pool().clone()));
    let purchase_repo: Arc<dyn PurchaseRepository> =
        Arc::new(PostgresPurchaseRepository::new(db.pool().clone()));

    // 3) Notification sink: Discord webhook when configured, else a no-op.
    let sink: Arc<dyn NotificationSink> = match std::env::var("DISCORD_WEBHOOK_URL") {
        Ok(url) if !url.trim().is_empty() => {
            let http = Arc::new(DefaultHttpClient::new(Duration::from_secs(
                args.webhook_timeout_secs,
            ))?);
            info!("Discord webhook notifications enabled.");
            Arc::new(DiscordWebhookSink::new(http, url))
        }
        _ => {
            info!("DISCORD_WEBHOOK_URL not set; notifications disabled.");
            Arc::new(NullSink)
        }
    };

    // 4) Services.
    let credentials = Arc::new(CredentialService::new(credential_repo.clone()));
    let purchases = Arc::new(PurchaseService::new(
        credential_repo.clone(),
        purchase_repo,
        sink.clone(),
        args.pending_page_size,
    ));
    let redemptions = Arc::new(RedemptionService::new(
        credential_repo,
        code_repo,
        sink,
        args.mint_replacement_on_redeem,
    ));

    let state = api::ApiState {
        credentials,
        purchases,
        redemptions,
    };
    let app = api::router(state);

    // 5) Serve, shutting down gracefully on Ctrl-C.
    let addr: SocketAddr = args.server_addr.parse()?;
    info!("HTTP API listening on http://{}", addr);

    let handle = axum_server::Handle::new();
    let handle_clone = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down...");
        handle_clone.graceful_shutdown(None);
    });

    axum_server::Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(Error::Io)?;

    Ok(())
}
