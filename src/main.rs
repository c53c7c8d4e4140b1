use payment_service::api::{apply_server_layers, create_router, AppState};
use payment_service::config::AppConfig;
use payment_service::database::memory::{
    InMemoryCustomerRepository, InMemoryMerchantRepository, InMemoryPaymentRepository,
};
use payment_service::database::{
    init_pool_from_config, run_migrations, PgCustomerRepository, PgMerchantRepository,
    PgPaymentRepository,
};
use payment_service::health::HealthChecker;
use payment_service::logging::init_tracing;
use payment_service::payments::repository::{
    CustomerRepository, MerchantRepository, PaymentRepository,
};
use payment_service::services::{PaymentService, PaymentServiceConfig};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

struct Storage {
    payments: Arc<dyn PaymentRepository>,
    merchants: Arc<dyn MerchantRepository>,
    customers: Arc<dyn CustomerRepository>,
    pool: Option<PgPool>,
}

async fn init_storage(config: &AppConfig) -> anyhow::Result<Storage> {
    let db_config = match &config.database {
        Some(db_config) => db_config,
        None => {
            warn!("SKIP_EXTERNALS=true, using in-memory storage; data is lost on restart");
            return Ok(Storage {
                payments: Arc::new(InMemoryPaymentRepository::new()),
                merchants: Arc::new(InMemoryMerchantRepository::new()),
                customers: Arc::new(InMemoryCustomerRepository::new()),
                pool: None,
            });
        }
    };

    info!("Initializing database connection pool...");
    let pool = init_pool_from_config(db_config).await.map_err(|e| {
        error!("Failed to initialize database pool: {}", e);
        e
    })?;

    if db_config.run_migrations {
        run_migrations(&pool).await?;
    }

    info!(
        max_connections = pool.options().get_max_connections(),
        "Database connection pool initialized"
    );

    Ok(Storage {
        payments: Arc::new(PgPaymentRepository::new(pool.clone())),
        merchants: Arc::new(PgMerchantRepository::new(pool.clone())),
        customers: Arc::new(PgCustomerRepository::new(pool.clone())),
        pool: Some(pool),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting payment service"
    );

    let storage_timeout = config.storage_timeout();

    let storage = init_storage(&config).await?;

    let payment_service = Arc::new(PaymentService::with_config(
        storage.payments,
        storage.merchants.clone(),
        storage.customers,
        PaymentServiceConfig { storage_timeout },
    ));

    let state = AppState {
        payment_service,
        merchants: storage.merchants,
        health_checker: HealthChecker::new(storage.pool),
    };

    let app = apply_server_layers(create_router(state), &config.server);
    info!("Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
