use std::sync::Arc;

use campus_shared::clients::db::create_pool;
use campus_shared::clients::email::{DisabledMailer, EmailClient, Mailer};
use campus_shared::middleware::{init_metrics, init_tracing};

use campus_events::config::AppConfig;
use campus_events::store::PgStore;
use campus_events::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("campus-events");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    tracing::info!(pool_size = config.db_pool_size, "database pool ready");

    let mailer: Arc<dyn Mailer> = if config.email_enabled {
        Arc::new(EmailClient::new(&config.resend_api_key, &config.from_email, &config.from_name))
    } else {
        tracing::warn!("e-mail delivery disabled; set CAMPUS_EVENTS__EMAIL_ENABLED=true to send");
        Arc::new(DisabledMailer)
    };

    let metrics_handle = init_metrics()?;

    let state = AppState::new(config, Arc::new(PgStore::new(pool)), mailer).with_metrics(metrics_handle);
    let app = campus_events::router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "campus-events starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
