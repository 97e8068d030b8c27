// src/main.rs

use dotenvy::dotenv;
use ecoscore::airtable::AirtableClient;
use ecoscore::config::Config;
use ecoscore::routes;
use ecoscore::state::AppState;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for (table, var) in [
        (&config.questions_table, "AIRTABLE_QUESTIONS_TABLE_NAME"),
        (&config.supplier_table, "AIRTABLE_SUPPLIER_TABLE_NAME"),
        (&config.product_table, "AIRTABLE_PRODUCT_TABLE_NAME"),
        (&config.answers_table, "AIRTABLE_ANSWERS_TABLE_NAME"),
        (&config.score_table, "AIRTABLE_SCORE_TABLE_NAME"),
    ] {
        if table.is_none() {
            // Not fatal at boot: the endpoint needing it reports a
            // configuration error instead.
            tracing::warn!("{} is not set", var);
        }
    }

    let airtable = AirtableClient::from_config(&config)
        .expect("Airtable client configuration is invalid");

    // Create AppState
    let state = AppState {
        airtable,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
