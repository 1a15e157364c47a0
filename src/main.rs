use std::sync::Arc;

use pitchcraft::{auth::{AuthGateway, Clients, FirebaseIdentity}, config::Config, db, genai::GeminiClient, store::SqliteMessageStore, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging()?;

    let config = Config::from_env()?;

    let db_pool = db::connect(&config.database_url, 16).await?;
    let store = SqliteMessageStore::new(db_pool).await?;

    let identity = FirebaseIdentity::new(config.firebase_api_key.clone(), &config.public_url);
    let clients = Clients::new(config.google.as_ref(), &config.public_url)?;
    if config.google.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set, Google sign-in is disabled");
    }

    let app_state = AppState {
        gateway: AuthGateway::new(Arc::new(identity)),
        clients,
        store: Arc::new(store),
        generator: Arc::new(GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())),
        prompts: config.prompts.clone(),
    };

    let app = pitchcraft::app(app_state, time::Duration::minutes(config.session_idle_minutes));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, public_url = %config.public_url, model = %config.gemini_model, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let default_filter = if cfg!(debug_assertions) {
        "debug,pitchcraft=trace,sqlx=info,reqwest=info,hyper=info,tower_http=debug"
    } else {
        "info,sqlx=warn,reqwest=warn,hyper=warn,tower_http=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    let fmt_layer = if matches!(dotenv::var("LOG_FORMAT").as_deref(), Ok("json")) {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
