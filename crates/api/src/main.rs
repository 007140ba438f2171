use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use txrec_core::domain::transaction::Transaction;
use txrec_core::llm::openai::OpenAiClient;
use txrec_core::llm::CompletionOptions;
use txrec_core::recommend;
use txrec_core::storage::PgTransactionRepository;
use txrec_core::time::DateFormatError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = txrec_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let repo: Option<PgTransactionRepository> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match txrec_core::storage::migrate(&pool).await {
                Ok(()) => Some(PgTransactionRepository::new(pool)),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let llm = match OpenAiClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!(error = %e, "LLM client unavailable; recommendations disabled");
            None
        }
    };

    let state = AppState {
        repo,
        llm,
        options: CompletionOptions::from_env()?,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/transactions", get(get_transactions))
        .route("/recommendations", post(post_recommendations))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    repo: Option<PgTransactionRepository>,
    llm: Option<Arc<OpenAiClient>>,
    options: CompletionOptions,
}

#[derive(Debug, Deserialize)]
struct TransactionsParams {
    date: String,
    #[serde(default)]
    include_processed: bool,
}

async fn get_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionsParams>,
) -> Result<Json<Vec<Transaction>>, StatusCode> {
    let Some(repo) = &state.repo else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let transactions = if params.include_processed {
        recommend::fetch_all_transactions_by_date(repo, &params.date).await
    } else {
        recommend::fetch_transactions_by_date(repo, &params.date).await
    }
    .map_err(status_for)?;

    Ok(Json(transactions))
}

#[derive(Debug, Deserialize)]
struct RecommendationsBody {
    date: String,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(body): Json<RecommendationsBody>,
) -> Result<Json<Value>, StatusCode> {
    let (Some(repo), Some(llm)) = (&state.repo, &state.llm) else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let result = recommend::get_recommended_transaction_by_date(
        repo,
        llm.as_ref(),
        &state.options,
        &body.date,
    )
    .await
    .map_err(status_for)?;

    Ok(Json(result.to_json()))
}

fn status_for(err: anyhow::Error) -> StatusCode {
    if err.downcast_ref::<DateFormatError>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &txrec_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
