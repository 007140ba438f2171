use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txrec_core::llm::CompletionOptions;
use txrec_core::recommend::{self, MarkPolicy};
use txrec_core::storage::PgTransactionRepository;

#[derive(Debug, Parser)]
#[command(name = "txrec_worker")]
struct Args {
    /// Transaction date (MM/DD/YYYY). Defaults to today's local date.
    #[arg(long)]
    date: Option<String>,

    /// Only print the day's transactions; no LLM call.
    #[arg(long)]
    inspect: bool,

    /// With --inspect, include transactions already processed for recommendation.
    #[arg(long, requires = "inspect")]
    include_processed: bool,

    /// Which transactions to flag as processed after a successful run.
    #[arg(long, default_value = "none")]
    mark_processed: MarkPolicy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = txrec_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let date = args.date.clone().unwrap_or_else(today_local);

    let res = run(&settings, &args, &date).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(%date, error = %err, "recommendation run failed");
    }
    res
}

async fn run(
    settings: &txrec_core::config::Settings,
    args: &Args,
    date: &str,
) -> anyhow::Result<()> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    txrec_core::storage::migrate(&pool).await?;
    let repo = PgTransactionRepository::new(pool);

    if args.inspect {
        let transactions = if args.include_processed {
            recommend::fetch_all_transactions_by_date(&repo, date).await?
        } else {
            recommend::fetch_transactions_by_date(&repo, date).await?
        };
        tracing::info!(%date, count = transactions.len(), "inspected transactions");
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    let llm = txrec_core::llm::openai::OpenAiClient::from_settings(settings)?;
    let options = CompletionOptions::from_env()?;

    let transactions = recommend::fetch_transactions_by_date(&repo, date).await?;
    let result = recommend::recommend_transactions(&llm, &options, date, &transactions).await;
    println!("{}", serde_json::to_string_pretty(&result.to_json())?);

    let ids = args.mark_processed.ids_to_mark(&transactions, &result);
    let updated = recommend::mark_processed_for_recommendation(&repo, &ids).await?;

    tracing::info!(
        %date,
        offered = transactions.len(),
        picked = result.entries().len(),
        failed = result.is_error(),
        mark_policy = %args.mark_processed,
        marked = updated,
        "recommendation run finished"
    );
    Ok(())
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

fn today_local() -> String {
    chrono::Local::now()
        .date_naive()
        .format(txrec_core::time::INPUT_DATE_FORMAT)
        .to_string()
}
