mod archive;
mod config;
mod counter;
mod db;
mod downloads;
mod enhancement;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod notify;
mod orders;
mod pipeline;
mod publish;
mod render;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::archive::ZipArchiver;
use crate::config::{Config, S3Config};
use crate::counter::{file::FileCounterStore, postgres::PgCounterStore, Counter, CounterStore};
use crate::db::{create_pool, ensure_schema};
use crate::downloads::{file::FileLinkStore, postgres::PgLinkStore, Downloads, LinkStore};
use crate::enhancement::Enhancer;
use crate::extraction::{pdf::LocalPdfParser, remote::ApifyParser, ResumeParser};
use crate::llm_client::{LlmClient, TextGenerator};
use crate::notify::{HttpMailer, Mailer, Notifier, PreviewMailer};
use crate::orders::admission::Admission;
use crate::orders::{file::FileOrderStore, postgres::PgOrderStore, OrderStore, OrderTracker};
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::publish::{
    local::LocalPublisher, s3::S3Publisher, vercel::VercelPublisher, HostedPublisher,
    SitePublisher,
};
use crate::render::PortfolioRenderer;
use crate::routes::build_router;
use crate::state::AppState;

struct Stores {
    counter: Arc<dyn CounterStore>,
    orders: Arc<dyn OrderStore>,
    links: Arc<dyn LinkStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("folio_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));
    if config.outbound_blocked {
        warn!("Outbound proxy points at a discard port; remote services will be skipped");
    }

    for dir in [
        &config.data_dir,
        &config.uploads_dir,
        &config.generated_dir,
        &config.archive_dir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }

    let stores = open_stores(&config).await?;
    let tracker = OrderTracker::new(stores.orders);
    let counter = Counter::new(stores.counter, config.max_slots);
    let downloads = Downloads::new(stores.links, &config.archive_dir);
    info!(
        "Capacity {} slots, {} remaining",
        config.max_slots,
        counter.remaining_slots().await?
    );

    let notifier = Notifier::new(build_mailer(&config), config.admin_email.clone(), config.max_slots);
    if config.admin_email.is_none() {
        warn!("ADMIN_EMAIL is not set; admin alerts will be recorded as failed");
    }

    let publisher = SitePublisher::new(
        build_hosted_publisher(&config).await,
        LocalPublisher::new(&config.generated_dir, &config.backend_url),
        config.outbound_blocked,
        config.admin_contact.clone(),
    );

    let pipeline = Pipeline::new(
        tracker.clone(),
        build_remote_parser(&config)?,
        Arc::new(LocalPdfParser),
        Arc::new(Enhancer::new(build_generator(&config)?, config.outbound_blocked)),
        Arc::new(PortfolioRenderer),
        Arc::new(publisher),
        Arc::new(ZipArchiver::new(&config.archive_dir)),
        downloads.clone(),
        notifier.clone(),
        PipelineSettings {
            backend_url: config.backend_url.clone(),
            uploads_dir: config.uploads_dir.clone(),
            admin_contact: config.admin_contact.clone(),
        },
    );

    let admission = Admission::new(
        counter.clone(),
        tracker.clone(),
        notifier,
        Arc::new(pipeline),
        config.eta_minutes,
    );

    let state = AppState {
        config: config.clone(),
        counter,
        tracker,
        admission,
        downloads,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, JSON files under `DATA_DIR` otherwise.
async fn open_stores(config: &Config) -> Result<Stores> {
    if let Some(url) = &config.database_url {
        let db = create_pool(url).await?;
        ensure_schema(&db).await?;
        return Ok(Stores {
            counter: Arc::new(PgCounterStore::new(db.clone())),
            orders: Arc::new(PgOrderStore::new(db.clone())),
            links: Arc::new(PgLinkStore::new(db)),
        });
    }

    let dir = &config.data_dir;
    info!("Using file-backed stores in {}", dir.display());
    Ok(Stores {
        counter: Arc::new(FileCounterStore::open(dir.join("purchase-counter.json")).await?),
        orders: Arc::new(FileOrderStore::open(dir.join("orders.json")).await?),
        links: Arc::new(FileLinkStore::open(dir.join("download-links.json")).await?),
    })
}

fn build_remote_parser(config: &Config) -> Result<Option<Arc<dyn ResumeParser>>> {
    let (Some(token), Some(actor)) = (&config.apify_api_token, &config.apify_actor_id) else {
        info!("Remote resume parser not configured; parsing locally");
        return Ok(None);
    };
    let parser = ApifyParser::new(token.clone(), actor.clone(), config.outbound_blocked)?;
    info!("Remote resume parser enabled (actor: {actor})");
    Ok(Some(Arc::new(parser)))
}

fn build_generator(config: &Config) -> Result<Option<Arc<dyn TextGenerator>>> {
    let Some(key) = &config.anthropic_api_key else {
        info!("ANTHROPIC_API_KEY not set; content enhancement uses the rule-based fallback");
        return Ok(None);
    };
    let llm = LlmClient::new(key.clone(), config.anthropic_model.clone())?;
    info!("LLM client initialized (model: {})", llm.primary_model());
    Ok(Some(Arc::new(llm)))
}

fn build_mailer(config: &Config) -> Arc<dyn Mailer> {
    match (&config.email_api_url, config.email_preview_mode) {
        (Some(url), false) => {
            info!("Sending email through {url}");
            Arc::new(HttpMailer::new(
                url.clone(),
                config.email_api_key.clone(),
                config.email_from.clone(),
            ))
        }
        _ => {
            info!("Email preview mode: messages are stored on the order only");
            Arc::new(PreviewMailer)
        }
    }
}

/// Vercel when a token is present, then S3-compatible storage, else none.
async fn build_hosted_publisher(config: &Config) -> Option<Arc<dyn HostedPublisher>> {
    if let Some(token) = &config.vercel_token {
        info!("Hosted publishing via Vercel");
        return Some(Arc::new(VercelPublisher::new(token.clone())));
    }
    if let Some(s3) = &config.s3 {
        let client = build_s3_client(s3).await;
        info!("Hosted publishing via S3 bucket {}", s3.bucket);
        return Some(Arc::new(S3Publisher::new(client, s3.bucket.clone(), &s3.public_url)));
    }
    warn!("No hosting provider configured; sites will be published locally");
    None
}

/// Constructs an S3 client for MinIO-style endpoints or AWS proper.
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"));
    if let (Some(id), Some(secret)) = (&s3.aws_access_key_id, &s3.aws_secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(id, secret, None, None, "folio-static"));
    }
    if let Some(endpoint) = &s3.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(s3.endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
