use chrono::NaiveDate;
use crm_mobile::auth::EnvToken;
use crm_mobile::backend::BackendClient;
use crm_mobile::config::ClientConfig;
use crm_mobile::visits::VisitFeedController;
use crm_mobile::CrmError;
use std::sync::Arc;
use tracing::{error, info};

/// Filters and paging for one run, from `CRM_MONTH`, `CRM_COMPANY`
/// and `CRM_MAX_PAGES`.
struct RunOptions {
    month: Option<NaiveDate>,
    company: Option<String>,
    max_pages: u32,
}

impl RunOptions {
    fn from_env() -> Result<Self, CrmError> {
        let month = match std::env::var("CRM_MONTH") {
            Ok(s) => Some(
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|e| CrmError::Config(format!("CRM_MONTH: {e}")))?,
            ),
            Err(_) => None,
        };
        let company = std::env::var("CRM_COMPANY").ok();
        let max_pages = match std::env::var("CRM_MAX_PAGES") {
            Ok(s) => s
                .trim()
                .parse()
                .map_err(|e| CrmError::Config(format!("CRM_MAX_PAGES: {e}")))?,
            Err(_) => 1,
        };

        Ok(Self {
            month,
            company,
            max_pages,
        })
    }
}

async fn run() -> Result<(), CrmError> {
    let cfg = ClientConfig::from_env()?;
    let opts = RunOptions::from_env()?;
    info!(backend = %cfg.backend_hostname, "starting visit feed");

    let page_size = cfg.page_size;
    let client = Arc::new(BackendClient::new(cfg)?);
    let feed = VisitFeedController::new(client, Arc::new(EnvToken::default()))
        .with_page_size(page_size);

    feed.set_month_filter(opts.month).await;
    if let Some(company) = opts.company {
        feed.set_company_name_filter(company).await;
    }
    feed.reset_list().await;
    feed.fetch().await?;

    let mut pages = 1;
    while pages < opts.max_pages {
        if feed.load_next_page().await?.is_none() {
            break;
        }
        pages += 1;
    }

    let state = feed.snapshot().await;
    for visit in &state.visits {
        let line =
            serde_json::to_string(visit).map_err(|e| CrmError::JsonParse(e.to_string()))?;
        println!("{line}");
    }

    let stats = feed.stats().await;
    info!(
        pages,
        total = stats.total,
        completed = stats.completed,
        has_more = state.has_more,
        "visit feed done"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "visit feed failed");
        std::process::exit(1);
    }
}
