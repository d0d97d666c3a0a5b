use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::AiClient;
use sitepulse_audit::audit::Auditor;
use sitepulse_audit::config::{AuditConfig, ScoringConfig};
use sitepulse_audit::coordinator::Coordinator;
use sitepulse_audit::crawler::{
    BrowserlessCapturer, BrowserlessFetcher, Crawler, HttpFetcher, NoopCapturer, PageFetcher,
    ScreenshotCapturer,
};
use sitepulse_audit::discovery::DiscoveryService;
use sitepulse_audit::selection::{AiPageClassifier, PageSelector};
use sitepulse_common::{BusinessContext, ProgressSender};

/// Audit a website and print the graded report as JSON.
#[derive(Parser)]
#[command(name = "sitepulse-audit")]
struct Args {
    /// Target site, e.g. https://example.com
    url: String,

    /// Industry hint for selection and lead scoring
    #[arg(long)]
    industry: Option<String>,

    /// Company size bucket, e.g. "11-50"
    #[arg(long)]
    company_size: Option<String>,

    /// Model id; provider is derived from it
    #[arg(long, default_value = "claude-haiku-4-5-20251001")]
    model: String,

    /// Max pages the classifier assigns per analyzer module
    #[arg(long, default_value_t = 5)]
    max_pages_per_module: usize,

    /// Overall crawl budget in seconds
    #[arg(long, default_value_t = 90)]
    max_crawl_secs: u64,

    /// Hard cap on crawled pages
    #[arg(long, default_value_t = 20)]
    max_total_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sitepulse=info".parse()?))
        .init();

    let args = Args::parse();
    info!(url = %args.url, model = %args.model, "SitePulse audit starting");

    let client = AiClient::from_env(&args.model)?;

    // A Browserless instance serves both rendered HTML and screenshots;
    // without one, fall back to plain HTTP fetches and no screenshots.
    let (fetcher, capturer): (Box<dyn PageFetcher>, Box<dyn ScreenshotCapturer>) =
        match std::env::var("BROWSERLESS_URL") {
            Ok(base_url) => {
                let token = std::env::var("BROWSERLESS_TOKEN").ok();
                (
                    Box::new(BrowserlessFetcher::new(&base_url, token.as_deref())),
                    Box::new(BrowserlessCapturer::new(&base_url, token.as_deref())),
                )
            }
            Err(_) => {
                info!("BROWSERLESS_URL not set, using plain HTTP without screenshots");
                (Box::new(HttpFetcher::new()), Box::new(NoopCapturer))
            }
        };

    let config = AuditConfig {
        max_pages_per_module: args.max_pages_per_module,
        max_crawl_time: std::time::Duration::from_secs(args.max_crawl_secs),
        max_total_pages: args.max_total_pages,
        ..Default::default()
    };

    let (progress, mut events) = ProgressSender::channel();
    let consumer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprintln!("[{}] {}", event.step, event.message);
        }
    });

    let auditor = Auditor::new(
        DiscoveryService::new(),
        PageSelector::new(Box::new(AiPageClassifier::new(client.clone()))),
        Crawler::new(fetcher, capturer),
        Coordinator::with_ai(client),
        config,
        ScoringConfig::default(),
        progress,
    );

    let business = BusinessContext {
        industry: args.industry,
        company_size: args.company_size,
        icp_notes: None,
    };

    let report = auditor.run(&args.url, business).await;
    // Dropping the auditor closes the progress channel so the consumer
    // drains and exits.
    drop(auditor);
    consumer.await.ok();
    let report = report?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!("{}", report.stats);

    Ok(())
}
