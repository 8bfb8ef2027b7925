//! Feelya - customer sentiment at a glance
//!
//! A terminal dashboard over the Feelya analysis service: aggregated
//! sentiment statistics, a filterable review list, on-demand classification
//! of new text and product recommendations.

mod api;
mod app;
mod config;
mod error;
mod logging;
mod model;
mod pipeline;
mod ui;
mod util;

use anyhow::{Context, Result};
use api::{ApiClient, Gateway};
use app::{input, App, RuntimeContext};
use clap::Parser;
use config::Config;
use error::ValidationError;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use model::Sentiment;
use pipeline::{load_dashboard, BusyFlag, CategoryFilter};
use ratatui::prelude::*;
use std::io;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use util::truncate;

#[derive(Parser, Debug)]
#[command(
    name = "feelya",
    about = "Customer sentiment at a glance",
    long_about = "F E E L Y A\n\n\
                  A terminal dashboard for the Feelya review analysis service.\n\n\
                  Browse sentiment statistics and reviews, classify new text\n\
                  and explore product recommendations.",
    version
)]
struct Args {
    /// Base URL of the analysis service API
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// User id for personal recommendations
    #[arg(long, value_name = "ID")]
    user: Option<i64>,

    /// Number of recommendations to request
    #[arg(long, value_name = "N")]
    top_n: Option<usize>,

    /// Show stats and exit (no TUI)
    #[arg(long)]
    stats: bool,

    /// Classify TEXT, print the result and exit (no TUI)
    #[arg(long, value_name = "TEXT")]
    analyze: Option<String>,

    /// Show one product and exit (no TUI)
    #[arg(long, value_name = "ID")]
    product: Option<i64>,

    /// Start with the review list filtered to a sentiment (all, Positif, Neutre, Négatif)
    #[arg(long, value_name = "LABEL", value_parser = parse_category)]
    category: Option<CategoryFilter>,
}

fn parse_category(raw: &str) -> Result<CategoryFilter, String> {
    CategoryFilter::parse(raw).ok_or_else(|| format!("unknown sentiment category '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if args.user.is_some() {
        config.user_id = args.user;
    }
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }
    config.validate()?;

    let _log_guard = logging::init(&config.log_filter)?;
    let client = ApiClient::new(&config.api_url, config.request_timeout)
        .context("failed to create API client")?;
    tracing::info!("using analysis service at {}", client.base_url());
    let gateway: Arc<dyn Gateway> = Arc::new(client);

    if args.stats {
        return run_stats(gateway.as_ref(), &config).await;
    }

    if let Some(text) = args.analyze {
        return run_analyze(gateway.as_ref(), &text).await;
    }

    if let Some(id) = args.product {
        return run_product(gateway.as_ref(), id).await;
    }

    run_tui(gateway, &config, args.category.unwrap_or_default()).await
}

/// Print stats and exit
async fn run_stats(gateway: &dyn Gateway, config: &Config) -> Result<()> {
    let health = gateway
        .health()
        .await
        .with_context(|| format!("analysis service at {} is unreachable", config.api_url))?;
    tracing::info!("health: {}", health.status);

    let snapshot = load_dashboard(gateway, config.limits).await?;
    let stats = &snapshot.stats;

    println!();
    println!("  ╔══════════════════════════════════════════════════╗");
    println!("  ║             F E E L Y A   Stats                  ║");
    println!("  ╠══════════════════════════════════════════════════╣");
    println!("  ║                                                  ║");
    println!("  ║  Service:   {:>20}                 ║", truncate(&health.status, 20));
    println!("  ║  Reviews:   {:>6}                               ║", stats.total_reviews);
    println!("  ║  Products:  {:>6}                               ║", stats.total_products);
    println!("  ║  Rating:    {:>6.2}                               ║", stats.avg_rating);
    println!("  ║                                                  ║");
    println!("  ║  Sentiment:                                      ║");
    for sentiment in Sentiment::ALL {
        println!(
            "  ║    {:8} {:>6} {:>6.1}%                         ║",
            sentiment.label(),
            stats.count_for(sentiment),
            stats.percentage_for(sentiment)
        );
    }
    println!("  ║                                                  ║");
    println!("  ╚══════════════════════════════════════════════════╝");
    println!();

    let top = snapshot.top_products(5);
    if !top.is_empty() {
        println!("  Top products:");
        println!();
        for (i, p) in top.iter().enumerate() {
            println!(
                "    {}. {} ({:.1}★, {} reviews)",
                i + 1,
                truncate(&p.name, 40),
                p.avg_rating,
                p.total_reviews
            );
        }
        println!();
    }
    Ok(())
}

/// Classify one piece of text and exit. Blank text is a silent no-op.
async fn run_analyze(gateway: &dyn Gateway, text: &str) -> Result<()> {
    let busy = BusyFlag::default();
    let outcome = match pipeline::dispatch::analyze(gateway, &busy, text).await {
        Ok(outcome) => outcome,
        Err(ValidationError::EmptyText) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    match outcome.result {
        Ok(analysis) => {
            println!("  {}", outcome.notification.message);
            if let Some(lang) = analysis.language_detected {
                println!("  language: {}", lang);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(outcome.notification.message)),
    }
}

/// Print one product and exit
async fn run_product(gateway: &dyn Gateway, id: i64) -> Result<()> {
    let product = gateway
        .product(id)
        .await
        .with_context(|| format!("failed to fetch product {id}"))?;

    println!();
    println!("  {} (#{})", truncate(&product.name, 60), product.id);
    if !product.category.is_empty() {
        println!("  category:  {}", product.category);
    }
    println!("  price:     {:.2}", product.price);
    println!(
        "  rating:    {:.1}★ over {} reviews",
        product.avg_rating, product.total_reviews
    );
    if let Some(percent) = product.positive_percent() {
        println!("  positive:  {}%", percent);
    }
    if let Some(created) = product.created_at {
        println!("  listed:    {}", created.format("%Y-%m-%d"));
    }
    println!();
    Ok(())
}

/// Run the TUI application
async fn run_tui(
    gateway: Arc<dyn Gateway>,
    config: &Config,
    category: CategoryFilter,
) -> Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let ctx = RuntimeContext {
        tx,
        gateway,
        limits: config.limits,
    };

    let mut app = App::new(config.user_id, config.top_n);
    app.set_category(category);
    app::background::execute(app.request_load(), &ctx);

    let result = run_loop(&mut terminal, &mut app, rx, &ctx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<app::messages::BackgroundMessage>,
    ctx: &RuntimeContext,
) -> Result<()> {
    loop {
        app.clear_expired_toast();
        app.tick_loading();

        // Check for background messages (non-blocking)
        while let Ok(msg) = rx.try_recv() {
            if let Some(effect) = app.handle_message(msg) {
                app::background::execute(effect, ctx);
            }
        }

        app.sync_filtered();

        terminal.draw(|f| ui::render(f, app))?;

        // Poll for events with fast timeout (snappy animations)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                input::handle_key_event(app, key, ctx)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
