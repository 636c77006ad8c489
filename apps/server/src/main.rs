use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;
use assistant::{AssistantClient, ChatExtractor, OpenAiConfig, load_assistant_id};
use server::{AppState, config::Config, routes};
use stock::{NewsClient, QuoteClient, SymbolResolver, SymbolTable};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(version = %config.version, "starting stock market chatbot");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let table = SymbolTable::load(&http, &config.symbols_source, &config.market_suffix)
        .await
        .unwrap_or_else(|e| {
            error!(error = ?e, "loading symbol table failed, no stock will resolve");
            SymbolTable::default()
        });
    let resolver = SymbolResolver::with_threshold(Arc::new(table), config.match_threshold);

    let shutdown = CancellationToken::new();

    let openai = OpenAiConfig::from_env()?;
    let assistant_id = load_assistant_id(&config.assistant_file)?;
    let agent = AssistantClient::new(openai.clone(), assistant_id)?
        .with_run_limits(config.run_poll_interval, config.run_timeout)
        .with_cancellation(shutdown.clone());
    let extractor = ChatExtractor::new(openai)?;
    let market = QuoteClient::new(config.http_timeout)?;
    let news = NewsClient::from_env()?.with_limits(config.news_per_source, config.news_limit);

    let state = web::Data::new(AppState {
        resolver,
        extractor: Arc::new(extractor),
        market: Arc::new(market),
        news: Arc::new(news),
        agent: Arc::new(agent),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .disable_signals()
    .run();

    info!(host = %config.host, port = config.port, "chatbot is running");

    let handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    shutdown_signal().await;
    info!("shutdown requested");

    shutdown.cancel();
    handle.stop(true).await;
    server_task.await??;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
