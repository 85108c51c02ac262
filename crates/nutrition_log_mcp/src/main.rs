use std::sync::Arc;

use anyhow::Context;
use nutrition_log_client::MealSession;
use nutrition_log_client::config::Config;
use nutrition_log_client::http_client::ReqwestNutritionClient;
use nutrition_log_mcp::NutritionMcpHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configure logging from env var `NUTRITION_LOG_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("NUTRITION_LOG_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // stdout carries the MCP protocol, so logs go to stderr and rmcp internals stay quiet
    let combined_filter = format!("{},rmcp=warn,serve_inner=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rmcp=warn,serve_inner=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("nutrition_log_mcp: log filter: {}", log_env);

    let config = Config::from_env().context("reading NUTRITION_LOG_* configuration")?;
    tracing::info!(base_url = %config.base_url, "nutrition_log_mcp: using backend");

    let client = ReqwestNutritionClient::from_config(&config);
    let session = MealSession::load(Arc::new(client), config.request_timeout)
        .await
        .context("loading today's calorie snapshot")?;
    let handler = NutritionMcpHandler::new(Arc::new(session));

    tracing::info!(
        "nutrition_log_mcp: registered {} tools",
        handler.tool_count()
    );
    tracing::info!("nutrition_log_mcp: starting stdio MCP server...");

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = rmcp::serve_server(handler, transport).await?;
    server.waiting().await?;

    Ok(())
}
