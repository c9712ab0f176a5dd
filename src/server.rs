//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire the
//! review service into the MCP tool handler.

use anyhow::{Context, Result};
use rmcp::ServiceExt;

use cinesift::config::CinesiftConfig;
use cinesift::service::ReviewService;

use crate::tools::CinesiftTools;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: CinesiftConfig) -> Result<()> {
    tracing::info!("starting Cinesift MCP server on stdio");

    let service = ReviewService::from_config(&config)?;
    let tools = CinesiftTools::new(service);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: CinesiftConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Cinesift MCP server on HTTP");

    let service = ReviewService::from_config(&config)?;

    let mcp = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(CinesiftTools::new(service.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", mcp);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c; running until killed");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
