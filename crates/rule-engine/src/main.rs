//! 规则引擎服务
//!
//! 提供 HTTP 接口的规则评估服务。

use anyhow::{Context, Result};
use rule_engine::http::{self, AppState};
use rule_engine::{InMemoryRuleStore, RuleEngine, RuleEngineService};
use rules_shared::config::AppConfig;
use rules_shared::observability;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

const SERVICE_NAME: &str = "rule-engine";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            ..AppConfig::default()
        }
    });

    let obs_config = config.observability.clone().with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        production = config.is_production(),
        "Starting rule-engine service..."
    );

    let store = InMemoryRuleStore::new();
    if let Some(path) = config.engine.rules_file.as_deref() {
        match load_rules_file(&store, path).await {
            Ok(count) => info!("Loaded {} rules from {}", count, path),
            Err(e) => warn!("Failed to load rules from {}: {:#}, starting with empty store", path, e),
        }
    }

    let engine = Arc::new(RuleEngine::with_config(&config.engine));
    let service = RuleEngineService::new(engine, Arc::new(store));
    let app = http::router(AppState::new(service, config.engine.default_log_limit));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shutdown complete");
    Ok(())
}

/// 从 JSON 文件加载规则到存储
async fn load_rules_file(store: &InMemoryRuleStore, path: &str) -> Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("读取规则文件失败: {}", path))?;
    let loaded = store.load_from_json(&content)?;
    Ok(loaded.len())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
