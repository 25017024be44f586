//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{CompletionModels, GithubAdapter, HttpGateway, OpenAiCompletionAdapter},
    config::Config,
    error::ApiError,
    web::{api_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use issuezz_core::{ports::AiGateway, Assistant, GithubService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let github: Arc<dyn GithubService> = Arc::new(
        GithubAdapter::new(
            &config.github_api_url,
            config.github_token.as_deref(),
            config.http_timeout,
        )?
        .with_raw_base(&config.github_raw_url),
    );
    if config.github_token.is_none() {
        warn!("GITHUB_TOKEN is not set; code search is disabled and rate limits are low");
    }

    let assistant = match &config.openai_api_key {
        Some(key) => {
            let mut openai_config = OpenAIConfig::new().with_api_key(key);
            if let Some(base) = &config.openai_base_url {
                openai_config = openai_config.with_api_base(base);
            }
            let completion = Arc::new(OpenAiCompletionAdapter::new(
                Client::with_config(openai_config),
                CompletionModels {
                    suggest: config.suggest_model.clone(),
                    review: config.review_model.clone(),
                    follow_up: config.followup_model.clone(),
                },
            ));
            Some(Arc::new(Assistant::new(
                completion,
                github.clone(),
                config.cache,
            )))
        }
        None => None,
    };

    // --- 3. Pick the AI Gateway the Chat Flows Talk To ---
    // Config guarantees at least one of the two is present.
    let gateway: Arc<dyn AiGateway> = match (&config.ai_gateway_url, &assistant) {
        (Some(url), _) => {
            info!("Using remote AI gateway at {}", url);
            Arc::new(HttpGateway::new(url, config.http_timeout)?)
        }
        (None, assistant) => assistant.clone().ok_or_else(|| {
            ApiError::Internal("no AI provider configured".to_string())
        })?,
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), github, assistant, gateway));

    let idle_ttl = app_state.sessions.idle_ttl();
    if !idle_ttl.is_zero() {
        let sessions = app_state.sessions.clone();
        tokio::spawn(async move {
            let mut sweep = tokio::time::interval(SESSION_SWEEP_INTERVAL.min(idle_ttl));
            loop {
                sweep.tick().await;
                sessions.evict_idle().await;
            }
        });
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(api_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
