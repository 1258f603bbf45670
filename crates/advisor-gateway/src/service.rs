//! Advisor gateway service - HTTP router and server lifecycle.

use crate::adapters::SiteverifyClient;
use crate::domain::config::GatewayConfig;
use crate::domain::error::{AdviceError, GatewayError};
use crate::domain::types::{
    AdviceRequest, AdviceRequestV2, AdviceResponse, PromptRequest, StatusResponse,
};
use crate::gateway::RequestGateway;
use crate::middleware::{create_cors_layer, TimeoutLayer, TracingLayer};
use crate::ports::outbound::TokenVerifier;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tracing::info;

/// Liveness message served on `/`
pub const ROOT_STATUS: &str = "Mechanical Advisor API is running!";

/// Advisor gateway service state
pub struct AdvisorGatewayService {
    config: GatewayConfig,
    gateway: Arc<RequestGateway>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl AdvisorGatewayService {
    /// Create a service that verifies tokens against the configured
    /// siteverify endpoint
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let verifier = SiteverifyClient::new(&config.verification, &config.timeouts)?;
        Self::with_verifier(config, Arc::new(verifier))
    }

    /// Create a service around an arbitrary verifier
    pub fn with_verifier(
        config: GatewayConfig,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let gateway = Arc::new(RequestGateway::new(config.verification.clone(), verifier));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        Ok(Self {
            config,
            gateway,
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx: Some(shutdown_rx),
        })
    }

    /// Build the HTTP router with the full middleware stack
    pub fn router(&self) -> Router {
        let state = AppState {
            gateway: Arc::clone(&self.gateway),
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new())
            .layer(TimeoutLayer::new(self.config.timeouts.request))
            .layer(DefaultBodyLimit::max(self.config.limits.max_request_size));

        Router::new()
            .route("/", get(root))
            .route("/health", get(health_check))
            .route("/get-advice", post(get_advice))
            .route("/get-advice-with-v2", post(get_advice_with_v2))
            .route("/get-advice-v2-passed", post(get_advice_v2_passed))
            .layer(middleware)
            .with_state(state)
    }

    /// Bind and serve until the shutdown handle fires or the server fails
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        let listener = tokio::net::TcpListener::bind(self.config.http_addr())
            .await
            .map_err(GatewayError::Bind)?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(&mut self, listener: tokio::net::TcpListener) -> Result<(), GatewayError> {
        let shutdown_rx = self.shutdown_rx.take();

        let addr = listener.local_addr().map_err(GatewayError::Bind)?;
        info!(
            addr = %addr,
            v3_enabled = self.config.verification.v3.enabled,
            v2_enabled = self.config.verification.v2.enabled,
            score_threshold = self.config.verification.score_threshold,
            "Advisor gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                // A dropped handle or a second `serve` call never fires
                let fired = match shutdown_rx {
                    Some(rx) => rx.await.is_ok(),
                    None => false,
                };
                if !fired {
                    std::future::pending::<()>().await;
                }
                info!("Received shutdown signal");
            })
            .await
            .map_err(GatewayError::Serve)?;

        info!("Advisor gateway stopped");
        Ok(())
    }

    /// Detach the shutdown trigger so another task can stop the server
    pub fn shutdown_handle(&mut self) -> Option<oneshot::Sender<()>> {
        self.shutdown_tx.take()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    gateway: Arc<RequestGateway>,
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: ROOT_STATUS.to_string(),
    })
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

async fn get_advice(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, AdviceError> {
    let advice = state
        .gateway
        .verify_and_advise_v3(&request.prompt, request.recaptcha_token.as_deref())
        .await?;
    Ok(Json(AdviceResponse { advice }))
}

async fn get_advice_with_v2(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequestV2>,
) -> Result<Json<AdviceResponse>, AdviceError> {
    let advice = state
        .gateway
        .verify_and_advise_v2(&request.prompt, request.recaptcha_token_v2.as_deref())
        .await?;
    Ok(Json(AdviceResponse { advice }))
}

async fn get_advice_v2_passed(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Json<AdviceResponse> {
    Json(AdviceResponse {
        advice: state.gateway.advise_v2_passed(&request.prompt),
    })
}
