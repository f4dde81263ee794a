//! Analyze Lambda - Handles /v1/analyze/{capability} endpoint.
//!
//! Accepts a photo as a data URI and returns the standard API envelope with the
//! animal's mood (and emoji/comment, depending on the capability). Every
//! facade outcome is a 200; only routing and body errors use other codes.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, json_response};
use shared::{
    AnalysisFacade, AnalysisResult, AnalyzeRequest, ApiResponse, BedrockModelClient, Capability, Config, ModelClient,
    PromptFlow,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ROUTE_PREFIX: &str = "/v1/analyze";

/// Application state shared across requests.
struct AppState<M> {
    client: Arc<M>,
    default_capability: &'static Capability,
}

impl AppState<BedrockModelClient> {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let client = BedrockModelClient::from_config(&config).await;
        info!(model_id = client.model_id(), "Model client ready");

        Ok(Self {
            client: Arc::new(client),
            default_capability: config.default_capability,
        })
    }
}

/// Resolve the capability named by the request path.
fn route(path: &str, default: &'static Capability) -> Option<&'static Capability> {
    let rest = path.strip_prefix(ROUTE_PREFIX)?;
    match rest.trim_matches('/') {
        "" if rest.is_empty() || rest == "/" => Some(default),
        name if !name.contains('/') => Capability::by_name(name),
        _ => None,
    }
}

async fn handler<M: ModelClient>(state: Arc<AppState<M>>, event: Request) -> Result<Response<Body>, Error> {
    let path = event.uri().path();

    let capability = match route(path, state.default_capability) {
        Some(capability) => capability,
        None => return error_response(404, format!("Unknown analysis route: {}", path)),
    };

    if event.method().as_str() != "POST" {
        return error_response(405, "Method not allowed");
    }

    let request: AnalyzeRequest = shared::parse_body!(event.body());

    info!(capability = capability.name, "Processing analysis request");

    let facade = AnalysisFacade::new(PromptFlow::new(Arc::clone(&state.client), capability));
    let envelope = facade.analyze(request.photo_data_uri.as_deref()).await;

    json_response(200, &ApiResponse::<AnalysisResult>::from(envelope))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
