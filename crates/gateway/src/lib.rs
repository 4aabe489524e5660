//! HTTP API gateway for Ain Bondhu.
//!
//! Four routes: the chat endpoint, session creation, a health check,
//! and intent analytics. Built on Axum.
//!
//! Security layers applied:
//! - CORS (same-origin by default; explicit origins via config)
//! - Request body size limit (1 MB)
//! - In-memory rate limiting per client
//! - HTTP trace logging

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use ainbondhu_agent::{ChatLoop, ContextManager};
use ainbondhu_core::message::{Message, ProfileId, Role};
use ainbondhu_core::store::AnalyticsRecord;
use ainbondhu_core::ConversationStore;
use ainbondhu_knowledge::KnowledgeIndex;

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// How many stored turns to fetch per request. Everything beyond the
/// context manager's verbatim window is summarization input.
const HISTORY_FETCH_FACTOR: usize = 5;

const GREETING: &str =
    "আসসালামু আলাইকুম। আমি আইন বন্ধু, আপনার আইনি সহায়ক। আপনি কি ধরনের আইনি সমস্যার মুখোমুখি?";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: Arc<ChatLoop>,
    pub context: Arc<ContextManager>,
    pub store: Arc<dyn ConversationStore>,
    pub index: Arc<KnowledgeIndex>,
    /// Turns fetched from the store per request.
    pub history_fetch: usize,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/new", post(new_session_handler))
        .route("/health", get(health_handler))
        .route("/analytics/intents", get(analytics_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the router with CORS, body limit, and rate limiting applied.
pub fn build_full_router(state: SharedState, config: &ainbondhu_config::GatewayConfig) -> Router {
    let origins: Vec<axum::http::HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_per_minute as usize,
        Duration::from_secs(60),
    ));

    build_router(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors)
}

/// Start the gateway HTTP server.
///
/// Builds the provider, knowledge index, tools, and store once and
/// shares them via Arc across all requests.
pub async fn start(config: ainbondhu_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let api_key = config
        .api_key
        .clone()
        .ok_or("No API key configured. Set AINBONDHU_API_KEY or OPENAI_API_KEY.")?;

    let provider: Arc<dyn ainbondhu_core::Provider> = Arc::new(
        ainbondhu_providers::OpenAiCompatProvider::new(
            "openai",
            config.provider.base_url.clone(),
            api_key,
            Duration::from_secs(config.provider.request_timeout_secs),
        ),
    );

    // A corrupt or missing corpus is fatal before serving.
    let index = Arc::new(KnowledgeIndex::load(&config.knowledge.data_dir)?);
    info!(
        acts = index.act_count(),
        sections = index.section_count(),
        intents = index.intent_count(),
        "Knowledge corpus loaded"
    );

    let search = Arc::new(ainbondhu_search::SemanticSearch::new(
        provider.clone(),
        index.clone(),
        config.provider.classifier_model.clone(),
        config.search.act_top_k,
        config.search.section_top_k,
        Duration::from_secs(config.search.classifier_timeout_secs),
    ));

    let tools = Arc::new(ainbondhu_tools::registry(index.clone(), search));

    let store =
        ainbondhu_store::create_store(&config.store.backend, &config.store.sqlite_path).await?;
    info!(backend = store.name(), "Conversation store ready");

    let mut chat = ChatLoop::new(
        provider.clone(),
        tools,
        config.provider.chat_model.clone(),
        config.provider.temperature,
    )
    .with_max_iterations(config.context.max_iterations);
    if let Some(max) = config.provider.max_tokens {
        chat = chat.with_max_tokens(max);
    }

    let context = ContextManager::new(
        provider,
        config.provider.classifier_model.clone(),
        config.context.history_limit,
        Duration::from_secs(config.context.summarizer_timeout_secs),
    );

    let state = Arc::new(GatewayState {
        chat: Arc::new(chat),
        context: Arc::new(context),
        store,
        index,
        history_fetch: config.context.history_limit * HISTORY_FETCH_FACTOR,
    });

    let app = build_full_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key. Thread-safe via
/// `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Evict stale entries if the map grows too large
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware. The client key is the forwarded address if
/// present, otherwise "anonymous". Returns 429 when exceeded. /health is
/// exempt so monitoring can poll it freely.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(40).collect::<String>(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

// --- Handlers ---

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    session_id: String,
    tools_used: Vec<serde_json::Value>,
    tokens_used: u32,
    model: String,
    response_time_ms: u64,
    success: bool,
}

/// One chat turn: fetch history, build the window, run the loop, store
/// both turns, log analytics. Store failures never fail the turn.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let started = Instant::now();

    let message = payload.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let session_id = payload
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ProfileId::new().to_string());

    // History is fetched before the current message is appended, so the
    // window never contains the message twice.
    let history = match state.store.history(&session_id, state.history_fetch).await {
        Ok(turns) => turns,
        Err(e) => {
            warn!(error = %e, session = %session_id, "History fetch failed, starting fresh");
            Vec::new()
        }
    };

    if let Err(e) = state.store.store_message(&session_id, Role::User, message).await {
        warn!(error = %e, session = %session_id, "Failed to store user turn");
    }

    let window = state.context.build(&history).await;
    let mut messages = window.messages;
    messages.push(Message::user(message));

    let outcome = state.chat.respond(messages).await;

    if let Err(e) = state
        .store
        .store_message(&session_id, Role::Assistant, &outcome.response)
        .await
    {
        warn!(error = %e, session = %session_id, "Failed to store assistant turn");
    }

    let response_time_ms = started.elapsed().as_millis() as u64;

    let record = AnalyticsRecord {
        profile_id: session_id.clone(),
        user_query: message.to_string(),
        intent_detected: outcome.intent_detected.clone(),
        tools_used: outcome.tools_used.clone(),
        sections_retrieved: outcome.sections_retrieved,
        tokens_used: outcome.tokens_used,
        response_time_ms,
        model: outcome.model.clone(),
        success: outcome.success,
        error_message: outcome.error_message.clone(),
    };
    if let Err(e) = state.store.log_analytics(record).await {
        warn!(error = %e, "Failed to log analytics");
    }

    info!(
        session = %session_id,
        summarized = window.summarized,
        tools = outcome.tools_used.len(),
        response_time_ms,
        success = outcome.success,
        "Chat turn served"
    );

    Ok(Json(ChatResponse {
        response: outcome.response,
        session_id,
        tools_used: outcome.tools_used,
        tokens_used: outcome.tokens_used,
        model: outcome.model,
        response_time_ms,
        success: outcome.success,
    }))
}

#[derive(Serialize)]
struct NewSessionResponse {
    session_id: String,
    greeting: &'static str,
}

async fn new_session_handler() -> Json<NewSessionResponse> {
    Json(NewSessionResponse {
        session_id: ProfileId::new().to_string(),
        greeting: GREETING,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    acts: usize,
    sections: usize,
    intents: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "ainbondhu-legal-chatbot",
        version: env!("CARGO_PKG_VERSION"),
        acts: state.index.act_count(),
        sections: state.index.section_count(),
        intents: state.index.intent_count(),
    })
}

#[derive(Serialize)]
struct AnalyticsResponse {
    success: bool,
    data: Vec<IntentCount>,
}

#[derive(Serialize)]
struct IntentCount {
    intent: String,
    count: u64,
}

async fn analytics_handler(
    State(state): State<SharedState>,
) -> Result<Json<AnalyticsResponse>, StatusCode> {
    match state.store.intent_analytics().await {
        Ok(rows) => Ok(Json(AnalyticsResponse {
            success: true,
            data: rows
                .into_iter()
                .map(|(intent, count)| IntentCount { intent, count })
                .collect(),
        })),
        Err(e) => {
            warn!(error = %e, "Intent analytics query failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainbondhu_core::error::ProviderError;
    use ainbondhu_core::provider::{ProviderRequest, ProviderResponse, Usage};
    use ainbondhu_core::{Provider, ToolRegistry};
    use ainbondhu_knowledge::Corpus;
    use ainbondhu_store::InMemoryStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct StaticProvider {
        reply: &'static str,
    }

    #[async_trait]
    impl Provider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(self.reply),
                usage: Some(Usage { prompt_tokens: 8, completion_tokens: 4, total_tokens: 12 }),
                model: "gpt-4o".into(),
            })
        }
    }

    fn test_state(reply: &'static str) -> SharedState {
        let provider: Arc<dyn Provider> = Arc::new(StaticProvider { reply });
        let index = Arc::new(KnowledgeIndex::from_corpus(Corpus::default()));
        let chat = ChatLoop::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            "gpt-4o",
            0.7,
        );
        let context = ContextManager::new(provider, "gpt-4o-mini", 10, Duration::from_secs(5));
        Arc::new(GatewayState {
            chat: Arc::new(chat),
            context: Arc::new(context),
            store: Arc::new(InMemoryStore::new()),
            index,
            history_fetch: 50,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_corpus_counts() {
        let app = build_router(test_state("unused"));

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["sections"], 0);
    }

    #[tokio::test]
    async fn chat_without_session_id_creates_one() {
        let app = build_router(test_state("আপনার অধিকার আছে।"));

        let req = post_json("/chat", serde_json::json!({"message": "ভরণপোষণ কীভাবে পাব?"}));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["response"], "আপনার অধিকার আছে।");
        assert_eq!(json["tokens_used"], 12);
        assert!(!json["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_reuses_provided_session_id() {
        let state = test_state("উত্তর");
        let app = build_router(state.clone());

        let req = post_json(
            "/chat",
            serde_json::json!({"message": "প্রশ্ন", "session_id": "s-1"}),
        );
        let response = app.oneshot(req).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["session_id"], "s-1");

        // Both turns were persisted under the session.
        let history = state.store.history("s-1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = build_router(test_state("unused"));

        let req = post_json("/chat", serde_json::json!({"message": "   "}));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let app = build_router(test_state("unused"));

        let req = post_json(
            "/chat",
            serde_json::json!({"message": "ক".repeat(MAX_MESSAGE_CHARS + 1)}),
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn new_session_returns_greeting() {
        let app = build_router(test_state("unused"));

        let req = post_json("/chat/new", serde_json::json!({}));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["greeting"].as_str().unwrap().contains("আইন বন্ধু"));
        assert!(!json["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analytics_endpoint_reflects_chats() {
        let state = test_state("উত্তর");
        let app = build_router(state.clone());

        let req = post_json("/chat", serde_json::json!({"message": "প্রশ্ন"}));
        app.oneshot(req).await.unwrap();

        let app = build_router(state);
        let req = Request::builder()
            .uri("/analytics/intents")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        // No tool was called, so no intent was detected.
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn full_router_rate_limits_clients_but_not_health() {
        let config = ainbondhu_config::GatewayConfig {
            rate_limit_per_minute: 2,
            ..Default::default()
        };
        let app = build_full_router(test_state("উত্তর"), &config);

        // Requests without X-Forwarded-For share the anonymous key.
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/chat/new", serde_json::json!({})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .clone()
            .oneshot(post_json("/chat/new", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // A different forwarded address gets its own window.
        let mut req = post_json("/chat/new", serde_json::json!({}));
        req.headers_mut()
            .insert("X-Forwarded-For", "203.0.113.7".parse().unwrap());
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // /health is exempt so monitoring can poll past the limit.
        for _ in 0..5 {
            let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn rate_limiter_allows_up_to_max_then_denies() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("client"));
        assert!(limiter.check("client"));
        assert!(limiter.check("client"));
        assert!(!limiter.check("client"));
        // A different client has its own window.
        assert!(limiter.check("other"));
    }
}
