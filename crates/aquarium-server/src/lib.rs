use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use aquarium_config::{
    AppliedEdit, Category, ConfigError, Configuration, Edit, SchemaKind, SettingEntry, SheetEntry,
    Value, ValueTree,
};
use aquarium_parts::{PartsError, ResolvedGroup};
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

const MAX_EDITS: usize = 1_000;
const WS_DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);
/// Longest a pending batch waits while `set_value` messages keep arriving.
const WS_DEBOUNCE_MAX_WAIT: Duration = Duration::from_millis(250);

/// The configuration session shared by every request and socket.
#[derive(Clone)]
struct AppState {
    config: Arc<Mutex<Configuration>>,
}

pub fn app(config: Configuration) -> Router {
    let state = AppState {
        config: Arc::new(Mutex::new(config)),
    };
    Router::new()
        .route("/health", get(health))
        .route("/schema", get(schema))
        .route("/config", get(config_values))
        .route("/computed", get(computed))
        .route("/categories/{tag}", get(category))
        .route("/evaluate", post(evaluate))
        .route("/edit", post(edit))
        .route("/parts", get(parts))
        .route("/ws", get(websocket))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    formula: String,
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    edits: Vec<Edit>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsClientMessage {
    SetValue {
        schema: SchemaKind,
        name: String,
        value: Value,
    },
    Evaluate {
        formula: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EvaluateResponse {
    formula: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct EditResponse {
    applied: Vec<AppliedEdit>,
}

#[derive(Debug, Serialize)]
struct CategoryEntry {
    schema: SchemaKind,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsServerMessage {
    Applied {
        edits: Vec<AppliedEdit>,
        computed: Vec<SheetEntry>,
    },
    Value {
        formula: String,
        value: f64,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn payload_too_large(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownCategory { .. } => Self::not_found(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<PartsError> for ApiError {
    fn from(err: PartsError) -> Self {
        match err {
            PartsError::Config(err) => err.into(),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn schema(State(state): State<AppState>) -> Result<Json<Vec<SettingEntry>>, ApiError> {
    let config = state.config.lock().await;
    Ok(Json(config.settings()?))
}

async fn config_values(State(state): State<AppState>) -> Result<Json<ValueTree>, ApiError> {
    let config = state.config.lock().await;
    Ok(Json(config.values()?))
}

async fn computed(State(state): State<AppState>) -> Result<Json<Vec<SheetEntry>>, ApiError> {
    let config = state.config.lock().await;
    Ok(Json(config.computed_sheet()?))
}

async fn category(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<CategoryEntry>>, ApiError> {
    let category: Category = tag.parse()?;
    let config = state.config.lock().await;
    let entries = config
        .category(category)
        .iter()
        .map(|(schema, name)| CategoryEntry {
            schema: *schema,
            name: name.clone(),
        })
        .collect();
    Ok(Json(entries))
}

async fn evaluate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let request: EvaluateRequest = parse_json(&body)?;
    let config = state.config.lock().await;
    let value = config.evaluate(&request.formula)?;
    Ok(Json(EvaluateResponse {
        formula: request.formula,
        value,
    }))
}

async fn edit(State(state): State<AppState>, body: Bytes) -> Result<Json<EditResponse>, ApiError> {
    let request: EditRequest = parse_json(&body)?;
    if request.edits.len() > MAX_EDITS {
        return Err(ApiError::payload_too_large(format!(
            "edit batch exceeds the {MAX_EDITS} edit limit"
        )));
    }
    let mut config = state.config.lock().await;
    let applied = config.apply_edits(&request.edits)?;
    Ok(Json(EditResponse { applied }))
}

/// Generates on a copy of the session so reading parts leaves the shared
/// flange count untouched.
async fn parts(State(state): State<AppState>) -> Result<Json<Vec<ResolvedGroup>>, ApiError> {
    let mut config = state.config.lock().await.clone();
    let assembly = aquarium_parts::generate(&mut config)?;
    Ok(Json(assembly.resolve(&config)?))
}

async fn websocket(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Pending `set_value` requests; a later value for the same setting wins.
type PendingEdits = BTreeMap<(SchemaKind, String), Value>;

async fn handle_websocket(mut socket: WebSocket, state: AppState) {
    let mut pending = PendingEdits::new();
    let mut debounce_timer: Option<Pin<Box<tokio::time::Sleep>>> = None;
    let mut batch_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = debounce_elapsed(&mut debounce_timer), if debounce_timer.is_some() => {
                if flush_pending_edits(&mut socket, &state, &mut pending).await.is_err() {
                    break;
                }
                debounce_timer = None;
                batch_deadline = None;
            }
            message = socket.recv() => {
                let Some(message) = message else {
                    break;
                };

                match message {
                    Ok(Message::Text(text)) => {
                        if handle_ws_text_message(
                            &mut socket,
                            &state,
                            text.as_str(),
                            &mut pending,
                            &mut debounce_timer,
                            &mut batch_deadline,
                        )
                        .await
                        .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        if send_ws_error(&mut socket, "binary messages are not supported")
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => break,
                    Err(_) => break,
                }
            }
        }
    }
}

async fn debounce_elapsed(timer: &mut Option<Pin<Box<tokio::time::Sleep>>>) {
    if let Some(timer) = timer.as_mut() {
        timer.await;
    }
}

async fn handle_ws_text_message(
    socket: &mut WebSocket,
    state: &AppState,
    raw_message: &str,
    pending: &mut PendingEdits,
    debounce_timer: &mut Option<Pin<Box<tokio::time::Sleep>>>,
    batch_deadline: &mut Option<Instant>,
) -> Result<(), ()> {
    let message: WsClientMessage = match serde_json::from_str(raw_message) {
        Ok(message) => message,
        Err(err) => {
            send_ws_error(socket, format!("invalid message: {err}")).await?;
            return Ok(());
        }
    };

    match message {
        WsClientMessage::SetValue {
            schema,
            name,
            value,
        } => {
            pending.insert((schema, name), value);
            let now = Instant::now();
            let deadline = *batch_deadline.get_or_insert(now + WS_DEBOUNCE_MAX_WAIT);
            let fire_at = (now + WS_DEBOUNCE_WINDOW).min(deadline);
            *debounce_timer = Some(Box::pin(tokio::time::sleep_until(fire_at)));
            Ok(())
        }
        WsClientMessage::Evaluate { formula } => {
            let result = state.config.lock().await.evaluate(&formula);
            match result {
                Ok(value) => send_ws_message(socket, WsServerMessage::Value { formula, value }).await,
                Err(err) => send_ws_error(socket, err.to_string()).await,
            }
        }
    }
}

/// Applies every pending value as one batch and reports the outcome.
async fn flush_pending_edits(
    socket: &mut WebSocket,
    state: &AppState,
    pending: &mut PendingEdits,
) -> Result<(), ()> {
    if pending.is_empty() {
        return Ok(());
    }
    let edits: Vec<Edit> = std::mem::take(pending)
        .into_iter()
        .map(|((schema, name), value)| Edit::new(schema, &name, value))
        .collect();
    debug!(edits = edits.len(), "flushing debounced edits");

    let outcome = {
        let mut config = state.config.lock().await;
        config
            .apply_edits(&edits)
            .and_then(|applied| Ok((applied, config.computed_sheet()?)))
    };
    match outcome {
        Ok((edits, computed)) => {
            send_ws_message(socket, WsServerMessage::Applied { edits, computed }).await
        }
        Err(err) => {
            warn!(error = %err, "websocket edit batch refused");
            send_ws_error(socket, err.to_string()).await
        }
    }
}

async fn send_ws_error(socket: &mut WebSocket, message: impl Into<String>) -> Result<(), ()> {
    send_ws_message(
        socket,
        WsServerMessage::Error {
            message: message.into(),
        },
    )
    .await
}

async fn send_ws_message(socket: &mut WebSocket, message: WsServerMessage) -> Result<(), ()> {
    let payload = serde_json::to_string(&message).map_err(|_| ())?;
    socket
        .send(Message::Text(payload.into()))
        .await
        .map_err(|_| ())
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body is required"));
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("invalid JSON body: {err}")))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use aquarium_config::Configuration;
    use axum::Router;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, ORIGIN};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use futures::{SinkExt, StreamExt};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
    use tower::ServiceExt;

    use super::{EvaluateResponse, HealthResponse, MAX_EDITS, app};

    type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    fn test_app() -> Router {
        app(Configuration::new().expect("configuration should open"))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = get(test_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: HealthResponse = parse_json_response(response).await;
        assert_eq!(payload.status, "ok");
    }

    #[tokio::test]
    async fn schema_lists_settings_with_editors() {
        let response = get(test_app(), "/schema").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_value(response).await;
        let width = body
            .as_array()
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|entry| entry["schema"] == "Config" && entry["name"] == "Width")
            })
            .expect("width should be listed");
        assert_eq!(width["value"], 1200.0);
        assert_eq!(width["editor"]["widget"], "integer_spin");
    }

    #[tokio::test]
    async fn evaluate_returns_snapshot_value() {
        let response = send_json(
            test_app(),
            Method::POST,
            "/evaluate",
            json!({"formula": "Computed.Width/2"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: EvaluateResponse = parse_json_response(response).await;
        assert!((payload.value - 585.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn evaluate_unknown_reference_returns_400() {
        let response = send_json(
            test_app(),
            Method::POST,
            "/evaluate",
            json!({"formula": "Computed.Nope+1"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_value(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("Nope"));
    }

    #[tokio::test]
    async fn edit_applies_batch_and_updates_computed() {
        let router = test_app();
        let response = send_json(
            router.clone(),
            Method::POST,
            "/edit",
            json!({"edits": [
                {"schema": "Config", "name": "Width", "value": 800.0},
                {"schema": "Config", "name": "Length", "value": 580.0}
            ]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_value(response).await;
        let applied = body["applied"].as_array().expect("applied list");
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0]["old"], 1200.0);
        assert_eq!(applied[0]["new"], 800.0);

        let response = get(router.clone(), "/config").await;
        let body = parse_json_value(response).await;
        assert_eq!(body["Config"]["Width"], 800.0);

        let response = get(router, "/computed").await;
        let body = parse_json_value(response).await;
        let width = body
            .as_array()
            .and_then(|entries| entries.iter().find(|entry| entry["name"] == "Width"))
            .expect("computed width");
        assert_eq!(width["value"], 770.0);
    }

    #[tokio::test]
    async fn refused_edit_leaves_state_untouched() {
        let router = test_app();
        let response = send_json(
            router.clone(),
            Method::POST,
            "/edit",
            json!({"edits": [
                {"schema": "Config", "name": "Width", "value": 800.0},
                {"schema": "Config", "name": "Length", "value": 5.0}
            ]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_value(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("Config.Length"));

        let body = parse_json_value(get(router, "/config").await).await;
        assert_eq!(body["Config"]["Width"], 1200.0);
    }

    #[tokio::test]
    async fn oversized_edit_batch_returns_413() {
        let edits: Vec<_> = (0..=MAX_EDITS)
            .map(|_| json!({"schema": "Config", "name": "Width", "value": 1000.0}))
            .collect();
        let response = send_json(test_app(), Method::POST, "/edit", json!({ "edits": edits })).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn edit_empty_body_returns_400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/edit")
            .body(Body::empty())
            .expect("request should build");
        let response = test_app()
            .oneshot(request)
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_value(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap_or_default()
                .contains("request body")
        );
    }

    #[tokio::test]
    async fn categories_list_members_and_reject_unknown_tags() {
        let response = get(test_app(), "/categories/canopy").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_value(response).await;
        assert!(
            body.as_array()
                .is_some_and(|entries| entries.iter().any(|entry| entry["name"] == "CanopyHeight"))
        );

        let response = get(test_app(), "/categories/roof").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn parts_resolve_every_group() {
        let response = get(test_app(), "/parts").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_value(response).await;
        let groups = body.as_array().expect("groups");
        assert_eq!(groups[0]["name"], "StandStructure");
        assert!(groups.iter().any(|group| group["name"] == "ClosedLoop"));
    }

    #[tokio::test]
    async fn reading_parts_leaves_the_session_unchanged() {
        let router = test_app();
        let response = get(router.clone(), "/parts").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send_json(
            router,
            Method::POST,
            "/evaluate",
            json!({"formula": "Computed.FlangeCount"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_value(response).await;
        assert_eq!(body["value"], 0.0);
    }

    #[tokio::test]
    async fn cors_headers_are_present() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .header(ORIGIN, "https://example.com")
            .body(Body::empty())
            .expect("request should build");
        let response = test_app()
            .oneshot(request)
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);
        let allow_origin = response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert_eq!(allow_origin, "*");
    }

    #[tokio::test]
    async fn websocket_rapid_set_value_is_debounced_into_one_batch() {
        let Some((addr, server)) = spawn_test_server().await else {
            return;
        };
        let mut socket = connect_ws(addr).await;

        for width in [900.0, 950.0, 1000.0] {
            send_ws_json(
                &mut socket,
                json!({"type": "set_value", "schema": "Config", "name": "Width", "value": width}),
            )
            .await;
        }
        send_ws_json(
            &mut socket,
            json!({"type": "set_value", "schema": "Config", "name": "Length", "value": 600.0}),
        )
        .await;

        let message = recv_ws_json(&mut socket, Duration::from_secs(3))
            .await
            .expect("applied message should arrive");
        assert_eq!(message["type"], "applied");
        let edits = message["edits"].as_array().expect("edits");
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().any(|edit| edit["name"] == "Width" && edit["new"] == 1000.0));
        let width = message["computed"]
            .as_array()
            .and_then(|entries| entries.iter().find(|entry| entry["name"] == "Width"))
            .expect("computed width");
        assert_eq!(width["value"], 970.0);

        let extra = recv_ws_json(&mut socket, Duration::from_millis(250)).await;
        assert!(extra.is_none(), "expected a single batch, got {extra:?}");
        shutdown_ws_test(socket, server).await;
    }

    #[tokio::test]
    async fn websocket_steady_stream_still_flushes() {
        let Some((addr, server)) = spawn_test_server().await else {
            return;
        };
        let mut socket = connect_ws(addr).await;

        let mut applied = None;
        for step in 0..40 {
            send_ws_json(
                &mut socket,
                json!({"type": "set_value", "schema": "Config", "name": "Width", "value": 900.0 + f64::from(step) * 10.0}),
            )
            .await;
            if let Some(message) = recv_ws_json(&mut socket, Duration::from_millis(20)).await {
                applied = Some(message);
                break;
            }
        }
        let applied = applied.expect("a batch should flush while values keep arriving");
        assert_eq!(applied["type"], "applied");
        shutdown_ws_test(socket, server).await;
    }

    #[tokio::test]
    async fn websocket_errors_keep_the_connection_open() {
        let Some((addr, server)) = spawn_test_server().await else {
            return;
        };
        let mut socket = connect_ws(addr).await;

        send_ws_json(
            &mut socket,
            json!({"type": "set_value", "schema": "Config", "name": "Widht", "value": 900.0}),
        )
        .await;
        let error = recv_ws_json(&mut socket, Duration::from_secs(3))
            .await
            .expect("error should arrive");
        assert_eq!(error["type"], "error");
        assert!(
            error["message"]
                .as_str()
                .unwrap_or_default()
                .contains("unknown setting Config.Widht")
        );

        send_ws_json(&mut socket, json!({"type": "evaluate", "formula": "Computed.Width"})).await;
        let value = recv_ws_json(&mut socket, Duration::from_secs(3))
            .await
            .expect("value should arrive");
        assert_eq!(value["type"], "value");
        assert_eq!(value["value"], 1170.0);
        shutdown_ws_test(socket, server).await;
    }

    async fn get(router: Router, uri: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        router
            .oneshot(request)
            .await
            .expect("request should complete")
    }

    async fn send_json(
        router: Router,
        method: Method,
        uri: &str,
        value: serde_json::Value,
    ) -> Response {
        let body = serde_json::to_vec(&value).expect("json encoding should succeed");
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request should build");
        router
            .oneshot(request)
            .await
            .expect("request should complete")
    }

    async fn spawn_test_server() -> Option<(SocketAddr, JoinHandle<()>)> {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                eprintln!(
                    "skipping websocket test: local socket bind not permitted in this environment ({err})"
                );
                return None;
            }
            Err(err) => panic!("listener should bind: {err}"),
        };
        let addr = listener
            .local_addr()
            .expect("listener should expose address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, test_app())
                .await
                .expect("test server should run");
        });
        Some((addr, handle))
    }

    async fn connect_ws(addr: SocketAddr) -> Socket {
        let url = format!("ws://{addr}/ws");
        let (socket, _response) = connect_async(&url)
            .await
            .expect("websocket client should connect");
        socket
    }

    async fn send_ws_json(socket: &mut Socket, value: serde_json::Value) {
        socket
            .send(WsMessage::Text(value.to_string().into()))
            .await
            .expect("websocket send should succeed");
    }

    async fn recv_ws_json(socket: &mut Socket, timeout_duration: Duration) -> Option<serde_json::Value> {
        loop {
            let message = timeout(timeout_duration, socket.next()).await.ok()??.ok()?;
            match message {
                WsMessage::Text(text) => return serde_json::from_str(text.as_ref()).ok(),
                WsMessage::Binary(bytes) => return serde_json::from_slice(&bytes).ok(),
                WsMessage::Ping(payload) => {
                    socket.send(WsMessage::Pong(payload)).await.ok()?;
                }
                WsMessage::Pong(_) => {}
                WsMessage::Close(_) => return None,
                WsMessage::Frame(_) => {}
            }
        }
    }

    async fn shutdown_ws_test(mut socket: Socket, server: JoinHandle<()>) {
        let _ = socket.close(None).await;
        server.abort();
        let _ = server.await;
    }

    async fn parse_json_response<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = read_body_bytes(response).await;
        serde_json::from_slice(&bytes).expect("response should decode as JSON")
    }

    async fn parse_json_value(response: Response) -> serde_json::Value {
        let bytes = read_body_bytes(response).await;
        serde_json::from_slice(&bytes).expect("response should decode as JSON")
    }

    async fn read_body_bytes(response: Response) -> axum::body::Bytes {
        response
            .into_body()
            .collect()
            .await
            .expect("response body should collect")
            .to_bytes()
    }
}
