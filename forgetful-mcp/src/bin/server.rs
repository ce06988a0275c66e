//! Stdio MCP server entry point. Reads JSON-RPC requests from stdin, one
//! per line (or LSP `Content-Length`-framed), and writes responses to
//! stdout. Logs go to stderr so they never corrupt the protocol stream.

use forgetful_core::config::Config;
use forgetful_core::embeddings::{DeterministicEmbeddingAdapter, EmbeddingAdapter};
use forgetful_core::graph::GraphTraversal;
use forgetful_core::linking::AutoLinker;
use forgetful_core::retrieval::{PipelineOptions, RetrievalPipeline};
use forgetful_core::storage::StorageBackend;
use forgetful_core::token_counter::TokenCounter;
use forgetful_core::tools::scope::parse_scopes;
use forgetful_core::tools::{ToolDispatcher, ToolRegistry};
use forgetful_core::types::UserId;
use forgetful_core::activity::ActivityBus;
use forgetful_mcp::jsonrpc::{error_codes, read_next_message, write_response, JsonRpcRequest, JsonRpcResponse};
use forgetful_mcp::{protocol, ServiceExecutor};
use serde_json::{json, Value};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Resolve the single local user this stdio server acts on behalf of.
/// MCP stdio transports have no per-request bearer token (unlike the HTTP
/// surface, spec §6); `FORGETFUL_USER_ID` picks a stable identity across
/// restarts, defaulting to the nil UUID for a brand-new local instance.
fn resolve_local_user() -> UserId {
    std::env::var("FORGETFUL_USER_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(UserId::nil())
}

async fn build_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage.backend.as_str() {
        "turso" => {
            let url = config.storage.turso_url.as_deref().unwrap_or_default();
            let storage = if let Some(token) = config.storage.turso_token.as_deref() {
                forgetful_storage_turso::TursoStorage::open_remote(url, token, config.embeddings.dimensions).await?
            } else {
                forgetful_storage_turso::TursoStorage::open_local(url, config.embeddings.dimensions).await?
            };
            Ok(Arc::new(storage))
        }
        _ => {
            let path = config.storage.redb_path.as_deref().unwrap_or("./forgetful.redb");
            let storage = forgetful_storage_redb::RedbStorage::open(Path::new(path)).await?;
            Ok(Arc::new(storage))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config_path = std::env::var("FORGETFUL_CONFIG").ok().map(std::path::PathBuf::from);
    let config = Arc::new(Config::load(config_path.as_deref())?);
    let user_id = resolve_local_user();

    let storage = build_storage(&config).await?;
    let embeddings: Arc<dyn EmbeddingAdapter> =
        Arc::new(DeterministicEmbeddingAdapter::new(config.embeddings.dimensions));
    let token_counter = Arc::new(TokenCounter::default());
    let pipeline = Arc::new(RetrievalPipeline::new(
        storage.clone(),
        embeddings.clone(),
        None,
        token_counter,
        PipelineOptions::default(),
    ));
    let linker = Arc::new(AutoLinker::new(storage.clone()));
    let graph = Arc::new(GraphTraversal::new(storage.clone()));
    let activity = ActivityBus::new(1024);

    let executor = Arc::new(ServiceExecutor {
        storage,
        embeddings,
        pipeline,
        linker,
        graph,
        config: config.clone(),
        activity,
    });

    let instance_scopes = parse_scopes(&config.scopes)?;
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), executor, instance_scopes);

    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    loop {
        let message = match read_next_message(&mut reader) {
            Ok(Some(m)) => m,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(%err, "failed reading stdin");
                break;
            }
        };

        let request: JsonRpcRequest = match serde_json::from_str(&message) {
            Ok(r) => r,
            Err(err) => {
                let response = JsonRpcResponse::failure(None, error_codes::PARSE_ERROR, err.to_string());
                write_response(&mut writer, &response)?;
                continue;
            }
        };

        let id = request.id.clone();
        let response = handle_request(&dispatcher, user_id, request).await;
        write_response(&mut writer, &JsonRpcResponse { id, ..response })?;
    }

    Ok(())
}

async fn handle_request(dispatcher: &ToolDispatcher, user_id: UserId, request: JsonRpcRequest) -> JsonRpcResponse {
    let params = request.params.unwrap_or(Value::Null);
    match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(None, protocol::initialize_result()),
        "tools/list" => JsonRpcResponse::success(None, protocol::list_tools_result()),
        "notifications/initialized" | "shutdown" => JsonRpcResponse::success(None, Value::Null),
        "tools/call" => handle_tool_call(dispatcher, user_id, &params).await,
        other => JsonRpcResponse::failure(None, error_codes::METHOD_NOT_FOUND, format!("unknown method '{other}'")),
    }
}

async fn handle_tool_call(dispatcher: &ToolDispatcher, user_id: UserId, params: &Value) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::failure(None, error_codes::INVALID_PARAMS, "missing 'name'");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    match name {
        "discover_forgetful_tools" => {
            // Per-category narrowing happens client-side off the full list;
            // the dispatcher itself only filters by effective scope.
            let summaries = dispatcher.discover(None);
            tool_success(json!({ "tools": summaries }))
        }
        "how_to_use_forgetful_tool" => {
            let Some(tool_name) = arguments.get("tool_name").and_then(Value::as_str) else {
                return JsonRpcResponse::failure(None, error_codes::INVALID_PARAMS, "missing 'tool_name'");
            };
            match dispatcher.how_to_use(None, tool_name) {
                Ok(docs) => tool_success(serde_json::to_value(docs).unwrap_or(Value::Null)),
                Err(err) => tool_error(&err),
            }
        }
        "execute_forgetful_tool" => {
            let Some(tool_name) = arguments.get("tool_name").and_then(Value::as_str).map(str::to_string) else {
                return JsonRpcResponse::failure(None, error_codes::INVALID_PARAMS, "missing 'tool_name'");
            };
            let tool_args = arguments.get("arguments").cloned().unwrap_or(json!({}));
            match dispatcher.execute(user_id, None, &tool_name, tool_args).await {
                Ok(value) => tool_success(value),
                Err(err) => tool_error(&err),
            }
        }
        other => JsonRpcResponse::failure(None, error_codes::METHOD_NOT_FOUND, format!("unknown tool '{other}'")),
    }
}

fn tool_success(value: Value) -> JsonRpcResponse {
    let text = serde_json::to_string(&value).unwrap_or_default();
    JsonRpcResponse::success(
        None,
        json!({ "content": [{ "type": "text", "text": text }], "isError": false }),
    )
}

fn tool_error(err: &forgetful_core::error::Error) -> JsonRpcResponse {
    let body = json!({ "code": err.tool_error_code(), "message": err.to_string() });
    JsonRpcResponse::success(
        None,
        json!({ "content": [{ "type": "text", "text": body.to_string() }], "isError": true }),
    )
}
