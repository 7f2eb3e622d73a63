//! MCP server core.
//!
//! This module implements the MCP server lifecycle and request dispatch:
//!
//! 1. **Uninitialised**: only `initialize` is accepted; every other request
//!    fails with `InvalidRequest`
//! 2. **Initialised**: requests are routed to the tool, resource and prompt
//!    registries
//!
//! The server owns its three registries for its whole lifetime. The
//! embedding application registers entries through `add_*` methods at any
//! time, including while requests are being served, and keeps the returned
//! [`Notifier`]s to push change notifications later.

use std::io;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{CapabilitiesConfig, Config};
use crate::error::{HandlerError, McpError};
use crate::mcp::prompts::{Prompt, PromptRegistry, PromptResponse};
use crate::mcp::protocol::{
    parse_value, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, OutgoingNotification, MCP_PROTOCOL_VERSION,
};
use crate::mcp::resources::{ChangeCallback, Notifier, ResourceContents, ResourceRegistry};
use crate::mcp::tools::ToolRegistry;
use crate::mcp::transport::{OutboundQueue, StdioTransport, Transport};
use crate::schema::Schema;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    Uninitialized,
    /// Initialize received; normal operation.
    Initialized,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
    /// Resource-related capabilities.
    pub resources: ResourceCapabilities,
    /// Prompt-related capabilities.
    pub prompts: PromptCapabilities,
}

impl From<&CapabilitiesConfig> for ServerCapabilities {
    fn from(config: &CapabilitiesConfig) -> Self {
        Self {
            tools: ToolCapabilities {
                list_changed: config.tools_list_changed,
            },
            resources: ResourceCapabilities {
                subscribe: config.resources_subscribe,
                list_changed: config.resources_list_changed,
            },
            prompts: PromptCapabilities {
                list_changed: config.prompts_list_changed,
            },
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

/// Resource-specific capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapabilities {
    /// Whether clients may subscribe to resource updates.
    #[serde(skip_serializing_if = "is_false")]
    pub subscribe: bool,
    /// Whether the resource list can change during the session.
    #[serde(skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

/// Prompt-specific capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromptCapabilities {
    /// Whether the prompt list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// State shared between the server and the change callbacks it hands to
/// its registries.
struct Session {
    state: RwLock<ServerState>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: RwLock::new(ServerState::Uninitialized),
            transport: RwLock::new(None),
        }
    }

    fn is_initialized(&self) -> bool {
        *self.state.read() == ServerState::Initialized
    }

    fn send(&self, message: &Value) -> io::Result<()> {
        // Clone out so the lock is not held while the transport writes
        let transport = self.transport.read().clone();
        match transport {
            Some(transport) => transport.send(message),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "server has no transport",
            )),
        }
    }

    /// Best-effort push of a server-initiated notification.
    fn notify(&self, notification: &OutgoingNotification) {
        if !self.is_initialized() {
            tracing::debug!(method = %notification.method, "Dropping notification before initialisation");
            return;
        }

        let message = match serde_json::to_value(notification) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise notification");
                return;
            }
        };

        if let Err(e) = self.send(&message) {
            tracing::warn!(method = %notification.method, error = %e, "Failed to send notification");
        }
    }
}

/// The MCP server.
pub struct McpServer {
    /// Identity reported at initialisation.
    info: ServerInfo,
    /// Capabilities reported at initialisation.
    capabilities: ServerCapabilities,
    /// Lifecycle state and transport, shared with change callbacks.
    session: Arc<Session>,
    /// Registered tools.
    tools: ToolRegistry,
    /// Registered resources and templates.
    resources: ResourceRegistry,
    /// Registered prompts.
    prompts: PromptRegistry,
    /// URIs the client subscribed to.
    subscriptions: RwLock<IndexSet<String>>,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl McpServer {
    /// Creates a server from configuration.
    ///
    /// Resource update and prompt list notifications are only wired when
    /// the matching capability is enabled.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let capabilities = ServerCapabilities::from(&config.capabilities);
        let session = Arc::new(Session::new());

        let on_resource_change: Option<ChangeCallback> = capabilities.resources.subscribe.then(|| {
            let session = Arc::clone(&session);
            Arc::new(move |uri: &str| {
                session.notify(&OutgoingNotification::resource_updated(uri));
            }) as ChangeCallback
        });

        let on_prompt_change: Option<ChangeCallback> = capabilities.prompts.list_changed.then(|| {
            let session = Arc::clone(&session);
            Arc::new(move |_name: &str| {
                session.notify(&OutgoingNotification::prompts_list_changed());
            }) as ChangeCallback
        });

        Self {
            info: ServerInfo {
                name: config.server.name.clone(),
                version: config.server.version.clone(),
            },
            capabilities,
            session,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(on_resource_change),
            prompts: PromptRegistry::new(on_prompt_change),
            subscriptions: RwLock::new(IndexSet::new()),
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        *self.session.state.read()
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Returns the tool registry.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Returns the resource registry.
    #[must_use]
    pub const fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Returns the prompt registry.
    #[must_use]
    pub const fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Returns the URIs the client is subscribed to, in subscription order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.read().iter().cloned().collect()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a tool. See [`ToolRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or the name is taken.
    pub fn add_tool<F>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Schema,
        handler: F,
    ) -> Result<(), McpError>
    where
        F: Fn(&Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.tools.register(name, description, schema, handler)
    }

    /// Registers a static resource. See [`ResourceRegistry::register_static`].
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or the URI is taken.
    pub fn add_resource<F>(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn() -> Result<ResourceContents, HandlerError> + Send + Sync + 'static,
    {
        self.resources.register_static(uri, name, description, reader)
    }

    /// Registers a dynamic resource. See [`ResourceRegistry::register_dynamic`].
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or the prefix is taken.
    pub fn add_dynamic_resource<F>(
        &self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn(&str) -> Result<ResourceContents, HandlerError> + Send + Sync + 'static,
    {
        self.resources
            .register_dynamic(prefix, name, description, reader)
    }

    /// Registers a resource template. See [`ResourceRegistry::register_template`].
    ///
    /// # Errors
    ///
    /// Returns an error if the template is malformed or already registered.
    pub fn add_template<F>(
        &self,
        uri_template: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mime_type: Option<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn(&indexmap::IndexMap<String, String>) -> Result<ResourceContents, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.resources
            .register_template(uri_template, name, description, mime_type, reader)
    }

    /// Registers a prompt. See [`PromptRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or the name is taken.
    pub fn add_prompt<F>(&self, prompt: Prompt, handler: F) -> Result<Notifier, McpError>
    where
        F: Fn(&str, &indexmap::IndexMap<String, String>) -> Result<PromptResponse, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.prompts.register(prompt, handler)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Attaches the transport used for outbound notifications.
    pub fn start(&self, transport: Arc<dyn Transport>) {
        *self.session.transport.write() = Some(transport);
        tracing::info!(server = %self.info.name, "MCP server started");
    }

    /// Detaches the transport. Later notifications are dropped.
    pub fn close(&self) {
        if self.session.transport.write().take().is_some() {
            tracing::info!(server = %self.info.name, "MCP server closed");
        }
    }

    /// Sends a message through the attached transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport is attached or sending fails.
    pub fn send_message(&self, message: &Value) -> io::Result<()> {
        self.session.send(message)
    }

    // =========================================================================
    // Message handling
    // =========================================================================

    /// Handles one line of raw input.
    ///
    /// Returns the response to send back, if any. Unparseable input is
    /// answered with a parse error addressed to a `null` id.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse incoming message");
                Some(encode(&JsonRpcError::parse_error()))
            }
        }
    }

    /// Handles one decoded message.
    ///
    /// Returns the response for requests (always, even on failure) and
    /// `None` for notifications.
    pub fn handle_message(&self, message: Value) -> Option<Value> {
        match parse_value(message) {
            Ok(IncomingMessage::Request(req)) => Some(self.handle_request(&req)),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                None
            }
            Err(error) => {
                tracing::debug!(message = %error.error.message, "Rejected malformed envelope");
                Some(encode(&error))
            }
        }
    }

    /// Handles an incoming request.
    fn handle_request(&self, req: &JsonRpcRequest) -> Value {
        tracing::debug!(method = %req.method, id = %req.id, "Handling request");

        match self.dispatch(&req.method, req.params.as_ref()) {
            Ok(result) => encode(&JsonRpcResponse::success(req.id.clone(), result)),
            Err(e) => {
                tracing::debug!(method = %req.method, error = %e, "Request failed");
                encode(&JsonRpcError::new(Some(req.id.clone()), e.to_error_data()))
            }
        }
    }

    /// Handles an incoming notification.
    ///
    /// Notifications have no response channel, so problems are only logged.
    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                if self.session.is_initialized() {
                    tracing::debug!("Client confirmed initialisation");
                } else {
                    tracing::warn!("Received initialized notification before initialize");
                }
            }
            "notifications/cancelled" => {
                tracing::debug!(params = ?notif.params, "Client cancelled a request");
            }
            other if other.starts_with("notifications/") => {
                tracing::warn!(method = %other, "Ignoring unknown notification");
            }
            // A request method sent without an id still runs; the result is discarded
            other => match self.dispatch(other, notif.params.as_ref()) {
                Ok(_) => tracing::debug!(method = %other, "Handled request sent as notification"),
                Err(e) => {
                    tracing::warn!(method = %other, error = %e, "Request sent as notification failed");
                }
            },
        }
    }

    /// Routes a request to its handler.
    fn dispatch(&self, method: &str, params: Option<&Value>) -> Result<Value, McpError> {
        if method != "initialize" && !self.session.is_initialized() {
            return Err(McpError::InvalidRequest("server not initialized".to_string()));
        }

        match method {
            "initialize" => self.handle_initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.list() })),
            "tools/call" => self.handle_tools_call(params),
            "resources/list" => Ok(json!({ "resources": self.resources.list() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": self.resources.list_templates() }))
            }
            "resources/read" => self.handle_resources_read(params),
            "resources/subscribe" => self.handle_subscribe(params, true),
            "resources/unsubscribe" => self.handle_subscribe(params, false),
            "prompts/list" => Ok(json!({ "prompts": self.prompts.list() })),
            "prompts/get" => self.handle_prompts_get(params),
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let params: Option<InitializeParams> = params
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| McpError::InvalidParams(format!("invalid initialize params: {e}")))?;

        {
            let mut state = self.session.state.write();
            if *state == ServerState::Initialized {
                return Err(McpError::InvalidRequest(
                    "server already initialized".to_string(),
                ));
            }
            *state = ServerState::Initialized;
        }

        if let Some(params) = params {
            if let Some(ref client) = params.client_info {
                tracing::info!(
                    client = %client.name,
                    version = client.version.as_deref().unwrap_or("unknown"),
                    "Client connected"
                );
            }
            if let Some(ref requested) = params.protocol_version {
                if requested != MCP_PROTOCOL_VERSION {
                    tracing::warn!(
                        requested = %requested,
                        supported = MCP_PROTOCOL_VERSION,
                        "Client requested a different protocol version"
                    );
                }
            }
        }

        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": self.capabilities,
            "serverInfo": self.info,
        }))
    }

    /// Handles the tools/call request.
    fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let name = required_str(params, "name")?;
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .ok_or_else(|| McpError::InvalidParams("missing 'arguments'".to_string()))?;

        let tool = self.tools.get(name)?;
        let output = ToolRegistry::execute(&tool, arguments);

        serde_json::to_value(&output).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            McpError::Internal("failed to serialise result".to_string())
        })
    }

    /// Handles the resources/read request.
    fn handle_resources_read(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let uri = required_str(params, "uri")?;
        let contents = self.resources.read(uri)?;
        Ok(json!({ "contents": [contents] }))
    }

    /// Handles resources/subscribe and resources/unsubscribe.
    fn handle_subscribe(&self, params: Option<&Value>, subscribe: bool) -> Result<Value, McpError> {
        let uri = required_str(params, "uri")?;
        let mut subscriptions = self.subscriptions.write();
        if subscribe {
            subscriptions.insert(uri.to_string());
        } else {
            subscriptions.shift_remove(uri);
        }
        Ok(json!({}))
    }

    /// Handles the prompts/get request.
    fn handle_prompts_get(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let name = required_str(params, "name")?;
        let arguments = params.and_then(|p| p.get("arguments"));
        let response = self.prompts.get_content(name, arguments)?;

        serde_json::to_value(&response).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise prompt response");
            McpError::Internal("failed to serialise result".to_string())
        })
    }

    /// Runs the server over stdin/stdout until EOF or a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve_stdio(&self) -> io::Result<()> {
        let mut transport = StdioTransport::new();
        let writer = transport.spawn_writer();
        let outbound = transport.outbound();

        self.start(Arc::new(outbound.clone()));
        let result = self.run_with_shutdown(&mut transport, &outbound).await;
        self.close();

        // The writer task ends once every queue handle is gone
        drop(outbound);
        drop(transport);
        if let Some(writer) = writer {
            match writer.await {
                Ok(write_result) => write_result?,
                Err(e) => tracing::error!(error = %e, "Writer task failed"),
            }
        }

        result
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(
        &self,
        transport: &mut StdioTransport,
        outbound: &OutboundQueue,
    ) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(line_result, outbound)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(
        &self,
        transport: &mut StdioTransport,
        outbound: &OutboundQueue,
    ) -> io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(line_result, outbound)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    fn handle_transport_result(
        &self,
        line_result: io::Result<Option<String>>,
        outbound: &OutboundQueue,
    ) -> io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("stdin closed, shutting down");
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        if let Some(response) = self.handle_line(&line) {
            outbound.send(&response)?;
        }

        Ok(false)
    }
}

/// Extracts a required string member of `params`.
fn required_str<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a str, McpError> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams(format!("missing or non-string '{key}'")))
}

/// Serialises an outbound envelope.
fn encode<T: Serialize>(message: &T) -> Value {
    serde_json::to_value(message).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialise outbound message");
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32603, "message": "Internal error" }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialised() -> McpServer {
        let server = McpServer::default();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}))
            .unwrap();
        assert!(response.get("result").is_some());
        server
    }

    #[test]
    fn server_initial_state() {
        let server = McpServer::default();
        assert_eq!(server.state(), ServerState::Uninitialized);
    }

    #[test]
    fn initialize_reports_identity_and_capabilities() {
        let server = McpServer::default();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .unwrap();

        assert_eq!(server.state(), ServerState::Initialized);
        let result = &response["result"];
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "mcp-server-kit");
        assert_eq!(result["capabilities"]["resources"]["subscribe"], true);
        assert_eq!(result["capabilities"]["prompts"]["listChanged"], true);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn second_initialize_rejected() {
        let server = initialised();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"}))
            .unwrap();
        assert_eq!(response["error"]["code"], -32600);
    }

    #[test]
    fn malformed_initialize_params_rejected() {
        let server = McpServer::default();
        let response = server
            .handle_message(json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"clientInfo": "not an object"}
            }))
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(server.state(), ServerState::Uninitialized);
    }

    #[test]
    fn subscriptions_tracked() {
        let server = initialised();
        for (id, method, uri) in [
            (2, "resources/subscribe", "a://1"),
            (3, "resources/subscribe", "a://2"),
            (4, "resources/unsubscribe", "a://1"),
        ] {
            let response = server
                .handle_message(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": {"uri": uri}}))
                .unwrap();
            assert_eq!(response["result"], json!({}));
        }
        assert_eq!(server.subscriptions(), ["a://2"]);
    }

    #[test]
    fn subscribe_requires_uri() {
        let server = initialised();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 2, "method": "resources/subscribe", "params": {}}))
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);
    }

    #[test]
    fn send_without_transport_fails() {
        let server = McpServer::default();
        let err = server.send_message(&json!({})).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn capabilities_from_config() {
        let caps = ServerCapabilities::from(&CapabilitiesConfig {
            tools_list_changed: true,
            resources_subscribe: false,
            resources_list_changed: false,
            prompts_list_changed: false,
        });
        let value = serde_json::to_value(&caps).unwrap();
        assert_eq!(value["tools"]["listChanged"], true);
        assert_eq!(value["resources"], json!({}));
        assert_eq!(value["prompts"], json!({}));
    }
}
