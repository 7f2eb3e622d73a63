//! Tool registry.
//!
//! Tools are named, schema-validated callables. Argument validation failures
//! and handler errors are reported to the client as tool output with
//! `isError: true`, not as JSON-RPC errors, so the calling model can see the
//! problem and retry.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::{call_handler, HandlerError, McpError};
use crate::schema::{Schema, SchemaKind};

/// Callback invoked with validated tool arguments.
pub type ToolHandler = Arc<dyn Fn(&Value) -> Result<Value, HandlerError> + Send + Sync>;

/// A tool definition for tools/list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// What a tool call produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    /// A result envelope built by the registry.
    Result(ToolCallResult),
    /// A handler result that was already an MCP content envelope.
    Passthrough(Value),
}

impl ToolOutput {
    /// Returns whether this output reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        match self {
            Self::Result(result) => result.is_error,
            Self::Passthrough(value) => value
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Wraps a raw handler result.
    ///
    /// Objects carrying `content` or `_meta` pass through untouched; anything
    /// else becomes a single text item.
    fn from_handler_result(value: Value) -> Self {
        let preformatted = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("content") || obj.contains_key("_meta"));

        if preformatted {
            return Self::Passthrough(value);
        }

        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self::Result(ToolCallResult::text(text))
    }
}

/// A registered tool.
pub struct Tool {
    name: String,
    description: String,
    schema: Schema,
    handler: ToolHandler,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Tool {
    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the listing entry for this tool.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_document(),
        }
    }
}

/// Thread-safe, insertion-ordered collection of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, Arc<Tool>>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidDefinition`] if the name or description is empty,
    ///   or the input schema is not an object schema
    /// - [`McpError::AlreadyExists`] if the name is taken
    pub fn register<F>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Schema,
        handler: F,
    ) -> Result<(), McpError>
    where
        F: Fn(&Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        let name = name.into();
        let description = description.into();

        if name.is_empty() {
            return Err(invalid_definition("name cannot be empty"));
        }
        if description.is_empty() {
            return Err(invalid_definition("description cannot be empty"));
        }
        if !matches!(schema.kind(), SchemaKind::Object(_)) {
            return Err(invalid_definition("input schema must be an object schema"));
        }

        let mut tools = self.tools.write();
        if tools.contains_key(&name) {
            return Err(McpError::AlreadyExists { kind: "Tool", name });
        }

        tracing::debug!(tool = %name, "Registered tool");
        tools.insert(
            name.clone(),
            Arc::new(Tool {
                name,
                description,
                schema,
                handler: Arc::new(handler),
            }),
        );
        Ok(())
    }

    /// Looks up a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::NotFound`] if no tool has that name.
    pub fn get(&self, name: &str) -> Result<Arc<Tool>, McpError> {
        self.tools
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| McpError::NotFound {
                kind: "Tool",
                name: name.to_string(),
            })
    }

    /// Lists tools in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.read().values().map(|tool| tool.definition()).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Validates `arguments` and runs the tool's handler.
    ///
    /// Never fails at the protocol level: validation and handler errors come
    /// back as an output with `isError: true`.
    pub fn execute(tool: &Tool, arguments: &Value) -> ToolOutput {
        if let Err(e) = tool.schema.validate(arguments) {
            tracing::debug!(tool = %tool.name, error = %e, "Tool arguments rejected");
            return ToolOutput::Result(ToolCallResult::error(format!(
                "Invalid arguments for tool '{}': {e}",
                tool.name
            )));
        }

        match call_handler(|| (tool.handler)(arguments)) {
            Ok(value) => ToolOutput::from_handler_result(value),
            Err(e) => {
                tracing::warn!(tool = %tool.name, error = %e, "Tool handler failed");
                ToolOutput::Result(ToolCallResult::error(format!(
                    "Tool '{}' failed: {e}",
                    tool.name
                )))
            }
        }
    }

    /// Looks up a tool and executes it.
    ///
    /// The registry lock is released before the handler runs.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::NotFound`] if no tool has that name.
    pub fn call(&self, name: &str, arguments: &Value) -> Result<ToolOutput, McpError> {
        let tool = self.get(name)?;
        Ok(Self::execute(&tool, arguments))
    }
}

fn invalid_definition(reason: &str) -> McpError {
    McpError::InvalidDefinition {
        kind: "tool",
        reason: reason.to_string(),
    }
}
