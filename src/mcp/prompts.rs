//! Prompt registry.
//!
//! A prompt is a named, argument-parameterised generator of messages.
//! Required arguments are checked before the handler runs; a handler that
//! returns no messages is treated as a server-side failure.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::{call_handler, HandlerError, McpError};
use crate::mcp::resources::{ChangeCallback, Notifier};

/// Callback producing a prompt response from the prompt name and its
/// string arguments.
pub type PromptHandler = Arc<
    dyn Fn(&str, &IndexMap<String, String>) -> Result<PromptResponse, HandlerError> + Send + Sync,
>;

/// A declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// A prompt definition, as listed by prompts/list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared arguments, in order.
    pub arguments: Vec<PromptArgument>,
}

impl Prompt {
    /// Creates a prompt without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
        }
    }

    /// Declares an argument.
    #[must_use]
    pub fn argument(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.arguments.push(PromptArgument {
            name: name.into(),
            description: description.into(),
            required,
        });
        self
    }
}

/// Who a prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Assistant,
}

/// A resource embedded inline in a prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedResource {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    pub mime_type: String,
    /// Inline text.
    pub text: String,
}

/// The content of a prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A base64-encoded image.
    Image {
        /// Base64 image data.
        data: String,
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// An embedded resource.
    Resource {
        /// The resource.
        resource: EmbeddedResource,
    },
}

/// One message of a prompt response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// Message role.
    pub role: Role,
    /// Message content.
    pub content: PromptContent,
}

impl PromptMessage {
    /// Creates a message.
    #[must_use]
    pub const fn new(role: Role, content: PromptContent) -> Self {
        Self { role, content }
    }

    /// Creates a user text message.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, PromptContent::Text { text: text.into() })
    }

    /// Creates an assistant text message.
    #[must_use]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, PromptContent::Text { text: text.into() })
    }
}

/// A generated prompt, as returned by prompts/get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptResponse {
    /// Description of this particular rendering.
    pub description: String,
    /// Messages in conversation order.
    pub messages: Vec<PromptMessage>,
}

struct RegisteredPrompt {
    prompt: Prompt,
    handler: PromptHandler,
}

/// Thread-safe, insertion-ordered collection of prompts.
pub struct PromptRegistry {
    prompts: RwLock<IndexMap<String, Arc<RegisteredPrompt>>>,
    on_change: Option<ChangeCallback>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PromptRegistry {
    /// Creates an empty registry.
    ///
    /// `on_change` receives the prompt name whenever a notifier returned by
    /// this registry fires.
    #[must_use]
    pub fn new(on_change: Option<ChangeCallback>) -> Self {
        Self {
            prompts: RwLock::new(IndexMap::new()),
            on_change,
        }
    }

    /// Registers a prompt.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidDefinition`] if the prompt name or an argument
    ///   name is empty, or an argument is declared twice
    /// - [`McpError::AlreadyExists`] if the name is taken
    pub fn register<F>(&self, prompt: Prompt, handler: F) -> Result<Notifier, McpError>
    where
        F: Fn(&str, &IndexMap<String, String>) -> Result<PromptResponse, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        if prompt.name.is_empty() {
            return Err(invalid_definition("name cannot be empty".to_string()));
        }
        for (index, argument) in prompt.arguments.iter().enumerate() {
            if argument.name.is_empty() {
                return Err(invalid_definition(format!(
                    "argument {index} of '{}' has an empty name",
                    prompt.name
                )));
            }
            if prompt.arguments[..index]
                .iter()
                .any(|earlier| earlier.name == argument.name)
            {
                return Err(invalid_definition(format!(
                    "argument '{}' of '{}' is declared twice",
                    argument.name, prompt.name
                )));
            }
        }

        let mut prompts = self.prompts.write();
        if prompts.contains_key(&prompt.name) {
            return Err(McpError::AlreadyExists {
                kind: "Prompt",
                name: prompt.name,
            });
        }

        tracing::debug!(prompt = %prompt.name, "Registered prompt");
        let notifier = Notifier::new(self.on_change.clone(), prompt.name.clone());
        prompts.insert(
            prompt.name.clone(),
            Arc::new(RegisteredPrompt {
                prompt,
                handler: Arc::new(handler),
            }),
        );
        Ok(notifier)
    }

    /// Lists prompts in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Prompt> {
        self.prompts
            .read()
            .values()
            .map(|entry| entry.prompt.clone())
            .collect()
    }

    /// Renders a prompt.
    ///
    /// `arguments` is the request's `arguments` member; non-string values
    /// in it are ignored.
    ///
    /// # Errors
    ///
    /// - [`McpError::NotFound`] if the prompt is unknown
    /// - [`McpError::InvalidParams`] if a required argument is missing
    /// - [`McpError::Internal`] if the handler fails or returns no messages
    pub fn get_content(
        &self,
        name: &str,
        arguments: Option<&Value>,
    ) -> Result<PromptResponse, McpError> {
        let entry = self
            .prompts
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| McpError::NotFound {
                kind: "Prompt",
                name: name.to_string(),
            })?;

        let arguments = extract_arguments(arguments);

        if let Some(missing) = entry
            .prompt
            .arguments
            .iter()
            .find(|declared| declared.required && !arguments.contains_key(&declared.name))
        {
            return Err(McpError::InvalidParams(format!(
                "missing required argument '{}' for prompt '{name}'",
                missing.name
            )));
        }

        let response = call_handler(|| (entry.handler)(name, &arguments)).map_err(|e| {
            tracing::warn!(prompt = %name, error = %e, "Prompt handler failed");
            McpError::Internal(format!("prompt '{name}' failed: {e}"))
        })?;

        if response.messages.is_empty() {
            return Err(McpError::Internal(format!(
                "prompt '{name}' produced no messages"
            )));
        }

        Ok(response)
    }
}

/// Keeps the string-valued members of an `arguments` object.
fn extract_arguments(arguments: Option<&Value>) -> IndexMap<String, String> {
    arguments
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(key, value)| value.as_str().map(|s| (key.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn invalid_definition(reason: String) -> McpError {
    McpError::InvalidDefinition {
        kind: "prompt",
        reason,
    }
}
