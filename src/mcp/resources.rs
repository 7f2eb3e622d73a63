//! Resource registry.
//!
//! Resources are addressed by URI and come in three flavours:
//!
//! - **Static**: an exact URI with a zero-argument reader
//! - **Dynamic**: a URI prefix; the reader receives the remainder of the URI
//! - **Template**: an RFC 6570 style template such as
//!   `users/{id}/repos/{repo}`; the reader receives the bound parameters
//!
//! # Matching
//!
//! `read` tries static entries first (exact match), then dynamic entries in
//! order of descending prefix length, so `a/b/` wins over `a/` for `a/b/x`.
//! Templates are only tried when no entry matched, in registration order.
//! Each placeholder matches one or more characters other than `/`.

use std::cmp::Reverse;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use indexmap::IndexMap;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{call_handler, HandlerError, McpError};

/// Callback invoked with a resource key when that resource changes.
pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Reader for a static resource.
pub type StaticReader = Arc<dyn Fn() -> Result<ResourceContents, HandlerError> + Send + Sync>;

/// Reader for a dynamic resource; receives the URI remainder after the prefix.
pub type DynamicReader =
    Arc<dyn Fn(&str) -> Result<ResourceContents, HandlerError> + Send + Sync>;

/// Reader for a templated resource; receives the bound template parameters.
pub type TemplateReader = Arc<
    dyn Fn(&IndexMap<String, String>) -> Result<ResourceContents, HandlerError> + Send + Sync,
>;

/// Signals a change to whoever the registry reports changes to.
///
/// Returned by every registration. It holds the registry's change callback
/// and the key of the registered item, never a reference into the registry.
#[derive(Clone)]
pub struct Notifier {
    callback: Option<ChangeCallback>,
    key: String,
}

impl Notifier {
    pub(crate) const fn new(callback: Option<ChangeCallback>, key: String) -> Self {
        Self { callback, key }
    }

    /// Reports a change. A no-op when the registry has no change callback.
    pub fn notify(&self) {
        if let Some(ref callback) = self.callback {
            callback(&self.key);
        }
    }

    /// Returns the URI, template or name this notifier reports.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("key", &self.key)
            .field("connected", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    Text(String),
    Blob(Vec<u8>),
}

/// The result of reading a resource.
///
/// The URI is stamped by the registry after the reader returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContents {
    uri: String,
    mime_type: String,
    payload: Payload,
}

impl ResourceContents {
    /// Creates text contents.
    #[must_use]
    pub fn text(mime_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: String::new(),
            mime_type: mime_type.into(),
            payload: Payload::Text(text.into()),
        }
    }

    /// Creates binary contents, serialised as base64.
    #[must_use]
    pub fn blob(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            uri: String::new(),
            mime_type: mime_type.into(),
            payload: Payload::Blob(bytes.into()),
        }
    }

    /// Returns the resolved URI (empty until read through the registry).
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self.payload {
            Payload::Text(ref text) => Some(text),
            Payload::Blob(_) => None,
        }
    }

    /// Returns the binary payload, if any.
    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self.payload {
            Payload::Blob(ref bytes) => Some(bytes),
            Payload::Text(_) => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentsWire<'a> {
    uri: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blob: Option<String>,
}

impl Serialize for ResourceContents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ContentsWire {
            uri: &self.uri,
            mime_type: &self.mime_type,
            text: self.as_text(),
            blob: self.as_blob().map(|bytes| BASE64_STANDARD.encode(bytes)),
        }
        .serialize(serializer)
    }
}

/// A resource entry for resources/list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDefinition {
    /// Resource URI; dynamic entries end with `*`.
    pub uri: String,
    /// Resource name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// A template entry for resources/templates/list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDefinition {
    /// The URI template.
    pub uri_template: String,
    /// Template name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// MIME type of the produced contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Clone)]
enum ResourceEntry {
    Static {
        uri: String,
        name: String,
        description: String,
        reader: StaticReader,
    },
    Dynamic {
        prefix: String,
        name: String,
        description: String,
        reader: DynamicReader,
    },
}

impl ResourceEntry {
    /// Statics first, then dynamics by descending prefix length.
    fn sort_key(&self) -> (u8, Reverse<usize>) {
        match self {
            Self::Static { .. } => (0, Reverse(0)),
            Self::Dynamic { prefix, .. } => (1, Reverse(prefix.len())),
        }
    }

    fn definition(&self) -> ResourceDefinition {
        match self {
            Self::Static {
                uri,
                name,
                description,
                ..
            } => ResourceDefinition {
                uri: uri.clone(),
                name: name.clone(),
                description: description.clone(),
            },
            Self::Dynamic {
                prefix,
                name,
                description,
                ..
            } => ResourceDefinition {
                uri: format!("{prefix}*"),
                name: name.clone(),
                description: description.clone(),
            },
        }
    }
}

struct ResourceTemplate {
    uri_template: String,
    name: String,
    description: String,
    mime_type: Option<String>,
    matcher: Regex,
    params: Vec<String>,
    reader: TemplateReader,
}

impl ResourceTemplate {
    fn bind(&self, uri: &str) -> Option<IndexMap<String, String>> {
        let captures = self.matcher.captures(uri)?;
        Some(
            self.params
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, value)| value.map(|v| (name.clone(), v.as_str().to_string())))
                .collect(),
        )
    }

    fn definition(&self) -> ResourceTemplateDefinition {
        ResourceTemplateDefinition {
            uri_template: self.uri_template.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Compiles a URI template into an anchored matcher and its parameter names.
fn compile_template(template: &str) -> Result<(Regex, Vec<String>), McpError> {
    let mut pattern = String::from("^");
    let mut params: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, after) = rest.split_at(open);
        if literal.contains('}') {
            return Err(invalid_definition("template", "unbalanced '}'"));
        }
        pattern.push_str(&regex::escape(literal));

        let close = after
            .find('}')
            .ok_or_else(|| invalid_definition("template", "unclosed placeholder"))?;
        let name = &after[1..close];
        if name.is_empty() || name.contains('{') {
            return Err(invalid_definition(
                "template",
                &format!("malformed placeholder '{{{name}}}'"),
            ));
        }
        if params.iter().any(|p| p == name) {
            return Err(invalid_definition(
                "template",
                &format!("duplicate placeholder '{{{name}}}'"),
            ));
        }

        params.push(name.to_string());
        pattern.push_str("([^/]+)");
        rest = &after[close + 1..];
    }

    if rest.contains('}') {
        return Err(invalid_definition("template", "unbalanced '}'"));
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    let matcher = Regex::new(&pattern)
        .map_err(|e| invalid_definition("template", &format!("cannot compile matcher: {e}")))?;
    Ok((matcher, params))
}

fn invalid_definition(kind: &'static str, reason: &str) -> McpError {
    McpError::InvalidDefinition {
        kind,
        reason: reason.to_string(),
    }
}

fn check_identity(kind: &'static str, key: &str, name: &str) -> Result<(), McpError> {
    if key.is_empty() {
        return Err(invalid_definition(kind, "URI cannot be empty"));
    }
    if name.is_empty() {
        return Err(invalid_definition(kind, "name cannot be empty"));
    }
    Ok(())
}

enum Matched {
    Static(StaticReader),
    Dynamic(DynamicReader, String),
    Template(TemplateReader, IndexMap<String, String>),
}

/// Thread-safe collection of static, dynamic and templated resources.
pub struct ResourceRegistry {
    entries: RwLock<Vec<ResourceEntry>>,
    templates: RwLock<Vec<Arc<ResourceTemplate>>>,
    on_change: Option<ChangeCallback>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ResourceRegistry {
    /// Creates an empty registry.
    ///
    /// `on_change` receives the URI (or template) whenever a notifier
    /// returned by this registry fires.
    #[must_use]
    pub fn new(on_change: Option<ChangeCallback>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            templates: RwLock::new(Vec::new()),
            on_change,
        }
    }

    fn notifier(&self, key: &str) -> Notifier {
        Notifier::new(self.on_change.clone(), key.to_string())
    }

    /// Registers a resource at an exact URI.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidDefinition`] if the URI or name is empty
    /// - [`McpError::AlreadyExists`] if the URI is already registered
    pub fn register_static<F>(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn() -> Result<ResourceContents, HandlerError> + Send + Sync + 'static,
    {
        let uri = uri.into();
        let name = name.into();
        check_identity("resource", &uri, &name)?;

        let mut entries = self.entries.write();
        let taken = entries
            .iter()
            .any(|e| matches!(e, ResourceEntry::Static { uri: existing, .. } if *existing == uri));
        if taken {
            return Err(McpError::AlreadyExists {
                kind: "Resource",
                name: uri,
            });
        }

        tracing::debug!(uri = %uri, "Registered static resource");
        let notifier = self.notifier(&uri);
        entries.push(ResourceEntry::Static {
            uri,
            name,
            description: description.into(),
            reader: Arc::new(reader),
        });
        entries.sort_by_key(ResourceEntry::sort_key);
        Ok(notifier)
    }

    /// Registers a resource subtree under a URI prefix.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidDefinition`] if the prefix or name is empty
    /// - [`McpError::AlreadyExists`] if the prefix is already registered
    pub fn register_dynamic<F>(
        &self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn(&str) -> Result<ResourceContents, HandlerError> + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        let name = name.into();
        check_identity("resource", &prefix, &name)?;

        let mut entries = self.entries.write();
        let taken = entries.iter().any(
            |e| matches!(e, ResourceEntry::Dynamic { prefix: existing, .. } if *existing == prefix),
        );
        if taken {
            return Err(McpError::AlreadyExists {
                kind: "Resource",
                name: prefix,
            });
        }

        tracing::debug!(prefix = %prefix, "Registered dynamic resource");
        let notifier = self.notifier(&prefix);
        entries.push(ResourceEntry::Dynamic {
            prefix,
            name,
            description: description.into(),
            reader: Arc::new(reader),
        });
        entries.sort_by_key(ResourceEntry::sort_key);
        Ok(notifier)
    }

    /// Registers a URI template.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidDefinition`] if the template or name is empty, or
    ///   the template has unbalanced braces, empty or duplicate placeholders
    /// - [`McpError::AlreadyExists`] if the template is already registered
    pub fn register_template<F>(
        &self,
        uri_template: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mime_type: Option<String>,
        reader: F,
    ) -> Result<Notifier, McpError>
    where
        F: Fn(&IndexMap<String, String>) -> Result<ResourceContents, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        let uri_template = uri_template.into();
        let name = name.into();
        check_identity("template", &uri_template, &name)?;
        let (matcher, params) = compile_template(&uri_template)?;

        let mut templates = self.templates.write();
        if templates.iter().any(|t| t.uri_template == uri_template) {
            return Err(McpError::AlreadyExists {
                kind: "Resource template",
                name: uri_template,
            });
        }

        tracing::debug!(template = %uri_template, params = ?params, "Registered resource template");
        let notifier = self.notifier(&uri_template);
        templates.push(Arc::new(ResourceTemplate {
            uri_template,
            name,
            description: description.into(),
            mime_type,
            matcher,
            params,
            reader: Arc::new(reader),
        }));
        Ok(notifier)
    }

    /// Lists static and dynamic resources in matching order.
    #[must_use]
    pub fn list(&self) -> Vec<ResourceDefinition> {
        self.entries
            .read()
            .iter()
            .map(ResourceEntry::definition)
            .collect()
    }

    /// Lists templates in registration order.
    #[must_use]
    pub fn list_templates(&self) -> Vec<ResourceTemplateDefinition> {
        self.templates
            .read()
            .iter()
            .map(|t| t.definition())
            .collect()
    }

    fn resolve(&self, uri: &str) -> Option<Matched> {
        let from_entries = self.entries.read().iter().find_map(|entry| match entry {
            ResourceEntry::Static {
                uri: candidate,
                reader,
                ..
            } if candidate == uri => Some(Matched::Static(Arc::clone(reader))),
            ResourceEntry::Dynamic { prefix, reader, .. } => uri
                .strip_prefix(prefix.as_str())
                .map(|rest| Matched::Dynamic(Arc::clone(reader), rest.to_string())),
            ResourceEntry::Static { .. } => None,
        });

        from_entries.or_else(|| {
            self.templates.read().iter().find_map(|template| {
                template
                    .bind(uri)
                    .map(|params| Matched::Template(Arc::clone(&template.reader), params))
            })
        })
    }

    /// Reads the resource addressed by `uri`.
    ///
    /// Registry locks are released before the reader runs.
    ///
    /// # Errors
    ///
    /// - [`McpError::NotFound`] if nothing matches
    /// - [`McpError::Internal`] if the reader fails
    pub fn read(&self, uri: &str) -> Result<ResourceContents, McpError> {
        let matched = self.resolve(uri).ok_or_else(|| McpError::NotFound {
            kind: "Resource",
            name: uri.to_string(),
        })?;

        let result = call_handler(|| match matched {
            Matched::Static(reader) => reader(),
            Matched::Dynamic(reader, rest) => reader(&rest),
            Matched::Template(reader, params) => reader(&params),
        });

        let mut contents = result.map_err(|e| {
            tracing::warn!(uri = %uri, error = %e, "Resource reader failed");
            McpError::Internal(format!("failed to read resource '{uri}': {e}"))
        })?;
        contents.uri = uri.to_string();
        Ok(contents)
    }
}
