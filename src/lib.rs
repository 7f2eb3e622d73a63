//! mcp-server-kit: embeddable Model Context Protocol server core
//!
//! This library lets an application expose tools, resources and prompts to
//! AI assistants over MCP. The application registers capabilities; the
//! server handles the JSON-RPC envelope, the initialisation handshake,
//! argument validation and change notifications.
//!
//! # Architecture
//!
//! - **Tools**: named operations whose arguments are checked against a
//!   declarative [`schema::Schema`] before the handler runs
//! - **Resources**: static URIs, dynamic URI prefixes and `{param}` templates
//! - **Prompts**: argument-parameterised message generators
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol implementation
//! - [`schema`]: Argument schemas and validation

pub mod config;
pub mod error;
pub mod mcp;
pub mod schema;
