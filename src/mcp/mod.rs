//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the server side of MCP: it accepts JSON-RPC 2.0
//! messages, drives the initialisation handshake and routes requests to
//! three registries of embedder-supplied capabilities.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP Server                          │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │   │  Transport  │───▶│   Server    │───▶│    Tools    │     │
//! │   │   (stdio)   │    │ (lifecycle) │    │  Resources  │     │
//! │   └─────────────┘    └─────────────┘    │   Prompts   │     │
//! │          ▲                  │           └─────────────┘     │
//! │          │                  ▼                  │            │
//! │          │           ┌─────────────┐           │            │
//! │          └───────────│  Notifiers  │◀──────────┘            │
//! │                      └─────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use prompts::{Prompt, PromptContent, PromptMessage, PromptRegistry, PromptResponse, Role};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use resources::{Notifier, ResourceContents, ResourceRegistry};
pub use server::{McpServer, ServerState};
pub use tools::{ToolOutput, ToolRegistry};
pub use transport::{OutboundQueue, StdioTransport, Transport};
