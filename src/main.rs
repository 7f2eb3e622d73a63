//! mcp-server-kit: demonstration MCP server
//!
//! Registers a small set of tools, resources and prompts and serves them
//! over stdio.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use mcp_server_kit::config;
use mcp_server_kit::error::{HandlerError, McpError};
use mcp_server_kit::mcp::prompts::{Prompt, PromptMessage, PromptResponse};
use mcp_server_kit::mcp::resources::ResourceContents;
use mcp_server_kit::mcp::server::McpServer;
use mcp_server_kit::schema::{Schema, SchemaBuilder};

/// Interval between counter resource updates.
const COUNTER_INTERVAL: Duration = Duration::from_secs(5);

/// Demonstration MCP server.
///
/// Serves an `add` tool, a handful of in-memory resources and a `greet`
/// prompt over stdio.
#[derive(Parser, Debug)]
#[command(name = "mcp-server-kit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Registers the `add` tool.
fn register_tools(server: &McpServer) -> Result<(), McpError> {
    let operand = || Schema::number().minimum(-1000.0).maximum(1000.0);
    let schema = Schema::object()
        .property("a", operand().description("First operand"))
        .property("b", operand().description("Second operand"))
        .build();

    server.add_tool("add", "Add two numbers", schema, |args: &Value| {
        let a = args["a"].as_f64().unwrap_or_default();
        let b = args["b"].as_f64().unwrap_or_default();
        Ok(number(a + b))
    })
}

/// Encodes a sum, keeping integral values free of a trailing `.0`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number(value: f64) -> Value {
    // Operands are bounded to +/-1000, so integral sums always fit
    if value.fract() == 0.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Registers the demo resources and starts the counter ticker.
fn register_resources(server: &McpServer) -> Result<(), McpError> {
    server.add_resource(
        "memory://greeting",
        "Greeting",
        "A friendly greeting",
        || Ok(ResourceContents::text("text/plain", "Hello, World!")),
    )?;

    server.add_dynamic_resource(
        "memory://notes/",
        "Notes",
        "Any note by path",
        |path: &str| {
            Ok(ResourceContents::text(
                "text/plain",
                format!("Note at '{path}' is empty"),
            ))
        },
    )?;

    server.add_template(
        "users/{id}/repos/{repo}",
        "User repository",
        "A repository owned by a user",
        Some("application/json".to_string()),
        |params| {
            let body = json!({ "owner": params["id"], "repo": params["repo"] });
            Ok(ResourceContents::text("application/json", body.to_string()))
        },
    )?;

    let count = Arc::new(AtomicU64::new(0));
    let reader_count = Arc::clone(&count);
    let notifier = server.add_resource(
        "memory://counter",
        "Counter",
        "Increments every few seconds",
        move || {
            Ok(ResourceContents::text(
                "text/plain",
                reader_count.load(Ordering::Relaxed).to_string(),
            ))
        },
    )?;

    std::thread::spawn(move || loop {
        std::thread::sleep(COUNTER_INTERVAL);
        count.fetch_add(1, Ordering::Relaxed);
        notifier.notify();
    });

    Ok(())
}

/// Registers the `greet` prompt.
fn register_prompts(server: &McpServer) -> Result<(), McpError> {
    let prompt = Prompt::new("greet", "Greets someone by name").argument(
        "name",
        "Who to greet",
        true,
    );

    server
        .add_prompt(prompt, |_, arguments| {
            let name = arguments
                .get("name")
                .ok_or_else(|| HandlerError::from("name missing"))?;
            Ok(PromptResponse {
                description: format!("Greeting for {name}"),
                messages: vec![PromptMessage::user_text(format!("Please greet {name}."))],
            })
        })
        .map(drop)
}

/// Entry point for the mcp-server-kit server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "mcp-server-kit {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting mcp-server-kit server"
    );

    let server = McpServer::new(&cfg);
    let registered = register_tools(&server)
        .and_then(|()| register_resources(&server))
        .and_then(|()| register_prompts(&server));
    if let Err(e) = registered {
        error!(error = %e, "Failed to register capabilities");
        return ExitCode::FAILURE;
    }

    info!("MCP server ready, waiting for client connection...");

    // Run the server
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.serve_stdio()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
