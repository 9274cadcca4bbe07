//! Trellis CLI - inspect and exercise a JSON route table
//!
//! Loads a route table, registers every route and then either reports on
//! the result, resolves a single request, or dumps a method's tree.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trellis_server::error::{TrellisError, TrellisResult};
use trellis_server::{Dispatcher, Method, Resolution, RouterConfig};

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version)]
#[command(about = "Radix-tree HTTP router route table tool", long_about = None)]
struct Args {
    /// Path to JSON route table
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and register every route, then print per-method statistics
    Check,
    /// Resolve one request and print the decision as JSON
    Resolve {
        /// Request method, e.g. GET
        method: String,
        /// Request path, e.g. /users/42
        path: String,
    },
    /// Print the radix tree registered for a method
    Tree {
        /// Method whose tree to print
        method: String,
    },
}

fn main() -> TrellisResult<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    let config = RouterConfig::from_file(&args.config)?;
    let dispatcher = config.build_dispatcher()?;

    match args.command {
        Command::Check => check(&dispatcher),
        Command::Resolve { method, path } => resolve(&dispatcher, &method, &path)?,
        Command::Tree { method } => tree(&dispatcher, &method)?,
    }

    Ok(())
}

fn check(dispatcher: &Dispatcher<String>) {
    let router = dispatcher.router();
    for method in router.methods() {
        println!(
            "{:<8} routes={:<4} max_params={}",
            method.as_str(),
            router.len(method),
            router.max_params(method)
        );
    }
    println!("total    routes={}", router.total_routes());
    info!("route table OK");
}

fn resolve(dispatcher: &Dispatcher<String>, method: &str, path: &str) -> TrellisResult<()> {
    let method = parse_method(method)?;
    let resolution = dispatcher.resolve(method, path);
    let status = resolution.status();

    let mut output = json!({
        "kind": resolution.kind(),
        "status": status.as_u16(),
        "handler": null,
        "route": null,
        "params": [],
        "location": null,
        "allow": null,
    });

    match &resolution {
        Resolution::Handle {
            handler,
            params,
            route,
        } => {
            output["handler"] = json!(handler);
            output["route"] = json!(route);
            output["params"] = params
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
        }
        Resolution::Redirect { location, .. } => {
            output["location"] = json!(location);
        }
        Resolution::Options { allow } | Resolution::MethodNotAllowed { allow } => {
            output["allow"] = json!(allow.header_value());
        }
        Resolution::NotFound => {}
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn tree(dispatcher: &Dispatcher<String>, method: &str) -> TrellisResult<()> {
    let method = parse_method(method)?;
    match dispatcher.router().tree(method) {
        Some(tree) => print!("{}", tree.pretty_print()),
        None => println!("(no routes for {})", method),
    }
    Ok(())
}

fn parse_method(method: &str) -> TrellisResult<Method> {
    method
        .to_ascii_uppercase()
        .parse()
        .map_err(|e| TrellisError::Config(format!("{}", e)))
}

/// Initialize structured logging with configurable level
fn init_logging(level: &str) -> TrellisResult<()> {
    let env_filter = level
        .parse::<EnvFilter>()
        .map_err(|e| TrellisError::Config(format!("Invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();

    Ok(())
}
