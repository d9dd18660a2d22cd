use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, Subcommand};
use rtlscope_mcp::{Dispatcher, ServerConfig};
use rtlscope_protocol::{Arguments, CapabilityKind, InvocationRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Exit status for requests rejected by the dispatcher (unknown id, bad arguments).
const PROTOCOL_ERROR_EXIT: i32 = 2;

#[derive(Parser)]
#[command(name = "rtlscope")]
#[command(about = "Invoke rtlscope capabilities without an MCP client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (takes precedence over RTLSCOPE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalogue of one capability kind
    List {
        /// resources, tools or prompts
        #[arg(value_parser = parse_kind)]
        kind: CapabilityKind,
    },

    /// Call a tool
    Call {
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Read a resource by id
    Read { id: String },

    /// Render a prompt
    Prompt {
        name: String,

        /// Prompt arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

fn parse_kind(raw: &str) -> Result<CapabilityKind, String> {
    CapabilityKind::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = CapabilityKind::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

fn parse_arguments(raw: Option<&str>) -> Result<Arguments> {
    let Some(raw) = raw else {
        return Ok(Arguments::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--args must be valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--args must be a JSON object"),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<ServerConfig> {
    match explicit {
        Some(path) => {
            let mut config = ServerConfig::from_file(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config.anchor_docs_dir_to_cwd();
            Ok(config)
        }
        None => Ok(ServerConfig::load()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    config.check_docs_dir();
    let dispatcher = Dispatcher::new(config);

    let request = match cli.command {
        Commands::List { kind } => return print_json(&dispatcher.list(kind)),
        Commands::Call { tool, args } => {
            InvocationRequest::tool(tool, parse_arguments(args.as_deref())?)
        }
        Commands::Read { id } => InvocationRequest::resource(id),
        Commands::Prompt { name, args } => {
            InvocationRequest::prompt(name, parse_arguments(args.as_deref())?)
        }
    };

    match dispatcher.handle(&request).await {
        Ok(result) => print_json(&result),
        Err(err) => match err.envelope() {
            Some(envelope) => {
                print_json(&envelope)?;
                eprintln!("Error: {err}");
                std::process::exit(PROTOCOL_ERROR_EXIT);
            }
            None => Err(anyhow::Error::new(err)),
        },
    }
}
