//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Backend selection from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponderArg {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI-compatible chat completions (hosted or local)
    Openai,
}

/// Memory backend selection from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MemoryArg {
    /// Append-only JSONL log
    Jsonl,
    /// Whole-file JSON snapshot
    Snapshot,
    /// Process memory only
    Memory,
}

/// CLI arguments for counsel-gateway
#[derive(Parser, Debug)]
#[command(name = "counsel-gateway")]
#[command(author, version, about = "Batching LLM gateway with per-user conversation memory")]
#[command(long_about = r#"
Counsel Gateway answers questions from registered users through a
text-generation backend. Requests that arrive close together are batched:
a batch is sent once it holds --max-batch-size requests or --max-wait-ms
after its first request, whichever comes first. Every user has a durable
conversation history that is included as context in each call.

Endpoints:
  POST /ask            {"user": "...", "question": "..."}
  POST /clear          {"user": "..."}
  GET  /health
  GET  /history/{user}

Configuration files are loaded from (in priority order):
1. COUNSEL_* environment variables (COUNSEL_BATCH__MAX_SIZE=4)
2. --config <path>     Explicit config file
3. ./counsel.toml      Project-level config
4. ~/.config/counsel-gateway/config.toml   Global config

Example:
  counsel-gateway --port 8080 -v
  counsel-gateway --responder openai --max-batch-size 4 --memory-path ./memory.jsonl
"#)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// TCP port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Requests per batch before it is sent early
    #[arg(long, value_name = "N")]
    pub max_batch_size: Option<usize>,

    /// Milliseconds a batch waits after its first request
    #[arg(long, value_name = "MS")]
    pub max_wait_ms: Option<u64>,

    /// Cap on admitted but unanswered requests
    #[arg(long, value_name = "N")]
    pub max_pending: Option<usize>,

    /// Text-generation backend
    #[arg(short, long, value_enum)]
    pub responder: Option<ResponderArg>,

    /// Model identifier passed to the backend
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Conversation memory backend
    #[arg(long, value_enum)]
    pub memory_backend: Option<MemoryArg>,

    /// Conversation memory file
    #[arg(long, value_name = "PATH")]
    pub memory_path: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
