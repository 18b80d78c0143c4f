use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "AI-assisted form detection and autofill engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect forms and fields across every frame of a DOM snapshot
    Detect {
        /// Path to the DOM snapshot JSON
        #[arg(long)]
        dom: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Match detected fields against stored memories
    Match {
        /// Path to the DOM snapshot JSON
        #[arg(long)]
        dom: String,

        /// Path to the memory store JSON
        #[arg(long)]
        memories: String,

        /// Matcher backend: fallback or ollama
        #[arg(long, default_value = "fallback")]
        backend: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Match, then write values back into the snapshot's fields
    Fill {
        /// Path to the DOM snapshot JSON
        #[arg(long)]
        dom: String,

        /// Path to the memory store JSON
        #[arg(long)]
        memories: String,

        /// Matcher backend: fallback or ollama
        #[arg(long, default_value = "fallback")]
        backend: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Capture a submitted form's values into the memory store
    Capture {
        /// Path to the DOM snapshot JSON
        #[arg(long)]
        dom: String,

        /// Form opid to capture (default: every detected form)
        #[arg(long)]
        form: Option<String>,

        /// Path to the memory store JSON
        #[arg(long)]
        store: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// jsonl trace file; tracing is off when unset
    pub trace_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// UI auto-fill gate, applied downstream of matching. Independent of
    /// the matcher's internal minimum-match-confidence floor.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramesConfig {
    #[serde(default = "default_gather_timeout")]
    pub gather_timeout_ms: u64,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            gather_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

// Serde default helpers
fn default_confidence_threshold() -> f32 { 0.75 }
fn default_gather_timeout() -> u64 { 2000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-autofill.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}
