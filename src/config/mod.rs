/// Configuration management for flowsync
///
/// Raw inputs come from command-line flags with environment fallbacks and are
/// resolved once into a validated `Config` before any request is sent.

use crate::error::{Error, Result};
use clap::Parser;
use reqwest::Url;
use std::fmt;

/// Default n8n instance when neither `--host` nor `N8N_HOST` is given
pub const DEFAULT_HOST: &str = "http://localhost:5678";

/// Default logical workflow name, used as the matching key on the service
pub const DEFAULT_WORKFLOW_NAME: &str = "Blockforge Build Dispatcher";

/// Default build-trigger endpoint called by the dispatch node
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:3000/build";

/// Public API prefix appended to the host
pub const API_PATH: &str = "/api/v1";

const MISSING_API_KEY: &str =
    "Missing n8n API key. Provide via --api-key=<key> or N8N_API_KEY env variable.";

/// Command-line surface. Flags win over environment variables, which win over defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "flowsync", version)]
#[command(about = "Create or update the Blockforge build dispatcher workflow on an n8n instance")]
pub struct CliArgs {
    /// Base URL of the n8n instance
    #[arg(long, env = "N8N_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// n8n public API key
    #[arg(long = "api-key", env = "N8N_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Workflow name used to find an existing workflow
    #[arg(long, default_value = DEFAULT_WORKFLOW_NAME)]
    pub name: String,

    /// Build-trigger URL the dispatch node posts to
    #[arg(long, default_value = DEFAULT_WEBHOOK_URL)]
    pub webhook: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote registry connection settings
    pub registry: RegistryConfig,
    /// Desired workflow parameters
    pub workflow: WorkflowConfig,
}

/// Connection settings for the n8n public API
#[derive(Clone)]
pub struct RegistryConfig {
    /// API root, e.g. "http://localhost:5678/api/v1" (no trailing slash)
    pub base_url: String,
    /// Value sent in the X-N8N-API-KEY header
    pub api_key: String,
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Inputs to the dispatcher workflow builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Logical workflow name (non-empty)
    pub name: String,
    /// Build-trigger URL
    pub webhook_url: String,
}

impl Config {
    /// Validate raw arguments into a configuration.
    ///
    /// Fails with `Error::Configuration` on a missing API key, a host that is not
    /// an absolute http(s) URL, a blank workflow name or an unparsable webhook URL.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let api_key = args
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::configuration(MISSING_API_KEY))?;

        let base_url = resolve_base_url(&args.host)?;

        // Matched byte-for-byte against remote names, so surrounding whitespace is kept
        if args.name.trim().is_empty() {
            return Err(Error::configuration("Workflow name must not be empty."));
        }

        Url::parse(&args.webhook).map_err(|e| {
            Error::configuration(format!("Invalid webhook URL '{}': {}", args.webhook, e))
        })?;

        Ok(Self {
            registry: RegistryConfig { base_url, api_key },
            workflow: WorkflowConfig {
                name: args.name,
                webhook_url: args.webhook,
            },
        })
    }
}

/// Strip trailing slashes from the host and append the API prefix
fn resolve_base_url(host: &str) -> Result<String> {
    let trimmed = host.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| Error::configuration(format!("Invalid n8n host '{}': {}", host, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration(format!(
            "Invalid n8n host '{}': expected an http or https URL",
            host
        )));
    }

    Ok(format!("{}{}", trimmed, API_PATH))
}
