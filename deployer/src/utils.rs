//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the deployer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Parse `--key=value` and `--flag` arguments. Dashes inside keys become
/// underscores so `--artifact-name` and `--artifact_name` are the same key.
pub fn parse_cli_args<I>(args: I) -> std::collections::HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = std::collections::HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-').replace('-', "_");
            cli_args.insert(clean_key, value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-').replace('-', "_");
            cli_args.insert(clean_key, "true".to_string());
        }
    }

    cli_args
}
