use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Remote state backend: backend name plus backend-specific key/value
/// configuration. Only meaningful when `backend` is non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteBackend {
    pub backend: String,
    #[serde(default)]
    pub config: HashMap<String, String>,
}

/// Complete declarative input for one pipeline run. Constructed once
/// from CLI flags / `PLUGIN_*` settings and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub remote: Option<RemoteBackend>,
    /// Stop after plan; never apply.
    pub plan_only: bool,
    /// Terraform variables passed as `-var name=value`.
    pub vars: HashMap<String, String>,
    /// Secrets: target variable name -> source environment variable name.
    pub secrets: HashMap<String, String>,
    /// PEM content to install into the system trust store.
    pub ca_cert: Option<String>,
    /// Suppress command tracing; arguments may carry secret values.
    pub sensitive: bool,
    /// IAM role to assume before any step runs.
    pub role_arn: Option<String>,
    /// Directory holding the terraform root module, relative to the
    /// workspace the CI runner starts us in.
    pub root_dir: Option<String>,
    /// Bound on concurrent terraform operations; 0 leaves the tool default.
    pub parallelism: u32,
    /// Resources scoped for plan/apply, in declaration order.
    pub targets: Vec<String>,
    /// Variable files passed to plan, in declaration order.
    pub var_files: Vec<String>,
}

/// Parse the `remote` setting, a JSON document like
/// `{"backend": "s3", "config": {"bucket": "tf-state"}}`.
pub fn parse_remote(spec: &str) -> Result<RemoteBackend> {
    serde_json::from_str(spec)
        .map_err(|e| Error::Config(format!("Invalid remote spec: {e}")))
}

/// Parse a JSON object of string values, as used by the `vars` and
/// `secrets` settings.
pub fn parse_string_map(field: &str, spec: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(spec)
        .map_err(|e| Error::Config(format!("Invalid {field} spec: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_remote_with_config() {
        let remote = parse_remote(r#"{"backend":"s3","config":{"bucket":"x","region":"us-east-1"}}"#)
            .unwrap();
        assert_eq!(remote.backend, "s3");
        assert_eq!(remote.config.get("bucket").map(String::as_str), Some("x"));
        assert_eq!(remote.config.len(), 2);
    }

    #[test]
    fn parse_remote_config_defaults_to_empty() {
        let remote = parse_remote(r#"{"backend":"consul"}"#).unwrap();
        assert_eq!(remote.backend, "consul");
        assert!(remote.config.is_empty());
    }

    #[test]
    fn parse_remote_rejects_malformed_json() {
        let err = parse_remote("{backend: s3").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn parse_string_map_names_the_field() {
        let err = parse_string_map("vars", "[1,2]").unwrap_err();
        assert!(err.to_string().contains("vars"));
    }
}
