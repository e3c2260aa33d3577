use std::process::Command;

use serde::Deserialize;

use crate::env::EnvOverlay;
use crate::error::{Error, Result};

/// Session name recorded against every assumed-role session.
pub const SESSION_NAME: &str = "tfdrive";

/// Lifetime of assumed credentials. One CI run comfortably fits in an
/// hour; a hung run is killed by the CI runner long before expiry.
pub const SESSION_DURATION_SECS: u32 = 3600;

/// Temporary credentials returned by a role assumption.
///
/// These exist only long enough to be published into the environment
/// overlay; nothing else persists them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: Credentials,
}

/// Exchanges a role ARN for temporary credentials.
pub trait CredentialSource {
    fn assume_role(&self, role_arn: &str) -> Result<Credentials>;
}

/// Production source: runs `aws sts assume-role` as an opaque external
/// step and parses its JSON response. The exchange protocol itself is
/// the CLI's problem, not ours.
#[derive(Debug, Clone, Default)]
pub struct AwsCliSource;

impl CredentialSource for AwsCliSource {
    fn assume_role(&self, role_arn: &str) -> Result<Credentials> {
        let duration = SESSION_DURATION_SECS.to_string();
        let output = Command::new("aws")
            .args([
                "sts",
                "assume-role",
                "--role-arn",
                role_arn,
                "--role-session-name",
                SESSION_NAME,
                "--duration-seconds",
                &duration,
                "--output",
                "json",
            ])
            .output()
            .map_err(|e| Error::Credential(format!("failed to invoke aws sts: {e}")))?;

        if !output.status.success() {
            return Err(Error::Credential(format!(
                "aws sts assume-role exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let response: AssumeRoleResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Credential(format!("malformed assume-role response: {e}")))?;
        Ok(response.credentials)
    }
}

/// Publish assumed credentials into the environment overlay under the
/// standard AWS variable names. Every subsequently spawned step sees
/// them; nothing in the parent process environment changes.
pub fn publish(credentials: &Credentials, env: &mut EnvOverlay) {
    env.set("AWS_ACCESS_KEY_ID", credentials.access_key_id.clone());
    env.set("AWS_SECRET_ACCESS_KEY", credentials.secret_access_key.clone());
    env.set("AWS_SESSION_TOKEN", credentials.session_token.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sts_response_shape() {
        let body = r#"{
            "Credentials": {
                "AccessKeyId": "ASIAEXAMPLE",
                "SecretAccessKey": "secret",
                "SessionToken": "token",
                "Expiration": "2026-01-01T00:00:00Z"
            },
            "AssumedRoleUser": {
                "AssumedRoleId": "AROAEXAMPLE:tfdrive",
                "Arn": "arn:aws:sts::123456789012:assumed-role/ci/tfdrive"
            }
        }"#;
        let response: AssumeRoleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.credentials.access_key_id, "ASIAEXAMPLE");
        assert_eq!(response.credentials.secret_access_key, "secret");
        assert_eq!(response.credentials.session_token, "token");
    }

    #[test]
    fn publish_sets_the_three_aws_names() {
        let creds = Credentials {
            access_key_id: "ak".into(),
            secret_access_key: "sk".into(),
            session_token: "st".into(),
        };
        let mut env = EnvOverlay::new();
        publish(&creds, &mut env);
        assert_eq!(env.get("AWS_ACCESS_KEY_ID"), "ak");
        assert_eq!(env.get("AWS_SECRET_ACCESS_KEY"), "sk");
        assert_eq!(env.get("AWS_SESSION_TOKEN"), "st");
        assert_eq!(env.len(), 3);
    }
}
