use std::collections::HashMap;
use std::path::Path;

use tfdrive::command::PipelineStep;
use tfdrive::credentials::{CredentialSource, Credentials};
use tfdrive::env::EnvOverlay;
use tfdrive::error::{Error, Result};
use tfdrive::executor::StepRunner;
use tfdrive::{Plugin, RemoteBackend, RunConfig};

struct StubCredentials {
    fail: bool,
}

impl CredentialSource for StubCredentials {
    fn assume_role(&self, role_arn: &str) -> Result<Credentials> {
        if self.fail {
            return Err(Error::Credential(format!("access denied for {role_arn}")));
        }
        Ok(Credentials {
            access_key_id: "ASIASTUB".to_string(),
            secret_access_key: "stub-secret".to_string(),
            session_token: "stub-token".to_string(),
        })
    }
}

/// Records each invocation together with a snapshot of the overlay the
/// step would have been spawned with.
#[derive(Default)]
struct RecordingRunner {
    invocations: Vec<(String, Vec<String>)>,
    env_snapshots: Vec<HashMap<String, String>>,
    fail_at: Option<usize>,
}

impl StepRunner for RecordingRunner {
    fn run(&mut self, step: &PipelineStep, _dir: &Path, env: &EnvOverlay) -> Result<()> {
        self.invocations
            .push((step.program.clone(), step.args.clone()));
        self.env_snapshots
            .push(env.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        if self.fail_at == Some(self.invocations.len()) {
            return Err(Error::step(&step.program, "exited with status 1"));
        }
        Ok(())
    }
}

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn full_run_with_role_secrets_and_backend() {
    let dir = tempfile::tempdir().unwrap();
    let ca_path = dir.path().join("ca_cert.crt");

    let plugin = Plugin::new(RunConfig {
        remote: Some(RemoteBackend {
            backend: "s3".to_string(),
            config: map(&[("bucket", "tf-state")]),
        }),
        ca_cert: Some("-----BEGIN CERTIFICATE-----\nabc\n".to_string()),
        role_arn: Some("arn:aws:iam::123456789012:role/ci".to_string()),
        secrets: map(&[("db_password", "TFDRIVE_TEST_ABSENT_SOURCE")]),
        sensitive: true,
        ..Default::default()
    });

    let mut runner = RecordingRunner::default();
    plugin
        .exec_with(&StubCredentials { fail: false }, &mut runner, &ca_path)
        .unwrap();

    // Certificate materialized before anything ran.
    assert_eq!(
        std::fs::read_to_string(&ca_path).unwrap(),
        "-----BEGIN CERTIFICATE-----\nabc\n"
    );

    let programs: Vec<&str> = runner
        .invocations
        .iter()
        .map(|(p, _)| p.as_str())
        .collect();
    assert_eq!(
        programs,
        vec![
            "update-ca-certificates",
            "rm",
            "terraform",
            "terraform",
            "terraform",
            "terraform",
            "terraform",
            "rm",
        ]
    );

    // Every step inherits the assumed credentials and exported secrets.
    for snapshot in &runner.env_snapshots {
        assert_eq!(snapshot.get("AWS_ACCESS_KEY_ID").unwrap(), "ASIASTUB");
        assert_eq!(snapshot.get("AWS_SESSION_TOKEN").unwrap(), "stub-token");
        assert_eq!(snapshot.get("db_password").unwrap(), "");
    }
}

#[test]
fn credential_failure_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = Plugin::new(RunConfig {
        role_arn: Some("arn:aws:iam::123456789012:role/ci".to_string()),
        ..Default::default()
    });

    let mut runner = RecordingRunner::default();
    let err = plugin
        .exec_with(
            &StubCredentials { fail: true },
            &mut runner,
            &dir.path().join("ca_cert.crt"),
        )
        .unwrap_err();

    assert_eq!(err.code(), "CREDENTIAL_ERROR");
    assert!(runner.invocations.is_empty());
}

#[test]
fn failed_step_skips_the_rest_including_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = Plugin::new(RunConfig {
        sensitive: true,
        ..Default::default()
    });

    // Default pipeline is [get, validate, plan, apply, cache-delete];
    // failing validate must leave plan, apply, and cleanup unrun.
    let mut runner = RecordingRunner {
        fail_at: Some(2),
        ..Default::default()
    };
    let err = plugin
        .exec_with(
            &StubCredentials { fail: false },
            &mut runner,
            &dir.path().join("ca_cert.crt"),
        )
        .unwrap_err();

    assert_eq!(err.code(), "STEP_FAILED");
    assert_eq!(runner.invocations.len(), 2);
    assert_eq!(runner.invocations[1].1[0], "validate");
}

#[test]
fn no_role_means_no_aws_exports() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = Plugin::new(RunConfig {
        plan_only: true,
        sensitive: true,
        ..Default::default()
    });

    let mut runner = RecordingRunner::default();
    plugin
        .exec_with(
            &StubCredentials { fail: true },
            &mut runner,
            &dir.path().join("ca_cert.crt"),
        )
        .unwrap();

    assert_eq!(runner.invocations.len(), 4);
    for snapshot in &runner.env_snapshots {
        assert!(!snapshot.contains_key("AWS_ACCESS_KEY_ID"));
    }
}

#[test]
fn missing_ca_cert_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let ca_path = dir.path().join("ca_cert.crt");
    let plugin = Plugin::new(RunConfig {
        plan_only: true,
        sensitive: true,
        ..Default::default()
    });

    let mut runner = RecordingRunner::default();
    plugin
        .exec_with(&StubCredentials { fail: false }, &mut runner, &ca_path)
        .unwrap();

    assert!(!ca_path.exists());
}
