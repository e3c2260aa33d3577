use std::path::PathBuf;

use crate::config::{RemoteBackend, RunConfig};
use crate::env::EnvOverlay;

/// Fixed relative path of terraform's local module/provider cache.
pub const CACHE_DIR: &str = ".terraform";

/// Output file the plan step writes and the apply step consumes.
pub const PLAN_FILE: &str = "plan.tfout";

/// Trust-store path the CA certificate is materialized to before the
/// refresh utility runs.
pub const CA_CERT_PATH: &str = "/usr/local/share/ca-certificates/ca_cert.crt";

/// One external-process invocation: program, ordered argument list, and
/// an optional working directory. Immutable once built; the executor
/// owns it exclusively during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl PipelineStep {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
        }
    }

    /// The `$ program args...` line echoed before execution.
    pub fn trace_line(&self) -> String {
        let mut line = format!("$ {}", self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Refresh the system trust store. The certificate file itself is
/// written by the orchestrator's materialize phase, not here.
pub fn install_ca_cert() -> PipelineStep {
    PipelineStep::new("update-ca-certificates", Vec::<String>::new())
}

/// Remove terraform's local cache. `rm -rf` makes this idempotent; a
/// missing directory is not a failure.
pub fn delete_cache() -> PipelineStep {
    PipelineStep::new("rm", ["-rf", CACHE_DIR])
}

pub fn remote_config(remote: &RemoteBackend) -> PipelineStep {
    let mut args = vec![
        "remote".to_string(),
        "config".to_string(),
        format!("-backend={}", remote.backend),
    ];
    // Map iteration order is unspecified; callers must not rely on the
    // relative order of -backend-config flags.
    for (key, value) in &remote.config {
        args.push(format!("-backend-config={key}={value}"));
    }
    PipelineStep::new("terraform", args)
}

pub fn get_modules() -> PipelineStep {
    PipelineStep::new("terraform", ["get"])
}

pub fn validate() -> PipelineStep {
    PipelineStep::new("terraform", ["validate"])
}

/// Build the plan step. Secret-backed variables are resolved from the
/// environment overlay here, at build time; the resulting arguments may
/// carry secret values, which is what the sensitive flag guards.
pub fn plan(config: &RunConfig, env: &EnvOverlay) -> PipelineStep {
    let mut args = vec!["plan".to_string(), format!("-out={PLAN_FILE}")];
    for target in &config.targets {
        args.push("--target".to_string());
        args.push(target.clone());
    }
    for var_file in &config.var_files {
        args.push("-var-file".to_string());
        args.push(var_file.clone());
    }
    // -var flags from the two maps are unordered, like -backend-config.
    for (key, value) in &config.vars {
        args.push("-var".to_string());
        args.push(format!("{key}={value}"));
    }
    for (key, source) in &config.secrets {
        args.push("-var".to_string());
        args.push(format!("{key}={}", env.get(source)));
    }
    if config.parallelism > 0 {
        args.push(format!("-parallelism={}", config.parallelism));
    }
    PipelineStep::new("terraform", args)
}

/// Build the apply step, consuming the plan output file.
pub fn apply(config: &RunConfig) -> PipelineStep {
    let mut args = vec!["apply".to_string()];
    for target in &config.targets {
        args.push("--target".to_string());
        args.push(target.clone());
    }
    if config.parallelism > 0 {
        args.push(format!("-parallelism={}", config.parallelism));
    }
    args.push(PLAN_FILE.to_string());
    PipelineStep::new("terraform", args)
}

/// Assemble the full ordered step list for one run.
///
/// The sequence is a deterministic function of the config:
/// [ca-install], [cache-delete, remote-config], get, validate, plan,
/// [apply], cache-delete. Role assumption and secret export are side
/// effects handled by the orchestrator before this list runs.
pub fn build_pipeline(config: &RunConfig, env: &EnvOverlay) -> Vec<PipelineStep> {
    let mut steps = Vec::new();

    if config.ca_cert.as_deref().is_some_and(|c| !c.is_empty()) {
        steps.push(install_ca_cert());
    }
    if let Some(remote) = config.remote.as_ref().filter(|r| !r.backend.is_empty()) {
        steps.push(delete_cache());
        steps.push(remote_config(remote));
    }
    steps.push(get_modules());
    steps.push(validate());
    steps.push(plan(config, env));
    if !config.plan_only {
        steps.push(apply(config));
    }
    steps.push(delete_cache());

    steps
}
