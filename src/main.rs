use std::process::ExitCode;

use clap::Parser;

use tfdrive::config::{self, RunConfig};
use tfdrive::{log_status, Plugin, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every flag falls back to the `PLUGIN_*` environment variable the CI
/// runner sets from pipeline settings, so the binary works both as a
/// container entrypoint and from a shell.
#[derive(Parser)]
#[command(name = "tfdrive")]
#[command(version = VERSION)]
#[command(about = "Drive terraform get/validate/plan/apply as a CI pipeline step")]
struct Cli {
    /// Remote state backend as JSON: {"backend":"s3","config":{...}}
    #[arg(long, env = "PLUGIN_REMOTE")]
    remote: Option<String>,

    /// Stop after plan; never apply
    #[arg(long, env = "PLUGIN_PLAN")]
    plan: bool,

    /// Terraform variables as a JSON object of string values
    #[arg(long, env = "PLUGIN_VARS")]
    vars: Option<String>,

    /// Secrets as a JSON object: {"var_name":"SOURCE_ENV_VAR"}
    #[arg(long, env = "PLUGIN_SECRETS")]
    secrets: Option<String>,

    /// PEM content to install into the system trust store
    #[arg(long = "ca-cert", env = "PLUGIN_CA_CERT")]
    ca_cert: Option<String>,

    /// Suppress command tracing; step arguments may carry secret values
    #[arg(long, env = "PLUGIN_SENSITIVE")]
    sensitive: bool,

    /// IAM role to assume before any step runs
    #[arg(long = "role-arn", env = "PLUGIN_ROLE_ARN")]
    role_arn: Option<String>,

    /// Directory holding the terraform root module, relative to the workspace
    #[arg(long = "root-dir", env = "PLUGIN_ROOT_DIR")]
    root_dir: Option<String>,

    /// Bound on concurrent terraform operations; 0 leaves the tool default
    #[arg(long, env = "PLUGIN_PARALLELISM", default_value_t = 0)]
    parallelism: u32,

    /// Resource to target (repeatable; comma-separated via PLUGIN_TARGETS)
    #[arg(long = "target", env = "PLUGIN_TARGETS", value_delimiter = ',')]
    targets: Vec<String>,

    /// Variable file for plan (repeatable; comma-separated via PLUGIN_VAR_FILES)
    #[arg(long = "var-file", env = "PLUGIN_VAR_FILES", value_delimiter = ',')]
    var_files: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        Ok(RunConfig {
            remote: self
                .remote
                .as_deref()
                .map(config::parse_remote)
                .transpose()?,
            plan_only: self.plan,
            vars: self
                .vars
                .as_deref()
                .map(|s| config::parse_string_map("vars", s))
                .transpose()?
                .unwrap_or_default(),
            secrets: self
                .secrets
                .as_deref()
                .map(|s| config::parse_string_map("secrets", s))
                .transpose()?
                .unwrap_or_default(),
            ca_cert: self.ca_cert,
            sensitive: self.sensitive,
            role_arn: self.role_arn,
            root_dir: self.root_dir,
            parallelism: self.parallelism,
            targets: self.targets,
            var_files: self.var_files,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let run_config = match cli.into_config() {
        Ok(run_config) => run_config,
        Err(err) => {
            log_status!("config", "{} ({})", err, err.code());
            return ExitCode::FAILURE;
        }
    };

    match Plugin::new(run_config).exec() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_status!("run", "{} ({})", err, err.code());
            ExitCode::FAILURE
        }
    }
}
