use std::fs;
use std::path::Path;

use crate::command::{self, CA_CERT_PATH};
use crate::config::RunConfig;
use crate::credentials::{self, AwsCliSource, CredentialSource};
use crate::env::EnvOverlay;
use crate::error::Result;
use crate::executor::{self, ExecutionContext, ProcessRunner, StepRunner};
use crate::log_status;

/// One single-shot pipeline run: assume role, export secrets,
/// materialize prerequisites, build the step list, run it fail-fast.
pub struct Plugin {
    pub config: RunConfig,
}

impl Plugin {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Execute the run with the production credential source, process
    /// runner, and system trust-store path.
    pub fn exec(&self) -> Result<()> {
        let mut runner = ProcessRunner;
        self.exec_with(&AwsCliSource, &mut runner, Path::new(CA_CERT_PATH))
    }

    /// Execution seam: credential source, step runner, and trust-store
    /// path are injectable so failure paths stay testable.
    pub fn exec_with(
        &self,
        credential_source: &dyn CredentialSource,
        runner: &mut dyn StepRunner,
        ca_cert_path: &Path,
    ) -> Result<()> {
        let mut env = EnvOverlay::new();

        if let Some(role_arn) = self.config.role_arn.as_deref().filter(|a| !a.is_empty()) {
            log_status!("auth", "Assuming role {}", role_arn);
            let creds = credential_source.assume_role(role_arn)?;
            credentials::publish(&creds, &mut env);
        }

        if !self.config.secrets.is_empty() {
            env.export_secrets(&self.config.secrets);
        }

        self.materialize(ca_cert_path)?;

        let steps = command::build_pipeline(&self.config, &env);
        let ctx = ExecutionContext::derive(
            self.config.root_dir.as_deref(),
            env,
            self.config.sensitive,
        )?;
        executor::run_pipeline(&steps, &ctx, runner)
    }

    /// Write files steps depend on, before anything runs. Currently
    /// just the CA certificate into the trust store.
    fn materialize(&self, ca_cert_path: &Path) -> Result<()> {
        if let Some(cert) = self.config.ca_cert.as_deref().filter(|c| !c.is_empty()) {
            fs::write(ca_cert_path, cert)?;
        }
        Ok(())
    }
}
