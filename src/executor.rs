use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::command::PipelineStep;
use crate::env::EnvOverlay;
use crate::error::{Error, Result};
use crate::log_debug;

/// Shared read-only context for every step in a run: the resolved base
/// working directory, the environment overlay, and whether tracing is
/// suppressed.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub base_dir: PathBuf,
    pub env: EnvOverlay,
    pub sensitive: bool,
}

impl ExecutionContext {
    /// Derive the context at run start: the process working directory,
    /// joined with the configured root directory when one is set.
    pub fn derive(root_dir: Option<&str>, env: EnvOverlay, sensitive: bool) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let base_dir = match root_dir {
            Some(dir) if !dir.is_empty() => cwd.join(shellexpand::tilde(dir).as_ref()),
            _ => cwd,
        };
        Ok(Self {
            base_dir,
            env,
            sensitive,
        })
    }

    /// Resolve a step's working directory once, before it runs. A step
    /// carrying an absolute directory keeps it; anything else lands
    /// under the base directory.
    pub fn resolve_dir(&self, step: &PipelineStep) -> PathBuf {
        match &step.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }
}

/// Seam between the pipeline loop and process spawning, so tests can
/// record invocations without executing anything.
pub trait StepRunner {
    fn run(&mut self, step: &PipelineStep, dir: &Path, env: &EnvOverlay) -> Result<()>;
}

/// Runs each step as a child process with inherited stdio, blocking
/// until it exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl StepRunner for ProcessRunner {
    fn run(&mut self, step: &PipelineStep, dir: &Path, env: &EnvOverlay) -> Result<()> {
        let status = Command::new(&step.program)
            .args(&step.args)
            .current_dir(dir)
            .envs(env.iter())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Error::step(&step.program, format!("failed to start: {e}")))?;

        if !status.success() {
            let detail = match status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            };
            return Err(Error::step(&step.program, detail));
        }
        Ok(())
    }
}

/// Run every step in order, aborting on the first failure.
///
/// Steps after a failed one never start, including the final cache
/// cleanup. Each step's trace line is echoed beforehand unless the run
/// is sensitive; successful completion is reported at debug level only.
pub fn run_pipeline(
    steps: &[PipelineStep],
    ctx: &ExecutionContext,
    runner: &mut dyn StepRunner,
) -> Result<()> {
    for step in steps {
        let dir = ctx.resolve_dir(step);
        if !ctx.sensitive {
            println!("{}", step.trace_line());
        }
        runner.run(step, &dir, &ctx.env)?;
        log_debug!("run", "{} completed", step.program);
    }
    Ok(())
}
