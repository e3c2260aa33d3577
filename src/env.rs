use std::collections::HashMap;

/// Environment overlay applied to every spawned step.
///
/// Values set here shadow the inherited process environment without
/// mutating it, so a run's credential and secret exports stay local to
/// the run and tests can assert on them directly.
#[derive(Debug, Clone, Default)]
pub struct EnvOverlay {
    vars: HashMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Look up a variable: overlay first, inherited process environment
    /// second. An absent variable resolves to the empty string.
    pub fn get(&self, key: &str) -> String {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .unwrap_or_default()
    }

    /// Re-export secrets: for every `{target: source}` pair, read the
    /// source variable's current value and publish it under the target
    /// name. A missing source exports an empty value; this never fails.
    pub fn export_secrets(&mut self, secrets: &HashMap<String, String>) {
        for (target, source) in secrets {
            let value = self.get(source);
            self.set(target.clone(), value);
        }
    }

    /// Overlay entries, for applying to a child process via `envs`.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }
}
