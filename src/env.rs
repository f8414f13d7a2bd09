use std::collections::HashMap;

/// Read access to the variables the runner exports into the process.
pub trait Environment: Send + Sync {
    /// Return the value of `key`, or None if it is unset or not valid unicode
    fn var(&self, key: &str) -> Option<String>;
}

/// Environment backed by the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
