use crate::error::{Error, Result};

/// What the worker does when a task panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicPolicy {
    /// Catch the panic, log it and keep draining the queue.
    #[default]
    LogAndContinue,
    /// Let the panic unwind the worker thread. Queued tasks wait for the next
    /// submission to start a fresh worker.
    Propagate,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
    pub panic_policy: PanicPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_name_prefix: "serial-worker".to_string(),
            stack_size: None,
            panic_policy: PanicPolicy::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL"));
        }
        if self.stack_size == Some(0) {
            return Err(Error::config("stack_size must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.config.panic_policy = policy;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
