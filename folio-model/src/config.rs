//! Configuration for the generation client.

use std::time::Duration;

use crate::error::{GenerationError, Result};

/// Per-call limits and sampling parameters shared by every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Upper bound on one candidate call.
    pub timeout: Duration,
    /// How long a failed candidate is skipped before it is tried again.
    pub cooldown: Duration,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cooldown: Duration::from_secs(60),
            temperature: 0.3,
            max_tokens: 256,
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for constructing a [`GenerationConfig`].
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`GenerationConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    /// Set the per-candidate timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the failure cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the answer token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Build the [`GenerationConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ConfigError`] if:
    /// - `timeout` is zero
    /// - `temperature` is outside `0.0..=2.0`
    /// - `max_tokens` is zero
    pub fn build(self) -> Result<GenerationConfig> {
        if self.config.timeout.is_zero() {
            return Err(GenerationError::ConfigError("timeout must be greater than zero".into()));
        }
        if !(0.0..=2.0).contains(&self.config.temperature) {
            return Err(GenerationError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.config.temperature
            )));
        }
        if self.config.max_tokens == 0 {
            return Err(GenerationError::ConfigError("max_tokens must be greater than zero".into()));
        }
        Ok(self.config)
    }
}
