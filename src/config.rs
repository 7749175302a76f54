//! Controller configuration types and builder

use crate::command::SENSE_ON_SETTLE_US;
pub use crate::error::BuilderError;

/// Controller configuration
///
/// Use `Builder` to create a Config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Wait after sense on before the controller reports itself awake
    pub wake_settle_us: u32,
    /// Extra wait added to every power-on step's minimum settle time
    pub settle_margin_us: u32,
    /// Start in diagnostic passthrough mode
    pub diagnostic_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_settle_us: SENSE_ON_SETTLE_US,
            settle_margin_us: 0,
            diagnostic_mode: false,
        }
    }
}

/// Builder for constructing controller configuration
///
/// # Example
///
/// ```rust,no_run
/// use hx85x::Builder;
///
/// let config = match Builder::new().wake_settle_us(2_000).settle_margin_us(500).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let _ = config;
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the settle time after sense on
    ///
    /// Must be at least [`SENSE_ON_SETTLE_US`].
    pub fn wake_settle_us(mut self, value: u32) -> Self {
        self.config.wake_settle_us = value;
        self
    }

    /// Set extra slack added to every power-on step
    ///
    /// Useful on boards with slow supply ramps. The chip minimums are never
    /// shortened.
    pub fn settle_margin_us(mut self, value: u32) -> Self {
        self.config.settle_margin_us = value;
        self
    }

    /// Start in diagnostic passthrough mode
    pub fn diagnostic_mode(mut self, value: bool) -> Self {
        self.config.diagnostic_mode = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::SettleTooShort` if the wake settle time is below
    /// the chip minimum
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.config.wake_settle_us < SENSE_ON_SETTLE_US {
            return Err(BuilderError::SettleTooShort {
                requested_us: self.config.wake_settle_us,
                minimum_us: SENSE_ON_SETTLE_US,
            });
        }
        Ok(self.config)
    }
}
