//! HX852x Touch Controller Driver
//!
//! A driver for the Himax HX8526, HX8520 and HX8528 capacitive touch controllers.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - Chip identification and model-specific power-on sequences
//! - Event packet decoding for both packet layouts
//! - Sleep and wake with settle handling
//! - Interrupt servicing into a caller-supplied [`ReportSink`]
//! - Per-device lock via `embassy-sync` ([`SharedController`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};
//! use hx85x::{Builder, Controller, Interface, ReportSink, TouchReport};
//!
//! # struct MockI2c;
//! # impl embedded_hal::i2c::ErrorType for MockI2c { type Error = Infallible; }
//! # impl I2c<SevenBitAddress> for MockI2c {
//! #     fn transaction(
//! #         &mut self,
//! #         _address: u8,
//! #         _operations: &mut [Operation<'_>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let i2c = MockI2c;
//! # let mut delay = MockDelay;
//! struct Touches;
//!
//! impl ReportSink for Touches {
//!     type Error = Infallible;
//!
//!     fn report_objects(&mut self, report: &TouchReport) -> Result<(), Self::Error> {
//!         for contact in report.present() {
//!             let _ = (contact.slot, contact.x, contact.y);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let config = match Builder::new().build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut controller = Controller::new(Interface::new(i2c), config);
//! if controller.start(&mut delay).is_err() {
//!     return;
//! }
//!
//! // on every touch interrupt
//! let _ = controller.service_interrupt(&mut Touches);
//! ```

#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

/// Supported chip models and their identity
pub mod chip;
/// HX852x command definitions
pub mod command;
/// Controller configuration types and builder
pub mod config;
/// Core controller operations
pub mod controller;
/// Error types for the driver
pub mod error;
/// Event packet decoding
pub mod event;
/// Hardware interface abstraction
pub mod interface;
/// Touch report aggregation
pub mod report;
/// Controller behind a per-device lock
pub mod shared;

pub use chip::{ChipModel, ChipVariant, ControllerIdentity};
pub use config::{Builder, Config};
pub use controller::{Controller, ControllerState, PowerState, Serviced};
pub use error::{BuilderError, Error, ErrorKind};
pub use event::{ContactRecord, ContactState, DetectedObjects, PacketError};
pub use interface::InterfaceError;
pub use interface::{DEFAULT_I2C_ADDRESS, Interface, NoPin, Transport};
pub use report::{ReportSink, ReportedContact, TouchReport};
pub use shared::SharedController;
