//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and controller operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during bring-up, decoding and power changes
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level bus errors
//!
//! Runtime errors fall into three classes, see [`ErrorKind`]. None of them are
//! retried by the driver.
//!
//! ## Example
//!
//! ```
//! use hx85x::{Builder, BuilderError};
//!
//! // Sense-on settle below the chip minimum
//! let result = Builder::new().wake_settle_us(100).build();
//! assert!(matches!(result, Err(BuilderError::SettleTooShort { .. })));
//! ```

use crate::event::PacketError;
use crate::interface::Transport;

/// Class of a runtime error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bus-level failure. The caller owns any retry policy.
    Transport,
    /// The chip said something the driver cannot use
    Protocol,
    /// The controller could not be acquired
    Resource,
}

/// Errors that can occur when interacting with the controller
///
/// Generic over the transport type to preserve the specific bus error.
pub enum Error<T: Transport> {
    /// Transport error
    ///
    /// Wraps the underlying error from the [`Transport`] implementation.
    Transport(T::Error),
    /// The chip ID is not a supported model
    ///
    /// Fatal for bring-up: the device cannot be driven.
    UnsupportedChip {
        /// Raw 3-byte ID response
        raw_id: [u8; 3],
    },
    /// The chip reported a different model than the one identified earlier
    IdentityMismatch {
        /// Model ID stored at first bring-up
        expected: u16,
        /// Model ID read now
        found: u16,
    },
    /// The event packet was rejected
    ///
    /// Drops the current interrupt cycle only.
    InvalidPacket(PacketError),
    /// The controller has not been brought up
    NotInitialized,
    /// The controller is already in use by another command sequence
    Busy,
}

impl<T: Transport> Error<T> {
    /// Class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::UnsupportedChip { .. }
            | Self::IdentityMismatch { .. }
            | Self::InvalidPacket(_)
            | Self::NotInitialized => ErrorKind::Protocol,
            Self::Busy => ErrorKind::Resource,
        }
    }
}

impl<T: Transport> From<PacketError> for Error<T> {
    fn from(e: PacketError) -> Self {
        Self::InvalidPacket(e)
    }
}

impl<T: Transport> core::fmt::Display for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {e:?}"),
            Self::UnsupportedChip { raw_id } => write!(
                f,
                "Unsupported chip ID {:02X}{:02X}{:02X}",
                raw_id[0], raw_id[1], raw_id[2]
            ),
            Self::IdentityMismatch { expected, found } => {
                write!(f, "Chip model changed: expected {expected:04X}, found {found:04X}")
            }
            Self::InvalidPacket(e) => write!(f, "{e}"),
            Self::NotInitialized => write!(f, "Controller not initialized"),
            Self::Busy => write!(f, "Controller busy"),
        }
    }
}

// Written out so `T` itself does not have to be `Debug`.
impl<T: Transport> core::fmt::Debug for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => f.debug_tuple("Transport").field(e).finish(),
            Self::UnsupportedChip { raw_id } => f
                .debug_struct("UnsupportedChip")
                .field("raw_id", raw_id)
                .finish(),
            Self::IdentityMismatch { expected, found } => f
                .debug_struct("IdentityMismatch")
                .field("expected", expected)
                .field("found", found)
                .finish(),
            Self::InvalidPacket(e) => f.debug_tuple("InvalidPacket").field(e).finish(),
            Self::NotInitialized => f.write_str("NotInitialized"),
            Self::Busy => f.write_str("Busy"),
        }
    }
}

impl<T: Transport> core::error::Error for Error<T> {}

/// Errors that can occur when building configuration
#[derive(Debug)]
pub enum BuilderError {
    /// A settle time is below the chip minimum
    ///
    /// See [`SENSE_ON_SETTLE_US`](crate::command::SENSE_ON_SETTLE_US).
    SettleTooShort {
        /// Requested settle time
        requested_us: u32,
        /// Chip minimum
        minimum_us: u32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SettleTooShort {
                requested_us,
                minimum_us,
            } => write!(
                f,
                "Settle time {requested_us}us is below the chip minimum of {minimum_us}us"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}
