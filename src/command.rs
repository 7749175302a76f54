//! HX852x command definitions
//!
//! This module defines the command bytes used to drive the Himax HX852x touch
//! controllers, and the per-variant power-on sequences built from them.
//!
//! Every command starts with a single opcode byte. Some commands carry a short
//! fixed payload which is sent in the same bus write; read commands are a one
//! byte write followed by a fixed-length read.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hx85x::{command, Interface, Transport};
//! # use core::convert::Infallible;
//! # use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
//! # struct MockI2c;
//! # impl ErrorType for MockI2c { type Error = Infallible; }
//! # impl I2c<SevenBitAddress> for MockI2c {
//! #     fn transaction(
//! #         &mut self,
//! #         _address: u8,
//! #         _operations: &mut [Operation<'_>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # let mut interface = Interface::new(MockI2c);
//! // Identify the chip
//! let mut id = [0u8; 3];
//! let _ = interface.read(command::GET_CHIP_ID, &mut id);
//!
//! // Start scanning
//! let _ = interface.write(command::SENSE_ON);
//! ```

// Identification and status

/// Get chip ID command (0x31)
///
/// Returns 3 bytes. The first two form the chip model, high byte first.
pub const GET_CHIP_ID: u8 = 0x31;

/// Length of the [`GET_CHIP_ID`] response
pub const CHIP_ID_LEN: usize = 3;

/// Get sleep status command (0x63)
///
/// Returns 1 byte. Non-zero means the controller firmware is already running.
pub const GET_SLEEP_STATUS: u8 = 0x63;

/// Get event command (0x85)
///
/// Returns one event packet. The length depends on the chip variant, see
/// [`PacketLayout`](crate::event::PacketLayout).
pub const GET_EVENT: u8 = 0x85;

// Power-on commands

/// IC power on (0x81)
pub const IC_POWER_ON: &[u8] = &[0x81];

/// MCU power on (0x35 0x02)
pub const MCU_POWER_ON: &[u8] = &[0x35, 0x02];

/// Flash power on for HX8526 (0x36 0x0F 0x53)
pub const FLASH_POWER_ON_A: &[u8] = &[0x36, 0x0F, 0x53];

/// Fetch flash for HX8526 (0xDD 0x04 0x02)
pub const FETCH_FLASH_A: &[u8] = &[0xDD, 0x04, 0x02];

/// Flash power on for HX8520/HX8528 (0x36 0x01)
pub const FLASH_POWER_ON_B: &[u8] = &[0x36, 0x01];

/// Speed mode for HX8520/HX8528 (0x9D 0x80)
///
/// Must be issued before the MCU is powered.
pub const SPEED_MODE_B: &[u8] = &[0x9D, 0x80];

// Power management commands

/// Sense on (0x83)
///
/// Starts panel scanning. The chip needs [`SENSE_ON_SETTLE_US`] before it
/// produces events.
pub const SENSE_ON: &[u8] = &[0x83];

/// Sense off (0x82)
///
/// Stops panel scanning. No event interrupts are raised until sense on.
pub const SENSE_OFF: &[u8] = &[0x82];

// Settle times

/// Settle time after [`IC_POWER_ON`] in microseconds
pub const IC_POWER_ON_SETTLE_US: u32 = 12_000;

/// Settle time after every other power-on step in microseconds
pub const STEP_SETTLE_US: u32 = 1_000;

/// Minimum settle time after [`SENSE_ON`] in microseconds
pub const SENSE_ON_SETTLE_US: u32 = 1_000;

/// One step of a power-on sequence
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Short name used in log output
    pub name: &'static str,
    /// Opcode and payload, sent in a single write
    pub bytes: &'static [u8],
    /// Minimum wait after the write before the next command
    pub settle_us: u32,
}

impl Step {
    const fn new(name: &'static str, bytes: &'static [u8], settle_us: u32) -> Self {
        Self {
            name,
            bytes,
            settle_us,
        }
    }
}

/// Power-on sequence for HX8526 controllers
pub const POWER_ON_SEQUENCE_A: &[Step] = &[
    Step::new("IC power on", IC_POWER_ON, IC_POWER_ON_SETTLE_US),
    Step::new("MCU power on", MCU_POWER_ON, STEP_SETTLE_US),
    Step::new("flash power on", FLASH_POWER_ON_A, STEP_SETTLE_US),
    Step::new("fetch flash", FETCH_FLASH_A, STEP_SETTLE_US),
];

/// Power-on sequence for HX8520 and HX8528 controllers
pub const POWER_ON_SEQUENCE_B: &[Step] = &[
    Step::new("IC power on", IC_POWER_ON, IC_POWER_ON_SETTLE_US),
    Step::new("speed mode", SPEED_MODE_B, STEP_SETTLE_US),
    Step::new("MCU power on", MCU_POWER_ON, STEP_SETTLE_US),
    Step::new("flash power on", FLASH_POWER_ON_B, STEP_SETTLE_US),
];
