//! Chip identification
//!
//! The HX852x family shares one command set but differs in event packet layout
//! and power-on sequence. The model is read once during bring-up and decides
//! which [`ChipVariant`] the driver uses for the rest of the device lifetime.

use crate::command::{POWER_ON_SEQUENCE_A, POWER_ON_SEQUENCE_B, Step};
use crate::event::{LAYOUT_A, LAYOUT_B, PacketLayout};

/// Supported chip models
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum ChipModel {
    /// HX8526, five contact slots
    Hx8526 = 0x8526,
    /// HX8520, two contact slots
    Hx8520 = 0x8520,
    /// HX8528, driven like the HX8520
    Hx8528 = 0x8528,
}

impl ChipModel {
    /// Look up a model from its 16-bit ID
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x8526 => Some(Self::Hx8526),
            0x8520 => Some(Self::Hx8520),
            0x8528 => Some(Self::Hx8528),
            _ => None,
        }
    }

    /// 16-bit model ID as reported by the chip
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Protocol variant used by this model
    pub fn variant(self) -> ChipVariant {
        match self {
            Self::Hx8526 => ChipVariant::A,
            Self::Hx8520 | Self::Hx8528 => ChipVariant::B,
        }
    }
}

/// Protocol variant
///
/// Selects the event packet layout and the power-on sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChipVariant {
    /// Five contact slots, flash fetch at the end of power-on
    A,
    /// Two contact slots, speed mode before MCU power-on
    B,
}

impl ChipVariant {
    /// Event packet layout
    pub fn layout(self) -> PacketLayout {
        match self {
            Self::A => LAYOUT_A,
            Self::B => LAYOUT_B,
        }
    }

    /// Power-on command sequence
    pub fn power_on_sequence(self) -> &'static [Step] {
        match self {
            Self::A => POWER_ON_SEQUENCE_A,
            Self::B => POWER_ON_SEQUENCE_B,
        }
    }

    /// Number of physical contact slots
    pub fn max_contacts(self) -> usize {
        self.layout().contact_slots
    }
}

/// Returned when the chip ID is not a supported model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsupportedChip {
    /// Raw 3-byte ID response
    pub raw_id: [u8; 3],
}

/// Identity of the attached controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerIdentity {
    /// Raw 3-byte ID response
    pub raw_id: [u8; 3],
    /// Recognized chip model
    pub model: ChipModel,
}

impl ControllerIdentity {
    /// Decode the 3-byte chip ID response
    ///
    /// The model is formed from the first two bytes, high byte first. The third
    /// byte is kept for logging only.
    pub fn from_raw(raw_id: [u8; 3]) -> Result<Self, UnsupportedChip> {
        let id = u16::from_be_bytes([raw_id[0], raw_id[1]]);
        ChipModel::from_id(id)
            .map(|model| Self { raw_id, model })
            .ok_or(UnsupportedChip { raw_id })
    }

    /// Protocol variant of the identified model
    pub fn variant(&self) -> ChipVariant {
        self.model.variant()
    }

    /// Number of contacts the chip can report
    pub fn max_contacts(&self) -> usize {
        self.variant().max_contacts()
    }
}
