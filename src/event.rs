//! Event packet layout and decoding
//!
//! Every touch interrupt is serviced by reading one event packet with
//! [`GET_EVENT`](crate::command::GET_EVENT). The packet is a fixed-size record:
//!
//! ```text
//! +---------------------------+----------+-------+------+----------+
//! | slot 0 .. slot N-1        | reserved | count | mask | reserved |
//! | XH XL YH YL per slot      | R bytes  | 1     | 1    | 2        |
//! +---------------------------+----------+-------+------+----------+
//! ```
//!
//! HX8526 uses N = 5, R = 8 (32 bytes). HX8520/HX8528 use N = 2, R = 4
//! (16 bytes). The contact count sits in the high nibble of the count byte.
//!
//! ## Example
//!
//! ```
//! use hx85x::event::{decode, ContactState, LAYOUT_B};
//!
//! let mut packet = [0u8; 16];
//! packet[0..4].copy_from_slice(&[0x01, 0x2C, 0x00, 0xC8]); // x = 300, y = 200
//! packet[12] = 0x10; // one contact
//! packet[13] = 0x01; // slot 0 active
//!
//! let objects = decode(LAYOUT_B, &packet).unwrap();
//! let contact = objects.get(0).unwrap();
//! assert_eq!(contact.state, ContactState::PresentWithAccuratePosition);
//! assert_eq!((contact.x, contact.y), (300, 200));
//! ```

/// Maximum number of contacts carried through the report path
pub const MAX_CONTACT_POINTS: usize = 10;

/// Count nibble value meaning "unknown"
pub const COUNT_SENTINEL: u8 = 0x0F;

/// Active mask value meaning "unknown"
pub const MASK_SENTINEL: u8 = 0xFF;

/// Largest slot count a layout can declare
///
/// The active points mask is one byte, one bit per slot.
pub const MAX_LAYOUT_SLOTS: usize = 8;

const SLOT_LEN: usize = 4;
const TRAILER_RESERVED_LEN: usize = 2;

/// Byte layout of an event packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketLayout {
    /// Number of 4-byte contact slots at the start of the packet
    pub contact_slots: usize,
    /// Reserved bytes between the slots and the count byte
    pub reserved_len: usize,
}

/// HX8526 layout: 5 slots, 8 reserved bytes
pub const LAYOUT_A: PacketLayout = PacketLayout::new(5, 8);

/// HX8520/HX8528 layout: 2 slots, 4 reserved bytes
pub const LAYOUT_B: PacketLayout = PacketLayout::new(2, 4);

/// Largest packet of any supported layout
pub const MAX_PACKET_LEN: usize = LAYOUT_A.len();

impl PacketLayout {
    /// Create a layout
    pub const fn new(contact_slots: usize, reserved_len: usize) -> Self {
        Self {
            contact_slots,
            reserved_len,
        }
    }

    /// Offset of the count byte
    pub const fn count_offset(&self) -> usize {
        self.contact_slots * SLOT_LEN + self.reserved_len
    }

    /// Offset of the active points mask
    pub const fn mask_offset(&self) -> usize {
        self.count_offset() + 1
    }

    /// Total packet length in bytes
    pub const fn len(&self) -> usize {
        self.mask_offset() + 1 + TRAILER_RESERVED_LEN
    }
}

/// Presence state of one contact slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContactState {
    /// No finger in this slot
    #[default]
    Absent,
    /// Finger present, position is valid
    PresentWithAccuratePosition,
}

/// One decoded contact slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactRecord {
    /// Slot index
    pub index: u8,
    /// Presence state
    pub state: ContactState,
    /// X position in panel units
    pub x: u16,
    /// Y position in panel units
    pub y: u16,
}

impl ContactRecord {
    /// Whether the slot holds a finger
    pub fn is_present(&self) -> bool {
        self.state == ContactState::PresentWithAccuratePosition
    }
}

/// Contacts decoded from one event packet
///
/// Slots at or beyond [`count`](Self::count) are always [`ContactState::Absent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectedObjects {
    records: [ContactRecord; MAX_CONTACT_POINTS],
    count: usize,
}

impl Default for DetectedObjects {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectedObjects {
    /// Empty set with every slot absent
    pub fn new() -> Self {
        let mut records = [ContactRecord::default(); MAX_CONTACT_POINTS];
        for (i, record) in records.iter_mut().enumerate() {
            record.index = i as u8;
        }
        Self { records, count: 0 }
    }

    /// Number of slots the packet declared
    pub fn count(&self) -> usize {
        self.count
    }

    /// Record for slot `index`
    pub fn get(&self, index: usize) -> Option<&ContactRecord> {
        self.records.get(index)
    }

    /// All slots, present or not
    pub fn iter(&self) -> impl Iterator<Item = &ContactRecord> {
        self.records.iter()
    }

    /// Only the slots holding a finger
    pub fn present(&self) -> impl Iterator<Item = &ContactRecord> {
        self.records.iter().filter(|r| r.is_present())
    }
}

/// Packet rejected by the decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Layout declares more slots than the mask byte can describe
    UnsupportedLayout {
        /// Slots in the layout
        contact_slots: usize,
        /// Largest supported slot count
        max: usize,
    },
    /// Fewer bytes than the layout needs
    TooShort {
        /// Layout length
        expected: usize,
        /// Bytes supplied
        provided: usize,
    },
    /// Declared contact count exceeds the physical slot count
    ContactCountOutOfRange {
        /// Normalized count from the packet
        count: u8,
        /// Slots in the layout
        max: usize,
    },
}

impl core::fmt::Display for PacketError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedLayout { contact_slots, max } => {
                write!(f, "Packet layout with {contact_slots} slots (max {max})")
            }
            Self::TooShort { expected, provided } => {
                write!(
                    f,
                    "Event packet too short: expected {expected} bytes, provided {provided}"
                )
            }
            Self::ContactCountOutOfRange { count, max } => {
                write!(f, "Invalid touch point count {count} (max {max})")
            }
        }
    }
}

impl core::error::Error for PacketError {}

/// Normalized contact count from the count byte
pub fn contact_count(count_byte: u8) -> u8 {
    match count_byte >> 4 {
        COUNT_SENTINEL => 0,
        n => n,
    }
}

/// Normalized active points mask
pub fn active_mask(mask_byte: u8) -> u8 {
    match mask_byte {
        MASK_SENTINEL => 0,
        m => m,
    }
}

/// Decode an event packet
///
/// Extra trailing bytes are ignored. On error nothing is returned, so a
/// partially decoded packet is never visible to the caller.
///
/// # Errors
///
/// - [`PacketError::UnsupportedLayout`] if the layout has more than
///   [`MAX_LAYOUT_SLOTS`] slots
/// - [`PacketError::TooShort`] if `packet` is shorter than `layout.len()`
/// - [`PacketError::ContactCountOutOfRange`] if the count exceeds the slots
pub fn decode(layout: PacketLayout, packet: &[u8]) -> Result<DetectedObjects, PacketError> {
    if layout.contact_slots > MAX_LAYOUT_SLOTS {
        return Err(PacketError::UnsupportedLayout {
            contact_slots: layout.contact_slots,
            max: MAX_LAYOUT_SLOTS,
        });
    }
    if packet.len() < layout.len() {
        return Err(PacketError::TooShort {
            expected: layout.len(),
            provided: packet.len(),
        });
    }

    let count = contact_count(packet[layout.count_offset()]);
    if count as usize > layout.contact_slots {
        return Err(PacketError::ContactCountOutOfRange {
            count,
            max: layout.contact_slots,
        });
    }
    let mask = active_mask(packet[layout.mask_offset()]);

    let mut objects = DetectedObjects::new();
    for (i, slot) in packet
        .chunks_exact(SLOT_LEN)
        .take(count as usize)
        .enumerate()
    {
        let record = &mut objects.records[i];
        record.x = u16::from_be_bytes([slot[0], slot[1]]);
        record.y = u16::from_be_bytes([slot[2], slot[3]]);
        record.state = if mask & (1 << i) != 0 {
            ContactState::PresentWithAccuratePosition
        } else {
            ContactState::Absent
        };
    }
    objects.count = count as usize;

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_a(slots: &[(u16, u16)], count_byte: u8, mask: u8) -> [u8; 32] {
        let mut packet = [0u8; 32];
        for (i, (x, y)) in slots.iter().enumerate() {
            packet[i * 4..i * 4 + 2].copy_from_slice(&x.to_be_bytes());
            packet[i * 4 + 2..i * 4 + 4].copy_from_slice(&y.to_be_bytes());
        }
        packet[LAYOUT_A.count_offset()] = count_byte;
        packet[LAYOUT_A.mask_offset()] = mask;
        packet
    }

    #[test]
    fn test_layout_offsets() {
        assert_eq!(LAYOUT_A.count_offset(), 28);
        assert_eq!(LAYOUT_A.mask_offset(), 29);
        assert_eq!(LAYOUT_A.len(), 32);

        assert_eq!(LAYOUT_B.count_offset(), 12);
        assert_eq!(LAYOUT_B.mask_offset(), 13);
        assert_eq!(LAYOUT_B.len(), 16);

        assert_eq!(MAX_PACKET_LEN, 32);
    }

    #[test]
    fn test_decode_sparse_mask() {
        let slots = [
            (0x0102, 0x0304),
            (0x0506, 0x0708),
            (0x0A0B, 0x0C0D),
            (0x1112, 0x1314),
        ];
        let packet = packet_a(&slots, 0x40, 0b0000_1101);

        let objects = decode(LAYOUT_A, &packet).unwrap();
        assert_eq!(objects.count(), 4);

        for i in [0usize, 2, 3] {
            let record = objects.get(i).unwrap();
            assert!(record.is_present(), "slot {i}");
            assert_eq!((record.x, record.y), slots[i]);
        }
        assert_eq!(objects.get(1).unwrap().state, ContactState::Absent);
        for i in 4..MAX_CONTACT_POINTS {
            assert_eq!(objects.get(i).unwrap().state, ContactState::Absent);
        }
        assert_eq!(objects.present().count(), 3);
    }

    #[test]
    fn test_decode_count_sentinel_reports_nothing() {
        let packet = packet_a(&[(100, 100)], 0xF0, 0x01);
        let objects = decode(LAYOUT_A, &packet).unwrap();
        assert_eq!(objects.count(), 0);
        assert_eq!(objects.present().count(), 0);
    }

    #[test]
    fn test_decode_mask_sentinel_marks_all_absent() {
        let packet = packet_a(&[(1, 2), (3, 4)], 0x20, 0xFF);
        let objects = decode(LAYOUT_A, &packet).unwrap();
        assert_eq!(objects.count(), 2);
        assert_eq!(objects.present().count(), 0);
        // positions are still carried for in-range slots
        assert_eq!(objects.get(1).unwrap().x, 3);
    }

    #[test]
    fn test_decode_count_above_layout_rejected() {
        let mut packet = [0u8; 16];
        packet[LAYOUT_B.count_offset()] = 0x30;
        packet[LAYOUT_B.mask_offset()] = 0x07;
        assert_eq!(
            decode(LAYOUT_B, &packet),
            Err(PacketError::ContactCountOutOfRange { count: 3, max: 2 })
        );
    }

    #[test]
    fn test_decode_low_nibble_ignored() {
        let packet = packet_a(&[(7, 8)], 0x1E, 0x01);
        let objects = decode(LAYOUT_A, &packet).unwrap();
        assert_eq!(objects.count(), 1);
        assert!(objects.get(0).unwrap().is_present());
    }

    #[test]
    fn test_decode_rejects_oversized_layout() {
        let layout = PacketLayout::new(12, 0);
        let mut packet = [0u8; 64];
        packet[layout.count_offset()] = 0xB0;
        packet[layout.mask_offset()] = 0x01;
        assert_eq!(
            decode(layout, &packet),
            Err(PacketError::UnsupportedLayout {
                contact_slots: 12,
                max: MAX_LAYOUT_SLOTS
            })
        );
    }

    #[test]
    fn test_decode_accepts_widest_layout() {
        let layout = PacketLayout::new(MAX_LAYOUT_SLOTS, 0);
        let mut packet = [0u8; 64];
        packet[(MAX_LAYOUT_SLOTS - 1) * 4..MAX_LAYOUT_SLOTS * 4]
            .copy_from_slice(&[0x00, 0x07, 0x00, 0x08]);
        packet[layout.count_offset()] = 0x80;
        packet[layout.mask_offset()] = 0x80;

        let objects = decode(layout, &packet).unwrap();
        let last = objects.get(MAX_LAYOUT_SLOTS - 1).unwrap();
        assert!(last.is_present());
        assert_eq!((last.x, last.y), (7, 8));
        assert_eq!(objects.present().count(), 1);
    }

    #[test]
    fn test_decode_short_packet_rejected() {
        let packet = [0u8; 20];
        assert_eq!(
            decode(LAYOUT_A, &packet),
            Err(PacketError::TooShort {
                expected: 32,
                provided: 20
            })
        );
    }

    #[test]
    fn test_decode_uses_variant_b_offsets() {
        let mut packet = [0u8; 16];
        packet[4..8].copy_from_slice(&[0x02, 0x00, 0x01, 0x00]);
        packet[12] = 0x20;
        packet[13] = 0x02;

        let objects = decode(LAYOUT_B, &packet).unwrap();
        assert!(!objects.get(0).unwrap().is_present());
        let second = objects.get(1).unwrap();
        assert!(second.is_present());
        assert_eq!((second.x, second.y), (0x0200, 0x0100));
    }

    #[test]
    fn test_detected_objects_indexes_slots() {
        let objects = DetectedObjects::new();
        for (i, record) in objects.iter().enumerate() {
            assert_eq!(record.index as usize, i);
        }
    }
}
