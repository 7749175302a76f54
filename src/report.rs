//! Touch report aggregation
//!
//! Decoded contacts are turned into a [`TouchReport`] and handed to a
//! [`ReportSink`], which is the boundary to whatever builds the host-facing
//! input report (HID, an input queue, a UI task).

use core::fmt::Debug;

use crate::event::{DetectedObjects, MAX_CONTACT_POINTS};

/// One entry of a touch report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportedContact {
    /// Contact slot
    pub slot: u8,
    /// Whether a finger is present
    pub present: bool,
    /// X position, zero when absent
    pub x: u16,
    /// Y position, zero when absent
    pub y: u16,
}

/// Normalized multi-contact report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchReport {
    /// One entry per slot, absent entries zeroed
    pub contacts: [ReportedContact; MAX_CONTACT_POINTS],
    /// Number of slots the chip declared for this frame
    pub contact_count: u8,
}

impl TouchReport {
    /// Build a report from decoded contacts
    pub fn from_objects(objects: &DetectedObjects) -> Self {
        let mut contacts = [ReportedContact::default(); MAX_CONTACT_POINTS];
        for (entry, record) in contacts.iter_mut().zip(objects.iter()) {
            entry.slot = record.index;
            if record.is_present() {
                entry.present = true;
                entry.x = record.x;
                entry.y = record.y;
            }
        }
        Self {
            contacts,
            contact_count: objects.count() as u8,
        }
    }

    /// Contacts with a finger present
    pub fn present(&self) -> impl Iterator<Item = &ReportedContact> {
        self.contacts.iter().filter(|c| c.present)
    }
}

/// Receiver of touch reports
///
/// Implement this on the type that forwards touches to the host.
pub trait ReportSink {
    /// Error type for report delivery
    type Error: Debug;

    /// Deliver one report
    ///
    /// # Errors
    ///
    /// Returns an error if the report could not be delivered. The driver logs
    /// it and drops the frame.
    fn report_objects(&mut self, report: &TouchReport) -> Result<(), Self::Error>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    type Error = S::Error;

    fn report_objects(&mut self, report: &TouchReport) -> Result<(), Self::Error> {
        (**self).report_objects(report)
    }
}

/// Build a report from `objects` and forward it to `sink`
///
/// Returns the report that was delivered.
pub fn aggregate<S: ReportSink>(
    objects: &DetectedObjects,
    sink: &mut S,
) -> Result<TouchReport, S::Error> {
    let report = TouchReport::from_objects(objects);
    sink.report_objects(&report)?;
    Ok(report)
}
