//! Controller shared between interrupt and worker contexts
//!
//! [`SharedController`] holds a [`Controller`] behind an
//! [`embassy_sync`] blocking mutex. Each operation takes the lock once and runs
//! its whole command sequence inside it, so a bring-up, a power transition and
//! an interrupt service never interleave on the bus.
//!
//! The raw mutex type picks the exclusion scope. `CriticalSectionRawMutex`
//! also masks interrupts for the length of a sequence, including the settle
//! delays; `NoopRawMutex` is enough when every caller runs in one executor.
//!
//! Re-entering the controller from inside a locked section fails with
//! [`Error::Busy`] instead of deadlocking.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;
use log::warn;

use crate::chip::ControllerIdentity;
use crate::controller::{Controller, ControllerState, Serviced};
use crate::error::Error;
use crate::event::DetectedObjects;
use crate::interface::Transport;
use crate::report::ReportSink;

/// A [`Controller`] guarded by a per-device lock
pub struct SharedController<M, T>
where
    M: RawMutex,
    T: Transport,
{
    inner: Mutex<M, RefCell<Controller<T>>>,
}

impl<M, T> SharedController<M, T>
where
    M: RawMutex,
    T: Transport,
{
    /// Wrap a controller
    pub fn new(controller: Controller<T>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(controller)),
        }
    }

    /// Run `f` with exclusive access to the controller
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if called from inside another locked section.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller<T>) -> R) -> Result<R, Error<T>> {
        self.inner.lock(|cell| {
            let mut controller = cell.try_borrow_mut().map_err(|_| Error::Busy)?;
            Ok(f(&mut controller))
        })
    }

    /// See [`Controller::start`]
    ///
    /// The lock is held for the whole sequence, settle delays included. With
    /// `CriticalSectionRawMutex` interrupts stay masked for that time (about
    /// 35 ms, reset pulse plus power-on with the default settle times).
    /// Use `NoopRawMutex` or a thread-mode mutex if that is too long.
    pub fn start<D: DelayNs>(&self, delay: &mut D) -> Result<ControllerIdentity, Error<T>> {
        self.with(|c| c.start(delay))?
    }

    /// See [`Controller::bring_up`]
    ///
    /// The lock is held for the whole sequence, settle delays included. With
    /// `CriticalSectionRawMutex` interrupts stay masked for that time (about
    /// 15 ms with the default settle times).
    pub fn bring_up<D: DelayNs>(&self, delay: &mut D) -> Result<ControllerIdentity, Error<T>> {
        self.with(|c| c.bring_up(delay))?
    }

    /// See [`Controller::decode_event`]
    pub fn decode_event(&self) -> Result<DetectedObjects, Error<T>> {
        self.with(Controller::decode_event)?
    }

    /// Service one touch interrupt
    ///
    /// A busy controller drops the frame like any other failure; the
    /// interrupt still counts as handled.
    pub fn service_interrupt<S: ReportSink>(&self, sink: &mut S) -> Serviced {
        self.with(|c| c.service_interrupt(sink)).unwrap_or_else(|_| {
            warn!("Controller busy, dropping touch frame");
            Serviced::Dropped
        })
    }

    /// See [`Controller::sleep`]
    pub fn sleep(&self) -> Result<(), Error<T>> {
        self.with(Controller::sleep)?
    }

    /// See [`Controller::wake`]
    ///
    /// The sense-on settle delay runs with the lock held.
    pub fn wake<D: DelayNs>(&self, delay: &mut D) -> Result<(), Error<T>> {
        self.with(|c| c.wake(delay))?
    }

    /// See [`Controller::take_service_pending`]
    pub fn take_service_pending(&self) -> Result<bool, Error<T>> {
        self.with(Controller::take_service_pending)
    }

    /// See [`Controller::set_charger_connected`]
    pub fn set_charger_connected(&self, connected: bool) -> Result<(), Error<T>> {
        self.with(|c| c.set_charger_connected(connected))
    }

    /// See [`Controller::set_diagnostic_mode`]
    pub fn set_diagnostic_mode(&self, enabled: bool) -> Result<(), Error<T>> {
        self.with(|c| c.set_diagnostic_mode(enabled))
    }

    /// See [`Controller::stop`]
    pub fn stop(&self) -> Result<(), Error<T>> {
        self.with(Controller::stop)
    }

    /// Snapshot of the controller state
    pub fn state(&self) -> Result<ControllerState, Error<T>> {
        self.with(|c| *c.state())
    }

    /// Unwrap the controller
    pub fn into_inner(self) -> Controller<T> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{GET_CHIP_ID, GET_EVENT, GET_SLEEP_STATUS};
    use crate::config::Config;
    use crate::controller::PowerState;
    use crate::error::ErrorKind;
    use crate::report::TouchReport;
    use alloc::vec::Vec;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[derive(Debug, Default)]
    struct MockTransport {
        writes: Vec<Vec<u8>>,
        event: [u8; 16],
    }

    impl Transport for MockTransport {
        type Error = core::convert::Infallible;

        fn read(&mut self, command: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
            match command {
                GET_CHIP_ID => buf.copy_from_slice(&[0x85, 0x20, 0x00]),
                GET_SLEEP_STATUS => buf[0] = 0,
                GET_EVENT => buf.copy_from_slice(&self.event[..buf.len()]),
                _ => {}
            }
            Ok(())
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.writes.push(bytes.to_vec());
            Ok(())
        }
    }

    struct MockDelay;

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct CountingSink(usize);

    impl ReportSink for CountingSink {
        type Error = core::convert::Infallible;

        fn report_objects(&mut self, _report: &TouchReport) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }
    }

    fn shared() -> SharedController<NoopRawMutex, MockTransport> {
        SharedController::new(Controller::new(MockTransport::default(), Config::default()))
    }

    #[test]
    fn test_operations_go_through_lock() {
        let shared = shared();
        shared.bring_up(&mut MockDelay).unwrap();
        shared.sleep().unwrap();
        shared.wake(&mut MockDelay).unwrap();

        assert_eq!(shared.state().unwrap().power_state, PowerState::Operating);
        assert!(shared.take_service_pending().unwrap());

        let controller = shared.into_inner();
        let writes = controller.release().writes;
        assert_eq!(writes[writes.len() - 2], [0x82]);
        assert_eq!(writes[writes.len() - 1], [0x83]);
    }

    #[test]
    fn test_reentrant_use_is_busy() {
        let shared = shared();
        let inner = shared.with(|_| shared.sleep()).unwrap();
        assert!(matches!(inner, Err(Error::Busy)));
        assert_eq!(inner.unwrap_err().kind(), ErrorKind::Resource);
    }

    struct ReentrantDelay<'a> {
        shared: &'a SharedController<NoopRawMutex, MockTransport>,
        busy_seen: usize,
    }

    impl DelayNs for ReentrantDelay<'_> {
        fn delay_ns(&mut self, _ns: u32) {
            if matches!(self.shared.sleep(), Err(Error::Busy)) {
                self.busy_seen += 1;
            }
        }
    }

    #[test]
    fn test_lock_held_through_settle_delays() {
        let shared = shared();
        let mut delay = ReentrantDelay {
            shared: &shared,
            busy_seen: 0,
        };
        shared.bring_up(&mut delay).unwrap();
        // one settle per power-on step of the HX8520
        assert_eq!(delay.busy_seen, 4);

        let controller = shared.into_inner();
        assert!(!controller.release().writes.contains(&alloc::vec![0x82]));
    }

    #[test]
    fn test_busy_interrupt_is_dropped() {
        let shared = shared();
        shared.bring_up(&mut MockDelay).unwrap();

        let mut sink = CountingSink(0);
        let outcome = shared.with(|_| shared.service_interrupt(&mut sink)).unwrap();
        assert_eq!(outcome, Serviced::Dropped);
        assert_eq!(sink.0, 0);
    }

    #[test]
    fn test_interrupt_reports_through_lock() {
        let shared = shared();
        shared.bring_up(&mut MockDelay).unwrap();
        shared
            .with(|c| {
                // count 1, slot 0 active
                let mut event = [0u8; 16];
                event[12] = 0x10;
                event[13] = 0x01;
                c.transport_mut().event = event;
            })
            .unwrap();

        let mut sink = CountingSink(0);
        assert_eq!(
            shared.service_interrupt(&mut sink),
            Serviced::Reported { contacts: 1 }
        );
        assert_eq!(sink.0, 1);
    }
}
