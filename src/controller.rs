//! Core controller operations
//!
//! [`Controller`] owns the transport and the controller state. Every operation
//! takes `&mut self`, so a whole command sequence (bring-up, a wake with its
//! settle time, an event read) always runs without interleaving. Use
//! [`SharedController`](crate::shared::SharedController) when the interrupt
//! path and the worker path live in different contexts.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, trace, warn};

use crate::chip::{ChipVariant, ControllerIdentity, UnsupportedChip};
use crate::command::{
    CHIP_ID_LEN, GET_CHIP_ID, GET_EVENT, GET_SLEEP_STATUS, SENSE_OFF, SENSE_ON,
};
use crate::config::Config;
use crate::error::Error;
use crate::event::{DetectedObjects, MAX_PACKET_LEN, decode};
use crate::interface::Transport;
use crate::report::{ReportSink, aggregate};

type ControllerResult<R, T> = core::result::Result<R, Error<T>>;

/// Power state of the controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PowerState {
    /// Not identified, nothing sent
    #[default]
    Off,
    /// Identified, power-on sequence not completed
    PoweredNotConfigured,
    /// Scanning and raising touch interrupts
    Operating,
    /// Sense off
    Sleeping,
}

/// Controller state guarded together with the transport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Current (or last requested) power state
    pub power_state: PowerState,
    /// Identity read at bring-up, fixed until [`Controller::stop`]
    pub identity: Option<ControllerIdentity>,
    /// Last charger state notification
    pub charger_connected: bool,
    /// Interrupts are left to a diagnostic tool
    pub diagnostic_mode: bool,
    /// An interrupt edge may have been missed while asleep
    pub service_pending: bool,
}

/// Outcome of [`Controller::service_interrupt`]
///
/// Every outcome means the interrupt was handled. Reporting an interrupt as
/// unrecognized makes a level-triggered line fire again immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Serviced {
    /// Diagnostic mode, no bus traffic
    Bypassed,
    /// A report was delivered
    Reported {
        /// Contacts present in the report
        contacts: u8,
    },
    /// No report this cycle (read failed, packet rejected or sink refused)
    Dropped,
}

/// Driver for one HX852x controller
pub struct Controller<T>
where
    T: Transport,
{
    /// Command transport
    transport: T,
    /// Controller configuration
    config: Config,
    /// State machine
    state: ControllerState,
}

impl<T> Controller<T>
where
    T: Transport,
{
    /// Create a new Controller in [`PowerState::Off`]
    ///
    /// Nothing is sent until [`start`](Self::start) or
    /// [`bring_up`](Self::bring_up).
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            state: ControllerState {
                diagnostic_mode: config.diagnostic_mode,
                ..ControllerState::default()
            },
        }
    }

    /// Pulse hardware reset, then bring the controller up
    pub fn start<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> ControllerResult<ControllerIdentity, T> {
        self.transport.reset(delay).map_err(|e| {
            error!("Could not reset controller: {e:?}");
            Error::Transport(e)
        })?;
        self.bring_up(delay)
    }

    /// Identify the chip and run its power-on sequence
    ///
    /// If the chip reports it is already awake, nothing is written. The
    /// identity is fixed after the first success; a later call that reads a
    /// different model fails with [`Error::IdentityMismatch`].
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if any read or write fails. The sequence stops at
    ///   the failing step.
    /// - [`Error::UnsupportedChip`] if the chip is not an HX8526, HX8520 or
    ///   HX8528. Nothing is written in that case.
    pub fn bring_up<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> ControllerResult<ControllerIdentity, T> {
        let identity = self.identify()?;

        if let Some(known) = self.state.identity {
            if known.model != identity.model {
                error!(
                    "Chip model changed from {:04X} to {:04X}",
                    known.model.id(),
                    identity.model.id()
                );
                return Err(Error::IdentityMismatch {
                    expected: known.model.id(),
                    found: identity.model.id(),
                });
            }
        }
        self.state.identity = Some(identity);
        self.state.power_state = PowerState::PoweredNotConfigured;

        let mut status = [0u8; 1];
        self.transport.read(GET_SLEEP_STATUS, &mut status).map_err(|e| {
            error!("Could not get sleep status: {e:?}");
            Error::Transport(e)
        })?;

        if status[0] != 0 {
            info!("Controller already initialized");
            self.state.power_state = PowerState::Operating;
            return Ok(identity);
        }

        self.power_on(identity.variant(), delay)?;
        self.state.power_state = PowerState::Operating;
        info!("Controller {:04X} operating", identity.model.id());

        Ok(identity)
    }

    fn identify(&mut self) -> ControllerResult<ControllerIdentity, T> {
        let mut raw = [0u8; CHIP_ID_LEN];
        self.transport.read(GET_CHIP_ID, &mut raw).map_err(|e| {
            error!("Could not get device ID: {e:?}");
            Error::Transport(e)
        })?;
        info!("Device ID {:02X}{:02X}{:02X}", raw[0], raw[1], raw[2]);

        ControllerIdentity::from_raw(raw).map_err(|UnsupportedChip { raw_id }| {
            error!("Unsupported device");
            Error::UnsupportedChip { raw_id }
        })
    }

    fn power_on<D: DelayNs>(
        &mut self,
        variant: ChipVariant,
        delay: &mut D,
    ) -> ControllerResult<(), T> {
        info!("Initializing digitizer IC");
        for step in variant.power_on_sequence() {
            debug!("{} {:02X?}", step.name, step.bytes);
            self.transport.write(step.bytes).map_err(|e| {
                error!("Power-on step '{}' failed: {e:?}", step.name);
                Error::Transport(e)
            })?;
            delay.delay_us(step.settle_us.saturating_add(self.config.settle_margin_us));
        }
        Ok(())
    }

    /// Read and decode one event packet
    ///
    /// The packet buffer lives on the stack of this call and is sized for the
    /// identified variant.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before a successful bring-up
    /// - [`Error::Transport`] if the read fails (no touch data this cycle)
    /// - [`Error::InvalidPacket`] if the packet is rejected
    pub fn decode_event(&mut self) -> ControllerResult<DetectedObjects, T> {
        let identity = self.configured_identity()?;
        let layout = identity.variant().layout();

        let mut buf = [0u8; MAX_PACKET_LEN];
        let packet = &mut buf[..layout.len()];
        self.transport.read(GET_EVENT, packet).map_err(|e| {
            debug!("Error reading finger status data: {e:?}");
            Error::Transport(e)
        })?;
        trace!("Event packet {:02X?}", packet);

        decode(layout, packet).map_err(|e| {
            warn!("Dropping event packet: {e}");
            Error::from(e)
        })
    }

    /// Service one touch interrupt
    ///
    /// Decodes the pending event and forwards it to `sink`. Failures drop the
    /// frame and are only logged; the next interrupt drives the next attempt.
    pub fn service_interrupt<S: ReportSink>(&mut self, sink: &mut S) -> Serviced {
        self.state.service_pending = false;

        if self.state.diagnostic_mode {
            trace!("Diagnostic mode, interrupt left to the diagnostic client");
            return Serviced::Bypassed;
        }

        let objects = match self.decode_event() {
            Ok(objects) => objects,
            Err(e) => {
                debug!("No object data to report: {e}");
                return Serviced::Dropped;
            }
        };

        match aggregate(&objects, sink) {
            Ok(report) => Serviced::Reported {
                contacts: report.present().count() as u8,
            },
            Err(e) => {
                warn!("Error while reporting objects: {e:?}");
                Serviced::Dropped
            }
        }
    }

    /// Stop scanning
    ///
    /// The state is [`PowerState::Sleeping`] afterwards even if the write
    /// fails; the caller decides whether to retry.
    pub fn sleep(&mut self) -> ControllerResult<(), T> {
        self.configured_identity()?;
        self.state.power_state = PowerState::Sleeping;

        self.transport.write(SENSE_OFF).map_err(|e| {
            error!("Could not turn off sense: {e:?}");
            Error::Transport(e)
        })?;
        info!("Sense off");
        Ok(())
    }

    /// Resume scanning
    ///
    /// Returns after the configured settle time, so the chip is scanning when
    /// this returns `Ok`. The state is [`PowerState::Operating`] afterwards
    /// even if the write fails.
    pub fn wake<D: DelayNs>(&mut self, delay: &mut D) -> ControllerResult<(), T> {
        self.configured_identity()?;
        self.state.power_state = PowerState::Operating;

        self.transport.write(SENSE_ON).map_err(|e| {
            error!("Could not turn on sense: {e:?}");
            Error::Transport(e)
        })?;
        delay.delay_us(self.config.wake_settle_us);

        // the interrupt line is level triggered but an edge may have been
        // lost while asleep
        self.state.service_pending = true;
        info!("Sense on");
        Ok(())
    }

    /// Record a charger state change
    ///
    /// The HX852x has no charger-mode command, so nothing is sent.
    pub fn set_charger_connected(&mut self, connected: bool) {
        if self.state.charger_connected != connected {
            info!("Charger connected: {connected}");
        }
        self.state.charger_connected = connected;
    }

    /// Enter or leave diagnostic passthrough mode
    pub fn set_diagnostic_mode(&mut self, enabled: bool) {
        self.state.diagnostic_mode = enabled;
    }

    /// Whether interrupts are left to a diagnostic client
    pub fn diagnostic_mode(&self) -> bool {
        self.state.diagnostic_mode
    }

    /// Clear and return the pending-service flag set by [`wake`](Self::wake)
    ///
    /// When it returns `true` the caller should run
    /// [`service_interrupt`](Self::service_interrupt) once.
    pub fn take_service_pending(&mut self) -> bool {
        core::mem::take(&mut self.state.service_pending)
    }

    /// Forget the chip (device removal)
    ///
    /// The next bring-up identifies the chip again.
    pub fn stop(&mut self) {
        info!("Controller stopped");
        self.state = ControllerState {
            diagnostic_mode: self.state.diagnostic_mode,
            ..ControllerState::default()
        };
    }

    /// Current state
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Current power state
    pub fn power_state(&self) -> PowerState {
        self.state.power_state
    }

    /// Identity, once brought up
    pub fn identity(&self) -> Option<ControllerIdentity> {
        self.state.identity
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the transport
    ///
    /// Writing to the chip behind the driver's back can desynchronize the
    /// recorded power state.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn release(self) -> T {
        self.transport
    }

    fn configured_identity(&self) -> ControllerResult<ControllerIdentity, T> {
        match (self.state.power_state, self.state.identity) {
            (PowerState::Operating | PowerState::Sleeping, Some(identity)) => Ok(identity),
            _ => Err(Error::NotInitialized),
        }
    }
}
