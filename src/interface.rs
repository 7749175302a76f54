//! Hardware interface abstraction
//!
//! This module provides the [`Transport`] trait and the [`Interface`] struct
//! for talking to an HX852x controller over I2C.
//!
//! ## Hardware Requirements
//!
//! The HX852x requires:
//! - I2C bus (SDA + SCL), 7-bit address (usually 0x48)
//! - Optionally a reset GPIO (output, active low)
//! - An interrupt line, which is serviced by the caller and not owned here
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::delay::DelayNs;
//! use hx85x::{Interface, Transport};
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::OutputPin;
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
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let mut delay = MockDelay;
//! // Interface on the default address, with a reset line
//! let mut interface = Interface::new(MockI2c).with_reset_pin(MockPin);
//!
//! // Pulse reset
//! let _ = interface.reset(&mut delay);
//!
//! // Read the sleep status
//! let mut status = [0u8; 1];
//! let _ = interface.read(0x63, &mut status);
//! ```

use core::convert::Infallible;
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::i2c::{I2c, SevenBitAddress};

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Default 7-bit I2C address of HX852x controllers
pub const DEFAULT_I2C_ADDRESS: u8 = 0x48;

/// Default time the reset line is held low, in milliseconds
pub const DEFAULT_RESET_LOW_MS: u32 = 10;

/// Default wait after releasing reset before the first command, in milliseconds
pub const DEFAULT_RESET_RECOVERY_MS: u32 = 10;

/// Trait for the command transport to an HX852x controller
///
/// Both calls are synchronous and may fail transiently. The driver never
/// retries; a failed call aborts the operation in progress.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. Implement this trait
/// yourself to route commands through a different bus stack, or to inject
/// failures in tests.
pub trait Transport {
    /// Error type for transport operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Write a one byte command and read the fixed-length response into `buf`
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn read(&mut self, command: u8, buf: &mut [u8]) -> InterfaceResult<(), Self::Error>;

    /// Write a command with its payload in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn write(&mut self, bytes: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Pulse the hardware reset line, if there is one
    ///
    /// The default implementation does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if driving the reset line fails.
    fn reset<D: DelayNs>(&mut self, delay: &mut D) -> InterfaceResult<(), Self::Error> {
        let _ = delay;
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read(&mut self, command: u8, buf: &mut [u8]) -> InterfaceResult<(), Self::Error> {
        (**self).read(command, buf)
    }

    fn write(&mut self, bytes: &[u8]) -> InterfaceResult<(), Self::Error> {
        (**self).write(bytes)
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D) -> InterfaceResult<(), Self::Error> {
        (**self).reset(delay)
    }
}

/// Errors that can occur at the interface level
///
/// Generic over I2C and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<I2cErr, PinErr> {
    /// I2C communication error
    I2c(I2cErr),
    /// Reset pin error
    Pin(PinErr),
}

impl<I2cErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<I2cErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<I2cErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<I2cErr, PinErr> {}

/// Placeholder for boards without a reset line
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// I2C implementation of [`Transport`]
///
/// ## Type Parameters
///
/// * `I2C` - I2C bus implementing [`I2c`]
/// * `RST` - Reset pin implementing [`OutputPin`], [`NoPin`] if not wired
pub struct Interface<I2C, RST = NoPin> {
    /// I2C bus
    i2c: I2C,
    /// 7-bit device address
    address: SevenBitAddress,
    /// Reset pin (active low)
    rst: RST,
    /// Whether `rst` is a real pin
    has_reset: bool,
    /// Time reset is held low
    reset_low_ms: u32,
    /// Time waited after releasing reset
    reset_recovery_ms: u32,
}

impl<I2C> Interface<I2C, NoPin>
where
    I2C: I2c,
{
    /// Create an interface on [`DEFAULT_I2C_ADDRESS`] without a reset line
    pub fn new(i2c: I2C) -> Self {
        Self::new_with_address(i2c, DEFAULT_I2C_ADDRESS)
    }

    /// Create an interface on a specific address without a reset line
    pub fn new_with_address(i2c: I2C, address: SevenBitAddress) -> Self {
        Self {
            i2c,
            address,
            rst: NoPin,
            has_reset: false,
            reset_low_ms: DEFAULT_RESET_LOW_MS,
            reset_recovery_ms: DEFAULT_RESET_RECOVERY_MS,
        }
    }

    /// Attach a reset pin
    pub fn with_reset_pin<P: OutputPin>(self, rst: P) -> Interface<I2C, P> {
        Interface {
            i2c: self.i2c,
            address: self.address,
            rst,
            has_reset: true,
            reset_low_ms: self.reset_low_ms,
            reset_recovery_ms: self.reset_recovery_ms,
        }
    }
}

impl<I2C, RST> Interface<I2C, RST>
where
    I2C: I2c,
    RST: OutputPin,
{
    /// Device address
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Set reset timing in milliseconds
    ///
    /// `low_ms` is how long reset is held low (power rail settle time),
    /// `recovery_ms` is the wait after release before the chip accepts commands.
    pub fn set_reset_timing(&mut self, low_ms: u32, recovery_ms: u32) -> &mut Self {
        self.reset_low_ms = low_ms;
        self.reset_recovery_ms = recovery_ms;
        self
    }

    /// Get reset timing as `(low_ms, recovery_ms)`
    pub fn reset_timing(&self) -> (u32, u32) {
        (self.reset_low_ms, self.reset_recovery_ms)
    }

    /// Give back the bus and the reset pin
    pub fn release(self) -> (I2C, RST) {
        (self.i2c, self.rst)
    }
}

impl<I2C, RST> Transport for Interface<I2C, RST>
where
    I2C: I2c,
    RST: OutputPin,
{
    type Error = InterfaceError<I2C::Error, RST::Error>;

    fn read(&mut self, command: u8, buf: &mut [u8]) -> InterfaceResult<(), Self::Error> {
        self.i2c
            .write_read(self.address, &[command], buf)
            .map_err(InterfaceError::I2c)
    }

    fn write(&mut self, bytes: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.i2c
            .write(self.address, bytes)
            .map_err(InterfaceError::I2c)
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D) -> InterfaceResult<(), Self::Error> {
        if !self.has_reset {
            return Ok(());
        }
        // LOW -> wait for rails -> HIGH -> wait until the chip talks
        self.rst.set_low().map_err(InterfaceError::Pin)?;
        delay.delay_ms(self.reset_low_ms);
        self.rst.set_high().map_err(InterfaceError::Pin)?;
        delay.delay_ms(self.reset_recovery_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use embedded_hal::i2c::{ErrorKind, ErrorType as I2cErrorType, Operation};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct MockError;

    impl embedded_hal::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Default)]
    struct MockI2c {
        writes: Vec<(u8, Vec<u8>)>,
        response: Vec<u8>,
        fail: bool,
    }

    impl I2cErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(MockError);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        let n = buf.len().min(self.response.len());
                        buf[..n].copy_from_slice(&self.response[..n]);
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPin {
        levels: Vec<bool>,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.levels.push(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.levels.push(true);
            Ok(())
        }
    }

    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_read_writes_command_then_reads() {
        let i2c = MockI2c {
            response: alloc::vec![0x85, 0x26, 0x00],
            ..MockI2c::default()
        };
        let mut interface = Interface::new(i2c);
        let mut buf = [0u8; 3];
        interface.read(0x31, &mut buf).unwrap();
        assert_eq!(buf, [0x85, 0x26, 0x00]);

        let (i2c, _) = interface.release();
        assert_eq!(i2c.writes, alloc::vec![(DEFAULT_I2C_ADDRESS, alloc::vec![0x31])]);
    }

    #[test]
    fn test_write_uses_configured_address() {
        let mut interface = Interface::new_with_address(MockI2c::default(), 0x4A);
        interface.write(&[0x35, 0x02]).unwrap();
        assert_eq!(interface.address(), 0x4A);
        let (i2c, _) = interface.release();
        assert_eq!(i2c.writes, alloc::vec![(0x4A, alloc::vec![0x35, 0x02])]);
    }

    #[test]
    fn test_bus_error_is_wrapped() {
        let i2c = MockI2c {
            fail: true,
            ..MockI2c::default()
        };
        let mut interface = Interface::new(i2c);
        assert!(matches!(
            interface.write(&[0x83]),
            Err(InterfaceError::I2c(MockError))
        ));
    }

    #[test]
    fn test_reset_without_pin_is_noop() {
        let mut interface = Interface::new(MockI2c::default());
        let mut delay = CountingDelay { total_ns: 0 };
        interface.reset(&mut delay).unwrap();
        assert_eq!(delay.total_ns, 0);
    }

    #[test]
    fn test_reset_pulses_pin() {
        let mut interface = Interface::new(MockI2c::default()).with_reset_pin(MockPin::default());
        interface.set_reset_timing(5, 20);
        assert_eq!(interface.reset_timing(), (5, 20));

        let mut delay = CountingDelay { total_ns: 0 };
        interface.reset(&mut delay).unwrap();
        assert_eq!(delay.total_ns, 25_000_000);

        let (_, pin) = interface.release();
        assert_eq!(pin.levels, alloc::vec![false, true]);
    }
}
