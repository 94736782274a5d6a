//! # Central adapter
//!
//! Every command follows the same sequence:
//!
//! 1. Pending data on the transport is discarded, so the response can not be mixed up with data
//!    of a previous exchange
//! 2. The command line is written
//! 3. The response is captured until a success or failure token is found or the timeout elapsed
//!
//! ## Example
//!
//! ````
//! # use esp01_at::adapter::Adapter;
//! # use esp01_at::example::{ExampleSerial, ExampleTimer};
//! #
//! let mut adapter: Adapter<_, _, 1_000_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default()).unwrap();
//!
//! // Checking if the module is alive
//! adapter.kick().unwrap();
//!
//! // Joining the WIFI network
//! adapter.join("test_wifi", "secret").unwrap();
//! ````
use crate::capture::{Capture, TokenSet};
use crate::commands::{Command, Wait};
use alloc::format;
use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};
use fugit::{ExtU32, TimerDurationU32};
use fugit_timer::Timer;

/// Reason why the ESP-AT did not acknowledge a command
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    /// No expected token was received within the timeout
    Timeout,

    /// ESP-AT responded with a failure token, e.g. ERROR
    Rejected,
}

/// Driver errors
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Command was not acknowledged by ESP-AT
    CommandFailed(Reason),

    /// Preparing the transmission failed (CIPSEND command was not answered by data prompt)
    TransmissionStartFailed(Reason),

    /// Transmitted data was not confirmed by ESP-AT
    SendFailed(Reason),

    /// Token set is empty, contains more then three tokens or an empty token
    InvalidTokenSet,

    /// Link ID is out of the supported range 0-4
    InvalidLinkId(u8),

    /// Given SSD is longer then the max. size of 32 chars
    InvalidSsidLength,

    /// Given password is longer then the max. size of 63 chars
    InvalidPasswordLength,

    /// Reading from the transport failed
    ReadError(ErrorKind),

    /// Writing to the transport failed
    WriteError(ErrorKind),

    /// Upstream timer error
    TimerError,
}

impl Error {
    /// Returns true if the error was caused by a missing response
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed(Reason::Timeout)
                | Error::TransmissionStartFailed(Reason::Timeout)
                | Error::SendFailed(Reason::Timeout)
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Reason::Timeout => defmt::write!(f, "Reason::Timeout"),
            Reason::Rejected => defmt::write!(f, "Reason::Rejected"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::CommandFailed(r) => defmt::write!(f, "Error::CommandFailed({})", r),
            Error::TransmissionStartFailed(r) => defmt::write!(f, "Error::TransmissionStartFailed({})", r),
            Error::SendFailed(r) => defmt::write!(f, "Error::SendFailed({})", r),
            Error::InvalidTokenSet => defmt::write!(f, "Error::InvalidTokenSet"),
            Error::InvalidLinkId(id) => defmt::write!(f, "Error::InvalidLinkId({})", id),
            Error::InvalidSsidLength => defmt::write!(f, "Error::InvalidSsidLength"),
            Error::InvalidPasswordLength => defmt::write!(f, "Error::InvalidPasswordLength"),
            Error::ReadError(kind) => defmt::write!(f, "Error::ReadError({})", defmt::Debug2Format(kind)),
            Error::WriteError(kind) => defmt::write!(f, "Error::WriteError({})", defmt::Debug2Format(kind)),
            Error::TimerError => defmt::write!(f, "Error::TimerError"),
        }
    }
}

/// Response timeouts
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config<const TIMER_HZ: u32> {
    /// Local commands like AT, CWQAP, CWMODE or CIPMUX
    pub command_timeout: TimerDurationU32<TIMER_HZ>,

    /// Commands involving network I/O: CWJAP, CIPSTART, PING and RST
    pub network_timeout: TimerDurationU32<TIMER_HZ>,

    /// Closing a connection (CIPCLOSE)
    pub close_timeout: TimerDurationU32<TIMER_HZ>,

    /// Waiting for the data prompt after CIPSEND
    pub prompt_timeout: TimerDurationU32<TIMER_HZ>,

    /// Waiting for SEND OK after transmitting data
    pub confirm_timeout: TimerDurationU32<TIMER_HZ>,
}

impl<const TIMER_HZ: u32> Default for Config<TIMER_HZ> {
    fn default() -> Self {
        Self {
            command_timeout: 1_000.millis(),
            network_timeout: 10_000.millis(),
            close_timeout: 5_000.millis(),
            prompt_timeout: 5_000.millis(),
            confirm_timeout: 10_000.millis(),
        }
    }
}

impl<const TIMER_HZ: u32> Config<TIMER_HZ> {
    /// Returns the timeout of the given class
    pub(crate) fn timeout(&self, wait: Wait) -> TimerDurationU32<TIMER_HZ> {
        match wait {
            Wait::Command => self.command_timeout,
            Wait::Network => self.network_timeout,
            Wait::Close => self.close_timeout,
            Wait::Prompt => self.prompt_timeout,
            Wait::Confirm => self.confirm_timeout,
        }
    }
}

/// Central client for communicating with an ESP-01 module
///
/// The transport is exclusively owned by the adapter. As `embedded-io` traits are implemented
/// for mutable references too, a borrowed serial port may be passed as well.
pub struct Adapter<T: Read + Write + ReadReady, Tm: Timer<TIMER_HZ>, const TIMER_HZ: u32> {
    /// Serial connection to the ESP-AT
    pub(crate) transport: T,

    /// Timer used for timeout measurement
    pub(crate) timer: Tm,

    /// Response timeouts
    pub(crate) config: Config<TIMER_HZ>,
}

impl<T: Read + Write + ReadReady, Tm: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<T, Tm, TIMER_HZ> {
    /// Creates a new adapter using the default timeouts. Data already pending on the transport is discarded.
    pub fn new(transport: T, timer: Tm) -> Result<Self, Error> {
        Self::with_config(transport, timer, Config::default())
    }

    /// Creates a new adapter with custom timeouts. Data already pending on the transport is discarded.
    pub fn with_config(transport: T, timer: Tm, config: Config<TIMER_HZ>) -> Result<Self, Error> {
        let mut adapter = Self {
            transport,
            timer,
            config,
        };

        adapter.flush_input()?;
        Ok(adapter)
    }

    /// Returns the current timeout configuration
    pub fn config(&self) -> &Config<TIMER_HZ> {
        &self.config
    }

    /// Sets the timeout for local commands in ms
    pub fn set_command_timeout_ms(&mut self, timeout: u32) {
        self.config.command_timeout = TimerDurationU32::millis(timeout);
    }

    /// Sets the timeout for commands involving network I/O in ms
    pub fn set_network_timeout_ms(&mut self, timeout: u32) {
        self.config.network_timeout = TimerDurationU32::millis(timeout);
    }

    /// Sets the timeout for closing connections in ms
    pub fn set_close_timeout_ms(&mut self, timeout: u32) {
        self.config.close_timeout = TimerDurationU32::millis(timeout);
    }

    /// Sets the timeouts for sending TCP data in ms
    pub fn set_send_timeout_ms(&mut self, prompt_timeout: u32, confirm_timeout: u32) {
        self.config.prompt_timeout = TimerDurationU32::millis(prompt_timeout);
        self.config.confirm_timeout = TimerDurationU32::millis(confirm_timeout);
    }

    /// Releases transport and timer
    pub fn release(self) -> (T, Tm) {
        (self.transport, self.timer)
    }

    /// Sends a command and maps the captured response to the command result
    pub(crate) fn send_command<Cmd: Command>(&mut self, command: &Cmd) -> Result<Capture<'static>, Error> {
        let tokens = TokenSet::from_parts(Cmd::SUCCESS, Cmd::FAILURE)?;

        self.flush_input()?;
        self.write_command(command)?;

        let capture = self.capture(&tokens, self.config.timeout(Cmd::WAIT))?;
        Cmd::verdict(&capture)?;

        Ok(capture)
    }

    /// Writes the command line including line terminator
    pub(crate) fn write_command<Cmd: Command>(&mut self, command: &Cmd) -> Result<(), Error> {
        let line = format!("AT{}", command.encode());
        debug!("Sending AT{}", command.describe().as_str());

        self.write_data(line.as_bytes())?;
        self.write_data(b"\r\n")
    }

    /// Writes the given raw data and flushes the transport
    pub(crate) fn write_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.transport.write_all(data).map_err(|e| Error::WriteError(e.kind()))?;
        self.transport.flush().map_err(|e| Error::WriteError(e.kind()))
    }
}
