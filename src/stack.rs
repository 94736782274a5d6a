//! # TCP connections
//!
//! Connections are either established in single connection mode (default of ESP-AT) or in
//! multiple connections mode, which needs to be enabled by `set_multiple_connections(true)` first.
//! In multiple connections mode each connection is identified by a [LinkId].
//!
//! ## Example
//!
//! ````
//! # use esp01_at::adapter::Adapter;
//! # use esp01_at::example::{ExampleSerial, ExampleTimer};
//! # use esp01_at::stack::LinkId;
//! #
//! let mut adapter: Adapter<_, _, 1_000_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default()).unwrap();
//!
//! // Single connection mode
//! adapter.connect("10.0.0.1", 21).unwrap();
//! adapter.send(b"hallo!").unwrap();
//! adapter.close().unwrap();
//!
//! // Multiple connections mode
//! let link = LinkId::new(0).unwrap();
//! adapter.set_multiple_connections(true).unwrap();
//! adapter.connect_link(link, "10.0.0.1", 21).unwrap();
//! adapter.send_link(link, b"hallo!").unwrap();
//! adapter.close_link(link).unwrap();
//! ````
use crate::adapter::{Adapter, Error, Reason};
use crate::capture::TokenSet;
use crate::commands::{
    CloseCommand, CloseLinkCommand, Command, ConnectCommand, SetMultipleConnectionsCommand,
    TransmissionPrepareCommand, Wait,
};
use core::fmt::{Display, Formatter};
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;

/// Identifier of a connection in multiple connections mode. ESP-AT supports link IDs 0-4.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkId(u8);

impl LinkId {
    /// Highest link ID supported by ESP-AT
    pub const MAX: u8 = 4;

    /// Returns [Error::InvalidLinkId] if the given ID is out of range
    pub fn new(id: u8) -> Result<Self, Error> {
        if id > Self::MAX {
            return Err(Error::InvalidLinkId(id));
        }

        Ok(Self(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LinkId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "LinkId({})", self.0)
    }
}

/// Tokens terminating the confirmation of transmitted data
const CONFIRM_SUCCESS: &[&str] = &["SEND OK"];
const CONFIRM_FAILURE: &[&str] = &["SEND FAIL"];

/// State of a data transmission
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Transmission {
    /// Data length gets announced by CIPSEND
    Announce,
    /// Waiting for the data prompt
    AwaitPrompt,
    /// Writing the raw data
    Streaming,
    /// Waiting for SEND OK
    AwaitConfirm,
}

impl<T: Read + Write + ReadReady, Tm: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<T, Tm, TIMER_HZ> {
    /// Enables or disables multiple connections mode
    pub fn set_multiple_connections(&mut self, enabled: bool) -> Result<(), Error> {
        let command = if enabled {
            SetMultipleConnectionsCommand::multiple()
        } else {
            SetMultipleConnectionsCommand::single()
        };

        self.send_command(&command)?;
        Ok(())
    }

    /// Opens a TCP connection in single connection mode
    pub fn connect(&mut self, remote_host: &str, port: u16) -> Result<(), Error> {
        self.send_command(&ConnectCommand::tcp(remote_host, port))?;
        Ok(())
    }

    /// Opens a TCP connection on the given link in multiple connections mode
    pub fn connect_link(&mut self, link_id: LinkId, remote_host: &str, port: u16) -> Result<(), Error> {
        self.send_command(&ConnectCommand::tcp_link(link_id, remote_host, port))?;
        Ok(())
    }

    /// Sends the given data in single connection mode
    pub fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        self.transmit(None, data)
    }

    /// Sends the given data on the given link in multiple connections mode
    pub fn send_link(&mut self, link_id: LinkId, data: &[u8]) -> Result<(), Error> {
        self.transmit(Some(link_id), data)
    }

    /// Closes the connection in single connection mode
    pub fn close(&mut self) -> Result<(), Error> {
        self.send_command(&CloseCommand)?;
        Ok(())
    }

    /// Closes the given link in multiple connections mode.
    /// Closing a link which is not connected is treated as success.
    pub fn close_link(&mut self, link_id: LinkId) -> Result<(), Error> {
        self.send_command(&CloseLinkCommand::new(link_id))?;
        Ok(())
    }

    /// Runs through all transmission states. Fails as whole if any state fails.
    ///
    /// Once data has been streamed, it is not retracted if the confirmation is missing.
    fn transmit(&mut self, link_id: Option<LinkId>, data: &[u8]) -> Result<(), Error> {
        let command = TransmissionPrepareCommand::new(link_id, data.len());
        let mut state = Transmission::Announce;

        loop {
            state = match state {
                Transmission::Announce => {
                    self.flush_input()?;
                    self.write_command(&command)?;
                    Transmission::AwaitPrompt
                }
                Transmission::AwaitPrompt => {
                    let tokens =
                        TokenSet::from_parts(TransmissionPrepareCommand::SUCCESS, TransmissionPrepareCommand::FAILURE)?;
                    let capture = self.capture(&tokens, self.config.timeout(Wait::Prompt))?;
                    TransmissionPrepareCommand::verdict(&capture)?;

                    // Discard remaining prompt noise
                    self.flush_input()?;
                    Transmission::Streaming
                }
                Transmission::Streaming => {
                    trace!("Streaming {} bytes", data.len());
                    self.write_data(data)?;
                    Transmission::AwaitConfirm
                }
                Transmission::AwaitConfirm => {
                    let tokens = TokenSet::from_parts(CONFIRM_SUCCESS, CONFIRM_FAILURE)?;
                    let capture = self.capture(&tokens, self.config.timeout(Wait::Confirm))?;

                    return match capture.token() {
                        Some("SEND OK") => Ok(()),
                        Some(_) => Err(Error::SendFailed(Reason::Rejected)),
                        None => Err(Error::SendFailed(Reason::Timeout)),
                    };
                }
            };
        }
    }
}
