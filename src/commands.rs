use crate::adapter::{Error, Reason};
use crate::capture::Capture;
use crate::stack::LinkId;
use alloc::format;
use alloc::string::String;
use core::fmt::{Debug, Formatter};

/// Escapes `"`, `,` and `\` inside quoted string parameters by a leading backslash
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for character in value.chars() {
        if matches!(character, '"' | ',' | '\\') {
            escaped.push('\\');
        }

        escaped.push(character);
    }

    escaped
}

/// Timeout class of a command, s. [Config](crate::adapter::Config)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Wait {
    /// Local state changes
    Command,
    /// Device performs network I/O
    Network,
    /// Closing a connection
    Close,
    /// Data prompt of CIPSEND
    Prompt,
    /// Confirmation of transmitted data
    Confirm,
}

/// A single AT command and the tokens terminating its response
pub(crate) trait Command {
    /// Tokens signaling success
    const SUCCESS: &'static [&'static str];

    /// Tokens signaling an explicit failure
    const FAILURE: &'static [&'static str] = &[];

    /// Timeout class
    const WAIT: Wait;

    /// Encodes the command without the leading `AT` and the line terminator
    fn encode(&self) -> String;

    /// Encoded command as written to the log. Secrets are masked.
    fn describe(&self) -> String {
        self.encode()
    }

    /// Maps the failure reason to the error returned to the caller
    fn error(reason: Reason) -> Error {
        Error::CommandFailed(reason)
    }

    /// Success iff the capture was terminated by a success token
    fn verdict(capture: &Capture<'_>) -> Result<(), Error> {
        match capture.token() {
            Some(token) if Self::SUCCESS.iter().any(|success| *success == token) => Ok(()),
            Some(_) => Err(Self::error(Reason::Rejected)),
            None => Err(Self::error(Reason::Timeout)),
        }
    }
}

/// Plain `AT` for checking if the module is alive
#[derive(Clone, Debug, Default)]
pub struct AttentionCommand;

impl Command for AttentionCommand {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const WAIT: Wait = Wait::Command;

    fn encode(&self) -> String {
        String::new()
    }
}

/// Sets the WIFI mode
#[derive(Clone, Debug, Default)]
pub struct WifiModeCommand {
    /// WIFI mode:
    ///     0: Null mode. Wi-Fi RF will be disabled.
    ///     1: Station mode.
    ///     2: SoftAP mode.
    ///     3: SoftAP+Station mode.
    mode: usize,
}

impl WifiModeCommand {
    pub fn station_mode() -> Self {
        Self { mode: 1 }
    }
}

impl Command for WifiModeCommand {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Command;

    fn encode(&self) -> String {
        format!("+CWMODE={}", self.mode)
    }
}

/// Command for joining the target WIFI access point
#[derive(Clone)]
pub struct AccessPointConnectCommand<'a> {
    /// The SSID of the target access point
    ssid: &'a str,

    /// The password/key of the target access point
    password: &'a str,
}

impl<'a> AccessPointConnectCommand<'a> {
    pub fn new(ssid: &'a str, password: &'a str) -> Result<Self, Error> {
        if ssid.len() > 32 {
            return Err(Error::InvalidSsidLength);
        }

        if password.len() > 63 {
            return Err(Error::InvalidPasswordLength);
        }

        Ok(Self { ssid, password })
    }
}

impl Debug for AccessPointConnectCommand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessPointConnectCommand")
            .field("ssid", &self.ssid)
            .finish_non_exhaustive()
    }
}

impl Command for AccessPointConnectCommand<'_> {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Network;

    fn encode(&self) -> String {
        format!("+CWJAP=\"{}\",\"{}\"", escape(self.ssid), escape(self.password))
    }

    fn describe(&self) -> String {
        format!("+CWJAP=\"{}\",\"***\"", escape(self.ssid))
    }
}

/// Disconnects from the current access point
#[derive(Clone, Debug, Default)]
pub struct AccessPointDisconnectCommand;

impl Command for AccessPointDisconnectCommand {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const WAIT: Wait = Wait::Command;

    fn encode(&self) -> String {
        String::from("+CWQAP")
    }
}

/// Restarts the module. Completed as soon as the module signals `ready`
#[derive(Clone, Debug, Default)]
pub struct RestartCommand;

impl Command for RestartCommand {
    const SUCCESS: &'static [&'static str] = &["ready"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Network;

    fn encode(&self) -> String {
        String::from("+RST")
    }
}

/// Pings a remote host
#[derive(Clone, Debug)]
pub struct PingCommand<'a> {
    /// IP address or domain name
    host: &'a str,
}

impl<'a> PingCommand<'a> {
    pub fn new(host: &'a str) -> Self {
        Self { host }
    }
}

impl Command for PingCommand<'_> {
    const SUCCESS: &'static [&'static str] = &["OK", "+PING:"];
    const WAIT: Wait = Wait::Network;

    fn encode(&self) -> String {
        format!("+PING=\"{}\"", escape(self.host))
    }
}

/// Enables/Disables multiple connections
#[derive(Clone, Debug)]
pub struct SetMultipleConnectionsCommand {
    /// 0: single connection, 1: multiple connections
    mode: usize,
}

impl SetMultipleConnectionsCommand {
    /// Enables multiple connections
    pub fn multiple() -> Self {
        Self { mode: 1 }
    }

    /// Disables multiple connections
    pub fn single() -> Self {
        Self { mode: 0 }
    }
}

impl Command for SetMultipleConnectionsCommand {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Command;

    fn encode(&self) -> String {
        format!("+CIPMUX={}", self.mode)
    }
}

/// Establishes a TCP connection
#[derive(Clone, Debug)]
pub struct ConnectCommand<'a> {
    /// Link ID in multiple connections mode, None in single connection mode
    link_id: Option<LinkId>,

    /// Connection type
    connection_type: &'static str,

    /// Remote IP address or domain name
    remote_host: &'a str,

    /// Remote port
    port: u16,
}

impl<'a> ConnectCommand<'a> {
    /// TCP connection in single connection mode
    pub fn tcp(remote_host: &'a str, port: u16) -> Self {
        Self {
            link_id: None,
            connection_type: "TCP",
            remote_host,
            port,
        }
    }

    /// TCP connection in multiple connections mode
    pub fn tcp_link(link_id: LinkId, remote_host: &'a str, port: u16) -> Self {
        Self {
            link_id: Some(link_id),
            ..Self::tcp(remote_host, port)
        }
    }
}

impl Command for ConnectCommand<'_> {
    const SUCCESS: &'static [&'static str] = &["OK", "CONNECT"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Network;

    fn encode(&self) -> String {
        match self.link_id {
            None => format!(
                "+CIPSTART=\"{}\",\"{}\",{}",
                self.connection_type,
                escape(self.remote_host),
                self.port
            ),
            Some(link_id) => format!(
                "+CIPSTART={},\"{}\",\"{}\",{}",
                link_id,
                self.connection_type,
                escape(self.remote_host),
                self.port
            ),
        }
    }
}

/// Closes the connection in single connection mode
#[derive(Clone, Debug, Default)]
pub struct CloseCommand;

impl Command for CloseCommand {
    const SUCCESS: &'static [&'static str] = &["OK"];
    const WAIT: Wait = Wait::Close;

    fn encode(&self) -> String {
        String::from("+CIPCLOSE")
    }
}

/// Closes the given link in multiple connections mode.
///
/// `link is not valid` is returned for links which are already closed, which is treated as success.
#[derive(Clone, Debug)]
pub struct CloseLinkCommand {
    link_id: LinkId,
}

impl CloseLinkCommand {
    pub fn new(link_id: LinkId) -> Self {
        Self { link_id }
    }
}

impl Command for CloseLinkCommand {
    const SUCCESS: &'static [&'static str] = &["OK", "link is not"];
    const WAIT: Wait = Wait::Close;

    fn encode(&self) -> String {
        format!("+CIPCLOSE={}", self.link_id)
    }
}

/// Announces the transmission of the given number of bytes. Answered by the data prompt.
#[derive(Clone, Debug)]
pub struct TransmissionPrepareCommand {
    /// Link ID in multiple connections mode, None in single connection mode
    link_id: Option<LinkId>,

    /// Number of bytes to send
    length: usize,
}

impl TransmissionPrepareCommand {
    pub fn new(link_id: Option<LinkId>, length: usize) -> Self {
        Self { link_id, length }
    }
}

impl Command for TransmissionPrepareCommand {
    const SUCCESS: &'static [&'static str] = &[">"];
    const FAILURE: &'static [&'static str] = &["ERROR"];
    const WAIT: Wait = Wait::Prompt;

    fn encode(&self) -> String {
        match self.link_id {
            None => format!("+CIPSEND={}", self.length),
            Some(link_id) => format!("+CIPSEND={},{}", link_id, self.length),
        }
    }

    fn error(reason: Reason) -> Error {
        Error::TransmissionStartFailed(reason)
    }
}
