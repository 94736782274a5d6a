//! # WIFI access point client
//!
//! Note: If the connection was not successful or is lost, the ESP-AT will try independently from time
//! to time (by default every second) to establish connection to the network.
//!
//! ## Example
//!
//! ````
//! # use esp01_at::adapter::Adapter;
//! # use esp01_at::example::{ExampleSerial, ExampleTimer};
//! #
//! let mut adapter: Adapter<_, _, 1_000_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default()).unwrap();
//!
//! adapter.set_station_mode().unwrap();
//! adapter.join("test_wifi", "secret").unwrap();
//! adapter.ping("10.0.0.1").unwrap();
//! adapter.leave().unwrap();
//! ````
use crate::adapter::{Adapter, Error};
use crate::commands::{
    AccessPointConnectCommand, AccessPointDisconnectCommand, AttentionCommand, PingCommand, RestartCommand,
    WifiModeCommand,
};
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;

impl<T: Read + Write + ReadReady, Tm: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<T, Tm, TIMER_HZ> {
    /// Checks if the module is alive by sending `AT`
    pub fn kick(&mut self) -> Result<(), Error> {
        self.send_command(&AttentionCommand)?;
        Ok(())
    }

    /// Connects to the given WIFI access point.
    ///
    /// SSID is limited to 32 chars and the key to 63 chars.
    pub fn join(&mut self, ssid: &str, key: &str) -> Result<(), Error> {
        let command = AccessPointConnectCommand::new(ssid, key)?;
        self.send_command(&command)?;
        Ok(())
    }

    /// Disconnects from the current access point
    pub fn leave(&mut self) -> Result<(), Error> {
        self.send_command(&AccessPointDisconnectCommand)?;
        Ok(())
    }

    /// Switches to station mode, which is required for joining an access point
    pub fn set_station_mode(&mut self) -> Result<(), Error> {
        self.send_command(&WifiModeCommand::station_mode())?;
        Ok(())
    }

    /// Restarts the module and blocks until ready
    pub fn restart(&mut self) -> Result<(), Error> {
        self.send_command(&RestartCommand)?;
        Ok(())
    }

    /// Pings the given host.
    ///
    /// Any `+PING:` reply counts as success, including `+PING:TIMEOUT`.
    pub fn ping(&mut self, host: &str) -> Result<(), Error> {
        self.send_command(&PingCommand::new(host))?;
        Ok(())
    }
}
