//! Mocks for doc examples
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_io::{ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;

/// Canned responses of a ESP-01 module, looked up by the data written by the host
const RESPONSES: &[(&[u8], &[u8])] = &[
    (b"AT\r\n", b"AT\r\n\r\nOK\r\n"),
    (b"AT+CWMODE=1\r\n", b"\r\nOK\r\n"),
    (
        b"AT+CWJAP=\"test_wifi\",\"secret\"\r\n",
        b"WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n",
    ),
    (b"AT+CWQAP\r\n", b"\r\nOK\r\nWIFI DISCONNECT\r\n"),
    (b"AT+PING=\"10.0.0.1\"\r\n", b"+PING:12\r\n\r\nOK\r\n"),
    (
        b"AT+RST\r\n",
        b"\r\nOK\r\n\0\0 ets Jan  8 2013,rst cause:2, boot mode:(3,6)\r\n\r\nready\r\n",
    ),
    (b"AT+CIPMUX=1\r\n", b"\r\nOK\r\n"),
    (b"AT+CIPSTART=\"TCP\",\"10.0.0.1\",21\r\n", b"CONNECT\r\n\r\nOK\r\n"),
    (b"AT+CIPSTART=0,\"TCP\",\"10.0.0.1\",21\r\n", b"0,CONNECT\r\n\r\nOK\r\n"),
    (b"AT+CIPSEND=6\r\n", b"\r\nOK\r\n> "),
    (b"AT+CIPSEND=0,6\r\n", b"\r\nOK\r\n> "),
    (b"hallo!", b"\r\nRecv 6 bytes\r\n\r\nSEND OK\r\n"),
    (b"AT+CIPCLOSE\r\n", b"CLOSED\r\n\r\nOK\r\n"),
    (b"AT+CIPCLOSE=0\r\n", b"0,CLOSED\r\n\r\nOK\r\n"),
];

/// Serial mock answering with canned responses
#[derive(Default)]
pub struct ExampleSerial {
    /// Data written by the host since the last response
    input: Vec<u8>,

    /// Data to be read by the host
    output: VecDeque<u8>,
}

impl ExampleSerial {
    /// Looks up the response of the current input
    fn respond(&mut self) {
        if let Some((_, response)) = RESPONSES.iter().find(|(request, _)| *request == self.input.as_slice()) {
            self.output.extend(response.iter());
            self.input.clear();
            return;
        }

        if self.input.ends_with(b"\r\n") {
            self.output.extend(b"\r\nERROR\r\n".iter());
            self.input.clear();
        }
    }
}

impl ErrorType for ExampleSerial {
    type Error = Infallible;
}

impl Read for ExampleSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let length = buf.len().min(self.output.len());

        for (target, byte) in buf.iter_mut().zip(self.output.drain(..length)) {
            *target = byte;
        }

        Ok(length)
    }
}

impl ReadReady for ExampleSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.output.is_empty())
    }
}

impl Write for ExampleSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.input.extend_from_slice(buf);
        self.respond();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Timer mock, which never expires
#[derive(Default)]
pub struct ExampleTimer {}

impl Timer<1_000_000> for ExampleTimer {
    type Error = u32;

    fn now(&mut self) -> TimerInstantU32<1000000> {
        TimerInstantU32::from_ticks(0)
    }

    fn start(&mut self, _duration: TimerDurationU32<1000000>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        nb::Result::Err(nb::Error::WouldBlock)
    }
}
