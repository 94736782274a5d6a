//! # Response capturing
//!
//! Collects the bytes sent by the ESP-AT until one of up to three expected tokens shows up or the
//! deadline elapses. Tokens are matched as plain substrings anywhere in the received data, as the
//! modem mixes free-form text (echo, banners, status lines) with the final result codes.
//!
//! If several tokens are contained in the received data, the token occurring first wins. Tokens
//! starting at the same position are resolved by declaration order.
//!
//! Only the last [CAPTURE_SIZE] bytes are retained. Older data is discarded while receiving, so a
//! chatty module can not exhaust memory during long timeouts.
use crate::adapter::{Adapter, Error};
use embedded_io::{Error as _, Read, ReadReady, Write};
use fugit::TimerDurationU32;
use fugit_timer::Timer;
use heapless::Vec;

/// Maximum number of tokens one capture can wait for
pub const MAX_TOKENS: usize = 3;

/// Maximum length of a single token
pub const MAX_TOKEN_LENGTH: usize = CHUNK_SIZE;

/// Number of received bytes retained by a capture
pub const CAPTURE_SIZE: usize = 256;

/// Number of bytes read from the transport at once
const CHUNK_SIZE: usize = 64;

/// Ordered set of 1-3 tokens terminating a capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSet<'a> {
    tokens: Vec<&'a str, MAX_TOKENS>,
}

impl<'a> TokenSet<'a> {
    /// Creates a new token set. Fails if no token, more then three tokens, an empty token or a token
    /// longer then [MAX_TOKEN_LENGTH] is given.
    pub fn new(tokens: &[&'a str]) -> Result<Self, Error> {
        Self::from_parts(tokens, &[])
    }

    /// Creates a token set by concatenating the given slices, e.g. success and failure tokens
    pub(crate) fn from_parts(first: &[&'a str], second: &[&'a str]) -> Result<Self, Error> {
        let mut tokens = Vec::new();

        for token in first.iter().chain(second) {
            if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
                return Err(Error::InvalidTokenSet);
            }

            tokens.push(*token).map_err(|_| Error::InvalidTokenSet)?;
        }

        if tokens.is_empty() {
            return Err(Error::InvalidTokenSet);
        }

        Ok(Self { tokens })
    }

    /// Returns the token found at the lowest offset of the given data
    pub fn find_first(&self, data: &[u8]) -> Option<&'a str> {
        self.tokens
            .iter()
            .filter_map(|token| find(data, token.as_bytes()).map(|position| (position, *token)))
            .min_by_key(|(position, _)| *position)
            .map(|(_, token)| token)
    }

    /// Tokens in declaration order
    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    /// Length of the longest token in bytes
    fn max_length(&self) -> usize {
        self.tokens.iter().map(|token| token.len()).max().unwrap_or(0)
    }
}

/// Position of the first occurrence of needle. Needle must not be empty.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Data received during a single capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture<'a> {
    /// Received bytes, excluding NUL bytes. Limited to the last [CAPTURE_SIZE] bytes.
    data: Vec<u8, CAPTURE_SIZE>,

    /// Matched token, None in case of a timeout
    token: Option<&'a str>,
}

impl<'a> Capture<'a> {
    /// Received raw data. If more then [CAPTURE_SIZE] bytes were received, only the tail is kept.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Received data as string. Returns None if the data is not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.data).ok()
    }

    /// The token which terminated the capture. None if the deadline elapsed.
    pub fn token(&self) -> Option<&'a str> {
        self.token
    }

    /// True if the capture was terminated by a token
    pub fn is_match(&self) -> bool {
        self.token.is_some()
    }
}

impl<T: Read + Write + ReadReady, Tm: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<T, Tm, TIMER_HZ> {
    /// Receives data until one of the given tokens is found or the timeout elapsed.
    ///
    /// A timeout is not treated as an error, instead the received data is returned without a
    /// matched token. Data is consumed from the transport up to the chunk containing the token.
    pub fn capture<'a>(
        &mut self,
        tokens: &TokenSet<'a>,
        timeout: TimerDurationU32<TIMER_HZ>,
    ) -> Result<Capture<'a>, Error> {
        let mut buffer = ScanBuffer::new(tokens.max_length());
        self.timer.start(timeout).map_err(|_| Error::TimerError)?;

        loop {
            match self.timer.wait() {
                Ok(_) => {
                    warn!(
                        "No token received within {} ms ({} bytes)",
                        timeout.to_millis(),
                        buffer.received
                    );
                    return Ok(buffer.into_capture(None));
                }
                Err(nb::Error::Other(_)) => return Err(Error::TimerError),
                Err(nb::Error::WouldBlock) => {}
            }

            if let Some(token) = self.receive(tokens, &mut buffer)? {
                trace!("Matched token {} after {} bytes", token, buffer.received);
                return Ok(buffer.into_capture(Some(token)));
            }

            core::hint::spin_loop();
        }
    }

    /// Discards all data which is currently pending on the transport
    pub(crate) fn flush_input(&mut self) -> Result<(), Error> {
        let mut chunk = [0x0; CHUNK_SIZE];
        let mut discarded = 0;

        while self.transport.read_ready().map_err(|e| Error::ReadError(e.kind()))? {
            let length = self.transport.read(&mut chunk).map_err(|e| Error::ReadError(e.kind()))?;
            if length == 0 {
                break;
            }

            discarded += length;
        }

        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }

        Ok(())
    }

    /// Reads all currently available data chunk by chunk. Each chunk is scanned right after reading.
    fn receive<'a>(&mut self, tokens: &TokenSet<'a>, buffer: &mut ScanBuffer) -> Result<Option<&'a str>, Error> {
        let mut chunk = [0x0; CHUNK_SIZE];

        while self.transport.read_ready().map_err(|e| Error::ReadError(e.kind()))? {
            let length = self.transport.read(&mut chunk).map_err(|e| Error::ReadError(e.kind()))?;
            if length == 0 {
                break;
            }

            if buffer.append(&chunk[..length]) {
                if let Some(token) = buffer.scan(tokens) {
                    return Ok(Some(token));
                }
            }
        }

        Ok(None)
    }
}

/// Bounded receive buffer, which only scans data not yet scanned
struct ScanBuffer {
    data: Vec<u8, CAPTURE_SIZE>,

    /// Start of the next scan. Overlaps the already scanned data by the longest token - 1,
    /// so tokens split between reads are found.
    scan_from: usize,

    /// Overlap between scans
    overlap: usize,

    /// Total number of bytes received, including discarded ones
    received: usize,
}

impl ScanBuffer {
    fn new(max_token_length: usize) -> Self {
        Self {
            data: Vec::new(),
            scan_from: 0,
            overlap: max_token_length.saturating_sub(1),
            received: 0,
        }
    }

    /// Appends the given chunk excluding NUL bytes. Returns false if nothing was appended.
    fn append(&mut self, chunk: &[u8]) -> bool {
        if self.data.len() + chunk.len() > CAPTURE_SIZE {
            self.discard(self.data.len() + chunk.len() - CAPTURE_SIZE);
        }

        let length = self.data.len();
        self.data.extend(chunk.iter().copied().filter(|byte| *byte != 0x0));
        self.received += self.data.len() - length;

        self.data.len() > length
    }

    /// Drops the given number of oldest bytes
    fn discard(&mut self, count: usize) {
        let count = count.min(self.data.len());
        let remaining = self.data.len() - count;

        self.data.copy_within(count.., 0);
        self.data.truncate(remaining);
        self.scan_from = self.scan_from.saturating_sub(count);
    }

    /// Scans the data appended since the last scan
    fn scan<'a>(&mut self, tokens: &TokenSet<'a>) -> Option<&'a str> {
        let token = tokens.find_first(&self.data[self.scan_from..]);
        self.scan_from = self.data.len().saturating_sub(self.overlap);
        token
    }

    fn into_capture<'a>(self, token: Option<&'a str>) -> Capture<'a> {
        Capture { data: self.data, token }
    }
}
