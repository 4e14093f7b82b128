//! Remote machine gateway.
//!
//! The four Ultimate 64 operations a capture needs: `pause`, `resume`,
//! `read`, and `write`, over the device's REST API. Pause and resume report
//! success as a boolean — a refusal usually just means the machine is
//! already in the requested state. Read and write failures are hard errors.

use std::fmt;
use std::io;

use crate::http;

/// A failed memory read or write.
#[derive(Debug)]
pub enum RemoteError {
    /// The request never completed (connect, send, or receive failed).
    Io(io::Error),
    /// The device answered with a non-200 status.
    Status { verb: &'static str, status: u16 },
    /// A read returned the wrong number of bytes.
    ShortRead {
        addr: u16,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "request failed: {e}"),
            Self::Status { verb, status } => {
                write!(f, "{verb} rejected with HTTP status {status}")
            }
            Self::ShortRead {
                addr,
                expected,
                got,
            } => write!(
                f,
                "read at ${addr:04X} returned {got} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<io::Error> for RemoteError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Handle to one Ultimate 64, identified by host (`ip` or `ip:port`) and an
/// optional API password. Holds no connection state; every operation is a
/// fresh request.
pub struct RemoteClient {
    host: String,
    password: Option<String>,
}

impl RemoteClient {
    #[must_use]
    pub fn new(host: impl Into<String>, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            password,
        }
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        match &self.password {
            Some(password) => vec![("X-Password", password.as_str())],
            None => Vec::new(),
        }
    }

    /// Freeze the machine. `false` means the device refused or could not be
    /// reached; the machine may already be paused.
    pub fn pause(&self) -> bool {
        self.machine_verb("pause")
    }

    /// Let the machine run again. Must be attempted on every exit path of a
    /// capture; `false` is reported to the caller for logging only.
    pub fn resume(&self) -> bool {
        self.machine_verb("resume")
    }

    fn machine_verb(&self, verb: &str) -> bool {
        let target = format!("/v1/machine:{verb}");
        match http::request(&self.host, "PUT", &target, &self.headers(), None) {
            Ok(response) => response.is_ok(),
            Err(e) => {
                log::warn!("machine:{verb} request failed: {e}");
                false
            }
        }
    }

    /// DMA-read `length` bytes at `addr`. The device sees the CPU memory
    /// map: ROMs and I/O win over the RAM beneath them.
    pub fn read(&self, addr: u16, length: usize) -> Result<Vec<u8>, RemoteError> {
        let target = format!("/v1/machine:readmem?address={addr:X}&length={length}");
        let response = http::request(&self.host, "GET", &target, &self.headers(), None)?;
        if !response.is_ok() {
            return Err(RemoteError::Status {
                verb: "readmem",
                status: response.status,
            });
        }
        if response.body.len() != length {
            return Err(RemoteError::ShortRead {
                addr,
                expected: length,
                got: response.body.len(),
            });
        }
        Ok(response.body)
    }

    /// DMA-write bytes at `addr`.
    pub fn write(&self, addr: u16, data: &[u8]) -> Result<(), RemoteError> {
        let target = format!("/v1/machine:writemem?address={addr:X}");
        let mut headers = self.headers();
        headers.push(("Content-Type", "application/octet-stream"));
        let response = http::request(&self.host, "POST", &target, &headers, Some(data))?;
        if !response.is_ok() {
            return Err(RemoteError::Status {
                verb: "writemem",
                status: response.status,
            });
        }
        Ok(())
    }
}
