//! ROM-shadow bypass.
//!
//! Reads RAM that the DMA view hides under KERNAL or BASIC ROM. With the
//! machine frozen, a copy routine is injected into the cassette buffer and
//! the NMI vector is pointed at it; a CIA2 Timer A underrun then fires the
//! NMI while the machine briefly runs. The routine banks the ROMs out,
//! copies the hidden range into a buffer the DMA read can see, stores a
//! sentinel, and returns through the original handler so the interrupt ends
//! with a proper RTI.
//!
//! Everything the protocol touches — stub area, copy buffer, zero-page
//! pointers, sentinel, NMI vector, CIA2 timer bytes — is backed up before
//! the first write and restored from a guard on every exit, so the machine
//! is left byte-identical whether the copy succeeded or not.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::remote::{RemoteClient, RemoteError};
use crate::stub::{self, SENTINEL_VALUE};

/// Copy destination: 8 KiB at $4000, enough for any single region the
/// VIC-II addresses, in an area DMA reads see directly.
pub const COPY_BUFFER: u16 = 0x4000;
/// Capacity of the copy buffer.
pub const COPY_BUFFER_SIZE: usize = 0x2000;
/// The injected routine lands in the cassette buffer.
pub const STUB_ADDR: u16 = 0x0340;

/// Bytes backed up around the stub area.
const STUB_BACKUP_LEN: usize = 128;
/// RAM NMI vector (CINV pair used by the KERNAL dispatcher).
const NMI_VECTOR: u16 = 0x0318;
/// First zero-page byte the routine scribbles on ($FB-$FE).
const ZP_POINTERS: u16 = 0x00FB;
/// Completion sentinel ([`stub::SENTINEL_ADDR`]) as a full address.
const SENTINEL: u16 = stub::SENTINEL_ADDR as u16;
/// CIA2 Timer A latch low/high plus the next register, as one backup window.
const CIA2_TIMER: u16 = 0xDD04;
/// CIA2 interrupt control register.
const CIA2_ICR: u16 = 0xDD0D;
/// CIA2 Timer A control register.
const CIA2_CRA: u16 = 0xDD0E;

/// How long the machine runs for the copy. An 8 KiB copy takes ~100 ms at
/// 1 MHz; half a second leaves margin for the handler chain.
const COPY_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum BypassError {
    Remote(RemoteError),
    /// Requested range does not fit the copy buffer.
    RangeTooLarge { length: usize },
    /// The machine refused to resume, so the routine never ran.
    ResumeFailed,
}

impl fmt::Display for BypassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(e) => write!(f, "{e}"),
            Self::RangeTooLarge { length } => write!(
                f,
                "range of {length} bytes exceeds the {COPY_BUFFER_SIZE}-byte copy buffer"
            ),
            Self::ResumeFailed => write!(f, "machine refused to resume for the copy routine"),
        }
    }
}

impl std::error::Error for BypassError {}

impl From<RemoteError> for BypassError {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

/// Backups taken before the first write. Dropping the guard re-freezes the
/// machine, disarms the timer NMI, and writes every window back in the
/// inverse order of setup; individual restore failures are logged and the
/// remaining restores still run.
struct RestoreGuard<'a> {
    client: &'a RemoteClient,
    stub_area: Vec<u8>,
    buffer: Vec<u8>,
    zero_page: Vec<u8>,
    sentinel: Vec<u8>,
    vector: Vec<u8>,
    timer: Vec<u8>,
}

impl RestoreGuard<'_> {
    fn restore_window(&self, what: &str, addr: u16, bytes: &[u8]) {
        if let Err(e) = self.client.write(addr, bytes) {
            log::error!("failed to restore {what} at ${addr:04X}: {e}");
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        log::info!("restoring original memory");
        if !self.client.pause() {
            log::warn!("could not confirm pause before restore");
        }
        // Disarm the Timer A NMI before anything else fires it again
        self.restore_window("CIA2 interrupt mask", CIA2_ICR, &[0x01]);
        self.restore_window("CIA2 timer", CIA2_TIMER, &self.timer);
        self.restore_window("NMI vector", NMI_VECTOR, &self.vector);
        self.restore_window("zero page", ZP_POINTERS, &self.zero_page);
        self.restore_window("sentinel", SENTINEL, &self.sentinel);
        self.restore_window("stub area", STUB_ADDR, &self.stub_area);
        self.restore_window("copy buffer", COPY_BUFFER, &self.buffer);
    }
}

/// Read `length` bytes at `src_addr` through the copy routine. The machine
/// must be paused on entry and is paused again on return.
pub fn read_via_copy(
    client: &RemoteClient,
    src_addr: u16,
    length: usize,
) -> Result<Vec<u8>, BypassError> {
    if length == 0 || length > COPY_BUFFER_SIZE {
        return Err(BypassError::RangeTooLarge { length });
    }
    // The routine copies whole pages, so the buffer is clobbered (and must
    // be preserved) up to the padded size.
    let padded = length.div_ceil(256) * 256;

    log::info!(
        "ROM bypass: copying ${src_addr:04X}-${:04X} to buffer at ${COPY_BUFFER:04X}",
        src_addr as usize + length - 1
    );

    // Back up everything first; a failure here aborts with the machine
    // untouched. The ICR backup doubles as documentation of what was
    // pending — reading it clears the flags, so "restoring" it means
    // disabling the Timer A interrupt again afterwards.
    let icr_before = client.read(CIA2_ICR, 1)?;
    log::debug!("CIA2 ICR before arming: ${:02X}", icr_before[0]);
    let guard = RestoreGuard {
        client,
        stub_area: client.read(STUB_ADDR, STUB_BACKUP_LEN)?,
        buffer: client.read(COPY_BUFFER, padded)?,
        zero_page: client.read(ZP_POINTERS, 4)?,
        sentinel: client.read(SENTINEL, 1)?,
        vector: client.read(NMI_VECTOR, 2)?,
        timer: client.read(CIA2_TIMER, 3)?,
    };

    // The continuation is whatever the vector held: the routine ends by
    // jumping into the original handler, which performs the RTI.
    let continuation = u16::from_le_bytes([guard.vector[0], guard.vector[1]]);
    log::debug!("original NMI handler at ${continuation:04X}");

    let routine = stub::copy_stub(STUB_ADDR, src_addr, COPY_BUFFER, length, Some(continuation));
    log::debug!(
        "injecting {}-byte copy routine ({} pages) at ${STUB_ADDR:04X}",
        routine.bytes.len(),
        routine.pages
    );
    client.write(STUB_ADDR, &routine.bytes)?;
    client.write(NMI_VECTOR, &STUB_ADDR.to_le_bytes())?;
    client.write(SENTINEL, &[0x00])?;

    // Arm CIA2 Timer A to raise an NMI almost immediately: acknowledge
    // anything pending, latch a near-zero count, enable the Timer A
    // interrupt, then start with force-load.
    let _ = client.read(CIA2_ICR, 1)?;
    client.write(CIA2_TIMER, &[0x02, 0x00])?;
    client.write(CIA2_ICR, &[0x81])?;
    client.write(CIA2_CRA, &[0x11])?;

    log::info!("running copy routine");
    if !client.resume() {
        return Err(BypassError::ResumeFailed);
    }
    thread::sleep(COPY_WAIT);
    if !client.pause() {
        log::warn!("could not confirm re-pause after copy");
    }

    // A wrong sentinel usually means the program overwrote $02 after the
    // handler finished, so the buffer is still worth reading.
    let marker = client.read(SENTINEL, 1)?;
    if marker[0] == SENTINEL_VALUE {
        log::info!("copy complete (sentinel verified)");
    } else {
        log::warn!(
            "copy sentinel is ${:02X}, expected ${SENTINEL_VALUE:02X}; using buffer anyway",
            marker[0]
        );
    }

    let data = client.read(COPY_BUFFER, length)?;
    drop(guard);
    Ok(data)
}
