//! Ultimate 64 screenshot capture.
//!
//! Reconstructs a pixel-accurate still of the frame a Commodore 64 is
//! displaying, using only the Ultimate 64's freeze + DMA memory facility:
//! the machine is paused, the VIC-II registers and the memory the chip
//! fetches from are read out, and the frame is rebuilt offline by
//! [`vic_frame`].
//!
//! The DMA read exposes the CPU-visible memory map, in which KERNAL and
//! BASIC ROM win over the RAM beneath them. When the VIC-II is pointed at
//! such RAM, the [`bypass`] module injects a short copy routine, fires it
//! through an NMI while the machine briefly runs, and reads the relocated
//! bytes — restoring every byte it touched.

pub mod bypass;
pub mod capture;
pub mod http;
pub mod remote;
pub mod romshadow;
pub mod stub;

pub use capture::{CaptureError, CaptureOptions, capture};
pub use remote::{RemoteClient, RemoteError};
