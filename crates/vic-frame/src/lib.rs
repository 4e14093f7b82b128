//! VIC-II still-frame reconstruction.
//!
//! Rebuilds the 320x200 frame a VIC-II is displaying from a snapshot of its
//! registers and the memory windows the chip fetches: screen matrix, colour
//! RAM, character set or bitmap, and sprite data. Covers the five defined
//! display modes, hardware sprites, 38-column/24-row edge blanking, the
//! border band, and integer nearest-neighbour upscaling.
//!
//! Everything here is pure: no I/O, no chip timing. The caller supplies the
//! register block and memory windows; short or missing windows render as
//! zero bytes rather than failing.

pub mod charset;
pub mod palette;
pub mod post;
pub mod render;
pub mod sprite;
pub mod state;

pub use render::{FRAME_HEIGHT, FRAME_WIDTH, FrameMemory, render_frame};
pub use state::{Mode, SpriteState, VicState};
