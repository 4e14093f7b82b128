//! Capture orchestration.
//!
//! The end-to-end sequence: freeze the machine, read the VIC-II registers
//! and every memory window the chip fetches (through the ROM bypass when a
//! window hides under KERNAL/BASIC), reconstruct the frame, lay sprites
//! over it, post-process, and let the machine run again. The resume is held
//! by a guard so it happens on success, error, and panic alike.

use std::fmt;

use image::RgbImage;
use vic_frame::charset::charset;
use vic_frame::{FrameMemory, Mode, VicState, post, render_frame, sprite};

use crate::bypass::{self, BypassError};
use crate::remote::{RemoteClient, RemoteError};
use crate::romshadow::rom_overlap;

/// VIC-II register block at $D000.
const VIC_REGS: u16 = 0xD000;
/// CIA2 port A: VIC bank select bits.
const CIA2_PORT_A: u16 = 0xDD00;
/// Colour RAM.
const COLOUR_RAM: u16 = 0xD800;
/// Screen matrix offset of the eight sprite shape pointers.
const SPRITE_POINTERS: usize = 0x3F8;

#[derive(Debug)]
pub enum CaptureError {
    Remote(RemoteError),
    Bypass(BypassError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(e) => write!(f, "{e}"),
            Self::Bypass(e) => write!(f, "ROM bypass failed: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<RemoteError> for CaptureError {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<BypassError> for CaptureError {
    fn from(e: BypassError) -> Self {
        Self::Bypass(e)
    }
}

/// What the capture should produce.
pub struct CaptureOptions {
    /// Surround the display window with a 32-pixel border band.
    pub border: bool,
    /// Fetch and composite hardware sprites.
    pub sprites: bool,
    /// Integer nearest-neighbour upscale factor (1 = native size).
    pub upscale: u32,
    /// Allow the NMI copy routine for ROM-shadowed windows. With this off,
    /// such windows read as ROM and the frame shows what the DMA sees.
    pub rom_bypass: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            border: true,
            sprites: true,
            upscale: 1,
            rom_bypass: true,
        }
    }
}

/// Resumes the machine when dropped, so every capture path lets it run.
struct ResumeGuard<'a> {
    client: &'a RemoteClient,
}

impl Drop for ResumeGuard<'_> {
    fn drop(&mut self) {
        log::info!("resuming machine");
        if !self.client.resume() {
            log::warn!("failed to resume machine (may already be running)");
        }
    }
}

/// Read a window, routing through the copy-routine bypass when it overlaps
/// a ROM shadow. Lengths running past $FFFF are clipped; the renderers
/// treat the missing tail as zero bytes.
fn read_window(
    client: &RemoteClient,
    addr: u16,
    length: usize,
    use_bypass: bool,
) -> Result<Vec<u8>, CaptureError> {
    let length = length.min(0x1_0000 - addr as usize);
    if use_bypass {
        if let Some(window) = rom_overlap(addr, length) {
            log::info!(
                "  ${addr:04X} lies under {} ROM; reading through copy routine",
                window.name()
            );
            return Ok(bypass::read_via_copy(client, addr, length)?);
        }
    }
    Ok(client.read(addr, length)?)
}

fn log_state(state: &VicState) {
    log::info!("screen mode: {}", state.mode().name());
    log::debug!(
        "  BMM={} ECM={} MCM={}",
        u8::from(state.bmm),
        u8::from(state.ecm),
        u8::from(state.mcm)
    );
    log::debug!(
        "  DEN={} (display {})",
        u8::from(state.den),
        if state.den { "enabled" } else { "disabled" }
    );
    log::debug!("  RSEL={} ({} rows)", u8::from(state.rsel), if state.rsel { 25 } else { 24 });
    log::debug!(
        "  CSEL={} ({} columns)",
        u8::from(state.csel),
        if state.csel { 40 } else { 38 }
    );
    log::info!("VIC bank ${:04X}, screen ${:04X}, chars ${:04X}, bitmap ${:04X}",
        state.vic_bank,
        state.screen_mem_addr(),
        state.char_mem_addr(),
        state.bitmap_mem_addr()
    );
    log::debug!(
        "border colour {}, background colour {}",
        state.border_colour,
        state.background_colour
    );
}

fn log_sprite(n: usize, state: &VicState, pointer: u8) {
    let s = &state.sprites[n];
    log::info!(
        "  sprite {n}: pos=({},{}) colour={} {} {}{}{} ptr=${pointer:02X} data=${:04X}",
        s.x,
        s.y,
        s.colour,
        if s.multicolour { "MC" } else { "HR" },
        if s.x_expand { "Xx2 " } else { "" },
        if s.y_expand { "Yx2 " } else { "" },
        if s.behind { "behind" } else { "front" },
        state.sprite_data_addr(pointer)
    );
}

/// Capture one frame. The machine is frozen for the duration (except the
/// brief bypass window) and resumed on every exit path.
pub fn capture(
    client: &RemoteClient,
    options: &CaptureOptions,
) -> Result<RgbImage, CaptureError> {
    log::info!("freezing machine");
    if !client.pause() {
        log::warn!("failed to pause machine (may already be paused)");
    }
    let _resume = ResumeGuard { client };

    log::info!("reading VIC-II registers");
    let vic_regs = client.read(VIC_REGS, vic_frame::state::VIC_REGS_LEN)?;
    let cia2_port = client.read(CIA2_PORT_A, 1)?;
    let state = VicState::decode(&vic_regs, cia2_port[0]);
    log_state(&state);

    log::info!("reading colour RAM");
    let colour_mem = client.read(COLOUR_RAM, 1000)?;

    log::info!("reading screen memory at ${:04X}", state.screen_mem_addr());
    let screen_mem = read_window(client, state.screen_mem_addr(), 1024, options.rom_bypass)?;

    let mode = state.mode();
    let mut char_mem = Vec::new();
    let mut bitmap_mem = Vec::new();
    if mode.is_bitmap() {
        log::info!("reading bitmap memory at ${:04X}", state.bitmap_mem_addr());
        bitmap_mem = read_window(client, state.bitmap_mem_addr(), 8000, options.rom_bypass)?;
    } else if mode == Mode::Invalid {
        log::warn!("undefined mode bits; rendering background only");
    } else if state.uses_char_rom() {
        // The chip fetches character ROM here, which the DMA read cannot
        // see; fall back to the embedded glyph table.
        log::info!("character data comes from ROM; using embedded character set");
        char_mem = charset();
    } else {
        log::info!("reading character memory at ${:04X}", state.char_mem_addr());
        char_mem = read_window(client, state.char_mem_addr(), 2048, options.rom_bypass)?;
    }

    log::info!("rendering screen");
    let mut img = render_frame(
        &state,
        &FrameMemory {
            screen: &screen_mem,
            colour: &colour_mem,
            chars: &char_mem,
            bitmap: &bitmap_mem,
        },
    );

    if options.sprites {
        let enabled = state.sprites.iter().filter(|s| s.enabled).count();
        log::info!("processing sprites ({enabled} enabled)");
        let mut sprite_data: [Option<Vec<u8>>; 8] = Default::default();
        for n in 0..8 {
            if !state.sprites[n].enabled {
                continue;
            }
            let pointer = screen_mem.get(SPRITE_POINTERS + n).copied().unwrap_or(0);
            log_sprite(n, &state, pointer);
            // Shape data under a ROM shadow is rare; a miss just skips the
            // sprite rather than failing the capture.
            match client.read(state.sprite_data_addr(pointer), 64) {
                Ok(data) => sprite_data[n] = Some(data),
                Err(e) => log::warn!("  sprite {n}: shape read failed, skipping: {e}"),
            }
        }
        sprite::overlay_sprites(&mut img, &state, &sprite_data);
    }

    if !state.rsel || !state.csel {
        log::info!(
            "applying display blanking ({} rows, {} columns)",
            if state.rsel { 25 } else { 24 },
            if state.csel { 40 } else { 38 }
        );
        img = post::apply_blanking(&img, &state);
    }

    if options.border {
        img = post::add_border(&img, state.border_colour);
    }

    if options.upscale > 1 {
        img = post::upscale(&img, options.upscale);
        log::info!(
            "upscaled to {}x{} ({}x)",
            img.width(),
            img.height(),
            options.upscale
        );
    }

    Ok(img)
}
