//! 6502 code emission for the ROM-bypass copy routine.
//!
//! A fixed-purpose assembler: instructions are recorded as values and
//! encoded to bytes afterwards, so the routine's structure (register saves,
//! the bank switch, the final jump) can be inspected directly instead of
//! pattern-matched out of opcode bytes.
//!
//! The emitted routine runs at a known address with interrupts in any
//! state. It saves A/X/Y and the $01 banking port, switches to the all-RAM
//! map, block-copies whole pages through zero-page pointers, restores the
//! port and registers, stores a completion sentinel, and jumps to a
//! caller-supplied continuation — intended to be the original NMI handler so
//! the interrupt ends with a proper RTI.

/// 6510 banking port at $01.
pub const BANK_PORT: u8 = 0x01;
/// Port value with KERNAL, BASIC, and character ROM banked out.
pub const ALL_RAM_BANK: u8 = 0x34;
/// Zero-page source pointer ($FB/$FC).
pub const SRC_PTR: u8 = 0xFB;
/// Zero-page destination pointer ($FD/$FE).
pub const DST_PTR: u8 = 0xFD;
/// Completion sentinel lives at $02.
pub const SENTINEL_ADDR: u8 = 0x02;
/// Value the routine stores once the copy finished.
pub const SENTINEL_VALUE: u8 = 0x42;

/// The instructions the copy routine is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insn {
    Pha,
    Pla,
    Txa,
    Tya,
    Tax,
    Tay,
    Iny,
    Dex,
    LdaImm(u8),
    LdaZp(u8),
    StaZp(u8),
    LdaIndY(u8),
    StaIndY(u8),
    LdxImm(u8),
    LdyImm(u8),
    IncZp(u8),
    Bne(i8),
    JmpAbs(u16),
}

impl Insn {
    /// Encoded instruction length in bytes.
    #[must_use]
    pub fn size(self) -> u16 {
        match self {
            Self::Pha | Self::Pla | Self::Txa | Self::Tya | Self::Tax | Self::Tay
            | Self::Iny | Self::Dex => 1,
            Self::JmpAbs(_) => 3,
            _ => 2,
        }
    }

    fn encode(self, out: &mut Vec<u8>) {
        match self {
            Self::Pha => out.push(0x48),
            Self::Pla => out.push(0x68),
            Self::Txa => out.push(0x8A),
            Self::Tya => out.push(0x98),
            Self::Tax => out.push(0xAA),
            Self::Tay => out.push(0xA8),
            Self::Iny => out.push(0xC8),
            Self::Dex => out.push(0xCA),
            Self::LdaImm(value) => out.extend([0xA9, value]),
            Self::LdaZp(addr) => out.extend([0xA5, addr]),
            Self::StaZp(addr) => out.extend([0x85, addr]),
            Self::LdaIndY(addr) => out.extend([0xB1, addr]),
            Self::StaIndY(addr) => out.extend([0x91, addr]),
            Self::LdxImm(value) => out.extend([0xA2, value]),
            Self::LdyImm(value) => out.extend([0xA0, value]),
            Self::IncZp(addr) => out.extend([0xE6, addr]),
            Self::Bne(offset) => out.extend([0xD0, offset as u8]),
            Self::JmpAbs(target) => {
                out.extend([0x4C, (target & 0xFF) as u8, (target >> 8) as u8]);
            }
        }
    }
}

/// Position-tracking emitter for one routine at a fixed origin.
struct Assembler {
    origin: u16,
    insns: Vec<Insn>,
    len: u16,
}

impl Assembler {
    fn new(origin: u16) -> Self {
        Self {
            origin,
            insns: Vec::new(),
            len: 0,
        }
    }

    fn emit(&mut self, insn: Insn) {
        self.len += insn.size();
        self.insns.push(insn);
    }

    /// Address of the next instruction to be emitted.
    fn here(&self) -> u16 {
        self.origin + self.len
    }

    /// Emit a BNE back to an already-emitted address.
    fn bne_to(&mut self, target: u16) {
        let from = self.here() + 2;
        let offset = i32::from(target) - i32::from(from);
        debug_assert!((-128..=127).contains(&offset), "branch out of range");
        self.emit(Insn::Bne(offset as i8));
    }
}

/// An assembled copy routine.
pub struct CopyStub {
    pub insns: Vec<Insn>,
    pub bytes: Vec<u8>,
    /// Whole 256-byte pages the routine copies; `length` rounded up. The
    /// destination window must be sized to `pages * 256` to absorb the
    /// padding.
    pub pages: u8,
}

/// Build the copy routine.
///
/// Copies `length` bytes (rounded up to whole pages) from `src` to `dst`
/// with all ROMs banked out, then continues at `continuation` — or parks in
/// a tight loop when no continuation is given.
///
/// # Panics
///
/// Panics when `length` is zero or exceeds 255 pages.
#[must_use]
pub fn copy_stub(stub_addr: u16, src: u16, dst: u16, length: usize, continuation: Option<u16>) -> CopyStub {
    let pages = length.div_ceil(256);
    assert!(length > 0 && pages <= 0xFF, "copy length out of range");

    let mut asm = Assembler::new(stub_addr);

    // Save A, X, Y and the banking port
    asm.emit(Insn::Pha);
    asm.emit(Insn::Txa);
    asm.emit(Insn::Pha);
    asm.emit(Insn::Tya);
    asm.emit(Insn::Pha);
    asm.emit(Insn::LdaZp(BANK_PORT));
    asm.emit(Insn::Pha);

    // All RAM, so the source reads what the VIC-II sees
    asm.emit(Insn::LdaImm(ALL_RAM_BANK));
    asm.emit(Insn::StaZp(BANK_PORT));

    // Copy pointers
    asm.emit(Insn::LdaImm((src & 0xFF) as u8));
    asm.emit(Insn::StaZp(SRC_PTR));
    asm.emit(Insn::LdaImm((src >> 8) as u8));
    asm.emit(Insn::StaZp(SRC_PTR + 1));
    asm.emit(Insn::LdaImm((dst & 0xFF) as u8));
    asm.emit(Insn::StaZp(DST_PTR));
    asm.emit(Insn::LdaImm((dst >> 8) as u8));
    asm.emit(Insn::StaZp(DST_PTR + 1));

    // Page-counted outer loop, 256-byte inner loop
    asm.emit(Insn::LdxImm(pages as u8));
    let outer = asm.here();
    asm.emit(Insn::LdyImm(0));
    let inner = asm.here();
    asm.emit(Insn::LdaIndY(SRC_PTR));
    asm.emit(Insn::StaIndY(DST_PTR));
    asm.emit(Insn::Iny);
    asm.bne_to(inner);
    asm.emit(Insn::IncZp(SRC_PTR + 1));
    asm.emit(Insn::IncZp(DST_PTR + 1));
    asm.emit(Insn::Dex);
    asm.bne_to(outer);

    // Back to the caller's memory map
    asm.emit(Insn::Pla);
    asm.emit(Insn::StaZp(BANK_PORT));

    // Completion sentinel
    asm.emit(Insn::LdaImm(SENTINEL_VALUE));
    asm.emit(Insn::StaZp(SENTINEL_ADDR));

    // Restore Y, X, A
    asm.emit(Insn::Pla);
    asm.emit(Insn::Tay);
    asm.emit(Insn::Pla);
    asm.emit(Insn::Tax);
    asm.emit(Insn::Pla);

    match continuation {
        Some(target) => asm.emit(Insn::JmpAbs(target)),
        None => {
            // Park until the machine is re-frozen
            let here = asm.here();
            asm.emit(Insn::JmpAbs(here));
        }
    }

    let mut bytes = Vec::new();
    for insn in &asm.insns {
        insn.encode(&mut bytes);
    }
    CopyStub {
        insns: asm.insns,
        bytes,
        pages: pages as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_8k() -> CopyStub {
        copy_stub(0x0340, 0xE000, 0x4000, 0x2000, Some(0xFE47))
    }

    #[test]
    fn saves_then_restores_registers_and_port() {
        let stub = stub_8k();
        // Entry: A, X (via TXA), Y (via TYA), then the port value
        assert_eq!(
            &stub.insns[..7],
            &[
                Insn::Pha,
                Insn::Txa,
                Insn::Pha,
                Insn::Tya,
                Insn::Pha,
                Insn::LdaZp(BANK_PORT),
                Insn::Pha,
            ]
        );
        // Exit (before the jump): Y, X, A pulled back in reverse order
        let n = stub.insns.len();
        assert_eq!(
            &stub.insns[n - 6..n - 1],
            &[Insn::Pla, Insn::Tay, Insn::Pla, Insn::Tax, Insn::Pla]
        );
        // The port comes back from the stack exactly once
        let restores = stub
            .insns
            .windows(2)
            .filter(|w| w == &[Insn::Pla, Insn::StaZp(BANK_PORT)])
            .count();
        assert_eq!(restores, 1);
    }

    #[test]
    fn banks_out_roms_exactly_once() {
        let stub = stub_8k();
        let bank_writes = stub
            .insns
            .windows(2)
            .filter(|w| w == &[Insn::LdaImm(ALL_RAM_BANK), Insn::StaZp(BANK_PORT)])
            .count();
        assert_eq!(bank_writes, 1);
    }

    #[test]
    fn stores_sentinel() {
        let stub = stub_8k();
        assert!(
            stub.insns
                .windows(2)
                .any(|w| w == [Insn::LdaImm(SENTINEL_VALUE), Insn::StaZp(SENTINEL_ADDR)])
        );
    }

    #[test]
    fn single_jump_last_to_continuation() {
        let stub = stub_8k();
        let jumps: Vec<_> = stub
            .insns
            .iter()
            .filter(|insn| matches!(insn, Insn::JmpAbs(_)))
            .collect();
        assert_eq!(jumps.len(), 1);
        assert_eq!(stub.insns.last(), Some(&Insn::JmpAbs(0xFE47)));
    }

    #[test]
    fn parks_in_place_without_continuation() {
        let stub = copy_stub(0x0340, 0xE000, 0x4000, 0x0100, None);
        let jump_addr = 0x0340
            + stub.insns[..stub.insns.len() - 1]
                .iter()
                .map(|insn| insn.size())
                .sum::<u16>();
        assert_eq!(stub.insns.last(), Some(&Insn::JmpAbs(jump_addr)));
    }

    #[test]
    fn rounds_length_up_to_pages() {
        assert_eq!(stub_8k().pages, 32);
        assert_eq!(copy_stub(0x0340, 0, 0x4000, 1, None).pages, 1);
        assert_eq!(copy_stub(0x0340, 0, 0x4000, 257, None).pages, 2);
        assert_eq!(copy_stub(0x0340, 0, 0x4000, 1000, None).pages, 4);
    }

    /// Byte-exact golden encoding for the canonical 8 KiB KERNAL-shadow copy.
    #[test]
    fn golden_encoding() {
        let stub = stub_8k();
        #[rustfmt::skip]
        let expected: [u8; 61] = [
            0x48,             // PHA
            0x8A, 0x48,       // TXA : PHA
            0x98, 0x48,       // TYA : PHA
            0xA5, 0x01, 0x48, // LDA $01 : PHA
            0xA9, 0x34, 0x85, 0x01, // LDA #$34 : STA $01
            0xA9, 0x00, 0x85, 0xFB, // LDA #<src : STA $FB
            0xA9, 0xE0, 0x85, 0xFC, // LDA #>src : STA $FC
            0xA9, 0x00, 0x85, 0xFD, // LDA #<dst : STA $FD
            0xA9, 0x40, 0x85, 0xFE, // LDA #>dst : STA $FE
            0xA2, 0x20,             // LDX #32 pages
            0xA0, 0x00,             // LDY #0
            0xB1, 0xFB,             // LDA ($FB),Y
            0x91, 0xFD,             // STA ($FD),Y
            0xC8,                   // INY
            0xD0, 0xF9,             // BNE inner
            0xE6, 0xFC,             // INC $FC
            0xE6, 0xFE,             // INC $FE
            0xCA,                   // DEX
            0xD0, 0xF0,             // BNE outer
            0x68, 0x85, 0x01,       // PLA : STA $01
            0xA9, 0x42, 0x85, 0x02, // LDA #$42 : STA $02
            0x68, 0xA8,             // PLA : TAY
            0x68, 0xAA,             // PLA : TAX
            0x68,                   // PLA
            0x4C, 0x47, 0xFE,       // JMP $FE47
        ];
        assert_eq!(stub.bytes, expected);
    }

    #[test]
    fn branch_offsets_stay_in_range() {
        for insn in copy_stub(0x0340, 0xA000, 0x4000, 0x2000, Some(0xEA31)).insns {
            if let Insn::Bne(offset) = insn {
                assert!(offset < 0, "copy loops only branch backwards");
            }
        }
    }
}
