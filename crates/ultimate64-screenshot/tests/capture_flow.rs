//! End-to-end capture against a mock Ultimate 64.
//!
//! The mock serves the four REST operations over a loopback listener,
//! backed by a 64K memory model with the CPU banking rules the DMA
//! facility exposes (ROMs and I/O win over RAM). Its `resume` runs a small
//! 6502 interpreter covering exactly the instructions the injected copy
//! routine uses, entered through the RAM NMI vector when the CIA2 timer
//! interrupt has been armed — so the ROM-bypass path is exercised for
//! real: the routine must bank ROMs out, move the hidden bytes, store its
//! sentinel, and leave every byte it touched restorable.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use ultimate64_screenshot::{CaptureOptions, RemoteClient, capture};
use vic_frame::palette;

// ---------------------------------------------------------------------------
// Machine model
// ---------------------------------------------------------------------------

/// Remote operations the mock saw, for protocol-order assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Pause,
    Resume,
    Read(u16, usize),
    Write(u16, usize),
}

struct Machine {
    ram: Vec<u8>,
    /// $D000-$DFFF I/O block: VIC registers, colour RAM, CIA registers.
    io: Vec<u8>,
    kernal: Vec<u8>,
    basic: Vec<u8>,
    paused: bool,
    /// CIA2 Timer A NMI enabled (set by writing $81 to $DD0D).
    nmi_armed: bool,
    log: Vec<Op>,
}

impl Machine {
    fn new() -> Self {
        let mut machine = Self {
            ram: vec![0u8; 0x1_0000],
            io: vec![0u8; 0x1000],
            kernal: vec![0u8; 0x2000],
            basic: vec![0u8; 0x2000],
            paused: false,
            nmi_armed: false,
            log: Vec::new(),
        };
        machine.ram[0x0001] = 0x37; // default banking: all ROMs + I/O
        machine
    }

    fn hiram(&self) -> bool {
        self.ram[1] & 0x04 != 0
    }

    fn loram(&self) -> bool {
        self.ram[1] & 0x02 != 0
    }

    fn io_visible(&self) -> bool {
        self.ram[1] & 0x01 != 0 && (self.hiram() || self.loram())
    }

    /// The CPU-visible map, which is also what DMA reads see.
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0xA000..=0xBFFF if self.hiram() && self.loram() => {
                self.basic[(addr - 0xA000) as usize]
            }
            0xD000..=0xDFFF if self.io_visible() => self.io[(addr - 0xD000) as usize],
            0xE000..=0xFFFF if self.hiram() => self.kernal[(addr - 0xE000) as usize],
            _ => self.ram[addr as usize],
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0xD000..=0xDFFF if self.io_visible() => {
                if addr == 0xDD0D {
                    // Set/clear semantics for the interrupt mask
                    self.nmi_armed = value & 0x81 == 0x81;
                }
                self.io[(addr - 0xD000) as usize] = value;
            }
            _ => self.ram[addr as usize] = value,
        }
    }

    fn dma_read(&mut self, addr: u16, length: usize) -> Vec<u8> {
        self.log.push(Op::Read(addr, length));
        (0..length)
            .map(|i| self.cpu_read(addr.wrapping_add(i as u16)))
            .collect()
    }

    fn dma_write(&mut self, addr: u16, data: &[u8]) {
        self.log.push(Op::Write(addr, data.len()));
        for (i, &value) in data.iter().enumerate() {
            self.cpu_write(addr.wrapping_add(i as u16), value);
        }
    }

    /// On resume, fire the armed timer NMI: enter the interpreter through
    /// the RAM vector and run until control leaves for the original
    /// handler address.
    fn resume(&mut self) {
        self.log.push(Op::Resume);
        self.paused = false;
        if self.nmi_armed {
            let entry = u16::from_le_bytes([self.ram[0x0318], self.ram[0x0319]]);
            self.run_6502(entry);
        }
    }

    /// Read the byte at `*pc` and advance.
    fn fetch(&self, pc: &mut u16) -> u8 {
        let value = self.cpu_read(*pc);
        *pc = pc.wrapping_add(1);
        value
    }

    /// Interpreter for the instruction subset the copy routine emits.
    fn run_6502(&mut self, entry: u16) {
        let mut pc = entry;
        let mut a = 0u8;
        let mut x = 0u8;
        let mut y = 0u8;
        let mut sp = 0xFFu8;
        let mut zero = false;

        for _ in 0..2_000_000 {
            let opcode = self.fetch(&mut pc);
            match opcode {
                0x48 => {
                    // PHA
                    self.ram[0x0100 + sp as usize] = a;
                    sp = sp.wrapping_sub(1);
                }
                0x68 => {
                    // PLA
                    sp = sp.wrapping_add(1);
                    a = self.ram[0x0100 + sp as usize];
                }
                0x8A => a = x,
                0x98 => a = y,
                0xAA => x = a,
                0xA8 => y = a,
                0xC8 => {
                    y = y.wrapping_add(1);
                    zero = y == 0;
                }
                0xCA => {
                    x = x.wrapping_sub(1);
                    zero = x == 0;
                }
                0xA9 => a = self.fetch(&mut pc),
                0xA5 => {
                    let zp = self.fetch(&mut pc);
                    a = self.cpu_read(u16::from(zp));
                }
                0x85 => {
                    let zp = self.fetch(&mut pc);
                    self.cpu_write(u16::from(zp), a);
                }
                0xB1 => {
                    let zp = self.fetch(&mut pc) as usize;
                    let base = u16::from_le_bytes([self.ram[zp], self.ram[zp + 1]]);
                    a = self.cpu_read(base.wrapping_add(u16::from(y)));
                }
                0x91 => {
                    let zp = self.fetch(&mut pc) as usize;
                    let base = u16::from_le_bytes([self.ram[zp], self.ram[zp + 1]]);
                    self.cpu_write(base.wrapping_add(u16::from(y)), a);
                }
                0xA2 => x = self.fetch(&mut pc),
                0xA0 => y = self.fetch(&mut pc),
                0xE6 => {
                    let zp = self.fetch(&mut pc) as usize;
                    self.ram[zp] = self.ram[zp].wrapping_add(1);
                }
                0xD0 => {
                    let offset = self.fetch(&mut pc) as i8;
                    if !zero {
                        pc = pc.wrapping_add_signed(i16::from(offset));
                    }
                }
                0x4C => {
                    let low = self.fetch(&mut pc);
                    let high = self.fetch(&mut pc);
                    let target = u16::from_le_bytes([low, high]);
                    // Jumping out of the injected routine means it finished
                    // and handed control to the original handler.
                    if !(0x0340..0x0400).contains(&target) {
                        return;
                    }
                    pc = target;
                }
                other => panic!("mock CPU hit unexpected opcode ${other:02X} at ${pc:04X}"),
            }
        }
        panic!("mock CPU ran away");
    }
}

// ---------------------------------------------------------------------------
// Mock REST server
// ---------------------------------------------------------------------------

fn spawn_server(machine: Arc<Mutex<Machine>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let host = format!("127.0.0.1:{}", listener.local_addr().expect("addr").port());
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            handle_request(stream, &machine);
        }
    });
    host
}

fn handle_request(mut stream: TcpStream, machine: &Arc<Mutex<Machine>>) {
    let mut seen = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        match stream.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
            Err(_) => return,
        }
        if let Some(pos) = seen.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };
    let head = String::from_utf8_lossy(&seen[..head_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let target = parts.next().unwrap_or_default().to_owned();

    let content_length: usize = lines
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0);

    let mut body = seen[head_end + 4..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => body.extend_from_slice(&buf[..n]),
            Err(_) => return,
        }
    }

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let param = |name: &str| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
            .map(ToOwned::to_owned)
    };

    let mut machine = machine.lock().expect("machine lock");
    let (status, response_body): (&str, Vec<u8>) = match (method.as_str(), path) {
        ("PUT", "/v1/machine:pause") => {
            machine.log.push(Op::Pause);
            machine.paused = true;
            ("200 OK", Vec::new())
        }
        ("PUT", "/v1/machine:resume") => {
            machine.resume();
            ("200 OK", Vec::new())
        }
        ("GET", "/v1/machine:readmem") => {
            let addr = param("address")
                .and_then(|v| u16::from_str_radix(&v, 16).ok())
                .expect("address param");
            let length: usize = param("length").and_then(|v| v.parse().ok()).expect("length");
            ("200 OK", machine.dma_read(addr, length))
        }
        ("POST", "/v1/machine:writemem") => {
            let addr = param("address")
                .and_then(|v| u16::from_str_radix(&v, 16).ok())
                .expect("address param");
            machine.dma_write(addr, &body);
            ("200 OK", Vec::new())
        }
        _ => ("404 Not Found", Vec::new()),
    };
    drop(machine);

    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response_body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response_body);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

fn no_border() -> CaptureOptions {
    CaptureOptions {
        border: false,
        ..CaptureOptions::default()
    }
}

/// Standard text mode out of VIC bank 0 with the character ROM shadow:
/// everything reads directly, glyphs come from the embedded set.
#[test]
fn captures_text_screen_without_bypass() {
    let mut machine = Machine::new();
    machine.io[0x11] = 0x1B; // DEN + RSEL, text mode
    machine.io[0x16] = 0xC8; // CSEL
    machine.io[0x18] = 0x14; // screen $0400, chars $1000 (ROM shadow)
    machine.io[0x20] = 0x0E;
    machine.io[0x21] = 0x06;
    machine.io[0xD00] = 0x97; // CIA2 port A: bank 0
    machine.ram[0x0400..0x07E8].fill(0x01); // 'A' everywhere
    machine.io[0x800..0x800 + 1000].fill(0x0E); // light blue

    let machine = Arc::new(Mutex::new(machine));
    let host = spawn_server(Arc::clone(&machine));
    let client = RemoteClient::new(host, None);

    let img = capture(&client, &no_border()).expect("capture");
    assert_eq!(img.dimensions(), (320, 200));

    // 'A' glyph row 0 is $18: two foreground pixels at x 3-4
    assert_eq!(*img.get_pixel(0, 0), palette::colour(6));
    assert_eq!(*img.get_pixel(3, 0), palette::colour(14));
    assert_eq!(*img.get_pixel(4, 0), palette::colour(14));

    let machine = machine.lock().expect("machine lock");
    assert!(!machine.paused, "capture must leave the machine running");
    // The shadowed character window must never be fetched remotely
    assert!(
        !machine
            .log
            .iter()
            .any(|op| matches!(op, Op::Read(0x1000, 2048))),
        "character ROM shadow read remotely"
    );
}

/// Hi-res bitmap in VIC bank 3 with the bitmap under KERNAL ROM: the copy
/// routine must run, the image must show the hidden RAM, and the machine
/// must come back byte-identical.
#[test]
fn bypass_reads_bitmap_under_kernal_and_restores_memory() {
    let mut machine = Machine::new();
    machine.io[0x11] = 0x3B; // BMM + DEN + RSEL
    machine.io[0x16] = 0xC8;
    machine.io[0x18] = 0x08; // screen $C400, bitmap $E000
    machine.io[0x20] = 0x00;
    machine.io[0x21] = 0x00;
    machine.io[0xD00] = 0x94; // CIA2 port A: bank 3

    // What the VIC-II displays: solid bitmap in RAM under KERNAL,
    // foreground cyan from the screen matrix
    machine.ram[0xE000..0xE000 + 8000].fill(0xFF);
    machine.ram[0xC400..0xC400 + 1000].fill(0x30);
    // The ROM that hides it reads as zeros, so a direct read would render
    // an all-background frame
    machine.kernal.fill(0x00);
    // RAM NMI vector points at the usual handler address
    machine.ram[0x0318] = 0x47;
    machine.ram[0x0319] = 0xFE;
    // Pre-existing bytes in every area the protocol touches
    machine.ram[0x0340..0x03C0].fill(0xAB); // stub area
    machine.ram[0x4000..0x6000].fill(0xCD); // copy buffer
    machine.ram[0x00FB..0x00FF].fill(0x11); // zero-page pointers
    machine.ram[0x0002] = 0x99; // sentinel cell

    let ram_before = machine.ram.clone();
    let io_before = machine.io.clone();

    let machine = Arc::new(Mutex::new(machine));
    let host = spawn_server(Arc::clone(&machine));
    let client = RemoteClient::new(host, None);

    let img = capture(&client, &no_border()).expect("capture");

    // The frame shows the RAM hidden under the ROM
    let cyan = palette::colour(3);
    assert!(img.pixels().all(|p| *p == cyan), "bitmap bytes not fetched from under ROM");

    let machine = machine.lock().expect("machine lock");
    assert!(!machine.paused);

    // Memory neutrality: all 64K of RAM identical, except the processor
    // stack page where the interrupt round-trip leaves its residue
    for (addr, (&before, &after)) in ram_before.iter().zip(machine.ram.iter()).enumerate() {
        if (0x0100..0x0200).contains(&addr) {
            continue;
        }
        assert_eq!(before, after, "RAM differs at ${addr:04X}");
    }
    // I/O identical except the CIA2 timer/interrupt cells the trigger used
    for (offset, (&before, &after)) in io_before.iter().zip(machine.io.iter()).enumerate() {
        if (0xD04..=0xD0F).contains(&offset) {
            continue;
        }
        assert_eq!(before, after, "I/O differs at ${:04X}", 0xD000 + offset);
    }

    // Protocol order: inject stub, repoint vector, resume, re-pause, read
    // buffer, then restore the stub area and buffer
    let log = &machine.log;
    let position = |op: &Op| log.iter().position(|o| o == op).expect("op in log");
    let stub_write = position(&Op::Write(0x0340, 61));
    let vector_write = position(&Op::Write(0x0318, 2));
    let buffer_read = position(&Op::Read(0x4000, 8000));
    let resume = log.iter().position(|o| *o == Op::Resume).expect("resume");
    assert!(stub_write < vector_write);
    assert!(vector_write < resume);
    assert!(resume < buffer_read);
    // Restores happen after the buffer read: last writes to the stub area
    // and buffer put the original bytes back
    let last_stub_write = log.iter().rposition(|o| matches!(o, Op::Write(0x0340, _)));
    assert!(last_stub_write.expect("restore write") > buffer_read);

    // Two resumes in total: one for the copy routine, one to hand the
    // machine back
    assert_eq!(log.iter().filter(|o| **o == Op::Resume).count(), 2);
}

/// With the bypass disabled, the same setup reads the ROM instead: the
/// capture still succeeds but shows the DMA view, and the machine is never
/// resumed mid-capture.
#[test]
fn no_bypass_renders_dma_view() {
    let mut machine = Machine::new();
    machine.io[0x11] = 0x3B;
    machine.io[0x16] = 0xC8;
    machine.io[0x18] = 0x08;
    machine.io[0xD00] = 0x94;
    machine.ram[0xE000..0xE000 + 8000].fill(0xFF);
    machine.ram[0xC400..0xC400 + 1000].fill(0x30); // fg cyan, bg black
    machine.kernal.fill(0x00);

    let machine = Arc::new(Mutex::new(machine));
    let host = spawn_server(Arc::clone(&machine));
    let client = RemoteClient::new(host, None);

    let options = CaptureOptions {
        border: false,
        rom_bypass: false,
        ..CaptureOptions::default()
    };
    let img = capture(&client, &options).expect("capture");

    // ROM zeros render as the per-cell background colour (black)
    assert!(img.pixels().all(|p| *p == palette::colour(0)));

    let machine = machine.lock().expect("machine lock");
    assert_eq!(
        machine.log.iter().filter(|o| **o == Op::Resume).count(),
        1,
        "only the final hand-back resume"
    );
    // Nothing was ever written to the machine
    assert!(!machine.log.iter().any(|op| matches!(op, Op::Write(..))));
}

/// Sprites fetched and composited over the frame, topmost sprite winning.
#[test]
fn captures_sprites_over_text_screen() {
    let mut machine = Machine::new();
    machine.io[0x11] = 0x1B;
    machine.io[0x16] = 0xC8;
    machine.io[0x18] = 0x14;
    machine.io[0x21] = 0x06;
    machine.io[0xD00] = 0x97;
    machine.io[0x15] = 0x01; // sprite 0 enabled
    machine.io[0x00] = 24; // at the display origin
    machine.io[0x01] = 50;
    machine.io[0x27] = 0x07; // yellow

    // Screen full of spaces; pointer for sprite 0 at $07F8 selects $2000
    machine.ram[0x0400..0x07E8].fill(0x20);
    machine.ram[0x07F8] = 0x80;
    machine.ram[0x2000..0x2000 + 63].fill(0xFF);

    let machine = Arc::new(Mutex::new(machine));
    let host = spawn_server(Arc::clone(&machine));
    let client = RemoteClient::new(host, None);

    let img = capture(&client, &no_border()).expect("capture");
    let yellow = palette::colour(7);
    assert_eq!(*img.get_pixel(0, 0), yellow);
    assert_eq!(*img.get_pixel(23, 20), yellow);
    assert_eq!(*img.get_pixel(24, 0), palette::colour(6));

    let machine = machine.lock().expect("machine lock");
    assert!(
        machine.log.contains(&Op::Read(0x2000, 64)),
        "sprite shape fetched from its pointer address"
    );
}
