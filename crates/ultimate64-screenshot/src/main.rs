//! Ultimate 64 screenshot capture binary.
//!
//! Freezes the machine over its REST API, reads the VIC-II state and the
//! memory it displays from, reconstructs the frame offline, and writes an
//! image file. The machine is resumed whether or not the capture succeeds.

use std::process;

use ultimate64_screenshot::{CaptureOptions, RemoteClient, capture};

/// Output formats, chosen by file extension.
const VALID_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// Default output filename.
const DEFAULT_OUTPUT: &str = "screenshot.png";

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    host: String,
    output: String,
    password: Option<String>,
    options: CaptureOptions,
}

fn print_usage() {
    eprintln!("Usage: ultimate64-screenshot <IP_ADDRESS> [output.png] [options]");
    eprintln!();
    eprintln!("Captures the current screen of a running Ultimate 64 via its Web API.");
    eprintln!("All graphics modes and hardware sprites are supported, including data");
    eprintln!("stored in RAM under KERNAL/BASIC ROM (VIC bank 3).");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  IP_ADDRESS       address of the Ultimate 64");
    eprintln!("  output.png       output filename [default: {DEFAULT_OUTPUT}]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-border      don't add a border around the screen");
    eprintln!("  --nosprites      don't include hardware sprites");
    eprintln!("  --upscale=N      upscale output by integer factor N");
    eprintln!("  --password=XXX   API password, if one is configured");
    eprintln!("  --no-rom-bypass  disable the ROM bypass (faster, fails on VIC bank 3)");
    eprintln!("  --help, -h       show this help");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        process::exit(0);
    }

    let mut cli = CliArgs {
        host: args[0].clone(),
        output: DEFAULT_OUTPUT.to_owned(),
        password: None,
        options: CaptureOptions::default(),
    };

    for arg in &args[1..] {
        match arg.as_str() {
            "--no-border" => cli.options.border = false,
            "--nosprites" => cli.options.sprites = false,
            "--no-rom-bypass" => cli.options.rom_bypass = false,
            other => {
                if let Some(value) = other.strip_prefix("--upscale=") {
                    match value.parse::<u32>() {
                        Ok(factor) if factor >= 1 => cli.options.upscale = factor,
                        _ => {
                            eprintln!("Invalid upscale value: {value}");
                            eprintln!("Use --upscale=N where N is a positive integer.");
                            process::exit(1);
                        }
                    }
                } else if let Some(value) = other.strip_prefix("--password=") {
                    cli.password = Some(value.to_owned());
                } else if other.starts_with("--") {
                    eprintln!("Unknown option: {other}");
                    eprintln!("Use --help for a list of valid options.");
                    process::exit(1);
                } else {
                    cli.output = other.to_owned();
                }
            }
        }
    }

    cli
}

/// The extension decides the encoder; reject unknown ones before touching
/// the network.
fn check_extension(output: &str) {
    let extension = output
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let valid = extension
        .as_deref()
        .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext));
    if !valid {
        eprintln!("Output file '{output}' has an invalid or missing extension.");
        eprintln!("Valid extensions: .{}", VALID_EXTENSIONS.join(", ."));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = parse_args();
    check_extension(&cli.output);

    log::info!("connecting to Ultimate 64 at {}", cli.host);
    log::info!(
        "ROM bypass: {}",
        if cli.options.rom_bypass { "enabled" } else { "disabled" }
    );

    let client = RemoteClient::new(cli.host, cli.password);
    let img = match capture(&client, &cli.options) {
        Ok(img) => img,
        Err(e) => {
            log::error!("capture failed: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = img.save(&cli.output) {
        log::error!("could not write {}: {e}", cli.output);
        process::exit(1);
    }
    log::info!("screenshot saved to {}", cli.output);
}
