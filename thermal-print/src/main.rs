use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;
use clap_verbosity::Verbosity;
use image::ImageFormat;
use thermal::{
    prepare_printable, prepare_raster, Darkness, Driver, FileBackend, PaperWidth, PrintGeometry,
    PrintParams, PrintableImage, Printer, Protocol, UsbBackend,
};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(about = "Print images on ESC/POS receipt printers and ZPL label printers")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Command {
    /// List the devices connected via USB.
    ListUsb,

    /// Print an image.
    Print(PrintArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Connection {
    /// Raw USB bulk transfer, requires `--usb-vid` and `--usb-pid`.
    Usb,

    /// Device file like /dev/usb/lp0, requires `--device`.
    File,

    /// Hand a color image to the system image viewer for printing.
    Driver,
}

#[derive(Args)]
struct PrintArgs {
    /// Path to the image to be printed, `-` for stdin.
    #[arg(short, long)]
    file: PathBuf,

    /// Printer language: escpos, zpl or label.
    #[arg(short, long, default_value = "escpos")]
    mode: Protocol,

    /// Paper width in mm, 58 or 80.
    #[arg(short, long)]
    paper: u32,

    /// How to reach the printer.
    #[arg(short, long, value_enum, default_value_t = Connection::Usb)]
    connection: Connection,

    /// Path to the device file.
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// USB vendor id, e.g. 0x04b8.
    #[arg(long, value_parser = parse_usb_id)]
    usb_vid: Option<u16>,

    /// USB product id, e.g. 0x0e15.
    #[arg(long, value_parser = parse_usb_id)]
    usb_pid: Option<u16>,

    /// USB interface number.
    #[arg(long, default_value_t = 0)]
    usb_interface: u8,

    /// Printer density in dots per inch.
    #[arg(long, default_value_t = 203)]
    dpi: i32,

    /// Pixels darker than this are printed, 0-255.
    #[arg(short = 'T', long, default_value_t = 0x80, value_parser = maybe_hex::<u8>)]
    threshold: u8,

    /// Darkness 50-180, 100 is neutral, higher values print darker.
    #[arg(short = 'D', long, default_value_t = 100)]
    darkness: i32,

    /// Number of copies.
    #[arg(short = 'n', long, default_value_t = 1)]
    copies: usize,

    /// Show the rasterized image instead of printing.
    #[arg(short, long)]
    show: bool,
}

/// Parse a USB id: `0x` prefixed or containing a-f means hex, otherwise decimal.
fn parse_usb_id(s: &str) -> Result<u16, String> {
    let lowered = s.to_ascii_lowercase();
    let (digits, radix) = match lowered.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None if lowered.contains(|c: char| matches!(c, 'a'..='f')) => (lowered.as_str(), 16),
        None => (lowered.as_str(), 10),
    };
    u16::from_str_radix(digits, radix).map_err(|e| format!("invalid usb id {s:?}: {e}"))
}

/// Saves the image as PNG and opens it with the system viewer, which owns the print dialog.
struct PreviewDriver {
    path: PathBuf,
}

impl Driver for PreviewDriver {
    fn print(&mut self, printable: &PrintableImage) -> Result<()> {
        log::info!(
            "printable image: {}x{}px, {:.1}x{:.1}mm",
            printable.image.width(),
            printable.image.height(),
            printable.width_mm,
            printable.height_mm,
        );
        printable
            .image
            .save_with_format(&self.path, ImageFormat::Png)
            .with_context(|| format!("cannot write {}", self.path.display()))?;
        open::that(&self.path)?;
        Ok(())
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let data = if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        data
    } else {
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?
    };
    Ok(data)
}

fn open_printer(args: &PrintArgs) -> Result<Printer> {
    let printer = match args.connection {
        Connection::Usb => {
            let (Some(vid), Some(pid)) = (args.usb_vid, args.usb_pid) else {
                bail!("--usb-vid and --usb-pid are required for usb connections");
            };
            log::trace!("opening usb device {vid:04x}:{pid:04x}...");
            Printer::new(UsbBackend::open(vid, pid, args.usb_interface)?)
        }
        Connection::File => {
            let Some(dev) = &args.device else {
                bail!("--device is required for file connections");
            };
            Printer::new(FileBackend::open(dev)?)
        }
        Connection::Driver => bail!("driver connections do not take raw payloads"),
    };
    Ok(printer)
}

fn print_with_driver(args: &PrintArgs) -> Result<()> {
    let geometry = PrintGeometry::new(PaperWidth::try_from(args.paper)?, args.dpi)?;
    let darkness = Darkness::new(args.darkness)?;
    let data = read_input(&args.file)?;

    log::trace!("preparing printable image...");
    let printable = prepare_printable(&data, geometry, darkness)?;
    if args.copies != 1 {
        log::warn!("copies are chosen in the print dialog, ignoring --copies");
    }

    let mut driver = PreviewDriver {
        path: std::env::temp_dir().join("thermal-print.png"),
    };
    driver.print(&printable)
}

fn print(args: &PrintArgs) -> Result<()> {
    if args.connection == Connection::Driver && !args.show {
        return print_with_driver(args);
    }

    let params = PrintParams::new(args.paper, args.dpi, args.darkness, args.threshold.into(), args.mode)?;
    let data = read_input(&args.file)?;

    log::trace!("rasterizing...");
    let bmp = prepare_raster(&data, &params)?;
    log::debug!("{bmp:?}");

    if args.show {
        let temppath = std::env::temp_dir().join("thermal-print-preview.png");
        bmp.to_image().save_with_format(&temppath, ImageFormat::Png)?;
        open::that(&temppath)?;
        return Ok(());
    }

    log::trace!("encoding as {}...", params.protocol);
    let payload = params.protocol.encode(&bmp)?;

    let mut printer = open_printer(args)?;
    printer.print_copies(&payload, args.copies)?;
    println!("Print job sent.");
    Ok(())
}

fn list_usb() -> Result<()> {
    let devices = UsbBackend::list().context("cannot get list of usb devices")?;
    if devices.is_empty() {
        println!("No USB devices detected.");
    }
    for dev in devices {
        println!("{dev}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match &cli.command {
        Command::ListUsb => list_usb(),
        Command::Print(args) => print(args),
    }
}
