use std::path::Path;

use thermal::{encode_escpos, FileBackend, Printer, RasterBitmap};

fn main() {
    let device = std::env::args().nth(1).unwrap_or_else(|| "/dev/usb/lp0".into());
    let mut pixels = vec![0u8; 48 * 384];

    pixels
        .iter_mut()
        .enumerate()
        .filter(|(i, _)| (i % 2 == 0))
        .for_each(|(_, p)| *p = 0xff);

    let bmp = RasterBitmap::new(384, 384, pixels).expect("invalid bitmap");
    let payload = encode_escpos(&bmp).expect("failed to encode pattern");

    let backend = FileBackend::open(Path::new(&device)).expect("cannot open printer");
    Printer::new(backend)
        .print(&payload)
        .expect("failed to print pattern");
}
