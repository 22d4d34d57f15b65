//! ESC/POS raster graphics.

use crate::{Error, RasterBitmap, Result};

/// `ESC @`, initialize the printer.
pub const INIT: [u8; 2] = [0x1b, 0x40];

/// `ESC a 1`, center alignment.
pub const ALIGN_CENTER: [u8; 3] = [0x1b, 0x61, 0x01];

/// `GS v 0 0`, print a raster bit image in normal mode.
pub const RASTER: [u8; 4] = [0x1d, 0x76, 0x30, 0x00];

/// `GS V 0`, full cut.
pub const CUT: [u8; 3] = [0x1d, 0x56, 0x00];

const FEED: [u8; 3] = [0x0a; 3];

/// Encode `bmp` as an ESC/POS job: initialize, center, print, feed three lines and cut.
///
/// # Errors
/// [`Error::InvalidParameter`] if the image is wider or taller than the
/// 16-bit raster header can express.
pub fn encode_escpos(bmp: &RasterBitmap) -> Result<Vec<u8>> {
	let x = u16::try_from(bmp.bytes_per_row())
		.map_err(|_| Error::invalid("image width", bmp.width(), "at most 65535 bytes per row"))?;
	let y = u16::try_from(bmp.height())
		.map_err(|_| Error::invalid("image height", bmp.height(), "at most 65535 rows"))?;

	log::trace!("encoding {bmp:?} as ESC/POS...");
	let mut packet = Vec::with_capacity(INIT.len() + ALIGN_CENTER.len() + RASTER.len() + 4 + bmp.bitmap().len() + FEED.len() + CUT.len());
	packet.extend_from_slice(&INIT);
	packet.extend_from_slice(&ALIGN_CENTER);
	packet.extend_from_slice(&RASTER);
	packet.extend_from_slice(&x.to_le_bytes());
	packet.extend_from_slice(&y.to_le_bytes());
	packet.extend_from_slice(bmp.bitmap());
	packet.extend_from_slice(&FEED);
	packet.extend_from_slice(&CUT);
	Ok(packet)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_byte_bitmap() {
		let bmp = RasterBitmap::new(8, 1, vec![0xaa]).unwrap();
		let out = encode_escpos(&bmp).unwrap();
		assert_eq!(out, [
			0x1b, 0x40,
			0x1b, 0x61, 0x01,
			0x1d, 0x76, 0x30, 0x00, 0x01, 0x00, 0x01, 0x00,
			0xaa,
			0x0a, 0x0a, 0x0a,
			0x1d, 0x56, 0x00,
		]);
	}

	#[test]
	fn header_is_little_endian() {
		// 440px wide receipt, 300 rows
		let bmp = RasterBitmap::new(440, 300, vec![0; 55 * 300]).unwrap();
		let out = encode_escpos(&bmp).unwrap();
		assert_eq!(&out[9..13], [55, 0, 0x2c, 0x01]);
		assert_eq!(out.len(), 2 + 3 + 8 + 55 * 300 + 3 + 3);
		assert_eq!(&out[out.len() - 3..], CUT);
	}

	#[test]
	fn rejects_overlong_bitmap() {
		let bmp = RasterBitmap::new(8, 0x1_0000, vec![0; 0x1_0000]).unwrap();
		let e = encode_escpos(&bmp).unwrap_err();
		assert!(matches!(e, Error::InvalidParameter { name: "image height", .. }));

		// the tallest image the header can hold still encodes
		let bmp = RasterBitmap::new(8, 0xffff, vec![0; 0xffff]).unwrap();
		assert_eq!(&encode_escpos(&bmp).unwrap()[11..13], [0xff, 0xff]);
	}
}
