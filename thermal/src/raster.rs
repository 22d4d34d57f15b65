use std::fmt::{self, Debug, Formatter};

use image::{GrayImage, Luma};

use crate::{Error, Result};

/// A packed monochrome bitmap.
///
/// Rows are stored top to bottom, 8 pixels per byte with the leftmost pixel
/// in the most significant bit. A set bit is printed, a cleared bit is left blank.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterBitmap {
	width: u32,
	height: u32,
	bitmap: Vec<u8>,
}

impl RasterBitmap {
	/// Wrap already packed pixels.
	///
	/// `width` must be a non-zero multiple of 8 and `bitmap` must contain exactly
	/// `width / 8 * height` bytes.
	pub fn new(width: u32, height: u32, bitmap: Vec<u8>) -> Result<Self> {
		if width == 0 || width % 8 != 0 {
			return Err(Error::invalid("bitmap width", width, "a non-zero multiple of 8"));
		}

		let expected = (width / 8) as usize * height as usize;
		if expected != bitmap.len() {
			return Err(Error::EncodingInvariant(format!(
				"expected a bitmap of {expected} bytes, got {}",
				bitmap.len(),
			)));
		}

		Ok(Self {
			width,
			height,
			bitmap,
		})
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn bytes_per_row(&self) -> u32 {
		self.width / 8
	}

	pub fn bitmap(&self) -> &[u8] {
		&self.bitmap
	}

	pub fn into_bitmap(self) -> Vec<u8> {
		self.bitmap
	}

	/// Whether the pixel at (`x`, `y`) is printed.
	pub fn get(&self, x: u32, y: u32) -> Option<bool> {
		if x >= self.width || y >= self.height {
			return None;
		}

		let b = self.bitmap[(y * self.bytes_per_row() + x / 8) as usize];
		Some(b & (128 >> (x % 8)) != 0)
	}

	/// Render the bitmap as black and white pixels, e.g. for a preview.
	pub fn to_image(&self) -> GrayImage {
		GrayImage::from_fn(self.width, self.height, |x, y| {
			match self.get(x, y) {
				Some(true) => Luma([0x00]),
				_ => Luma([0xff]),
			}
		})
	}
}

impl Debug for RasterBitmap {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("RasterBitmap")
			.field("width", &self.width)
			.field("height", &self.height)
			.field("bytes_per_row", &self.bytes_per_row())
			.finish()
	}
}

/// Threshold a grayscale image into a [`RasterBitmap`].
///
/// Every pixel darker than `threshold` is printed. There is no dithering.
pub fn rasterize(img: &GrayImage, threshold: u8) -> Result<RasterBitmap> {
	let (w, h) = img.dimensions();
	if w == 0 || w % 8 != 0 {
		return Err(Error::invalid("image width", w, "a non-zero multiple of 8"));
	}

	log::trace!("rasterizing {w}x{h} at threshold {threshold}...");
	let bitmap = img
		.as_raw()
		.chunks_exact(8)
		.map(|chunk| {
			chunk.iter().enumerate().fold(0u8, |acc, (i, &px)| {
				if px < threshold {
					acc | 128 >> i
				} else {
					acc
				}
			})
		})
		.collect();

	RasterBitmap::new(w, h, bitmap)
}

/// Validate a raw threshold value.
pub fn threshold(value: i32) -> Result<u8> {
	u8::try_from(value).map_err(|_| Error::invalid("threshold", value, "0..=255"))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gray(width: u32, pixels: &[u8]) -> GrayImage {
		let height = pixels.len() as u32 / width;
		GrayImage::from_raw(width, height, pixels.to_vec()).unwrap()
	}

	#[test]
	fn packs_msb_first() {
		let img = gray(8, &[0, 255, 0, 255, 0, 255, 0, 255]);
		let bmp = rasterize(&img, 128).unwrap();
		assert_eq!(bmp.bitmap(), [0xaa]);
		assert_eq!(bmp.bytes_per_row(), 1);
		assert_eq!(bmp.height(), 1);
	}

	#[test]
	fn threshold_is_strict() {
		let img = gray(8, &[99, 100, 101, 0, 255, 100, 100, 99]);
		let bmp = rasterize(&img, 100).unwrap();
		assert_eq!(bmp.bitmap(), [0b1001_0001]);

		// nothing is darker than 0
		assert_eq!(rasterize(&img, 0).unwrap().bitmap(), [0x00]);
	}

	#[test]
	fn rows_are_row_major() {
		let mut px = vec![255u8; 16 * 2];
		px[0] = 0; // row 0, x 0
		px[16 + 15] = 0; // row 1, x 15
		let bmp = rasterize(&gray(16, &px), 128).unwrap();
		assert_eq!(bmp.bitmap(), [0x80, 0x00, 0x00, 0x01]);
		assert_eq!(bmp.get(0, 0), Some(true));
		assert_eq!(bmp.get(15, 1), Some(true));
		assert_eq!(bmp.get(1, 0), Some(false));
		assert_eq!(bmp.get(16, 0), None);
	}

	#[test]
	fn rasterize_is_deterministic() {
		let px: Vec<u8> = (0..64).map(|i| (i * 37 % 256) as u8).collect();
		let img = gray(16, &px);
		assert_eq!(rasterize(&img, 90).unwrap(), rasterize(&img, 90).unwrap());
	}

	#[test]
	fn rejects_unaligned_width() {
		let img = gray(12, &[0; 12]);
		let e = rasterize(&img, 128).unwrap_err();
		assert!(matches!(e, Error::InvalidParameter { name: "image width", .. }));
	}

	#[test]
	fn threshold_bounds() {
		assert_eq!(threshold(0).unwrap(), 0);
		assert_eq!(threshold(255).unwrap(), 255);
		assert!(matches!(threshold(256), Err(Error::InvalidParameter { .. })));
		assert!(matches!(threshold(-1), Err(Error::InvalidParameter { .. })));
	}

	#[test]
	fn bitmap_length_is_checked() {
		let e = RasterBitmap::new(16, 2, vec![0; 3]).unwrap_err();
		assert!(matches!(e, Error::EncodingInvariant(_)));
	}

	#[test]
	fn to_image_roundtrips_pixels() {
		let bmp = RasterBitmap::new(8, 1, vec![0x81]).unwrap();
		let img = bmp.to_image();
		assert_eq!(img.get_pixel(0, 0).0, [0x00]);
		assert_eq!(img.get_pixel(1, 0).0, [0xff]);
		assert_eq!(img.get_pixel(7, 0).0, [0x00]);
	}
}
