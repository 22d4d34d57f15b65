use std::{fmt::{self, Display, Formatter}, str::FromStr};

use image::RgbImage;

use crate::{
	encode_escpos, encode_zpl, normalize, rasterize,
	normalize::decode,
	raster,
	ColorMode, Darkness, Error, PaperWidth, PrintGeometry, RasterBitmap, Result,
};

/// Wire format of a printer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
	/// Binary ESC/POS commands, used by receipt printers.
	#[default]
	EscPos,

	/// ZPL label script, used by label printers.
	Zpl,
}

impl Protocol {
	/// Encode `bmp` in this wire format.
	pub fn encode(self, bmp: &RasterBitmap) -> Result<Vec<u8>> {
		match self {
			Self::EscPos => encode_escpos(bmp),
			Self::Zpl => Ok(encode_zpl(bmp)),
		}
	}
}

impl FromStr for Protocol {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"escpos" => Ok(Self::EscPos),
			"zpl" | "label" => Ok(Self::Zpl),
			_ => Err(Error::invalid("protocol", s, "escpos or zpl")),
		}
	}
}

impl Display for Protocol {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::EscPos => "escpos",
			Self::Zpl => "zpl",
		})
	}
}

/// Validated parameters of a monochrome print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintParams {
	pub geometry: PrintGeometry,
	pub darkness: Darkness,
	pub threshold: u8,
	pub protocol: Protocol,
}

impl PrintParams {
	/// Validate raw parameters. Nothing is decoded until every one of them is valid.
	pub fn new(paper_width_mm: u32, dpi: i32, darkness: i32, threshold: i32, protocol: Protocol) -> Result<Self> {
		let paper = PaperWidth::try_from(paper_width_mm)?;
		Ok(Self {
			geometry: PrintGeometry::new(paper, dpi)?,
			darkness: Darkness::new(darkness)?,
			threshold: raster::threshold(threshold)?,
			protocol,
		})
	}
}

/// A color image, scaled for a paper, with its physical size.
#[derive(Debug, Clone)]
pub struct PrintableImage {
	pub image: RgbImage,
	pub width_mm: f64,
	pub height_mm: f64,
}

/// Decode `data` and turn it into a monochrome bitmap, as wide as the printable area.
pub fn prepare_raster(data: &[u8], params: &PrintParams) -> Result<RasterBitmap> {
	let source = decode(data)?;
	let img = normalize(&source, params.geometry.width(), params.darkness, ColorMode::Grayscale)?
		.into_gray()
		.ok_or_else(|| Error::EncodingInvariant("normalizer did not return a grayscale image".into()))?;
	rasterize(&img, params.threshold)
}

/// Decode `data` and encode it into a payload, ready to be sent to a printer.
pub fn prepare_payload(data: &[u8], params: &PrintParams) -> Result<Vec<u8>> {
	let bmp = prepare_raster(data, params)?;
	params.protocol.encode(&bmp)
}

/// Decode `data` and scale it for a driver which prints color images.
pub fn prepare_printable(data: &[u8], geometry: PrintGeometry, darkness: Darkness) -> Result<PrintableImage> {
	let source = decode(data)?;
	let image = normalize(&source, geometry.width(), darkness, ColorMode::Color)?
		.into_color()
		.ok_or_else(|| Error::EncodingInvariant("normalizer did not return a color image".into()))?;

	Ok(PrintableImage {
		width_mm: geometry.paper().mm() as f64,
		height_mm: geometry.pixels_to_mm(image.height()),
		image,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_protocol() {
		assert_eq!("escpos".parse::<Protocol>().unwrap(), Protocol::EscPos);
		assert_eq!("zpl".parse::<Protocol>().unwrap(), Protocol::Zpl);
		assert_eq!("label".parse::<Protocol>().unwrap(), Protocol::Zpl);
		assert!(matches!("pcl".parse::<Protocol>(), Err(Error::InvalidParameter { .. })));
	}

	#[test]
	fn params_are_validated_up_front() {
		let ok = PrintParams::new(58, 203, 100, 128, Protocol::EscPos).unwrap();
		assert_eq!(ok.geometry.width(), 440);

		let bad = [
			PrintParams::new(57, 203, 100, 128, Protocol::EscPos),
			PrintParams::new(58, 0, 100, 128, Protocol::EscPos),
			PrintParams::new(58, 203, 20, 128, Protocol::EscPos),
			PrintParams::new(58, 203, 100, 300, Protocol::EscPos),
		];
		for p in bad {
			assert!(matches!(p, Err(Error::InvalidParameter { .. })));
		}
	}

	#[test]
	fn decode_errors_are_reported() {
		let params = PrintParams::new(80, 203, 100, 128, Protocol::Zpl).unwrap();
		let e = prepare_payload(b"GIF89a but not really", &params).unwrap_err();
		assert!(matches!(e, Error::ImageDecode(_)));
	}
}
