//! Decoding and normalizing of source images.
//!
//! A source image is oriented according to its metadata, converted to the
//! requested color mode, scaled to the printable width and finally adjusted
//! for the requested darkness.

use std::{fs, io::Cursor, path::Path};

use image::{imageops::{self, FilterType}, DynamicImage, GrayImage, ImageDecoder, ImageReader, RgbImage};

use crate::{Error, Result};

/// Color mode of a [`NormalizedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
	/// One intensity channel, used for monochrome printing.
	Grayscale,

	/// Three channels, handed to a driver that does its own rendering.
	Color,
}

/// An image, ready to be rasterized or handed to a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedImage {
	Gray(GrayImage),
	Color(RgbImage),
}

impl NormalizedImage {
	pub fn width(&self) -> u32 {
		match self {
			Self::Gray(img) => img.width(),
			Self::Color(img) => img.width(),
		}
	}

	pub fn height(&self) -> u32 {
		match self {
			Self::Gray(img) => img.height(),
			Self::Color(img) => img.height(),
		}
	}

	pub fn mode(&self) -> ColorMode {
		match self {
			Self::Gray(_) => ColorMode::Grayscale,
			Self::Color(_) => ColorMode::Color,
		}
	}

	pub fn into_gray(self) -> Option<GrayImage> {
		match self {
			Self::Gray(img) => Some(img),
			Self::Color(_) => None,
		}
	}

	pub fn into_color(self) -> Option<RgbImage> {
		match self {
			Self::Color(img) => Some(img),
			Self::Gray(_) => None,
		}
	}
}

/// Print darkness, `100` is neutral.
///
/// Values above `100` darken the image, values below lighten it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Darkness(u8);

impl Darkness {
	pub const MIN: u8 = 50;
	pub const MAX: u8 = 180;
	pub const NEUTRAL: Self = Self(100);

	pub fn new(value: i32) -> Result<Self> {
		if !(Self::MIN as i32..=Self::MAX as i32).contains(&value) {
			return Err(Error::invalid("darkness", value, "50..=180"));
		}
		Ok(Self(value as u8))
	}

	pub fn get(self) -> u8 {
		self.0
	}

	/// Brightness factor applied to every channel.
	pub fn factor(self) -> f32 {
		100.0 / self.0 as f32
	}
}

impl Default for Darkness {
	fn default() -> Self {
		Self::NEUTRAL
	}
}

impl TryFrom<i32> for Darkness {
	type Error = Error;

	fn try_from(value: i32) -> Result<Self> {
		Self::new(value)
	}
}

/// Decode an image and apply its orientation metadata.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
	log::trace!("decoding {} bytes...", data.len());
	let mut decoder = ImageReader::new(Cursor::new(data))
		.with_guessed_format()?
		.into_decoder()?;
	let orientation = decoder.orientation()?;
	let mut img = DynamicImage::from_decoder(decoder)?;

	log::trace!("orienting ({orientation:?})...");
	img.apply_orientation(orientation);
	Ok(img)
}

/// Read and [`decode`] an image file.
pub fn load(path: &Path) -> Result<DynamicImage> {
	let data = fs::read(path)?;
	decode(&data)
}

/// Height of an image scaled to `width`, keeping its aspect ratio.
pub fn scaled_height(src_width: u32, src_height: u32, width: u32) -> u32 {
	let ratio = src_height as f64 / src_width as f64;
	((width as f64 * ratio).round_ties_even() as u32).max(1)
}

/// Convert `source` into `mode`, scale it to `width` and apply `darkness`.
///
/// The source image is left untouched.
pub fn normalize(source: &DynamicImage, width: u32, darkness: Darkness, mode: ColorMode) -> Result<NormalizedImage> {
	if width == 0 {
		return Err(Error::invalid("target width", width, "a positive number of pixels"));
	}
	if source.width() == 0 || source.height() == 0 {
		let dim = format!("{}x{}", source.width(), source.height());
		return Err(Error::invalid("source image", dim, "a non-empty image"));
	}

	let height = scaled_height(source.width(), source.height(), width);
	log::trace!("resizing {}x{} to {width}x{height}...", source.width(), source.height());

	let img = match mode {
		ColorMode::Grayscale => {
			let mut img = imageops::resize(&source.to_luma8(), width, height, FilterType::Lanczos3);
			brighten(&mut img, darkness);
			NormalizedImage::Gray(img)
		},
		ColorMode::Color => {
			let mut img = imageops::resize(&source.to_rgb8(), width, height, FilterType::Lanczos3);
			brighten(&mut img, darkness);
			NormalizedImage::Color(img)
		},
	};
	Ok(img)
}

fn brighten(channels: &mut [u8], darkness: Darkness) {
	if darkness == Darkness::NEUTRAL {
		return;
	}

	log::trace!("adjusting darkness to {}...", darkness.get());
	let factor = darkness.factor();
	channels
		.iter_mut()
		.for_each(|c| *c = (*c as f32 * factor).round().clamp(0.0, 255.0) as u8);
}
