//! Turn raster images into payloads for thermal receipt and label printers.
//!
//! The pipeline is:
//! 1. derive the printable width from the paper and density ([`PrintGeometry`]),
//! 2. decode, orient, scale and darken the image ([`normalize()`]),
//! 3. threshold it into a packed bitmap ([`rasterize()`]),
//! 4. wrap the bitmap into ESC/POS or ZPL ([`Protocol`]).
//!
//! [`prepare_payload()`] runs all of these at once.
//! Delivering the payload is left to a [`Backend`].

use std::time::Duration;

use anyhow::Context as _;

macro_rules! backends {
	[$($(# [$($m:tt)*])? $mod:ident :: $name:ident),* $(,)?] => {
		$(
			$(# [$($m)*])*
			mod $mod;
			$(# [$($m)*])*
			pub use crate::$mod::$name;
		)*
	};
}

backends! [
	#[cfg(feature = "usb")]
	usb::UsbBackend,
	#[cfg(feature = "file")]
	file::FileBackend,
];

#[cfg(feature = "usb")]
pub use crate::usb::UsbDeviceInfo;

mod error;
mod escpos;
mod geometry;
mod normalize;
mod pipeline;
mod raster;
mod zpl;

pub use crate::{
	error::{Error, Result},
	escpos::encode_escpos,
	geometry::{compute_printable_width, mm_to_pixels, PaperWidth, PrintGeometry, MM_PER_INCH},
	normalize::{decode, load, normalize, scaled_height, ColorMode, Darkness, NormalizedImage},
	pipeline::{prepare_payload, prepare_printable, prepare_raster, PrintParams, PrintableImage, Protocol},
	raster::{rasterize, threshold, RasterBitmap},
	zpl::encode_zpl,
};

/// Printing backend, a raw channel to the printer.
pub trait Backend {
	/// Send data to the printer.
	fn send(&mut self, buf: &[u8], timeout: Duration) -> anyhow::Result<()>;
}

/// Printing driver, for printers that render color images themselves.
///
/// The driver is responsible for everything past the image: scaling it to the
/// device, and starting and ending the document and page.
pub trait Driver {
	fn print(&mut self, image: &PrintableImage) -> anyhow::Result<()>;
}

/// A printer, reached through a [`Backend`].
pub struct Printer {
	backend: Box<dyn Backend>,
}

impl Printer {
	/// Construct a new printer using `backend` as it's printing [`Backend`].
	pub fn new(backend: impl Backend + 'static) -> Self {
		Self {
			backend: Box::new(backend),
		}
	}

	/// Send a payload, as produced by [`prepare_payload()`], to the printer.
	pub fn print(&mut self, payload: &[u8]) -> anyhow::Result<()> {
		log::trace!("send({} bytes);", payload.len());
		self.backend
			.send(payload, Duration::from_secs(60))
			.context("failed to send payload")
	}

	/// Print `copies` copies of the same payload.
	pub fn print_copies(&mut self, payload: &[u8], copies: usize) -> anyhow::Result<()> {
		(0..copies).try_for_each(|i| {
			log::trace!("printing copy {}/{copies}...", i + 1);
			self.print(payload)
		})
	}
}
