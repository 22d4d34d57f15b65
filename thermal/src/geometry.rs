use std::fmt::{self, Display, Formatter};

use crate::{Error, Result};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Margin subtracted from each side of the paper, as a fraction of its width.
const SIDE_MARGIN: f64 = 0.02;

/// Physical paper width class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperWidth {
	Mm58,
	Mm80,
}

impl PaperWidth {
	pub fn mm(self) -> u32 {
		match self {
			Self::Mm58 => 58,
			Self::Mm80 => 80,
		}
	}
}

impl TryFrom<u32> for PaperWidth {
	type Error = Error;

	fn try_from(mm: u32) -> Result<Self> {
		match mm {
			58 => Ok(Self::Mm58),
			80 => Ok(Self::Mm80),
			_ => Err(Error::invalid("paper width", mm, "58 or 80 mm")),
		}
	}
}

impl Display for PaperWidth {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}mm", self.mm())
	}
}

/// Convert a physical length into dots at `dpi`.
///
/// Ties round to even.
pub fn mm_to_pixels(mm: f64, dpi: u32) -> u64 {
	(mm / MM_PER_INCH * dpi as f64).round_ties_even() as u64
}

/// Compute the printable width in pixels of a paper, at a given density.
///
/// The naive width is reduced by a 2% margin on each side and then truncated
/// to a multiple of 8, so every row packs into whole bytes.
///
/// # Errors
/// [`Error::InvalidParameter`] if the paper is not 58 or 80mm, if `dpi` is not
/// positive, or if the combination leaves no printable pixels or more than
/// fit in a `u32`.
pub fn compute_printable_width(paper_width_mm: u32, dpi: i32) -> Result<u32> {
	let paper = PaperWidth::try_from(paper_width_mm)?;
	let dpi = check_dpi(dpi)?;
	printable_width(paper, dpi)
}

fn check_dpi(dpi: i32) -> Result<u32> {
	if dpi <= 0 {
		return Err(Error::invalid("dpi", dpi, "a positive integer"));
	}
	Ok(dpi as u32)
}

fn printable_width(paper: PaperWidth, dpi: u32) -> Result<u32> {
	let total = mm_to_pixels(paper.mm() as f64, dpi);
	let margin = (total as f64 * SIDE_MARGIN).round_ties_even() as u64;
	let usable = total.saturating_sub(2 * margin);
	let width = u32::try_from(usable / 8 * 8)
		.map_err(|_| Error::invalid("dpi", dpi, "a density whose printable width fits in 32 bits"))?;

	if width == 0 {
		return Err(Error::invalid("dpi", dpi, "a density leaving at least 8 printable dots"));
	}

	log::debug!("{paper} @ {dpi}dpi: {total}px total, {margin}px margin, {width}px printable");
	Ok(width)
}

/// Pixel geometry derived from a paper width and a printing density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintGeometry {
	paper: PaperWidth,
	dpi: u32,
	width: u32,
}

impl PrintGeometry {
	pub fn new(paper: PaperWidth, dpi: i32) -> Result<Self> {
		let dpi = check_dpi(dpi)?;
		let width = printable_width(paper, dpi)?;
		Ok(Self {
			paper,
			dpi,
			width,
		})
	}

	pub fn paper(&self) -> PaperWidth {
		self.paper
	}

	pub fn dpi(&self) -> u32 {
		self.dpi
	}

	/// Printable width in pixels, always a non-zero multiple of 8.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Physical length in millimeters of `px` rows at this density.
	pub fn pixels_to_mm(&self, px: u32) -> f64 {
		px as f64 / self.dpi as f64 * MM_PER_INCH
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paper_58mm_at_203dpi() {
		assert_eq!(compute_printable_width(58, 203).unwrap(), 440);
	}

	#[test]
	fn paper_80mm_at_203dpi() {
		// 639px total, 13px margin each side, 613 usable
		assert_eq!(compute_printable_width(80, 203).unwrap(), 608);
	}

	#[test]
	fn always_byte_aligned_and_narrower_than_paper() {
		for mm in [58, 80] {
			for dpi in 50..=600 {
				let w = compute_printable_width(mm, dpi).unwrap();
				assert_eq!(w % 8, 0, "{mm}mm @ {dpi}dpi");
				assert!((w as u64) < mm_to_pixels(mm as f64, dpi as u32), "{mm}mm @ {dpi}dpi");
			}
		}
	}

	#[test]
	fn rejects_unknown_paper() {
		let e = compute_printable_width(60, 203).unwrap_err();
		assert!(matches!(e, Error::InvalidParameter { name: "paper width", .. }));
	}

	#[test]
	fn rejects_non_positive_dpi() {
		for dpi in [0, -203] {
			let e = compute_printable_width(58, dpi).unwrap_err();
			assert!(matches!(e, Error::InvalidParameter { name: "dpi", .. }));
		}
	}

	#[test]
	fn rejects_zero_width() {
		// 58mm @ 3dpi is 7 dots, which truncates to nothing
		let e = compute_printable_width(58, 3).unwrap_err();
		assert!(matches!(e, Error::InvalidParameter { name: "dpi", .. }));
	}

	#[test]
	fn huge_dpi_is_rejected_not_truncated() {
		for (mm, dpi) in [(80, i32::MAX), (58, i32::MAX), (80, 2_000_000_000)] {
			let e = compute_printable_width(mm, dpi).unwrap_err();
			assert!(matches!(e, Error::InvalidParameter { name: "dpi", .. }), "{mm}mm @ {dpi}dpi");
		}
		assert_eq!(mm_to_pixels(80.0, 2_000_000_000), 6_299_212_598);
	}

	#[test]
	fn largest_widths_still_fit() {
		// 80mm @ 1e9dpi: 3149606299px total, 62992126px margin each side
		assert_eq!(compute_printable_width(80, 1_000_000_000).unwrap(), 3_023_622_040);
	}

	#[test]
	fn geometry_converts_rows_back_to_mm() {
		let g = PrintGeometry::new(PaperWidth::Mm80, 254).unwrap();
		assert_eq!(g.paper(), PaperWidth::Mm80);
		assert!((g.pixels_to_mm(100) - 10.0).abs() < 1e-9);
	}
}
