use std::{fmt::Display, io};

use thiserror::Error;

/// Errors produced while turning an image into a printer payload.
#[derive(Debug, Error)]
pub enum Error {
	/// A parameter is outside of its documented domain.
	#[error("invalid {name}: {value} (expected {expected})")]
	InvalidParameter {
		name: &'static str,
		value: String,
		expected: &'static str,
	},

	/// The input could not be interpreted as a supported image.
	#[error("cannot decode image: {0}")]
	ImageDecode(#[from] image::ImageError),

	/// An internal invariant would be violated, this is a bug.
	#[error("encoding invariant violated: {0}")]
	EncodingInvariant(String),

	/// The input resource could not be read.
	#[error("cannot read input: {0}")]
	Io(#[from] io::Error),
}

impl Error {
	pub(crate) fn invalid(name: &'static str, value: impl Display, expected: &'static str) -> Self {
		Self::InvalidParameter {
			name,
			value: value.to_string(),
			expected,
		}
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
