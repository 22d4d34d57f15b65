//! ZPL label graphics.

use crate::RasterBitmap;

/// Encode `bmp` as a ZPL label, with the bitmap as an ASCII hex graphic field.
pub fn encode_zpl(bmp: &RasterBitmap) -> Vec<u8> {
	log::trace!("encoding {bmp:?} as ZPL...");
	let total = bmp.bitmap().len();
	let mut field = format!("^GFA,{total},{total},{},", bmp.bytes_per_row());
	field.reserve(total * 2);
	field.extend(bmp.bitmap().iter().map(|b| format!("{b:02X}")));

	[
		"^XA".to_string(),
		format!("^PW{}", bmp.width()),
		"^LH0,0".to_string(),
		"^FO0,0".to_string(),
		field,
		"^XZ".to_string(),
	]
	.join("\n")
	.into_bytes()
}
