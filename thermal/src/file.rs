use std::{
	fs::{File, OpenOptions},
	io::Write,
	path::Path,
	time::Duration,
};
use anyhow::{Context, Result};

use crate::Backend;

/// A device file backend for [`Printer`](crate::Printer), e.g. `/dev/usb/lp0`.
///
/// Any regular file works too, which is handy for saving a payload.
pub struct FileBackend {
	file: File,
}

impl FileBackend {
	/// Open a printing device file, creating it if it is a regular file that does not exist.
	pub fn open(path: &Path) -> Result<Self> {
		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(path)
			.with_context(|| format!("cannot open {}", path.display()))?;
		Ok(Self {
			file,
		})
	}
}

impl Backend for FileBackend {
	fn send(&mut self, buf: &[u8], _timeout: Duration) -> Result<()> {
		// TODO: timeout, character devices block until the printer accepts the data
		self.file.write_all(buf)?;
		self.file.flush()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn writes_payload_verbatim() {
		let path = std::env::temp_dir().join(format!("thermal-file-backend-{}.bin", std::process::id()));
		let mut backend = FileBackend::open(&path).unwrap();
		backend.send(&[0x1b, 0x40, 0x00], Duration::from_secs(1)).unwrap();
		drop(backend);

		assert_eq!(fs::read(&path).unwrap(), [0x1b, 0x40, 0x00]);
		fs::remove_file(&path).unwrap();
	}
}
