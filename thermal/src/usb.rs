use std::{fmt::{self, Display, Formatter}, time::Duration};
use anyhow::{bail, Context, Result};
use rusb::{Direction, GlobalContext, TransferType};

use crate::Backend;

pub type Device = rusb::Device<GlobalContext>;
pub type DeviceHandle = rusb::DeviceHandle<GlobalContext>;

/// Snapshot of a device on the USB bus, see [`UsbBackend::list()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbDeviceInfo {
	pub bus: u8,
	pub address: u8,
	pub vendor_id: u16,
	pub product_id: u16,
}

impl Display for UsbDeviceInfo {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "VID:PID {:04x}:{:04x}", self.vendor_id, self.product_id)
	}
}

/// A raw USB backend for [`Printer`](crate::Printer).
///
/// Payloads are written verbatim to the first OUT endpoint of the interface.
pub struct UsbBackend {
	handle: DeviceHandle,
	iface: u8,
	epout: u8,
	transfer: TransferType,
}

impl UsbBackend {
	/// Get a list of all devices currently connected via usb.
	pub fn list() -> rusb::Result<Vec<UsbDeviceInfo>> {
		let devs = rusb::devices()?
			.iter()
			.filter_map(|dev| {
				let desc = match dev.device_descriptor() {
					Ok(desc) => desc,
					Err(e) => {
						log::error!("cannot get device descriptor for device {dev:?}: {e}");
						return None;
					},
				};

				Some(UsbDeviceInfo {
					bus: dev.bus_number(),
					address: dev.address(),
					vendor_id: desc.vendor_id(),
					product_id: desc.product_id(),
				})
			})
			.collect();
		Ok(devs)
	}

	fn find(vendor_id: u16, product_id: u16) -> Result<Device> {
		rusb::devices()
			.context("cannot read list of usb devices")?
			.iter()
			.find(|dev| {
				let Ok(desc) = dev.device_descriptor() else {
					log::error!("cannot get device descriptor for device {dev:?}");
					return false
				};

				desc.vendor_id() == vendor_id && desc.product_id() == product_id
			})
			.with_context(|| format!("usb device {vendor_id:04x}:{product_id:04x} not found"))
	}

	/// Open the device `vendor_id:product_id` and claim interface `iface`.
	pub fn open(vendor_id: u16, product_id: u16, iface: u8) -> Result<Self> {
		let dev = Self::find(vendor_id, product_id)?;
		let handle = dev
			.open()
			.context("cannot open usb device")?;

		// automatically steal the USB device from the kernel
		let _ = handle.set_auto_detach_kernel_driver(true);

		let dd = dev
			.device_descriptor()
			.context("cannot get usb device descriptor")?;

		log::debug!("USB device descriptor = {dd:#?}");
		if let Ok(s) = handle.read_manufacturer_string_ascii(&dd) {
			log::info!("USB Vendor: {s}");
		}
		if let Ok(s) = handle.read_product_string_ascii(&dd) {
			log::info!("USB Product: {s}");
		}
		if let Ok(s) = handle.read_serial_number_string_ascii(&dd) {
			log::info!("USB Serial: {s}");
		}

		let cd = dev
			.active_config_descriptor()
			.or_else(|_| dev.config_descriptor(0))
			.context("cannot get usb config descriptor")?;
		log::debug!("USB configuration descriptor: {cd:#?}");

		let Some(id) = cd
			.interfaces()
			.find(|int| int.number() == iface)
			.and_then(|int| int.descriptors().find(|id| id.setting_number() == 0))
		else {
			bail!("usb interface {iface} not available");
		};
		log::debug!("USB interface descriptor {iface}: {id:#?}");

		let Some(epd) = id
			.endpoint_descriptors()
			.find(|epd| epd.direction() == Direction::Out)
		else {
			bail!("usb interface {iface} has no OUT endpoint");
		};
		log::debug!("USB OUT endpoint descriptor: {epd:#?}");

		let epout = epd.address();
		let transfer = epd.transfer_type();
		if !matches!(transfer, TransferType::Bulk | TransferType::Interrupt) {
			bail!("unsupported transfer type {transfer:?} on usb endpoint {epout:#x}");
		}

		log::info!("Is usb kernel driver active: {:?}", handle.kernel_driver_active(iface));
		handle
			.claim_interface(iface)
			.with_context(|| format!("cannot claim usb interface {iface}"))?;

		Ok(Self {
			handle,
			iface,
			epout,
			transfer,
		})
	}
}

impl Backend for UsbBackend {
	fn send(&mut self, buf: &[u8], timeout: Duration) -> Result<()> {
		let mut sent = 0;
		while sent < buf.len() {
			let n = match self.transfer {
				TransferType::Interrupt => self.handle.write_interrupt(self.epout, &buf[sent..], timeout)?,
				_ => self.handle.write_bulk(self.epout, &buf[sent..], timeout)?,
			};
			if n == 0 {
				bail!("usb device accepted no data after {sent} of {} bytes", buf.len());
			}
			sent += n;
		}
		Ok(())
	}
}

impl Drop for UsbBackend {
	fn drop(&mut self) {
		let _ = self.handle.release_interface(self.iface);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn device_info_formats_as_vid_pid() {
		let info = UsbDeviceInfo {
			bus: 1,
			address: 4,
			vendor_id: 0x04b8,
			product_id: 0x0e15,
		};
		assert_eq!(info.to_string(), "VID:PID 04b8:0e15");
	}
}
