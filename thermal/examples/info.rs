use thermal::UsbBackend;

fn main() {
    let devices = UsbBackend::list().expect("cannot list usb devices");
    for dev in devices {
        println!("Bus {:03} Device {:03}: {dev}", dev.bus, dev.address);
    }
}
