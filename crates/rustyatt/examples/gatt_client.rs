use rustyatt::{BdAddr, GattClient, L2capConfig, L2capSocket};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr: BdAddr = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => return Err("usage: gatt_client XX:XX:XX:XX:XX:XX".into()),
    };

    let config = L2capConfig {
        receive_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    };

    println!("Connecting to {}...", addr);
    let socket = L2capSocket::connect(addr, &config)?;
    println!("Connected to {}", socket.remote());
    let mut client = GattClient::new(socket);

    let services = client.discover_primary_services()?;
    let characteristics = client.read_characteristics()?;

    for service in &services {
        println!(
            "Service {} [0x{:04x}-0x{:04x}]",
            service.uuid, service.start_handle, service.end_handle
        );
        for (_, characteristic) in characteristics
            .iter()
            .filter(|(declaration, _)| service.contains(*declaration))
        {
            println!(
                "  Characteristic {} (value handle 0x{:04x}): {}",
                characteristic.uuid, characteristic.handle, characteristic.flags
            );
            if characteristic.flags.can_write_without_response() {
                println!("    accepts Write Command");
            }
        }
    }

    // Stop at the first characteristic that can push values
    for item in client.characteristics() {
        let (_, characteristic) = item?;
        let flags = characteristic.flags;
        if flags.can_notify() || flags.can_indicate() {
            println!("First notifying characteristic: {}", characteristic.uuid);
            break;
        }
    }

    Ok(())
}
