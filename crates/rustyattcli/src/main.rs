//! Attribute discovery for a single Bluetooth LE device.
//!
//! Connects to the ATT channel of the device and lists what it exposes.

use anyhow::Context;
use clap::Parser;
use log::info;
use rustyatt::att::dump::{attribute_type_name, printable};
use rustyatt::{AddressType, BdAddr, GattClient, L2capConfig, L2capSocket, Transport, Uuid};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rustyattcli")]
#[command(about = "Discover the attributes of a Bluetooth LE device")]
struct Args {
    /// Address of the remote device, XX:XX:XX:XX:XX:XX
    address: BdAddr,

    /// Address type of the remote device (public or random)
    #[arg(short = 't', long, default_value = "public")]
    address_type: AddressType,

    /// Local adapter address, defaults to any adapter
    #[arg(long)]
    adapter: Option<BdAddr>,

    /// Receive timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Attribute type for Read By Type
    #[arg(long = "type", default_value = "2800")]
    attribute_type: Uuid,

    /// Run Read By Type
    #[arg(long)]
    read_by_type: bool,

    /// List primary services with Read By Group Type
    #[arg(long)]
    services: bool,

    /// List characteristic declarations
    #[arg(long)]
    characteristics: bool,

    /// Run Find Information
    #[arg(long)]
    information: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// With no discovery selected, run all of them
    fn run_all(&self) -> bool {
        !(self.read_by_type || self.services || self.characteristics || self.information)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = L2capConfig {
        source: args.adapter.unwrap_or(BdAddr::ANY),
        address_type: args.address_type,
        receive_timeout: Some(Duration::from_secs(args.timeout)),
        ..Default::default()
    };

    let socket = L2capSocket::connect(args.address, &config)
        .with_context(|| format!("Failed to connect to {}", args.address))?;
    match socket.link_mtu() {
        Some(link_mtu) => info!(
            "Connected to {}, ATT MTU {}, L2CAP MTU {}",
            socket.remote(),
            socket.mtu(),
            link_mtu
        ),
        None => info!("Connected to {}, ATT MTU {}", socket.remote(), socket.mtu()),
    }
    let mut client = GattClient::new(socket);
    let all = args.run_all();

    if all || args.read_by_type {
        let attributes = client
            .read_by_type(&args.attribute_type)
            .context("Read By Type failed")?;
        println!("Read By Type {}", args.attribute_type);
        for (handle, value) in attributes {
            println!("Handle: 0x{:04x}, Data: {}", handle, hex::encode(&value));
            println!("-->{}<--", printable(&value));
        }
    }

    if all || args.services {
        let services = client
            .discover_primary_services()
            .context("Primary service discovery failed")?;
        println!("Primary services");
        for service in services {
            println!(
                "Start: 0x{:04x} End: 0x{:04x} UUID: {}",
                service.start_handle, service.end_handle, service.uuid
            );
        }
    }

    if all || args.characteristics {
        let characteristics = client
            .read_characteristics()
            .context("Characteristic discovery failed")?;
        println!("Characteristics");
        for (declaration, characteristic) in characteristics {
            println!(
                "0x{:04x} Handle: 0x{:04x} UUID: {} Flags: {}",
                declaration, characteristic.handle, characteristic.uuid, characteristic.flags
            );
        }
    }

    if all || args.information {
        let information = client
            .find_information()
            .context("Find Information failed")?;
        println!("Information");
        for (handle, uuid) in information {
            match attribute_type_name(&uuid) {
                Some(name) => println!("Handle: 0x{:04x}\tType: {} ({})", handle, uuid, name),
                None => println!("Handle: 0x{:04x}\tType: {}", handle, uuid),
            }
        }
    }

    Ok(())
}
