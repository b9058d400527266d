//! Query the status of an already-paired printer

use zinkprint::{Printer, PrinterConfig, PrinterFamily};

#[tokio::main]
async fn main() -> zinkprint::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let address =
        std::env::var("PRINTER_ADDRESS").unwrap_or_else(|_| "A4:62:DF:A9:72:D4".to_string());
    let slim = std::env::var("PRINTER_SLIM").is_ok();

    println!("Connecting to {address}...");

    let mut config = PrinterConfig::new(address, PrinterFamily::KodakStep);
    if slim {
        config = config.slim();
    }

    let mut printer = Printer::new(config);
    printer.open().await?;
    println!("✓ Connected: {}", printer.info());

    let status = printer.status().await?;
    println!("✓ Battery: {}%", status.battery_percent);
    if let Some(charging) = status.charging {
        println!("✓ Charging: {charging}");
    }
    match status.condition {
        Some(condition) => println!("✗ Not ready: {condition}"),
        None => println!("✓ Ready to print"),
    }

    let settings = printer.settings().await?;
    println!("✓ Settings: {settings:?}");

    printer.close().await?;
    println!("✓ Disconnected");

    Ok(())
}
