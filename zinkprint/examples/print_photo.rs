//! Print a photo on a Canon Ivy 2

use zinkprint::{PrintOptions, Printer, PrinterConfig, PrinterFamily};

#[tokio::main]
async fn main() -> zinkprint::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let address =
        std::env::var("PRINTER_ADDRESS").unwrap_or_else(|_| "70:70:70:70:70:70".to_string());
    let path = std::env::args().nth(1).unwrap_or_else(|| "photo.jpg".to_string());

    let photo = std::fs::read(&path).expect("readable image file");

    let mut printer = Printer::new(PrinterConfig::new(address, PrinterFamily::CanonIvy2));
    printer.open().await?;
    println!("Connected: {}", printer.info());

    let status = printer.status().await?;
    println!("Battery at {}%", status.battery_percent);
    if !status.is_ready {
        println!("Printer not ready: {:?}", status.condition);
        printer.close().await?;
        return Ok(());
    }

    println!("Printing {path}...");
    let options = PrintOptions {
        auto_crop: true,
        ..PrintOptions::default()
    };
    printer.print_with_options(&photo, &options).await?;
    println!("Done! The photo should eject shortly.");

    printer.close().await?;

    Ok(())
}
