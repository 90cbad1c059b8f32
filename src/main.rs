use std::env;

use anyhow::Result;
use meli_shipping_rs::MeliClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <listing_ids> <zip_code>", args[0]);
        eprintln!("  listing_ids: comma-separated; bare numbers get the MLB prefix");
        eprintln!("               (e.g., MLB1234567891,2345678912)");
        eprintln!("  zip_code: sender ZIP, punctuation allowed (e.g., 01.001-000)");
        std::process::exit(1);
    }

    let client = MeliClient::new()?;

    let batch = match client.parse_batch(&args[1], &args[2]) {
        Ok(batch) => batch,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    if batch.is_empty() {
        eprintln!("Error: No listing ids provided");
        std::process::exit(1);
    }

    println!(
        "Fetching shipping quotes for {} listing(s) to ZIP {}...",
        batch.len(),
        batch.zip_code
    );

    let results = client.quote_batch(batch).await;

    for line in &results {
        match &line.outcome {
            Ok(quote) => {
                let currency = quote.currency_id.as_deref().unwrap_or("BRL");
                match &quote.option_name {
                    Some(name) => {
                        println!("{}: {} {:.2} ({})", line.label(), currency, quote.cost, name)
                    }
                    None => println!("{}: {} {:.2}", line.label(), currency, quote.cost),
                }
            }
            Err(err) => println!("{}: {}", line.label(), err),
        }
    }

    Ok(())
}
