use anyhow::Result;
use meli_shipping_rs::{DEFAULT_PREFIX, MeliClient, normalize_listing_id, normalize_zip_code};

#[tokio::main]
async fn main() -> Result<()> {
    let client = MeliClient::new()?;

    // A bare numeric id gets the MLB prefix during normalization.
    let listing_id = normalize_listing_id("1234567891", DEFAULT_PREFIX)?;
    let zip_code = normalize_zip_code("01.001-000")?;

    println!("Shipping options for {} from ZIP {}:", listing_id, zip_code);

    let payload = client.shipping_options(&listing_id, &zip_code).await?;

    if let Some(destination) = &payload.destination {
        if let Some(label) = destination.label() {
            println!("Destination: {}", label);
        }
    }

    for (i, option) in payload.options.iter().enumerate() {
        let name = option.name.as_deref().unwrap_or("N/A");
        let currency = option.currency_id.as_deref().unwrap_or("BRL");
        match option.list_cost {
            Some(cost) => println!("  [{}] {}: {} {:.2}", i, name, currency, cost),
            None => println!("  [{}] {}: no cost listed", i, name),
        }
        if let Some(eta) = &option.estimated_delivery_time {
            if let (Some(shipping), Some(unit)) = (eta.shipping, eta.unit.as_deref()) {
                println!("      estimated delivery: {} {}(s)", shipping, unit);
            }
        }
    }

    let quote = client.shipping_quote(&listing_id, &zip_code).await?;
    println!(
        "\nReported quote: {} {:.2}",
        quote.currency_id.as_deref().unwrap_or("BRL"),
        quote.cost
    );

    Ok(())
}
