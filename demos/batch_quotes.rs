use std::time::Instant;

use anyhow::Result;
use meli_shipping_rs::MeliClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Create a single client instance; all requests share its connection pool
    let client = MeliClient::new()?;

    // Test listing ids (you can replace with real listing ids)
    let ids = "1234567891, 2345678912, 3456789123,\n\
               MLB4567891234, MLB5678912345,\n\
               6789123456, 7891234567, not-a-listing,\n\
               8912345678, 9123456789";

    let batch = client.parse_batch(ids, "01001000")?;

    println!("Quoting {} listing(s) concurrently...", batch.len());
    let start = Instant::now();

    let results = client.quote_batch(batch).await;

    let elapsed = start.elapsed();

    println!("\n=== Results ===");
    println!("Quoted {} listing(s) in {:?}", results.len(), elapsed);
    println!(
        "Throughput: {:.2} listings/sec",
        results.len() as f64 / elapsed.as_secs_f64()
    );

    let succeeded = results.iter().filter(|r| r.outcome.is_ok()).count();
    println!("Succeeded: {} / {}", succeeded, results.len());

    // Results come back in input order regardless of completion order
    for (i, line) in results.iter().enumerate() {
        match &line.outcome {
            Ok(quote) => println!(
                "[{}] {}: {} {:.2}",
                i + 1,
                line.label(),
                quote.currency_id.as_deref().unwrap_or("BRL"),
                quote.cost
            ),
            Err(err) => println!("[{}] {}: {}", i + 1, line.label(), err),
        }
    }

    Ok(())
}
