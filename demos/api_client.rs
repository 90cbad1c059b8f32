/// Example HTTP client demonstrating how to call the shipping quote HTTP server API
///
/// Run the server first:
/// ```bash
/// cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client
/// ```

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct QuoteRequestBody {
    listing_id: String,
    zip_code: String,
}

#[derive(Serialize)]
struct BatchQuoteRequest {
    listing_ids: String,
    zip_code: String,
}

#[derive(Deserialize, Debug)]
struct QuoteResponse {
    success: bool,
    data: QuoteData,
}

#[derive(Deserialize, Debug)]
struct BatchQuoteResponse {
    success: bool,
    data: Vec<LineQuoteData>,
}

#[derive(Deserialize, Debug)]
struct QuoteData {
    listing_id: String,
    cost: f64,
    currency_id: Option<String>,
    option_name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LineQuoteData {
    input: String,
    listing_id: Option<String>,
    cost: Option<f64>,
    currency_id: Option<String>,
    option_name: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    println!("=== Shipping Quote HTTP API Client Demo ===\n");

    // 1. Health Check
    println!("1. Checking server health...");
    let health_url = format!("{}/health", base_url);
    let health: HealthResponse = client.get(&health_url).send().await?.json().await?;
    println!("   Server status: {}", health.status);
    println!("   Version: {}\n", health.version);

    // 2. Quote a Single Listing
    println!("2. Quoting single listing...");
    let quote_url = format!("{}/api/quote", base_url);
    let request = QuoteRequestBody {
        listing_id: "1234567891".to_string(), // bare digits, server applies the MLB prefix
        zip_code: "01.001-000".to_string(),
    };

    match client.post(&quote_url).json(&request).send().await {
        Ok(response) => {
            if response.status().is_success() {
                let result: QuoteResponse = response.json().await?;
                println!("   Listing: {}", result.data.listing_id);
                println!(
                    "   Cost: {} {:.2}",
                    result.data.currency_id.as_deref().unwrap_or("BRL"),
                    result.data.cost
                );
                if let Some(name) = &result.data.option_name {
                    println!("   Option: {}", name);
                }
                println!();
            } else {
                let error_text = response.text().await?;
                println!("   Error: {}\n", error_text);
            }
        }
        Err(e) => {
            println!("   Request failed: {}\n", e);
        }
    }

    // 3. Quote Multiple Listings (Batch)
    println!("3. Quoting multiple listings (batch)...");
    let batch_url = format!("{}/api/quote/batch", base_url);
    let batch_request = BatchQuoteRequest {
        listing_ids: "1234567891, MLB2345678912\n3456789123, bogus-id".to_string(),
        zip_code: "01001000".to_string(),
    };

    match client.post(&batch_url).json(&batch_request).send().await {
        Ok(response) => {
            if response.status().is_success() {
                let result: BatchQuoteResponse = response.json().await?;
                println!("   Received {} per-line results:", result.data.len());
                for (i, line) in result.data.iter().enumerate() {
                    let label = line.listing_id.as_deref().unwrap_or(&line.input);
                    match (line.cost, &line.error) {
                        (Some(cost), _) => println!(
                            "   [{}] {} - {} {:.2}",
                            i + 1,
                            label,
                            line.currency_id.as_deref().unwrap_or("BRL"),
                            cost
                        ),
                        (None, Some(error)) => println!("   [{}] {} - {}", i + 1, label, error),
                        (None, None) => println!("   [{}] {} - no data", i + 1, label),
                    }
                }
                println!();
            } else {
                let error_text = response.text().await?;
                println!("   Error: {}\n", error_text);
            }
        }
        Err(e) => {
            println!("   Request failed: {}\n", e);
        }
    }

    // 4. Get Metrics
    println!("4. Getting server metrics...");
    let metrics_url = format!("{}/api/metrics", base_url);
    let metrics: MetricsResponse = client.get(&metrics_url).send().await?.json().await?;
    println!("   Total requests: {}", metrics.total_requests);
    println!("   Requests in flight: {}", metrics.requests_in_flight);
    println!("   Uptime: {} seconds\n", metrics.uptime_seconds);

    println!("=== Demo Complete ===");

    Ok(())
}
