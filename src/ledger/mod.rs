//! Ride ledger and bike access.
//!
//! The surrounding system owns both; this engine only reads them, either
//! from a local JSON file or over HTTP from the system's export endpoint.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::{Bike, RideRecord};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads the ride ledger from a local file path or an HTTP URL.
pub async fn load_rides(source: &str) -> Result<Vec<RideRecord>> {
    let bytes = read_source(source).await?;
    let rides: Vec<RideRecord> = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse ride ledger from {source}"))?;
    debug!(source, rides = rides.len(), "Ride ledger loaded");
    Ok(rides)
}

/// Loads a single bike (with its component baselines) from a local file
/// path or an HTTP URL.
pub async fn load_bike(source: &str) -> Result<Bike> {
    let bytes = read_source(source).await?;
    let bike: Bike = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse bike from {source}"))?;
    Ok(bike)
}

async fn read_source(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_rides_from_file() {
        let path = std::env::temp_dir().join("bike_wear_rater_ledger_test.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "r1",
                "bike_id": "b1",
                "start_time": "2024-02-01T08:00:00Z",
                "duration_seconds": 5400.0,
                "distance_miles": 14.0,
                "elevation_gain_feet": 1800.0,
                "conditions": "wet"
            }]"#,
        )
        .unwrap();

        let rides = load_rides(path.to_str().unwrap()).await.unwrap();
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].id, "r1");
        assert_eq!(rides[0].duration_seconds, 5400.0);
        assert!(rides[0].avg_speed_mph.is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_rides_rejects_malformed_json() {
        let path = std::env::temp_dir().join("bike_wear_rater_ledger_bad.json");
        std::fs::write(&path, "not json").unwrap();

        let result = load_rides(path.to_str().unwrap()).await;
        assert!(result.is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
