use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::constants;

/// What the weather card needs, distilled from the provider payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub pressure: u32,
    pub humidity: u32,
    pub visibility: u32,
    pub condition: String,
    pub description: String,
}

// Provider payload, the fields we care about only.
#[derive(Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    visibility: u32,
    weather: Vec<WeatherCondition>,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: f64,
    pressure: u32,
    humidity: u32,
}

#[derive(Deserialize)]
struct WeatherCondition {
    main: String,
    description: String,
}

fn snapshot_from(response: WeatherResponse) -> Option<WeatherSnapshot> {
    let condition = response.weather.into_iter().next()?;
    Some(WeatherSnapshot {
        temperature: response.main.temp,
        pressure: response.main.pressure,
        humidity: response.main.humidity,
        visibility: response.visibility,
        condition: condition.main.to_lowercase(),
        description: condition.description,
    })
}

/// Fire-and-forget fetch for the fixed location, once per page load. Any
/// failure is logged and collapses to `None`; the card renders nothing in
/// that case.
pub async fn fetch_weather(http: &Client, config: &RelayConfig) -> Option<WeatherSnapshot> {
    let Some(api_key) = config.weather_api_key.as_deref() else {
        warn!("WEATHER_API_KEY not set, skipping weather fetch");
        return None;
    };

    let url = format!("{}/data/2.5/weather", config.weather_api_url);
    let result = http
        .get(url)
        .query(&[
            ("q", constants::WEATHER_LOCATION.as_str()),
            ("units", "metric"),
            ("appid", api_key),
        ])
        .send()
        .await;

    let response = match result {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!(status = %response.status(), "weather API request failed");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "weather API unreachable");
            return None;
        }
    };

    match response.json::<WeatherResponse>().await {
        Ok(payload) => {
            let snapshot = snapshot_from(payload);
            match &snapshot {
                Some(snapshot) => debug!(?snapshot, "fetched weather snapshot"),
                None => warn!("weather payload had no condition entries"),
            }
            snapshot
        }
        Err(e) => {
            warn!(error = %e, "unparseable weather payload");
            None
        }
    }
}
