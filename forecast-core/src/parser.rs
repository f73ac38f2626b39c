//! Decoder for the forecast API's JSON payload.

use serde::Deserialize;

use crate::{
    error::FormatError,
    model::{DayRecord, StructuredForecast},
};

#[derive(Debug, Deserialize)]
struct WireResponse {
    status: String,
    data: WireData,
}

#[derive(Debug, Deserialize)]
struct WireData {
    #[serde(default)]
    city: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    forecast: Vec<WireDay>,
}

#[derive(Debug, Deserialize)]
struct WireDay {
    date: String,
    temperature: String,
    weather: String,
    wind: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<WireDay>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<WireDay>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a raw response body into a [`StructuredForecast`].
///
/// Fails only on structural problems. A non-success `status` parses fine and
/// is left for the caller to judge.
pub fn parse(bytes: &[u8]) -> Result<StructuredForecast, FormatError> {
    let wire: WireResponse = serde_json::from_slice(bytes)?;

    let days = wire
        .data
        .forecast
        .into_iter()
        .map(|day| DayRecord {
            date: day.date,
            temperature_range: day.temperature,
            weather_text: day.weather,
            wind_text: day.wind,
        })
        .collect();

    Ok(StructuredForecast { status: wire.status, city_name: wire.data.city, days })
}
