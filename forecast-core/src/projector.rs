use crate::model::{DisplayRow, StructuredForecast};

/// Map each forecast day onto a display row, keeping server order.
pub fn project(forecast: StructuredForecast) -> Vec<DisplayRow> {
    forecast
        .days
        .into_iter()
        .map(|day| DisplayRow {
            date: day.date,
            temperature: day.temperature_range,
            weather: day.weather_text,
            wind: day.wind_text,
        })
        .collect()
}
