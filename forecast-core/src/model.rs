/// Status token the forecast API reports on success.
pub const SUCCESS_STATUS: &str = "OK";

/// Result of parsing one API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredForecast {
    /// Opaque outcome signal from the API, compared against [`SUCCESS_STATUS`].
    pub status: String,
    /// City name as resolved by the server; may differ from the query.
    pub city_name: Option<String>,
    /// Days in server order.
    pub days: Vec<DayRecord>,
}

impl StructuredForecast {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Resolved city name, treating an empty name the same as a missing one.
    pub fn resolved_city_name(&self) -> Option<&str> {
        self.city_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// One forecast day. All fields are server-formatted display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: String,
    pub temperature_range: String,
    pub weather_text: String,
    pub wind_text: String,
}

/// A single rendered row of the forecast list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub date: String,
    pub temperature: String,
    pub weather: String,
    pub wind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(status: &str, city: Option<&str>) -> StructuredForecast {
        StructuredForecast {
            status: status.to_string(),
            city_name: city.map(str::to_string),
            days: Vec::new(),
        }
    }

    #[test]
    fn success_status_is_compared_exactly() {
        assert!(forecast("OK", None).is_success());
        assert!(!forecast("ok", None).is_success());
        assert!(!forecast("OK ", None).is_success());
        assert!(!forecast("", None).is_success());
    }

    #[test]
    fn empty_city_name_is_not_resolved() {
        assert_eq!(forecast("OK", Some("北京")).resolved_city_name(), Some("北京"));
        assert_eq!(forecast("OK", Some("")).resolved_city_name(), None);
        assert_eq!(forecast("OK", None).resolved_city_name(), None);
    }
}
