//! Weather tool backed by the Open-Meteo geocoding and forecast APIs.
//!
//! Supports two actions: `current` (conditions right now) and `forecast`
//! (daily outlook up to 16 days). The city is geocoded first; an unknown
//! city is an execution error the reasoning step can relay to the user.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use parley_core::tools::Tool;
use parley_types::tool::{ToolError, ToolSpec};

const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Variables requested for `current` weather.
const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,weather_code,wind_speed_10m";

/// Variables requested per day for `forecast`.
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_probability_max";

const MAX_FORECAST_DAYS: u8 = 16;
const DEFAULT_FORECAST_DAYS: u8 = 7;

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
    #[serde(default = "default_action")]
    action: String,
    #[serde(default)]
    days: Option<u8>,
}

fn default_action() -> String {
    "current".to_string()
}

impl WeatherArgs {
    /// Forecast horizon, clamped to the API's supported range.
    fn forecast_days(&self) -> u8 {
        self.days.unwrap_or(DEFAULT_FORECAST_DAYS).clamp(1, MAX_FORECAST_DAYS)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

/// Current weather and forecasts for a city.
pub struct WeatherTool {
    client: reqwest::Client,
    spec: ToolSpec,
    geocode_url: String,
    forecast_url: String,
}

impl WeatherTool {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| ToolError::Execution(format!("client construction: {e}")))?;

        Ok(Self {
            client,
            spec: ToolSpec {
                name: "weather".to_string(),
                description:
                    "Current weather conditions or a daily forecast for a city.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "city": {
                            "type": "string",
                            "description": "City name, e.g. 'Paris'"
                        },
                        "action": {
                            "type": "string",
                            "enum": ["current", "forecast"],
                            "description": "What to fetch (default: current)"
                        },
                        "days": {
                            "type": "integer",
                            "description": "Forecast horizon in days (1-16, default 7)"
                        }
                    },
                    "required": ["city"]
                }),
            },
            geocode_url: GEOCODE_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
        })
    }

    /// Override upstream URLs (tests and proxies).
    #[allow(dead_code)]
    pub fn with_urls(mut self, geocode_url: String, forecast_url: String) -> Self {
        self.geocode_url = geocode_url;
        self.forecast_url = forecast_url;
        self
    }

    async fn geocode(&self, city: &str) -> Result<GeocodeResult, ToolError> {
        let response = self
            .client
            .get(&self.geocode_url)
            .query(&[("name", city), ("count", "1")])
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("geocoding: {e}")))?
            .error_for_status()
            .map_err(|e| ToolError::Upstream(format!("geocoding: {e}")))?;

        let geocoded: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("geocoding body: {e}")))?;

        geocoded
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::Execution(format!("no match for city '{city}'")))
    }

    async fn fetch_forecast(&self, query: &[(&str, String)]) -> Result<Value, ToolError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(query)
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("forecast: {e}")))?
            .error_for_status()
            .map_err(|e| ToolError::Upstream(format!("forecast: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("forecast body: {e}")))
    }
}

impl Tool for WeatherTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: WeatherArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        if !matches!(args.action.as_str(), "current" | "forecast") {
            return Err(ToolError::InvalidArguments(format!(
                "unknown action '{}'; supported: current, forecast",
                args.action
            )));
        }

        let place = self.geocode(&args.city).await?;
        debug!(
            city = %place.name,
            latitude = place.latitude,
            longitude = place.longitude,
            action = %args.action,
            "Resolved city"
        );

        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let mut query = vec![
            ("latitude", latitude),
            ("longitude", longitude),
        ];
        match args.action.as_str() {
            "current" => query.push(("current", CURRENT_FIELDS.to_string())),
            _ => {
                query.push(("daily", DAILY_FIELDS.to_string()));
                query.push(("forecast_days", args.forecast_days().to_string()));
            }
        }

        let data = self.fetch_forecast(&query).await?;

        Ok(json!({
            "city": place.name,
            "country": place.country,
            "action": args.action,
            "data": data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_declares_city_required() {
        let tool = WeatherTool::new().unwrap();
        let required = tool.spec().input_schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "city");
    }

    #[test]
    fn test_args_default_action_is_current() {
        let args: WeatherArgs = serde_json::from_value(json!({"city": "Paris"})).unwrap();
        assert_eq!(args.action, "current");
        assert_eq!(args.forecast_days(), DEFAULT_FORECAST_DAYS);
    }

    #[test]
    fn test_forecast_days_clamped() {
        let args: WeatherArgs =
            serde_json::from_value(json!({"city": "Paris", "days": 0})).unwrap();
        assert_eq!(args.forecast_days(), 1);

        let args: WeatherArgs =
            serde_json::from_value(json!({"city": "Paris", "days": 90})).unwrap();
        assert_eq!(args.forecast_days(), MAX_FORECAST_DAYS);
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let tool = WeatherTool::new().unwrap();
        let err = tool
            .invoke(json!({"city": "Paris", "action": "hourly_by_minute"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("hourly_by_minute")));
    }

    #[tokio::test]
    async fn test_missing_city_rejected() {
        let tool = WeatherTool::new().unwrap();
        let err = tool.invoke(json!({"action": "current"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
