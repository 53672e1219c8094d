//! Current-weather summary for the portal header, backed by Open-Meteo.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::WeatherConfig;

pub const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
pub const FAILURE_TEXT: &str = "天気情報の取得に失敗";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl Default for WeatherLocation {
    fn default() -> Self {
        Self {
            latitude: 34.69,
            longitude: 135.50,
            label: "大阪".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherIcon {
    Sun,
    CloudSun,
    Cloud,
    Smog,
    CloudRain,
    CloudShowersHeavy,
    Bolt,
    Unknown,
}

impl WeatherIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            WeatherIcon::Sun => "☀",
            WeatherIcon::CloudSun => "⛅",
            WeatherIcon::Cloud => "☁",
            WeatherIcon::Smog => "🌫",
            WeatherIcon::CloudRain => "🌦",
            WeatherIcon::CloudShowersHeavy => "🌧",
            WeatherIcon::Bolt => "⛈",
            WeatherIcon::Unknown => "?",
        }
    }
}

/// Accent used when rendering the icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherTone {
    Yellow,
    LightGray,
    Gray,
    LightBlue,
    Blue,
    DeepBlue,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeatherCondition {
    pub icon: WeatherIcon,
    pub tone: WeatherTone,
    pub text: &'static str,
}

const fn condition(icon: WeatherIcon, tone: WeatherTone, text: &'static str) -> WeatherCondition {
    WeatherCondition { icon, tone, text }
}

/// Map an Open-Meteo weather code to an icon and a short label.
pub fn describe(code: u16) -> WeatherCondition {
    use WeatherIcon as I;
    use WeatherTone as T;

    match code {
        0 => condition(I::Sun, T::Yellow, "快晴"),
        1 => condition(I::CloudSun, T::Yellow, "晴れ"),
        2 => condition(I::Cloud, T::LightGray, "一部曇り"),
        3 => condition(I::Cloud, T::Gray, "曇り"),
        45 => condition(I::Smog, T::LightGray, "霧"),
        48 => condition(I::Smog, T::LightGray, "霧氷"),
        51 | 53 | 55 => condition(I::CloudRain, T::LightBlue, "霧雨"),
        61 | 63 => condition(I::CloudShowersHeavy, T::Blue, "雨"),
        65 => condition(I::CloudShowersHeavy, T::DeepBlue, "強い雨"),
        80 | 81 => condition(I::CloudShowersHeavy, T::Blue, "にわか雨"),
        82 => condition(I::CloudShowersHeavy, T::DeepBlue, "激しいにわか雨"),
        95 => condition(I::Bolt, T::Yellow, "雷雨"),
        _ => condition(I::Unknown, T::Neutral, "不明"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSummary {
    pub location: String,
    pub condition: WeatherCondition,
    pub temperature: f64,
}

impl fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}の天気: {}, {}°C",
            self.location, self.condition.text, self.temperature
        )
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid weather endpoint {endpoint}: {source}")]
    Endpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("Weather request failed: {0}")]
    Request(#[from] Box<ureq::Error>),
    #[error("Weather response could not be read: {0}")]
    Decode(#[from] std::io::Error),
    #[error("Weather response is not a forecast: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    weathercode: u16,
}

/// Build the current-weather request URL for `location`.
pub fn forecast_url(endpoint: &str, location: &WeatherLocation) -> Result<Url, WeatherError> {
    Url::parse_with_params(
        endpoint,
        &[
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current_weather", "true".to_string()),
        ],
    )
    .map_err(|source| WeatherError::Endpoint {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Decode an Open-Meteo forecast body into a summary.
pub fn parse_forecast(
    body: &str,
    location: &WeatherLocation,
) -> Result<WeatherSummary, WeatherError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    Ok(summarize(response, location))
}

fn summarize(response: ForecastResponse, location: &WeatherLocation) -> WeatherSummary {
    WeatherSummary {
        location: location.label.clone(),
        condition: describe(response.current_weather.weathercode),
        temperature: response.current_weather.temperature,
    }
}

fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build()
    })
}

/// Fetch the current weather. Blocking; run it off the UI thread.
pub fn fetch_current_weather(config: &WeatherConfig) -> Result<WeatherSummary, WeatherError> {
    let location = config.location();
    let url = forecast_url(&config.endpoint, &location)?;
    tracing::debug!(%url, "fetching weather");

    let response = agent().request_url("GET", &url).call().map_err(Box::new)?;
    let body = response.into_string()?;
    let summary = parse_forecast(&body, &location)?;
    tracing::info!("{summary}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_labels() {
        assert_eq!(describe(0).text, "快晴");
        assert_eq!(describe(0).icon, WeatherIcon::Sun);
        assert_eq!(describe(53).text, "霧雨");
        assert_eq!(describe(65).tone, WeatherTone::DeepBlue);
        assert_eq!(describe(95).icon, WeatherIcon::Bolt);
    }

    #[test]
    fn unknown_codes_fall_back() {
        for code in [4, 56, 71, 96, 99, u16::MAX] {
            let condition = describe(code);
            assert_eq!(condition.text, "不明");
            assert_eq!(condition.icon, WeatherIcon::Unknown);
        }
    }

    #[test]
    fn url_carries_location() {
        let url = forecast_url(DEFAULT_ENDPOINT, &WeatherLocation::default()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.open-meteo.com/v1/forecast?latitude=34.69&longitude=135.5&current_weather=true"
        );
    }

    #[test]
    fn bad_endpoint_is_an_error() {
        let err = forecast_url("not a url", &WeatherLocation::default()).unwrap_err();
        assert!(matches!(err, WeatherError::Endpoint { .. }));
    }

    #[test]
    fn summary_formats_like_the_header() {
        let body = r#"{
            "latitude": 34.7,
            "longitude": 135.5,
            "current_weather": { "temperature": 27.4, "windspeed": 3.1, "weathercode": 1 }
        }"#;
        let summary = parse_forecast(body, &WeatherLocation::default()).unwrap();
        assert_eq!(summary.to_string(), "大阪の天気: 晴れ, 27.4°C");

        let body = r#"{ "current_weather": { "temperature": 25.0, "weathercode": 3 } }"#;
        let summary = parse_forecast(body, &WeatherLocation::default()).unwrap();
        assert_eq!(summary.to_string(), "大阪の天気: 曇り, 25°C");
    }

    #[test]
    fn missing_current_weather_is_a_json_error() {
        let err = parse_forecast("{}", &WeatherLocation::default()).unwrap_err();
        assert!(matches!(err, WeatherError::Json(_)));
        assert!(err.to_string().contains("current_weather"));
    }
}
