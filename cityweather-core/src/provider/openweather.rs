use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::WeatherError,
    model::{Condition, ForecastCondition, ForecastEntry, ForecastSet, WeatherSnapshot},
};

use super::{Endpoint, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const REQUEST_TIMEOUT_SECS: u64 = 10;
const FORECAST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(WeatherError::Client)?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        city: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        tracing::debug!(%endpoint, city, "Requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Api {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| WeatherError::InvalidResponse {
            endpoint,
            reason: format!("malformed JSON: {err}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwForecastWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn invalid(endpoint: Endpoint, reason: impl Into<String>) -> WeatherError {
    WeatherError::InvalidResponse {
        endpoint,
        reason: reason.into(),
    }
}

impl TryFrom<OwCurrentResponse> for WeatherSnapshot {
    type Error = WeatherError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        if parsed.weather.is_empty() {
            return Err(invalid(Endpoint::Current, "no weather conditions"));
        }
        if !parsed.main.temp.is_finite() {
            return Err(invalid(Endpoint::Current, "temperature is not a finite number"));
        }

        Ok(WeatherSnapshot {
            location_name: parsed.name,
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            conditions: parsed
                .weather
                .into_iter()
                .map(|w| Condition {
                    main: w.main,
                    description: w.description,
                })
                .collect(),
        })
    }
}

impl TryFrom<OwForecastResponse> for ForecastSet {
    type Error = WeatherError;

    fn try_from(parsed: OwForecastResponse) -> Result<Self, Self::Error> {
        let entries = parsed
            .list
            .into_iter()
            .map(|entry| {
                NaiveDateTime::parse_from_str(&entry.dt_txt, FORECAST_TIMESTAMP_FORMAT).map_err(
                    |_| invalid(Endpoint::Forecast, format!("bad timestamp '{}'", entry.dt_txt)),
                )?;

                if entry.weather.is_empty() {
                    return Err(invalid(
                        Endpoint::Forecast,
                        format!("no weather conditions at {}", entry.dt_txt),
                    ));
                }
                if !entry.main.temp.is_finite() {
                    return Err(invalid(
                        Endpoint::Forecast,
                        format!("temperature at {} is not a finite number", entry.dt_txt),
                    ));
                }

                Ok(ForecastEntry {
                    timestamp: entry.dt_txt,
                    temperature_c: entry.main.temp,
                    conditions: entry
                        .weather
                        .into_iter()
                        .map(|w| ForecastCondition {
                            description: w.description,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForecastSet { entries })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let parsed: OwCurrentResponse = self.fetch(Endpoint::Current, city).await?;
        parsed.try_into()
    }

    async fn forecast(&self, city: &str) -> Result<ForecastSet, WeatherError> {
        let parsed: OwForecastResponse = self.fetch(Endpoint::Forecast, city).await?;
        parsed.try_into()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
