use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::{
    Config,
    error::WeatherError,
    model::{CityWeather, ForecastSet, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// The two remote calls made for every city lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "forecast",
        }
    }

    /// Path segment under the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    async fn forecast(&self, city: &str) -> Result<ForecastSet, WeatherError>;
}

/// Fetch current conditions and forecast for `city` concurrently.
///
/// Fails as a whole if either request fails.
pub async fn fetch_city(
    provider: &dyn WeatherProvider,
    city: &str,
) -> Result<CityWeather, WeatherError> {
    tracing::debug!(city, "Fetching current weather and forecast");

    let (current, forecast) = tokio::try_join!(provider.current(city), provider.forecast(city))?;

    Ok(CityWeather { current, forecast })
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key.to_owned(), base_url)?,
        None => OpenWeatherProvider::new(api_key.to_owned())?,
    };

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, ForecastCondition, ForecastEntry};
    use reqwest::StatusCode;

    #[derive(Debug)]
    struct FakeProvider {
        fail_forecast: bool,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
            Ok(WeatherSnapshot {
                location_name: city.to_string(),
                temperature_c: 21.5,
                humidity_pct: 40,
                conditions: vec![Condition {
                    main: "Clear".into(),
                    description: "clear sky".into(),
                }],
            })
        }

        async fn forecast(&self, _city: &str) -> Result<ForecastSet, WeatherError> {
            if self.fail_forecast {
                return Err(WeatherError::Api {
                    endpoint: Endpoint::Forecast,
                    status: StatusCode::NOT_FOUND,
                    body: "city not found".into(),
                });
            }

            Ok(ForecastSet {
                entries: vec![ForecastEntry {
                    timestamp: "2024-01-01 12:00:00".into(),
                    temperature_c: 20.0,
                    conditions: vec![ForecastCondition {
                        description: "clear sky".into(),
                    }],
                }],
            })
        }
    }

    #[tokio::test]
    async fn fetch_city_combines_both_results() {
        let provider = FakeProvider {
            fail_forecast: false,
        };

        let weather = fetch_city(&provider, "Lisbon")
            .await
            .expect("lookup should succeed");

        assert_eq!(weather.current.location_name, "Lisbon");
        assert_eq!(weather.forecast.entries.len(), 1);
    }

    #[tokio::test]
    async fn fetch_city_fails_when_either_request_fails() {
        let provider = FakeProvider {
            fail_forecast: true,
        };

        let err = fetch_city(&provider, "Atlantis").await.unwrap_err();

        assert!(matches!(
            err,
            WeatherError::Api {
                endpoint: Endpoint::Forecast,
                ..
            }
        ));
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Current.path(), "weather");
        assert_eq!(Endpoint::Forecast.path(), "forecast");
        assert_eq!(Endpoint::Current.to_string(), "current weather");
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
