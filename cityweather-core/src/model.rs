use serde::{Deserialize, Serialize};

/// One weather condition as reported for a current observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
}

/// Point-in-time observation for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub conditions: Vec<Condition>,
}

impl WeatherSnapshot {
    /// The condition the API lists first, which is the one to display.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCondition {
    pub description: String,
}

/// One forecast slot. `timestamp` has the form `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: String,
    pub temperature_c: f64,
    pub conditions: Vec<ForecastCondition>,
}

/// Forecast slots in the order the API delivered them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSet {
    pub entries: Vec<ForecastEntry>,
}

/// Result of a successful lookup for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityWeather {
    pub current: WeatherSnapshot,
    pub forecast: ForecastSet,
}

/// Coarse condition category, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Rain,
    Cloudy,
    Clear,
    Snow,
}

impl ConditionKind {
    /// Classify an OpenWeather `main` label such as "Rain" or "Clouds".
    /// Unknown labels fall back to `Clear`.
    pub fn from_main(main: &str) -> Self {
        let main = main.to_lowercase();
        if main.contains("rain") || main.contains("drizzle") {
            Self::Rain
        } else if main.contains("cloud") {
            Self::Cloudy
        } else if main.contains("clear") {
            Self::Clear
        } else if main.contains("snow") {
            Self::Snow
        } else {
            Self::Clear
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Rain => "🌧",
            Self::Cloudy => "☁",
            Self::Clear => "☀",
            Self::Snow => "❄",
        }
    }
}
