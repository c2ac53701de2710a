//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - The weather store, which owns application state and persists it
//! - Durable key-value storage backends
//! - Per-day forecast grouping
//! - The OpenWeather client and configuration handling
//!
//! It is used by `cityweather-cli`, but holds no terminal or rendering code.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{StorageError, WeatherError};
pub use forecast::{DaySummary, group_by_day};
pub use model::{
    CityWeather, Condition, ConditionKind, ForecastCondition, ForecastEntry, ForecastSet,
    WeatherSnapshot,
};
pub use provider::{WeatherProvider, fetch_city};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::{AppState, LookupOutcome, LookupTicket, WeatherStore};
