//! The weather store: sole owner of application state.
//!
//! State is restored field by field from a [`KeyValueStore`] when the store is
//! opened, and every mutation writes the changed field back before returning.
//! A failed write is reported to the caller but never rolls back memory.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::StorageError,
    model::{CityWeather, ForecastSet, WeatherSnapshot},
    storage::KeyValueStore,
};

pub const HISTORY_LIMIT: usize = 10;

pub const CURRENT_WEATHER_KEY: &str = "weatherData";
pub const FORECAST_KEY: &str = "forecastData";
pub const HISTORY_KEY: &str = "history";
pub const DARK_MODE_KEY: &str = "darkMode";
/// Sequence number of the newest lookup issued against this storage.
pub const LOOKUP_SEQ_KEY: &str = "lookupSeq";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub current_weather: Option<WeatherSnapshot>,
    pub forecast: Option<ForecastSet>,
    /// Most recent first, no duplicates, at most [`HISTORY_LIMIT`] entries.
    pub history: Vec<String>,
    pub dark_mode: bool,
}

/// Handle for one in-flight city lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    seq: u64,
    city: String,
}

impl LookupTicket {
    pub fn city(&self) -> &str {
        &self.city
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied,
    /// A newer lookup was issued after this one; its result was discarded.
    Superseded,
}

#[derive(Debug)]
pub struct WeatherStore<S> {
    storage: S,
    state: AppState,
    last_issued: u64,
}

impl<S: KeyValueStore> WeatherStore<S> {
    /// Restore state from `storage`. Missing or unreadable fields take their
    /// defaults independently of each other.
    pub fn open(storage: S) -> Self {
        let state = AppState {
            current_weather: load_field(&storage, CURRENT_WEATHER_KEY),
            forecast: load_field(&storage, FORECAST_KEY),
            history: load_history(&storage).unwrap_or_default(),
            dark_mode: load_field(&storage, DARK_MODE_KEY).unwrap_or_default(),
        };

        Self {
            storage,
            state,
            last_issued: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn current_weather(&self) -> Option<&WeatherSnapshot> {
        self.state.current_weather.as_ref()
    }

    pub fn forecast(&self) -> Option<&ForecastSet> {
        self.state.forecast.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.state.history
    }

    pub fn dark_mode(&self) -> bool {
        self.state.dark_mode
    }

    pub fn set_current_weather(&mut self, snapshot: WeatherSnapshot) -> Result<(), StorageError> {
        self.state.current_weather = Some(snapshot);
        persist(
            &mut self.storage,
            CURRENT_WEATHER_KEY,
            &self.state.current_weather,
        )
    }

    pub fn set_forecast(&mut self, forecast: ForecastSet) -> Result<(), StorageError> {
        self.state.forecast = Some(forecast);
        persist(&mut self.storage, FORECAST_KEY, &self.state.forecast)
    }

    /// Move `city` to the front of the history, dropping any earlier copy and
    /// anything past [`HISTORY_LIMIT`]. The name is stored exactly as given.
    pub fn add_to_history(&mut self, city: &str) -> Result<(), StorageError> {
        let history = &mut self.state.history;
        history.retain(|entry| entry != city);
        history.insert(0, city.to_string());
        history.truncate(HISTORY_LIMIT);

        persist(&mut self.storage, HISTORY_KEY, &self.state.history)
    }

    pub fn toggle_dark_mode(&mut self) -> Result<(), StorageError> {
        self.state.dark_mode = !self.state.dark_mode;
        persist(&mut self.storage, DARK_MODE_KEY, &self.state.dark_mode)
    }

    /// Register a new lookup for `city`. Any ticket issued earlier, by this
    /// store or by another store sharing the same storage, becomes stale.
    pub fn begin_lookup(&mut self, city: &str) -> LookupTicket {
        let seq = self.latest_issued() + 1;
        self.last_issued = seq;

        // Without the shared counter, ordering only holds within this store.
        if let Err(err) = persist(&mut self.storage, LOOKUP_SEQ_KEY, &seq) {
            tracing::debug!(error = %err, "Lookup sequence not shared");
        }

        LookupTicket {
            seq,
            city: city.to_string(),
        }
    }

    /// Apply the result of a lookup unless a newer one has been issued since.
    ///
    /// The history is re-read from storage first, so entries added by other
    /// sessions since this store was opened are kept. All three fields are
    /// updated even if a write fails along the way; the first write error is
    /// returned.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        weather: CityWeather,
    ) -> Result<LookupOutcome, StorageError> {
        if ticket.seq < self.latest_issued() {
            tracing::debug!(city = %ticket.city, "Discarding superseded lookup");
            return Ok(LookupOutcome::Superseded);
        }

        if let Some(history) = load_history(&self.storage) {
            self.state.history = history;
        }

        let results = [
            self.set_current_weather(weather.current),
            self.set_forecast(weather.forecast),
            self.add_to_history(&ticket.city),
        ];

        results
            .into_iter()
            .find(Result::is_err)
            .unwrap_or(Ok(()))
            .map(|()| LookupOutcome::Applied)
    }

    fn latest_issued(&self) -> u64 {
        let stored: u64 = load_field(&self.storage, LOOKUP_SEQ_KEY).unwrap_or_default();
        self.last_issued.max(stored)
    }
}

fn load_field<S: KeyValueStore, T: DeserializeOwned>(storage: &S, key: &str) -> Option<T> {
    let value = storage.load(key)?;

    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(key, error = %err, "Stored value has unexpected shape, using default");
            None
        }
    }
}

/// Load the history, dropping repeats and anything past [`HISTORY_LIMIT`].
fn load_history<S: KeyValueStore>(storage: &S) -> Option<Vec<String>> {
    let stored: Vec<String> = load_field(storage, HISTORY_KEY)?;

    let mut history: Vec<String> = Vec::with_capacity(HISTORY_LIMIT);
    for city in stored {
        if history.len() == HISTORY_LIMIT {
            break;
        }
        if !history.contains(&city) {
            history.push(city);
        }
    }

    Some(history)
}

fn persist<S: KeyValueStore, T: Serialize>(
    storage: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_value(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;

    storage.store(key, &json).inspect_err(|err| {
        tracing::warn!(key, error = %err, "Failed to persist store field");
    })
}
