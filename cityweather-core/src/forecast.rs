use std::collections::HashMap;

use crate::model::ForecastSet;

/// Forecast slots of one calendar date, reduced for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: String,
    pub average_temperature_c: f64,
    pub description: String,
}

struct Bucket<'a> {
    date: &'a str,
    sum: f64,
    count: usize,
    description: &'a str,
}

/// Group forecast slots by date.
///
/// Days come out in the order they first appear in the input. The average is
/// rounded to one decimal with ties away from zero; the description is taken
/// from the first slot of each day.
pub fn group_by_day(forecast: &ForecastSet) -> Vec<DaySummary> {
    let mut buckets: Vec<Bucket<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in &forecast.entries {
        let date = date_key(&entry.timestamp);

        let slot = *index.entry(date).or_insert_with(|| {
            buckets.push(Bucket {
                date,
                sum: 0.0,
                count: 0,
                description: entry
                    .conditions
                    .first()
                    .map(|c| c.description.as_str())
                    .unwrap_or("Unknown"),
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.sum += entry.temperature_c;
        bucket.count += 1;
    }

    buckets
        .into_iter()
        .map(|b| DaySummary {
            date: b.date.to_string(),
            average_temperature_c: round_one_decimal(b.sum / b.count as f64),
            description: b.description.to_string(),
        })
        .collect()
}

fn date_key(timestamp: &str) -> &str {
    timestamp.split_once(' ').map_or(timestamp, |(date, _)| date)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastCondition, ForecastEntry};

    fn entry(ts: &str, temp: f64, description: &str) -> ForecastEntry {
        ForecastEntry {
            timestamp: ts.to_string(),
            temperature_c: temp,
            conditions: vec![ForecastCondition {
                description: description.to_string(),
            }],
        }
    }

    #[test]
    fn groups_by_date_in_first_seen_order() {
        let forecast = ForecastSet {
            entries: vec![
                entry("2024-01-01 03:00:00", 10.0, "light rain"),
                entry("2024-01-01 09:00:00", 14.0, "overcast clouds"),
                entry("2024-01-02 03:00:00", 5.0, "clear sky"),
            ],
        };

        let days = group_by_day(&forecast);

        assert_eq!(
            days,
            vec![
                DaySummary {
                    date: "2024-01-01".into(),
                    average_temperature_c: 12.0,
                    description: "light rain".into(),
                },
                DaySummary {
                    date: "2024-01-02".into(),
                    average_temperature_c: 5.0,
                    description: "clear sky".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_forecast_gives_no_days() {
        assert!(group_by_day(&ForecastSet::default()).is_empty());
    }

    #[test]
    fn bucket_order_follows_first_appearance_not_date_order() {
        let forecast = ForecastSet {
            entries: vec![
                entry("2024-01-02 00:00:00", 1.0, "a"),
                entry("2024-01-01 00:00:00", 2.0, "b"),
                entry("2024-01-02 03:00:00", 3.0, "c"),
            ],
        };

        let dates: Vec<_> = group_by_day(&forecast)
            .into_iter()
            .map(|d| d.date)
            .collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01"]);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let forecast = ForecastSet {
            entries: vec![
                entry("2024-03-01 00:00:00", 12.0, "x"),
                entry("2024-03-01 03:00:00", 12.5, "x"),
            ],
        };
        assert_eq!(group_by_day(&forecast)[0].average_temperature_c, 12.3);

        let single = ForecastSet {
            entries: vec![entry("2024-03-02 00:00:00", 7.04, "y")],
        };
        assert_eq!(group_by_day(&single)[0].average_temperature_c, 7.0);
    }

    #[test]
    fn negative_average_ties_round_away_from_zero() {
        let forecast = ForecastSet {
            entries: vec![
                entry("2024-01-15 00:00:00", -2.0, "snow"),
                entry("2024-01-15 03:00:00", -2.5, "snow"),
            ],
        };

        assert_eq!(group_by_day(&forecast)[0].average_temperature_c, -2.3);
    }

    #[test]
    fn timestamp_without_space_is_its_own_key() {
        let forecast = ForecastSet {
            entries: vec![entry("2024-05-05", 20.0, "sunny")],
        };
        assert_eq!(group_by_day(&forecast)[0].date, "2024-05-05");
    }

    #[test]
    fn missing_condition_uses_placeholder_description() {
        let forecast = ForecastSet {
            entries: vec![ForecastEntry {
                timestamp: "2024-06-01 12:00:00".into(),
                temperature_c: 18.0,
                conditions: vec![],
            }],
        };
        assert_eq!(group_by_day(&forecast)[0].description, "Unknown");
    }

    #[test]
    fn grouping_is_idempotent() {
        let forecast = ForecastSet {
            entries: vec![
                entry("2024-01-01 03:00:00", -1.5, "snow"),
                entry("2024-01-01 06:00:00", -2.5, "snow"),
                entry("2024-01-02 03:00:00", 0.0, "fog"),
            ],
        };

        assert_eq!(group_by_day(&forecast), group_by_day(&forecast));
    }
}
