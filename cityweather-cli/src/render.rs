use chrono::NaiveDate;
use cityweather_core::{ConditionKind, DaySummary, WeatherSnapshot};
use colored::{ColoredString, Colorize};
use std::fmt;

/// Output colors for the light or dark theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    dark: bool,
}

impl Palette {
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }

    fn heading(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_white().bold()
        } else {
            text.blue().bold()
        }
    }

    fn label(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_black()
        } else {
            text.black()
        }
    }

    fn value(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_cyan().bold()
        } else {
            text.bright_blue().bold()
        }
    }
}

/// Current conditions for one location.
pub struct Details<'a> {
    snapshot: &'a WeatherSnapshot,
    palette: Palette,
}

pub fn details(snapshot: &WeatherSnapshot, palette: Palette) -> Details<'_> {
    Details { snapshot, palette }
}

impl fmt::Display for Details<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { snapshot, palette } = self;
        let (kind, description) = match snapshot.primary_condition() {
            Some(c) => (ConditionKind::from_main(&c.main), c.description.as_str()),
            None => (ConditionKind::Clear, "Unknown"),
        };

        writeln!(
            f,
            "{} {}",
            kind.icon(),
            palette.heading(&snapshot.location_name)
        )?;
        writeln!(
            f,
            "  {} {}",
            palette.label("Temperature:"),
            palette.value(&format!("{}°C", snapshot.temperature_c))
        )?;
        writeln!(
            f,
            "  {} {}",
            palette.label("Humidity:"),
            palette.value(&format!("{}%", snapshot.humidity_pct))
        )?;
        writeln!(
            f,
            "  {} {}",
            palette.label("Condition:"),
            capitalize(description)
        )
    }
}

/// One line per forecast day under a heading.
pub struct Forecast<'a> {
    days: &'a [DaySummary],
    palette: Palette,
}

pub fn forecast(days: &[DaySummary], palette: Palette) -> Forecast<'_> {
    Forecast { days, palette }
}

impl fmt::Display for Forecast<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = format!("{}-Day Forecast", self.days.len());
        writeln!(f, "{}", self.palette.heading(&heading))?;

        for day in self.days {
            let average = format!("{:.1}°C", day.average_temperature_c);
            writeln!(
                f,
                "  {:<16} {} {}",
                display_date(&day.date),
                self.palette.value(&average),
                capitalize(&day.description)
            )?;
        }
        Ok(())
    }
}

/// Numbered search history, most recent first.
pub struct History<'a> {
    entries: &'a [String],
    palette: Palette,
}

pub fn history(entries: &[String], palette: Palette) -> History<'_> {
    History { entries, palette }
}

impl fmt::Display for History<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("No searches yet.\n");
        }

        writeln!(f, "{}", self.palette.heading("Search History"))?;
        for (i, city) in self.entries.iter().enumerate() {
            let number = format!("{:>2}.", i + 1);
            writeln!(f, "  {} {city}", self.palette.label(&number))?;
        }
        Ok(())
    }
}

pub fn theme(dark: bool) -> &'static str {
    if dark {
        "Dark mode on"
    } else {
        "Light mode on"
    }
}

/// "2024-01-01" -> "Mon 01 Jan 2024"; anything unparseable is shown as-is.
fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a %d %b %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
