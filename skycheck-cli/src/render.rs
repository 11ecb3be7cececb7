//! Plain-text rendering of search state for the terminal.

use std::fmt::Write as _;

use chrono::{Local, NaiveDate};
use skycheck_core::{SearchState, Suggestion, WeatherSnapshot, model::DayOutlook};

use crate::codes;

const TEMPERATURE: &str = "temperature_2m";
const HUMIDITY: &str = "relative_humidity_2m";
const WIND_SPEED: &str = "wind_speed_10m";

/// Whole degrees. Going through an integer keeps small negatives from printing as "-0".
pub fn degrees(value: f64) -> i64 {
    value.round() as i64
}

pub fn snapshot(weather: &WeatherSnapshot) -> String {
    snapshot_on(weather, Local::now().date_naive())
}

fn snapshot_on(weather: &WeatherSnapshot, today: NaiveDate) -> String {
    let current = &weather.current;
    let info = codes::describe(current.weather_code);
    let temp_unit = weather.unit(TEMPERATURE);

    let mut out = String::new();
    let _ = writeln!(out, "{}, {}", weather.city_name, weather.country);
    let _ = writeln!(out, "{}  {}", info.icon, info.description);
    let _ = writeln!(out, "{}{}", degrees(current.temperature), temp_unit);
    let _ = writeln!(
        out,
        "Wind        {} {}",
        current.wind_speed,
        weather.unit(WIND_SPEED)
    );
    let _ = writeln!(
        out,
        "Humidity    {}{}",
        current.humidity,
        weather.unit(HUMIDITY)
    );
    let _ = writeln!(
        out,
        "Feels like  {}{}",
        degrees(current.apparent_temperature),
        temp_unit
    );

    let days: Vec<DayOutlook> = weather.daily.days().collect();
    if !days.is_empty() {
        out.push('\n');
        for day in days {
            let _ = writeln!(out, "{}", outlook_line(&day, today));
        }
    }

    out
}

fn outlook_line(day: &DayOutlook, today: NaiveDate) -> String {
    let info = codes::describe(day.weather_code);
    let label = if day.date == today {
        String::from("Today")
    } else {
        day.date.format("%a %d %b").to_string()
    };
    format!(
        "{:<10}  {}  {:<20} {:>4}° / {}°",
        label,
        info.icon,
        info.description,
        degrees(day.temp_max),
        degrees(day.temp_min)
    )
}

pub fn suggestions(items: &[Suggestion]) -> String {
    items
        .iter()
        .map(|s| format!("{}  ({:.2}, {:.2})\n", s.label(), s.latitude, s.longitude))
        .collect()
}

/// Final state of a one-shot lookup: the snapshot, or the failure message.
pub fn outcome(state: &SearchState) -> String {
    match (state.error_message(), &state.snapshot) {
        (Some(message), _) => format!("{message}\n"),
        (None, Some(weather)) => snapshot(weather),
        (None, None) => String::from("Nothing to show.\n"),
    }
}
