use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One geocoder match offered while the user is typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Open-Meteo ids are numeric, area-provider ids are strings; both are kept as text.
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Suggestion {
    /// "Name, Region, Country", region omitted when the provider has none.
    pub fn label(&self) -> String {
        match self.admin1.as_deref().filter(|a| !a.is_empty()) {
            Some(admin1) => format!("{}, {}, {}", self.name, admin1, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// The place currently driving forecast fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Suggestion> for ResolvedPlace {
    fn from(s: &Suggestion) -> Self {
        Self {
            name: s.name.clone(),
            country: s.country.clone(),
            latitude: s.latitude,
            longitude: s.longitude,
        }
    }
}

impl From<Suggestion> for ResolvedPlace {
    fn from(s: Suggestion) -> Self {
        Self {
            name: s.name,
            country: s.country,
            latitude: s.latitude,
            longitude: s.longitude,
        }
    }
}

/// Conditions at the time of the request, keyed by the provider's field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: f64,
    pub apparent_temperature: f64,
    /// 1 during daylight, 0 at night.
    #[serde(default)]
    pub is_day: u8,
    #[serde(default)]
    pub precipitation: f64,
    #[serde(default)]
    pub rain: f64,
    #[serde(default)]
    pub showers: f64,
    #[serde(default)]
    pub snowfall: f64,
    pub weather_code: i32,
    #[serde(default)]
    pub cloud_cover: f64,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: f64,
}

impl CurrentConditions {
    pub fn is_daytime(&self) -> bool {
        self.is_day != 0
    }
}

/// Parallel per-day arrays as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub time: Vec<NaiveDate>,
    #[serde(default)]
    pub weather_code: Vec<i32>,
    #[serde(rename = "temperature_2m_max", default)]
    pub temp_max: Vec<f64>,
    #[serde(rename = "temperature_2m_min", default)]
    pub temp_min: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayOutlook {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub temp_max: f64,
    pub temp_min: f64,
}

impl DailyForecast {
    /// Zips the daily arrays; stops at the shortest one.
    pub fn days(&self) -> impl Iterator<Item = DayOutlook> + '_ {
        self.time
            .iter()
            .zip(&self.weather_code)
            .zip(self.temp_max.iter().zip(&self.temp_min))
            .map(|((date, code), (max, min))| DayOutlook {
                date: *date,
                weather_code: *code,
                temp_max: *max,
                temp_min: *min,
            })
    }
}

/// Raw forecast body: `{current, current_units, daily}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub current: CurrentConditions,
    #[serde(default)]
    pub current_units: BTreeMap<String, String>,
    #[serde(default)]
    pub daily: DailyForecast,
}

/// Everything the display needs for one place. Replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub country: String,
    pub current: CurrentConditions,
    pub daily: DailyForecast,
    pub units: BTreeMap<String, String>,
}

impl WeatherSnapshot {
    pub fn new(place: &ResolvedPlace, payload: ForecastPayload) -> Self {
        Self {
            city_name: place.name.clone(),
            country: place.country.clone(),
            current: payload.current,
            daily: payload.daily,
            units: payload.current_units,
        }
    }

    /// Unit string for a provider field name such as `"temperature_2m"`; empty if unknown.
    pub fn unit(&self, field: &str) -> &str {
        self.units.get(field).map(String::as_str).unwrap_or("")
    }
}
