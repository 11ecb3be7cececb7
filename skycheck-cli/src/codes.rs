/// Short description and icon for a WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherInfo {
    pub description: &'static str,
    pub icon: &'static str,
}

const fn info(description: &'static str, icon: &'static str) -> WeatherInfo {
    WeatherInfo { description, icon }
}

pub const UNKNOWN: WeatherInfo = info("Unknown", "❓");

/// Only the codes Open-Meteo commonly reports are mapped; anything else is [`UNKNOWN`].
pub fn describe(code: i32) -> WeatherInfo {
    match code {
        0 => info("Clear Sky", "☀️"),
        1 => info("Mainly Clear", "🌤️"),
        2 => info("Partly Cloudy", "⛅"),
        3 => info("Overcast", "☁️"),
        45 => info("Fog", "🌫️"),
        48 => info("Depositing Rime Fog", "🌫️"),
        51 => info("Light Drizzle", "🌦️"),
        53 => info("Moderate Drizzle", "🌦️"),
        55 => info("Dense Drizzle", "🌧️"),
        61 => info("Slight Rain", "🌦️"),
        63 => info("Moderate Rain", "🌧️"),
        65 => info("Heavy Rain", "⛈️"),
        71 => info("Slight Snow", "🌨️"),
        73 => info("Moderate Snow", "🌨️"),
        75 => info("Heavy Snow", "❄️"),
        95 => info("Thunderstorm", "⚡"),
        _ => UNKNOWN,
    }
}
