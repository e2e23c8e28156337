use crate::base::types::TemperatureUnit;

/// Convert a temperature into the other scale and format it with its unit letter.
pub fn convert_temperature(value: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{:.2}F", value * 9.0 / 5.0 + 32.0),
        TemperatureUnit::Fahrenheit => format!("{:.2}C", (value - 32.0) * 5.0 / 9.0),
    }
}
