//! Plain-text frames for the terminal.

use hourcast_core::{DashboardView, DistanceUnit};
use hourcast_core::ambient::Composition;

/// Clears the screen and homes the cursor.
pub const CLEAR: &str = "\x1b[2J\x1b[H";

const LABEL_WIDTH: usize = 14;
const VALUE_WIDTH: usize = 10;

pub fn welcome() -> String {
    "\n\n        Welcome to\n\n        H O U R C A S T\n\n".to_string()
}

fn row(out: &mut String, label: &str, value: &str, detail: &str) {
    out.push_str(&format!("{label:<LABEL_WIDTH$}{value:<VALUE_WIDTH$}{detail}\n"));
}

pub fn frame(view: &DashboardView, unit: DistanceUnit) -> String {
    let mut out = String::new();
    let face = &view.face;
    let weather = &view.weather;

    out.push_str(&format!("{}\n\n", view.greeting));
    out.push_str(&format!(
        "  {}:{} {}  {}\n",
        face.hour, face.minute, face.second, face.meridiem
    ));
    out.push_str(&format!("  {} · {}\n\n", face.weekday, face.date));

    row(
        &mut out,
        "Week",
        &format!("{:.0}%", view.week.percent),
        &format!(
            "Week {} · Day {} · {} weeks left",
            view.week.week,
            view.day_of_year,
            view.week.weeks_left()
        ),
    );
    row(
        &mut out,
        "Time left",
        &view.time_left.to_string(),
        &format!("{}% of day complete", view.day_progress),
    );

    let spring = if view.days_until_spring > 0 {
        format!("Spring in {} days", view.days_until_spring)
    } else {
        String::new()
    };
    row(&mut out, "Season", view.season.as_str(), &spring);

    row(
        &mut out,
        "Daylight",
        &weather.day_length,
        &format!("↑ {} · ↓ {}", weather.sunrise, weather.sunset),
    );
    row(
        &mut out,
        "Month",
        &format!("{}%", view.month_progress),
        &format!("{} days left", view.days_left_in_month),
    );
    row(
        &mut out,
        "Temp",
        &format!("{}°C", weather.temperature),
        &format!(
            "H: {}° · L: {}° · {}% humidity · feels {}°",
            weather.high, weather.low, weather.humidity, weather.feels_like
        ),
    );
    row(
        &mut out,
        "Weather",
        &weather.conditions,
        &format!(
            "{} · Wind {} m/s · Visibility {} {}",
            weather.description,
            weather.wind_speed,
            weather.visibility,
            unit.abbreviation()
        ),
    );

    out.push_str("\nHOURCAST\n");
    out
}

/// One-line summary of the decorative layers.
pub fn ambient(layers: &Composition<'_>) -> String {
    let mut parts = vec![format!("{} stars", layers.stars.len())];
    if let Some(rain) = layers.rain {
        parts.push(format!("{} raindrops", rain.len()));
    }
    if let Some(snow) = layers.snow {
        parts.push(format!("{} snowflakes", snow.len()));
    }
    if layers.fog_layers > 0 {
        parts.push(format!("{} fog layers", layers.fog_layers));
    }
    if let Some(clouds) = layers.clouds {
        parts.push(format!("{} clouds", clouds.len()));
    }
    if layers.lightning_flash {
        parts.push("LIGHTNING".to_string());
    }
    format!("\n{}\n", parts.join(" · "))
}
