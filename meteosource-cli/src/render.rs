use meteosource_core::{Archive, Forecast, TimePoint, TimeSeriesCollection};

/// Timesteps printed per section before eliding the rest.
const ROWS: usize = 12;

pub fn forecast(forecast: &Forecast) {
    println!("{forecast}");
    println!(
        "Elevation: {} m, units: {}, timezone: {}",
        forecast.elevation(),
        forecast.units(),
        forecast.timezone()
    );

    if let Some(current) = forecast.current() {
        println!("\nNow: {}", describe(current));
    }

    for series in [forecast.minutely(), forecast.hourly(), forecast.daily()]
        .into_iter()
        .flatten()
    {
        println!();
        timesteps(series);
    }

    if let Some(alerts) = forecast.alerts() {
        println!("\n{alerts}");
        let active = alerts.active_now();
        if active.is_empty() {
            println!("  No alerts active right now.");
        }
        for alert in active {
            println!(
                "  {} (until {})",
                text(alert, "event").unwrap_or("Unnamed alert"),
                text(alert, "expires").unwrap_or("?")
            );
        }
    }
}

pub fn archive(archive: &Archive) {
    println!("{archive}");
    println!(
        "Elevation: {} m, units: {}, timezone: {}",
        archive.elevation(),
        archive.units(),
        archive.timezone()
    );

    if !archive.missing_days().is_empty() {
        let days: Vec<String> = archive.missing_days().iter().map(|d| d.to_string()).collect();
        println!("Missing days: {}", days.join(", "));
    }

    match archive.data() {
        Some(data) => {
            println!();
            timesteps(data);
        }
        None => println!("No archive data returned."),
    }
}

fn timesteps(series: &TimeSeriesCollection) {
    println!("{series}");
    for (date, point) in series.dates().zip(series.iter()).take(ROWS) {
        println!("  {date}  {}", describe(point));
    }
    if series.len() > ROWS {
        println!("  ... {} more", series.len() - ROWS);
    }
}

fn describe(point: &TimePoint) -> String {
    let mut parts = Vec::new();

    if let Some(temp) = point.get("temperature").and_then(|v| v.as_f64()) {
        parts.push(format!("{temp:.1}°"));
    }
    if let Some(feels) = point.get("feels_like").and_then(|v| v.as_f64()) {
        parts.push(format!("feels {feels:.1}°"));
    }
    if let Some(precip) = point.get("precipitation").and_then(|v| v.as_f64()) {
        parts.push(format!("precip {precip}"));
    }
    if let Some(summary) = text(point, "summary").or_else(|| text(point, "weather")) {
        parts.push(summary.to_string());
    }

    if parts.is_empty() {
        point.to_string()
    } else {
        parts.join(", ")
    }
}

fn text<'a>(point: &'a TimePoint, name: &str) -> Option<&'a str> {
    point.get(name).and_then(|v| v.as_str())
}
