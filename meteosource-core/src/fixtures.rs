//! Canned API payloads shared by unit tests.

use serde_json::{Value, json};

pub fn forecast() -> Value {
    json!({
        "lat": "51.50853N",
        "lon": "0.12574W",
        "elevation": 25,
        "timezone": "UTC",
        "units": "metric",
        "current": {
            "icon": "partly_sunny",
            "summary": "Partly sunny",
            "temperature": 22.8,
            "wind": {"speed": 2.0, "angle": 110, "dir": "ESE"}
        },
        "minutely": {
            "summary": "No precipitation within an hour.",
            "data": [
                {"date": "2021-09-08T10:47:00", "precipitation": 0.0},
                {"date": "2021-09-08T10:48:00", "precipitation": 0.0}
            ]
        },
        "hourly": {
            "data": [
                {
                    "date": "2021-09-08T10:00:00",
                    "temperature": 22.0,
                    "feels_like": 22.4,
                    "wind": {"speed": 1.9, "angle": 112, "dir": "ESE"}
                },
                {
                    "date": "2021-09-08T11:00:00",
                    "temperature": 22.9,
                    "feels_like": 23.2,
                    "wind": {"speed": 2.1, "angle": 106, "dir": "ESE"}
                },
                {
                    "date": "2021-09-08T12:00:00",
                    "temperature": 23.6,
                    "feels_like": 24.1,
                    "wind": {"speed": 2.4, "angle": 101, "dir": "E"}
                }
            ]
        },
        "daily": {
            "data": [
                {
                    "day": "2021-09-08",
                    "weather": "sunny",
                    "astro": {"sun": {"rise": "2021-09-08T05:29:00", "set": "2021-09-08T18:28:00"}}
                },
                {
                    "day": "2021-09-09",
                    "weather": "partly_sunny",
                    "astro": {"sun": {"rise": "2021-09-09T05:31:00", "set": "2021-09-09T18:26:00"}}
                }
            ]
        },
        "alerts": {
            "data": [
                {
                    "event": "Strong Winds",
                    "onset": "2022-03-08T12:00:00",
                    "expires": "2022-03-09T06:00:00",
                    "sender": "Met Office"
                },
                {
                    "event": "Heavy Rain",
                    "onset": "2022-03-08T15:00:00",
                    "expires": "2022-03-08T23:00:00",
                    "sender": "Met Office"
                },
                {
                    "event": "Minor Flooding",
                    "onset": "2022-03-08T20:00:00",
                    "expires": "2022-03-09T02:00:00",
                    "sender": "Environment Agency"
                },
                {
                    "event": "Moderate Thunderstorms",
                    "onset": "2022-03-09T03:00:00",
                    "expires": "2022-03-09T09:00:00",
                    "sender": "Met Office"
                }
            ]
        }
    })
}

/// One archive day of `hours` hourly records starting at midnight UTC.
pub fn archive_day(day: &str, hours: u32) -> Value {
    let data: Vec<Value> = (0..hours)
        .map(|hour| {
            json!({
                "date": format!("{day}T{hour:02}:00:00"),
                "temperature": 10.0 + f64::from(hour) / 2.0
            })
        })
        .collect();

    json!({
        "lat": "50.08804N",
        "lon": "14.42076E",
        "elevation": 202,
        "units": "metric",
        "data": data
    })
}
