//! Wall-clock access that works in both the browser and the server.
//!
//! `time`'s own clock is unavailable on `wasm32-unknown-unknown`, so the
//! browser asks `Date.now()` and everything else derives from Unix seconds.
//! Calendar days are UTC days.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

use time::{Date, OffsetDateTime};

/// Current Unix time in seconds.
#[allow(clippy::cast_possible_truncation)]
pub fn now_unix() -> i64 {
    #[cfg(feature = "hydrate")]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
    #[cfg(not(feature = "hydrate"))]
    {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Today's UTC calendar date.
pub fn today() -> Date {
    date_at(now_unix())
}

fn date_at(unix: i64) -> Date {
    OffsetDateTime::from_unix_timestamp(unix).map_or(OffsetDateTime::UNIX_EPOCH.date(), OffsetDateTime::date)
}
