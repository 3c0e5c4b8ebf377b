use std::str::FromStr;

use kiji_client::api::Time;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
    export function get_timezone() {
        return Intl.DateTimeFormat().resolvedOptions().timeZone;
    }
")]
extern "C" {
    fn get_timezone() -> String;
}

lazy_static::lazy_static! {
    static ref LOCAL_TZ: chrono_tz::Tz = {
        chrono_tz::Tz::from_str(&get_timezone())
            .expect("host js timezone is not in chrono-tz database")
    };
}

pub fn local_tz() -> chrono_tz::Tz {
    LOCAL_TZ.clone()
}

/// Human-readable age of a timestamp, for comment and notification lists.
/// Ages beyond a week read better as a date, rendered in the local timezone.
pub fn relative_time(t: Time) -> String {
    let age = chrono::Utc::now() - t;
    if age < chrono::Duration::minutes(1) {
        String::from("just now")
    } else if age < chrono::Duration::hours(1) {
        format!("{}m ago", age.num_minutes())
    } else if age < chrono::Duration::days(1) {
        format!("{}h ago", age.num_hours())
    } else if age < chrono::Duration::days(7) {
        format!("{}d ago", age.num_days())
    } else {
        t.with_timezone(&local_tz()).format("%Y-%m-%d").to_string()
    }
}
