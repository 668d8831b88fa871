//! Sunrise/sunset, from the sunrise equation
//! https://en.wikipedia.org/wiki/Sunrise_equation

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Julian date of the J2000 epoch (2000-01-01 12:00 UTC)
const J2000: f64 = 2_451_545.0;
/// Julian date of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Days from the Unix epoch to J2000, rounded down to a whole day
const UNIX_TO_J2000_DAYS: i64 = 10_957;
/// Earth's axial tilt, in degrees
const OBLIQUITY: f64 = 23.4397;
/// Sun altitude at rise/set, corrected for refraction and the sun's radius
const HORIZON: f64 = -0.833;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SunTimes {
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
}

impl SunTimes {
    pub fn day_length(&self) -> chrono::Duration {
        self.set - self.rise
    }
}

/// Calculate sunrise and sunset for a date at a location. Longitude is
/// positive east. Returns `None` when the sun doesn't rise or doesn't set
/// that day (polar night/day).
pub fn sun_times(date: NaiveDate, lat: f64, lon: f64) -> Option<SunTimes> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let n = ((date - epoch).num_days() - UNIX_TO_J2000_DAYS) as f64;

    // Mean solar time
    let j_star = n - lon / 360.0;
    let mean_anomaly = (357.5291 + 0.98560028 * j_star).rem_euclid(360.0);
    let m = mean_anomaly.to_radians();
    let center = 1.9148 * m.sin() + 0.02 * (2.0 * m).sin()
        + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude =
        (mean_anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);
    let lambda = ecliptic_longitude.to_radians();
    let transit =
        J2000 + j_star + 0.0053 * m.sin() - 0.0069 * (2.0 * lambda).sin();

    let sin_declination = lambda.sin() * OBLIQUITY.to_radians().sin();
    let declination = sin_declination.asin();
    let phi = lat.to_radians();
    let cos_hour_angle = (HORIZON.to_radians().sin()
        - phi.sin() * sin_declination)
        / (phi.cos() * declination.cos());
    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        return None;
    }
    let hour_angle = cos_hour_angle.acos().to_degrees();

    Some(SunTimes {
        rise: julian_to_utc(transit - hour_angle / 360.0)?,
        set: julian_to_utc(transit + hour_angle / 360.0)?,
    })
}

fn julian_to_utc(julian: f64) -> Option<DateTime<Utc>> {
    let seconds = ((julian - UNIX_EPOCH_JD) * 86_400.0).round() as i64;
    Utc.timestamp_opt(seconds, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn hours(times: &SunTimes) -> f64 {
        times.day_length().num_seconds() as f64 / 3600.0
    }

    #[test]
    fn test_equinox_at_equator() {
        let times = sun_times(date("2024-03-20"), 0.0, 0.0).unwrap();
        let length = hours(&times);
        assert!((11.9..12.3).contains(&length), "{length}");
        // Solar noon at the prime meridian is close to 12:00 UTC
        let noon = times.rise + times.day_length() / 2;
        assert_eq!(noon.date_naive(), date("2024-03-20"));
        assert!((11..=12).contains(&chrono::Timelike::hour(&noon)));
    }

    #[test]
    fn test_summer_in_boston() {
        let times = sun_times(date("2024-06-20"), 42.36, -71.06).unwrap();
        let length = hours(&times);
        assert!((15.0..15.5).contains(&length), "{length}");
        // Sunrise is around 09:07 UTC
        assert_eq!(chrono::Timelike::hour(&times.rise), 9);
    }

    #[test]
    fn test_polar_night() {
        assert_eq!(sun_times(date("2024-12-21"), 80.0, 0.0), None);
    }
}
