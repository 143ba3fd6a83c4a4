use crate::constants::SECONDS_PER_DAY;

const SECONDS_PER_COMMON_YEAR: f64 = 365.0 * SECONDS_PER_DAY;
const SECONDS_PER_LEAP_YEAR: f64 = 366.0 * SECONDS_PER_DAY;

/// Calendar conversion where one year in four is a leap year.
pub fn years_to_seconds(years: f64) -> f64 {
    let leap_years = years / 4.0;
    (years - leap_years) * SECONDS_PER_COMMON_YEAR + leap_years * SECONDS_PER_LEAP_YEAR
}
