//! Holiday calendars fed to the forecaster.

use chrono::{Duration, NaiveDate};

/// Fixed-date Brazilian national holidays as `(month, day)`.
const BR_FIXED: [(u32, u32); 8] = [
    (1, 1),   // Confraternização Universal
    (4, 21),  // Tiradentes
    (5, 1),   // Dia do Trabalho
    (9, 7),   // Independência
    (10, 12), // Nossa Senhora Aparecida
    (11, 2),  // Finados
    (11, 15), // Proclamação da República
    (12, 25), // Natal
];

/// Dia Nacional de Zumbi e da Consciência Negra, national from 2024 on.
const CONSCIENCIA_NEGRA: (u32, u32) = (11, 20);
const CONSCIENCIA_NEGRA_FROM: i32 = 2024;

/// Easter Sunday (Gregorian calendar, anonymous computus).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// National holidays for `first_year..=last_year`: the fixed dates, Good
/// Friday, and 11-20 from 2024.
pub fn br_national_holidays(first_year: i32, last_year: i32) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for year in first_year..=last_year {
        for (month, day) in BR_FIXED {
            if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
                out.push(d);
            }
        }
        if year >= CONSCIENCIA_NEGRA_FROM {
            let (month, day) = CONSCIENCIA_NEGRA;
            if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
                out.push(d);
            }
        }
        if let Some(easter) = easter_sunday(year) {
            out.push(easter - Duration::days(2));
        }
    }
    out.sort();
    out
}

/// Optional points (ponto facultativo): Carnival Monday and Tuesday and
/// Corpus Christi.
pub fn br_optional_holidays(first_year: i32, last_year: i32) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for year in first_year..=last_year {
        if let Some(easter) = easter_sunday(year) {
            out.push(easter - Duration::days(48));
            out.push(easter - Duration::days(47));
            out.push(easter + Duration::days(60));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2019), Some(ymd(2019, 4, 21)));
        assert_eq!(easter_sunday(2024), Some(ymd(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(ymd(2025, 4, 20)));
        assert_eq!(easter_sunday(2038), Some(ymd(2038, 4, 25)));
    }

    #[test]
    fn two_years_of_national_holidays() {
        let h = br_national_holidays(2023, 2024);
        // 8 fixed + Good Friday per year, plus 11-20 in 2024 only.
        assert_eq!(h.len(), 19);
        assert!(h.contains(&ymd(2024, 9, 7)));
        assert!(h.contains(&ymd(2023, 4, 7)));
        assert!(h.contains(&ymd(2024, 3, 29)));
        assert!(h.contains(&ymd(2024, 11, 20)));
        assert!(!h.contains(&ymd(2023, 11, 20)));
        assert!(h.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn optional_holidays_follow_easter() {
        let h = br_optional_holidays(2024, 2024);
        assert_eq!(h, vec![ymd(2024, 2, 12), ymd(2024, 2, 13), ymd(2024, 5, 30)]);
    }
}
