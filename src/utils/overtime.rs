use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::settings::PayrollSettings;

/// Hours an officer worked on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub hours_worked: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct OvertimeResult {
    #[schema(example = 6.5)]
    pub total_overtime_hours: f64,
    #[schema(example = 3412.5)]
    pub overtime_pay: f64,
}

pub fn daily_overtime(hours_worked: f64, normal_hours: f64) -> f64 {
    (hours_worked - normal_hours).max(0.0)
}

/// Total overtime hours over a month of records.
///
/// Per-day values are added smallest first, so any ordering of `records`
/// produces the same bits.
pub fn monthly_overtime<'a, I>(records: I, normal_hours: f64) -> f64
where
    I: IntoIterator<Item = &'a DailyAttendance>,
{
    let mut per_day: Vec<f64> = records
        .into_iter()
        .map(|r| daily_overtime(r.hours_worked, normal_hours))
        .collect();
    per_day.sort_by(f64::total_cmp);
    per_day.into_iter().sum()
}

pub fn overtime_pay(overtime_hours: f64, hourly_rate: f64, multiplier: f64) -> f64 {
    overtime_hours * hourly_rate * multiplier
}

/// Hourly rate implied by a monthly salary under the institution's working
/// pattern. Zero when the pattern has no working hours.
pub fn hourly_rate(base_salary: f64, settings: &PayrollSettings) -> f64 {
    let monthly_hours = settings.working_days_per_month * settings.normal_hours_per_day;
    if monthly_hours > 0.0 {
        base_salary / monthly_hours
    } else {
        0.0
    }
}

pub fn compute<'a, I>(records: I, settings: &PayrollSettings, hourly_rate: f64) -> OvertimeResult
where
    I: IntoIterator<Item = &'a DailyAttendance>,
{
    let total_overtime_hours = monthly_overtime(records, settings.normal_hours_per_day);

    OvertimeResult {
        total_overtime_hours,
        overtime_pay: overtime_pay(total_overtime_hours, hourly_rate, settings.overtime_multiplier),
    }
}

/// `[first day of month, first day of next month)` for the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = date.with_day(1)?;
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)?
    };
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32, hours_worked: f64) -> DailyAttendance {
        DailyAttendance {
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            hours_worked,
        }
    }

    #[test]
    fn test_no_overtime_at_threshold() {
        assert_eq!(monthly_overtime(&[day(1, 8.0)], 8.0), 0.0);
    }

    #[test]
    fn test_overtime_above_threshold() {
        assert_eq!(monthly_overtime(&[day(1, 10.0)], 8.0), 2.0);
    }

    #[test]
    fn test_short_days_do_not_offset_long_days() {
        let records = [day(1, 4.0), day(2, 11.5), day(3, 9.0), day(4, 0.0)];
        assert_eq!(monthly_overtime(&records, 8.0), 4.5);
    }

    #[test]
    fn test_empty_month() {
        let records: Vec<DailyAttendance> = Vec::new();
        assert_eq!(monthly_overtime(&records, 8.0), 0.0);
    }

    #[test]
    fn test_negative_hours_count_as_zero() {
        assert_eq!(daily_overtime(-3.0, 8.0), 0.0);
    }

    #[test]
    fn test_overtime_pay() {
        assert_eq!(overtime_pay(2.0, 350.0, 1.5), 1050.0);
    }

    #[test]
    fn test_compute_uses_settings() {
        let settings = PayrollSettings {
            normal_hours_per_day: 8.0,
            overtime_multiplier: 2.0,
            working_days_per_month: 26.0,
        };
        let records = [day(2, 10.0), day(3, 9.0)];

        let result = compute(&records, &settings, 100.0);
        assert_eq!(result.total_overtime_hours, 3.0);
        assert_eq!(result.overtime_pay, 600.0);
    }

    #[test]
    fn test_hourly_rate_from_salary() {
        let settings = PayrollSettings::default();
        assert_eq!(hourly_rate(20_800.0, &settings), 100.0);

        let idle = PayrollSettings {
            working_days_per_month: 0.0,
            ..PayrollSettings::default()
        };
        assert_eq!(hourly_rate(20_800.0, &idle), 0.0);
    }

    #[test]
    fn test_month_bounds() {
        let mid = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        assert_eq!(
            month_bounds(mid),
            Some((
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
            ))
        );

        let december = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            month_bounds(december),
            Some((
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
            ))
        );
    }

    proptest! {
        #[test]
        fn property_overtime_ignores_order(
            hours in proptest::collection::vec(0.0f64..16.0, 0..31),
            normal in 0.0f64..12.0,
            seed in any::<u64>(),
        ) {
            let records: Vec<DailyAttendance> = hours
                .iter()
                .enumerate()
                .map(|(i, h)| day(i as u32 + 1, *h))
                .collect();

            let mut shuffled = records.clone();
            if !shuffled.is_empty() {
                let len = shuffled.len();
                shuffled.rotate_left((seed as usize) % len);
                shuffled.reverse();
            }

            prop_assert_eq!(
                monthly_overtime(&records, normal).to_bits(),
                monthly_overtime(&shuffled, normal).to_bits()
            );
        }

        #[test]
        fn property_overtime_is_never_negative(
            hours in proptest::collection::vec(-5.0f64..24.0, 0..31),
            normal in 0.0f64..12.0,
        ) {
            let records: Vec<DailyAttendance> = hours
                .iter()
                .enumerate()
                .map(|(i, h)| day(i as u32 + 1, *h))
                .collect();
            prop_assert!(monthly_overtime(&records, normal) >= 0.0);
        }
    }
}
