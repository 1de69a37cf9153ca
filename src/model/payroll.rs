use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payroll {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub month: NaiveDate,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub bonus: f64,
    #[schema(example = 2000.0)]
    pub deductions: f64,
    #[schema(example = 240.38)]
    pub hourly_rate: f64,
    #[schema(example = 6.5)]
    pub overtime_hours: f64,
    #[schema(example = 2343.75)]
    pub overtime_pay: f64,
    #[schema(example = 55343.75)]
    pub net_salary: f64,
}

pub fn net_salary(base_salary: f64, bonus: f64, overtime_pay: f64, deductions: f64) -> f64 {
    base_salary + bonus + overtime_pay - deductions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_salary_includes_overtime() {
        assert_eq!(net_salary(50_000.0, 5_000.0, 1_050.0, 2_000.0), 54_050.0);
    }

    #[test]
    fn test_net_salary_without_overtime() {
        assert_eq!(net_salary(50_000.0, 0.0, 0.0, 2_500.0), 47_500.0);
    }
}
