pub mod attendance;
pub mod institution;
pub mod payroll;
