pub mod attendance;
pub mod institution;
pub mod payroll;
pub mod role;
pub mod settings;
