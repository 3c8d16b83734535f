pub mod checklists;
pub mod employees;

pub use checklists::{get_checklist, CountryQuery};
pub use employees::{get_employee, list_employees, EmployeeListQuery};
