//! Per-country completeness rules and the country-wide checklist summary.
//!
//! Everything here is pure: the same (employee, country) input always yields the same output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::EmployeeRecord;

// ASCII digits only; `\d` would also accept other Unicode digits.
static GERMAN_TAX_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DE[0-9]{9}$").expect("static tax id pattern"));

/// Country after alias normalization. Unrecognized strings pass through verbatim
/// and get an empty rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Country {
    Usa,
    Germany,
    Other(String),
}

impl Country {
    pub fn normalize(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "USA" => Country::Usa,
            "DE" | "DEU" | "GERMANY" => Country::Germany,
            _ => Country::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Country::Usa => "USA",
            Country::Germany => "Germany",
            Country::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub field: String,
    pub label: String,
    pub complete: bool,
    pub message: String,
}

impl FieldCheck {
    fn new(field: &str, label: &str, complete: bool) -> Self {
        let message = if complete {
            format!("{} is complete", label)
        } else {
            format!("{} is required or invalid", label)
        };
        Self {
            field: field.to_string(),
            label: label.to_string(),
            complete,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeValidation {
    pub fields: Vec<FieldCheck>,
    pub completion_percentage: u8,
    /// Vacuously true when the rule set is empty.
    pub complete: bool,
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

fn german_tax_id(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| GERMAN_TAX_ID.is_match(v))
}

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u8
}

/// Score one employee against the rules of `country`. Rules run in a fixed order.
pub fn validate_employee(employee: &EmployeeRecord, country: &str) -> EmployeeValidation {
    let fields = match Country::normalize(country) {
        Country::Usa => vec![
            FieldCheck::new("ssn", "SSN", non_blank(&employee.ssn)),
            FieldCheck::new("salary", "Salary", positive(employee.salary)),
            FieldCheck::new("address", "Address", non_blank(&employee.address)),
        ],
        Country::Germany => vec![
            FieldCheck::new("salary", "Salary", positive(employee.salary)),
            FieldCheck::new("goal", "Goal", non_blank(&employee.goal)),
            FieldCheck::new("tax_id", "Tax ID", german_tax_id(&employee.tax_id)),
        ],
        Country::Other(_) => Vec::new(),
    };

    let complete_count = fields.iter().filter(|f| f.complete).count();
    EmployeeValidation {
        completion_percentage: percentage(complete_count, fields.len()),
        complete: complete_count == fields.len(),
        fields,
    }
}

/// Messages of the incomplete fields, in rule order.
pub fn missing_field_messages(validation: &EmployeeValidation) -> Vec<String> {
    validation
        .fields
        .iter()
        .filter(|f| !f.complete)
        .map(|f| f.message.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeChecklist {
    pub id: i64,
    pub name: String,
    pub fields: Vec<FieldCheck>,
    pub completion_percentage: u8,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistOverview {
    pub total: usize,
    pub complete: usize,
    pub percentage: u8,
}

/// The cached `checklist:country:{country}` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryChecklist {
    pub overall: ChecklistOverview,
    pub employees: Vec<EmployeeChecklist>,
}

pub fn summarize_country(country: &str, employees: &[EmployeeRecord]) -> CountryChecklist {
    let employees: Vec<EmployeeChecklist> = employees
        .iter()
        .map(|employee| {
            let validation = validate_employee(employee, country);
            EmployeeChecklist {
                id: employee.id,
                name: employee.display_name(),
                fields: validation.fields,
                completion_percentage: validation.completion_percentage,
                complete: validation.complete,
            }
        })
        .collect();

    let complete = employees.iter().filter(|e| e.complete).count();
    CountryChecklist {
        overall: ChecklistOverview {
            total: employees.len(),
            complete,
            percentage: percentage(complete, employees.len()),
        },
        employees,
    }
}
