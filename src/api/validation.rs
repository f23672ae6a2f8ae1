//! Input validation for employee and timesheet submissions.
//!
//! Validation is a pure function of the raw submission: it never touches the
//! database. Anything that needs outside knowledge (today's date, whether an
//! employee id exists) is passed in by the caller.
//!
//! `check_*` returns the typed input on success; `validate_*` returns only the
//! field-keyed error map, empty when the submission is valid.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use super::error::FieldErrors;
use crate::config::ValidationConfig;
use crate::db::{blank_to_none, EmployeeForm, EmployeeInput, TimesheetForm, TimesheetInput};

lazy_static! {
    /// Basic local@domain.tld shape
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted timesheet timestamp formats (datetime-local inputs and stored rows)
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Validate a required free-text field
fn validate_required(value: &str, label: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(trimmed.to_string())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err("Valid email is required".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate a salary against the configured minimum
pub fn validate_salary(salary: &str, min_salary: f64) -> Result<f64, String> {
    match salary.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= min_salary => Ok(value),
        _ => Err(format!("Salary must be at least {}", min_salary)),
    }
}

/// Keep the value of a field check, or record its error
fn record<T>(errors: &mut FieldErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Parse a YYYY-MM-DD date
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Parse a timesheet timestamp in any accepted format
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Validate a date of birth.
///
/// Age is the difference of calendar years only, so someone born late in the
/// year counts as a year older than they are until their birthday.
pub fn validate_date_of_birth(value: &str, min_age: i32, today: NaiveDate) -> Result<NaiveDate, String> {
    if value.trim().is_empty() {
        return Err("Date of birth is required".to_string());
    }
    let dob = parse_date(value).ok_or_else(|| "Date of birth must be a valid date".to_string())?;
    if today.year() - dob.year() < min_age {
        return Err(format!("Employee must be at least {} years old", min_age));
    }
    Ok(dob)
}

/// Validate an employee submission and build the typed input
pub fn check_employee(
    form: &EmployeeForm,
    rules: &ValidationConfig,
    today: NaiveDate,
) -> Result<EmployeeInput, FieldErrors> {
    let mut errors = FieldErrors::new();

    let full_name = record(&mut errors, "full_name", validate_required(&form.full_name, "Full name"));
    let email = record(&mut errors, "email", validate_email(&form.email));
    let date_of_birth = record(&mut errors, "date_of_birth", validate_date_of_birth(&form.date_of_birth, rules.min_age, today));
    let job_title = record(&mut errors, "job_title", validate_required(&form.job_title, "Job title"));
    let department = record(&mut errors, "department", validate_required(&form.department, "Department"));
    let salary = record(&mut errors, "salary", validate_salary(&form.salary, rules.min_salary));

    let start_date = if form.start_date.trim().is_empty() {
        errors.add("start_date", "Start date is required");
        None
    } else {
        let parsed = parse_date(&form.start_date);
        if parsed.is_none() {
            errors.add("start_date", "Start date must be a valid date");
        }
        parsed
    };

    let end_date = match blank_to_none(&form.end_date) {
        None => None,
        Some(raw) => {
            let parsed = parse_date(&raw);
            if parsed.is_none() {
                errors.add("end_date", "End date must be a valid date");
            }
            parsed
        }
    };

    if rules.require_end_after_start {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("end_date", "End date must not be before start date");
            }
        }
    }

    let (Some(full_name), Some(email), Some(date_of_birth), Some(job_title), Some(department), Some(salary), Some(start_date)) =
        (full_name, email, date_of_birth, job_title, department, salary, start_date)
    else {
        return Err(errors);
    };

    errors.finish(|| EmployeeInput {
        full_name,
        email,
        phone: blank_to_none(&form.phone),
        date_of_birth,
        job_title,
        department,
        salary,
        start_date,
        end_date,
    })
}

/// Field errors of an employee submission; empty when valid
pub fn validate_employee(form: &EmployeeForm, rules: &ValidationConfig, today: NaiveDate) -> FieldErrors {
    check_employee(form, rules, today).err().unwrap_or_default()
}

/// Employee id of a timesheet submission, if it is a well-formed integer
pub fn timesheet_employee_id(form: &TimesheetForm) -> Option<i64> {
    form.employee_id.trim().parse::<i64>().ok()
}

/// Validate a timesheet submission and build the typed input.
///
/// `employee_exists` answers whether a parsed employee id refers to a stored
/// employee.
pub fn check_timesheet(
    form: &TimesheetForm,
    employee_exists: impl Fn(i64) -> bool,
) -> Result<TimesheetInput, FieldErrors> {
    let mut errors = FieldErrors::new();

    let employee_id = if form.employee_id.trim().is_empty() {
        errors.add("employee_id", "Employee is required");
        None
    } else {
        match timesheet_employee_id(form) {
            Some(id) if employee_exists(id) => Some(id),
            _ => {
                errors.add("employee_id", "Selected employee does not exist");
                None
            }
        }
    };

    let start_time = parse_timestamp_field(&form.start_time, "start_time", "Start time", &mut errors);
    let end_time = parse_timestamp_field(&form.end_time, "end_time", "End time", &mut errors);

    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.add("end_time", "End time must be after start time");
        }
    }

    let (Some(employee_id), Some(start_time), Some(end_time)) = (employee_id, start_time, end_time) else {
        return Err(errors);
    };

    errors.finish(|| TimesheetInput {
        employee_id,
        start_time,
        end_time,
        work_summary: blank_to_none(&form.work_summary),
    })
}

/// Field errors of a timesheet submission; empty when valid
pub fn validate_timesheet(form: &TimesheetForm, employee_exists: impl Fn(i64) -> bool) -> FieldErrors {
    check_timesheet(form, employee_exists).err().unwrap_or_default()
}

fn parse_timestamp_field(
    value: &str,
    field: &str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<NaiveDateTime> {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
        return None;
    }
    let parsed = parse_datetime(value);
    if parsed.is_none() {
        errors.add(field, format!("{} must be a valid date and time", label));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn rules() -> ValidationConfig {
        ValidationConfig::default()
    }

    fn valid_employee() -> EmployeeForm {
        EmployeeForm {
            full_name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "123-456-7890".to_string(),
            date_of_birth: "1990-05-15".to_string(),
            job_title: "Software Engineer".to_string(),
            department: "Engineering".to_string(),
            salary: "12000".to_string(),
            start_date: "2022-01-10".to_string(),
            end_date: String::new(),
        }
    }

    fn valid_timesheet() -> TimesheetForm {
        TimesheetForm {
            employee_id: "1".to_string(),
            start_time: "2024-02-01T09:00".to_string(),
            end_time: "2024-02-01T17:00".to_string(),
            work_summary: "Developed new feature X.".to_string(),
        }
    }

    #[test]
    fn test_valid_employee() {
        let errors = validate_employee(&valid_employee(), &rules(), today());
        assert!(errors.is_empty(), "{:?}", errors);

        let input = check_employee(&valid_employee(), &rules(), today()).unwrap();
        assert_eq!(input.salary, 12_000.0);
        assert_eq!(input.phone.as_deref(), Some("123-456-7890"));
        assert_eq!(input.end_date, None);
    }

    #[test]
    fn test_each_missing_required_field_is_reported() {
        for field in [
            "full_name",
            "email",
            "date_of_birth",
            "job_title",
            "department",
            "salary",
            "start_date",
        ] {
            let mut form = valid_employee();
            form.set(field, String::new());
            let errors = validate_employee(&form, &rules(), today());
            assert!(errors.contains(field), "missing {} not reported", field);
            assert_eq!(errors.len(), 1, "{:?}", errors);
        }
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let mut form = valid_employee();
        form.phone = "  ".to_string();
        form.end_date = String::new();

        let input = check_employee(&form, &rules(), today()).unwrap();
        assert_eq!(input.phone, None);
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.de").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_salary_minimum() {
        assert_eq!(validate_salary("10000", 10_000.0), Ok(10_000.0));
        assert_eq!(validate_salary(" 25000.50 ", 10_000.0), Ok(25_000.5));
        assert_eq!(
            validate_salary("9999", 10_000.0),
            Err("Salary must be at least 10000".to_string())
        );
        assert!(validate_salary("lots", 10_000.0).is_err());
        assert!(validate_salary("NaN", 10_000.0).is_err());
        assert!(validate_salary("inf", 10_000.0).is_err());
        assert!(validate_salary("600", 500.0).is_ok());
    }

    #[test]
    fn test_age_exactly_eighteen_by_year_accepted() {
        let dob = validate_date_of_birth("2008-10-14", 18, today());
        assert!(dob.is_ok());
    }

    #[test]
    fn test_age_uses_coarse_year_difference() {
        // 17 years and 364 days old on 2026-01-01, but 2026 - 2008 = 18
        let new_year = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(validate_date_of_birth("2008-01-02", 18, new_year).is_ok());

        // Born late in 2008, still counts as 18 for all of 2026
        assert!(validate_date_of_birth("2008-12-31", 18, today()).is_ok());
    }

    #[test]
    fn test_age_below_minimum_rejected() {
        assert_eq!(
            validate_date_of_birth("2009-01-01", 18, today()),
            Err("Employee must be at least 18 years old".to_string())
        );
    }

    #[test]
    fn test_invalid_dates() {
        let mut form = valid_employee();
        form.date_of_birth = "15/05/1990".to_string();
        form.start_date = "soon".to_string();
        form.end_date = "2023-02-30".to_string();

        let errors = validate_employee(&form, &rules(), today());
        assert_eq!(errors.get("date_of_birth"), Some("Date of birth must be a valid date"));
        assert_eq!(errors.get("start_date"), Some("Start date must be a valid date"));
        assert_eq!(errors.get("end_date"), Some("End date must be a valid date"));
    }

    #[test]
    fn test_end_date_order_not_checked_by_default() {
        let mut form = valid_employee();
        form.end_date = "2020-01-01".to_string();

        assert!(validate_employee(&form, &rules(), today()).is_empty());
    }

    #[test]
    fn test_end_date_order_when_enabled() {
        let mut form = valid_employee();
        form.end_date = "2020-01-01".to_string();
        let strict = ValidationConfig {
            require_end_after_start: true,
            ..ValidationConfig::default()
        };

        let errors = validate_employee(&form, &strict, today());
        assert!(errors.contains("end_date"));

        form.end_date = "2022-01-10".to_string();
        assert!(validate_employee(&form, &strict, today()).is_empty());
    }

    #[test]
    fn test_valid_timesheet() {
        let input = check_timesheet(&valid_timesheet(), |id| id == 1).unwrap();
        assert_eq!(input.employee_id, 1);
        assert_eq!(input.work_summary.as_deref(), Some("Developed new feature X."));
    }

    #[test]
    fn test_timesheet_required_fields() {
        let errors = validate_timesheet(&TimesheetForm::default(), |_| true);
        assert_eq!(errors.get("employee_id"), Some("Employee is required"));
        assert_eq!(errors.get("start_time"), Some("Start time is required"));
        assert_eq!(errors.get("end_time"), Some("End time is required"));
        assert!(!errors.contains("work_summary"));
    }

    #[test]
    fn test_timesheet_unknown_employee() {
        let errors = validate_timesheet(&valid_timesheet(), |_| false);
        assert_eq!(errors.get("employee_id"), Some("Selected employee does not exist"));

        let mut form = valid_timesheet();
        form.employee_id = "abc".to_string();
        assert!(validate_timesheet(&form, |_| true).contains("employee_id"));
    }

    #[test]
    fn test_timesheet_equal_times_rejected() {
        let mut form = valid_timesheet();
        form.end_time = form.start_time.clone();

        let errors = validate_timesheet(&form, |_| true);
        assert_eq!(errors.get("end_time"), Some("End time must be after start time"));
    }

    #[test]
    fn test_timesheet_one_second_later_accepted() {
        let mut form = valid_timesheet();
        form.start_time = "2024-02-01T09:00:00".to_string();
        form.end_time = "2024-02-01T09:00:01".to_string();

        assert!(validate_timesheet(&form, |_| true).is_empty());
    }

    #[test]
    fn test_timesheet_end_before_start_rejected() {
        let mut form = valid_timesheet();
        form.end_time = "2024-02-01 08:00:00".to_string();

        assert!(validate_timesheet(&form, |_| true).contains("end_time"));
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-02-01T09:30"), Some(expected));
        assert_eq!(parse_datetime("2024-02-01T09:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-02-01 09:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-02-01 09:30"), Some(expected));
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
