//! Turning raw request text into typed values.
//!
//! Every problem is collected as a [`FieldError`] keyed by the wire name of
//! the field, so a single response can list all of them.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{FieldError, MoneyInput};
use model::entities::deal::Project;
use rust_decimal::Decimal;
use store::PageWindow;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{AccessError, Result};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Keeps `(page - 1) * limit` inside the database's signed 64-bit offset.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// Accumulates field errors while a request is being parsed.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the derive-based checks of a request type.
    pub fn validate<T: Validate>(request: &T) -> Self {
        let mut errors = Self::new();
        if let Err(validation) = request.validate() {
            errors.extend_validator(&validation);
        }
        errors
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError::new(field, message));
    }

    /// Keeps the value, or records the error and yields `None`.
    pub fn check<T>(&mut self, parsed: std::result::Result<T, FieldError>) -> Option<T> {
        match parsed {
            Ok(value) => Some(value),
            Err(error) => {
                self.0.push(error);
                None
            }
        }
    }

    /// Parses an optional input: absent stays `None`, invalid is recorded.
    pub fn check_opt<S, T>(
        &mut self,
        raw: Option<S>,
        parse: impl FnOnce(S) -> std::result::Result<T, FieldError>,
    ) -> Option<T> {
        raw.and_then(|raw| self.check(parse(raw)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fails with every collected error, sorted by field name.
    pub fn finish(mut self) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        self.0.sort_by(|a, b| a.field.cmp(&b.field));
        self.0.dedup();
        Err(AccessError::Validation(self.0))
    }

    fn extend_validator(&mut self, errors: &ValidationErrors) {
        for (field, problems) in errors.field_errors() {
            let field = to_camel_case(&field);
            for problem in problems.iter() {
                let message = match &problem.message {
                    Some(message) => message.to_string(),
                    None => match problem.code.as_ref() {
                        "length" => "Invalid length".to_string(),
                        "range" => "Value out of range".to_string(),
                        "email" => "Invalid email address".to_string(),
                        other => format!("Invalid value ({other})"),
                    },
                };
                self.0.push(FieldError::new(&field, &message));
            }
        }
    }
}

/// `full_name` -> `fullName`
fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses one of an enum's wire values.
pub fn parse_enum<T>(
    field: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    allowed: &str,
) -> std::result::Result<T, FieldError> {
    parse(value.trim())
        .ok_or_else(|| FieldError::new(field, &format!("Must be one of: {allowed}")))
}

/// Parses a project filter. `all` means no filter.
pub fn parse_project_filter(
    field: &str,
    value: &str,
) -> std::result::Result<Option<Project>, FieldError> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    parse_enum(field, value, Project::parse, "amazon, shopify").map(Some)
}

pub fn parse_project(field: &str, value: &str) -> std::result::Result<Project, FieldError> {
    parse_enum(field, value, Project::parse, "amazon, shopify")
}

pub fn parse_uuid(field: &str, value: &str) -> std::result::Result<Uuid, FieldError> {
    Uuid::parse_str(value.trim()).map_err(|_| FieldError::new(field, "Must be a valid UUID"))
}

/// Which end of a day a bare `YYYY-MM-DD` stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Parses an RFC 3339 timestamp or a bare date. A bare date resolves to the
/// first or last instant of that day (UTC).
pub fn parse_date_bound(
    field: &str,
    value: &str,
    bound: DayBound,
) -> std::result::Result<DateTime<Utc>, FieldError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        FieldError::new(field, "Must be an RFC 3339 timestamp or a YYYY-MM-DD date")
    })?;
    Ok(match bound {
        DayBound::Start => start_of_day(date),
        DayBound::End => end_of_day(date),
    })
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last).and_utc()
}

/// Parses an integer and checks it lies in `min..=max`.
pub fn parse_int_in<T>(
    field: &str,
    value: &str,
    min: T,
    max: T,
) -> std::result::Result<T, FieldError>
where
    T: FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| FieldError::new(field, "Must be a whole number"))?;
    if parsed < min || parsed > max {
        return Err(FieldError::new(
            field,
            &format!("Must be between {min} and {max}"),
        ));
    }
    Ok(parsed)
}

pub fn parse_bool(field: &str, value: &str) -> std::result::Result<bool, FieldError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(FieldError::new(field, "Must be true or false")),
    }
}

pub fn parse_money(field: &str, value: &MoneyInput) -> std::result::Result<Decimal, FieldError> {
    store::money::parse_money(field, value.as_str())
}

/// Reads `page` and `limit`, applying defaults.
pub fn parse_page_window(
    errors: &mut FieldErrors,
    page: Option<&str>,
    limit: Option<&str>,
) -> PageWindow {
    let page = errors
        .check_opt(page, |v| parse_int_in("page", v, 1, MAX_PAGE))
        .unwrap_or(DEFAULT_PAGE);
    let limit = errors
        .check_opt(limit, |v| parse_int_in("limit", v, 1, MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT);
    PageWindow::new(page, limit)
}
