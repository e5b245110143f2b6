use std::io::{stdout, Write};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::errors::{Error, Result};

pub fn prompt_user_for_password() -> Result<String> {
    stdout().flush().map_err(Error::generic)?;
    rpassword::prompt_password("Please enter your password: ").map_err(Error::generic)
}

/// Parse either a date, meaning midnight, or a date and time without timezone
pub fn parse_datetime(s: &str) -> core::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(Default::default()))
        })
        .map_err(|e| format!("{s} is not a valid date: {e}"))
}

/// Parse a `key=value` search option
///
/// The value is kept as a JSON value if it parses as one (`true`, `42`...),
/// as a string otherwise.
pub fn parse_filter(s: &str) -> core::result::Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("{s} is not of the form KEY=VALUE"))?;
    if key.is_empty() {
        return Err(format!("{s} has an empty key"));
    }
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => v,
        _ => Value::from(value),
    };
    Ok((key.to_owned(), value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn datetimes() {
        assert_eq!(
            parse_datetime("2012-10-01").unwrap(),
            NaiveDateTime::parse_from_str("2012-10-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
        );
        assert_eq!(
            parse_datetime("2012-10-01T12:30:00").unwrap(),
            parse_datetime("2012-10-01 12:30:00").unwrap()
        );
        assert!(parse_datetime("October 1st").is_err());
    }

    #[test]
    fn filters() {
        assert_eq!(
            parse_filter("all_tenants=true").unwrap(),
            ("all_tenants".to_owned(), json!(true))
        );
        assert_eq!(
            parse_filter("status=ACTIVE").unwrap(),
            ("status".to_owned(), json!("ACTIVE"))
        );
        assert_eq!(
            parse_filter("name=a=b").unwrap(),
            ("name".to_owned(), json!("a=b"))
        );
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=x").is_err());
    }
}
