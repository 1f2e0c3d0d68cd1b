use chrono::NaiveDate;

use crate::domain::models::DAY_FORMAT;
use crate::error::{AppError, Result};

/// `YYYY-MM-DD` の日付を読む
/// field は エラーメッセージ用の項目名
pub fn parse_day(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|_| AppError::Validation(format!("{} must be YYYY-MM-DD, got {:?}", field, value)))
}

/// 省略可能な日付 (空文字も省略扱い)
pub fn parse_optional_day(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_day(field, value).map(Some),
    }
}

/// 必須の日付 (Option で受け取ったもの)
pub fn require_day(field: &str, value: Option<&str>) -> Result<NaiveDate> {
    parse_optional_day(field, value)?
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

#[cfg(test)]
mod time_tests {
    use super::*;

    #[test]
    fn parses_iso_days() {
        assert_eq!(
            parse_day("start_date", " 2025-01-03 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
        );
    }

    #[test]
    fn rejects_missing_and_malformed_days() {
        assert!(matches!(parse_day("start_date", ""), Err(AppError::Validation(_))));
        assert!(matches!(parse_day("start_date", "01/03/2025"), Err(AppError::Validation(_))));
        assert!(matches!(require_day("end_date", None), Err(AppError::Validation(_))));
        assert_eq!(parse_optional_day("start_date", Some("")).unwrap(), None);
    }
}
