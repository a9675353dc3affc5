use crate::errors::{DomainError, DomainResult, ValidationError};
use chrono::NaiveDate;
use regex::Regex;
use sqlx::{query_scalar, SqlitePool};
use std::sync::OnceLock;
use uuid::Uuid;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap())
}

fn trainer_code_regex() -> &'static Regex {
    static TRAINER_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    TRAINER_CODE_REGEX.get_or_init(|| Regex::new(r"^[A-Z0-9]{4,12}$").unwrap())
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            // Return the first error for simplicity
            Err(DomainError::Validation(self.errors[0].clone()))
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn min_length(mut self, min: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() < min {
                self.errors
                    .push(ValidationError::min_length(&self.field_name, min));
            }
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() > max {
                self.errors
                    .push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors
                    .push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn email(self) -> Self {
        self.matches_pattern(email_regex(), "must be a valid email address")
    }

    pub fn trainer_code(self) -> Self {
        self.matches_pattern(
            trainer_code_regex(),
            "must be 4-12 uppercase letters or digits",
        )
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors
                    .push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// UUID validation helpers
impl ValidationBuilder<Uuid> {
    pub fn not_nil(mut self) -> Self {
        if let Some(value) = &self.value {
            if *value == Uuid::nil() {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    "cannot be a nil UUID",
                ));
            }
        }
        self
    }
}

/// Uniqueness validation helper (relies on database access)
pub async fn validate_unique(
    pool: &SqlitePool,
    table: &str,
    field: &str,
    value: &str,
    exclude_id: Option<&str>,
    field_name: &str,
) -> DomainResult<()> {
    let query = match exclude_id {
        Some(_) => format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND id != ? AND deleted_at IS NULL",
            table, field
        ),
        None => format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND deleted_at IS NULL",
            table, field
        ),
    };

    let count: i64 = match exclude_id {
        Some(id) => query_scalar(&query)
            .bind(value)
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?,
        None => query_scalar(&query)
            .bind(value)
            .fetch_one(pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?,
    };

    if count > 0 {
        return Err(DomainError::Validation(ValidationError::unique(field_name)));
    }

    Ok(())
}

/// Validation utility for checking entity exists in the database
pub async fn validate_entity_exists(
    pool: &SqlitePool,
    table: &str,
    id: &Uuid,
    field_name: &str,
) -> DomainResult<()> {
    let query = format!(
        "SELECT COUNT(*) FROM {} WHERE id = ? AND deleted_at IS NULL",
        table
    );

    let count: i64 = query_scalar(&query)
        .bind(id.to_string())
        .fetch_one(pool)
        .await
        .map_err(|e| DomainError::Database(e.into()))?;

    if count == 0 {
        return Err(DomainError::Validation(ValidationError::relationship(
            &format!("{} does not exist", field_name),
        )));
    }

    Ok(())
}

/// Helper to check all dependencies before deletion
pub async fn check_all_dependencies(
    pool: &SqlitePool,
    id: &Uuid,
    dependencies: &[(&str, &str)],
) -> Result<Vec<String>, DomainError> {
    let mut found_dependencies = Vec::new();

    for (table, foreign_key) in dependencies {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND deleted_at IS NULL",
            table, foreign_key
        );

        let count: i64 = query_scalar(&query)
            .bind(id.to_string())
            .fetch_one(pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?;

        if count > 0 {
            found_dependencies.push(table.to_string());
        }
    }

    Ok(found_dependencies)
}

// Common validation utility module for frequently validated fields
pub mod common {
    use super::*;
    use chrono::DateTime;

    pub fn validate_date_format(date_str: &str, field_name: &str) -> DomainResult<()> {
        match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(_) => Ok(()),
            Err(_) => Err(DomainError::Validation(ValidationError::format(
                field_name,
                "must be in the format YYYY-MM-DD",
            ))),
        }
    }

    pub fn validate_iso8601_datetime(date_str: &str, field_name: &str) -> DomainResult<()> {
        match DateTime::parse_from_rfc3339(date_str) {
            Ok(_) => Ok(()),
            Err(_) => Err(DomainError::Validation(ValidationError::format(
                field_name,
                "must be in ISO 8601 format (YYYY-MM-DDTHH:MM:SS.sssZ)",
            ))),
        }
    }

    pub fn validate_trainer_code(code: &str, field_name: &str) -> DomainResult<()> {
        ValidationBuilder::new(field_name, Some(code.to_string()))
            .trainer_code()
            .validate()
    }

    pub async fn validate_trainer_exists(
        pool: &SqlitePool,
        trainer_id: &Uuid,
        field_name: &str,
    ) -> DomainResult<()> {
        validate_entity_exists(pool, "workshop_trainers", trainer_id, field_name).await
    }

    pub async fn validate_contract_template_exists(
        pool: &SqlitePool,
        template_id: &Uuid,
        field_name: &str,
    ) -> DomainResult<()> {
        validate_entity_exists(pool, "contract_templates", template_id, field_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(email_regex().is_match("user@example.com"));
        assert!(email_regex().is_match("user.name+tag@example.co.uk"));
        assert!(!email_regex().is_match("user@"));
        assert!(!email_regex().is_match("@example.com"));
        assert!(!email_regex().is_match("user@example"));
    }

    #[test]
    fn test_trainer_code_validation() {
        assert!(trainer_code_regex().is_match("FORM01"));
        assert!(trainer_code_regex().is_match("A1B2C3D4"));
        assert!(!trainer_code_regex().is_match("abc"));
        assert!(!trainer_code_regex().is_match("TOO-LONG-CODE"));
        assert!(common::validate_trainer_code("FORM01", "trainer_code").is_ok());
        assert!(common::validate_trainer_code("form01", "trainer_code").is_err());
    }

    #[test]
    fn test_validation_builder() {
        let result = ValidationBuilder::new("name", Some("".to_string()))
            .required()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("name", Some("test".to_string()))
            .required()
            .min_length(5)
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("email", Some("invalid".to_string()))
            .email()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("email", Some("valid@example.com".to_string()))
            .email()
            .validate();
        assert!(result.is_ok());

        let result = ValidationBuilder::new("kind", Some("trainer".to_string()))
            .one_of(&["trainer", "client"], None)
            .validate();
        assert!(result.is_ok());

        let value: Option<String> = None;
        let result = ValidationBuilder::new("name", value).required().validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_date_format_validation() {
        assert!(common::validate_date_format("2025-01-01", "workshop_date").is_ok());
        assert!(common::validate_date_format("01/01/2025", "workshop_date").is_err());
        assert!(common::validate_iso8601_datetime("2025-01-01T12:00:00Z", "signed_at").is_ok());
        assert!(common::validate_iso8601_datetime("2025-01-01", "signed_at").is_err());
    }
}
