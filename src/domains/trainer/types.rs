use crate::errors::{DomainError, DomainResult};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// WorkshopTrainer entity - a claimable, code-identified trainer slot for a workshop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopTrainer {
    pub id: Uuid,
    pub workshop_date: String, // ISO date format YYYY-MM-DD
    pub trainer_code: String,
    pub is_claimed: bool,
    pub is_abandoned: bool,
    pub code_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<Uuid>,
}

impl WorkshopTrainer {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether this slot still counts toward workshop aggregates
    pub fn is_active(&self) -> bool {
        !self.is_abandoned
    }
}

/// NewWorkshopTrainer DTO - used when creating a trainer slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkshopTrainer {
    pub workshop_date: String,
    /// Server-generated when absent
    pub trainer_code: Option<String>,
    pub created_by_user_id: Option<Uuid>,
}

impl Validate for NewWorkshopTrainer {
    fn validate(&self) -> DomainResult<()> {
        common::validate_date_format(&self.workshop_date, "workshop_date")?;
        if let Some(code) = &self.trainer_code {
            common::validate_trainer_code(code, "trainer_code")?;
        }
        Ok(())
    }
}

/// WorkshopTrainerRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct WorkshopTrainerRow {
    pub id: String,
    pub workshop_date: String,
    pub trainer_code: String,
    pub is_claimed: i64,
    pub is_abandoned: i64,
    pub code_sent: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl WorkshopTrainerRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<WorkshopTrainer> {
        Ok(WorkshopTrainer {
            id: parse_required_uuid(&self.id, "WorkshopTrainer.id")?,
            workshop_date: self.workshop_date,
            trainer_code: self.trainer_code,
            is_claimed: self.is_claimed != 0,
            is_abandoned: self.is_abandoned != 0,
            code_sent: self.code_sent != 0,
            created_at: parse_required_datetime(&self.created_at, "WorkshopTrainer.created_at")?,
            updated_at: parse_required_datetime(&self.updated_at, "WorkshopTrainer.updated_at")?,
            created_by_user_id: parse_uuid_opt(&self.created_by_user_id)?,
            updated_by_user_id: parse_uuid_opt(&self.updated_by_user_id)?,
            deleted_at: parse_datetime_opt(&self.deleted_at)?,
            deleted_by_user_id: parse_uuid_opt(&self.deleted_by_user_id)?,
        })
    }
}

/// TrainerRegistration entity - a trainer's response to a claimed slot,
/// linked to the slot by `trainer_code` (natural key, not a surrogate id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerRegistration {
    pub id: Uuid,
    pub workshop_date: String,
    pub trainer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    // Company fields feeding the trainer contract placeholders
    pub company_name: Option<String>,
    pub legal_form: Option<String>,
    pub share_capital: Option<String>,
    pub rcs_city: Option<String>,
    pub rcs_number: Option<String>,
    pub head_office_address: Option<String>,
    pub representative_name: Option<String>,
    pub representative_role: Option<String>,
    pub company_short_name: Option<String>,
    pub representative_email: Option<String>,
    pub contract_accepted: bool,
    pub invoice_file_url: Option<String>,
    pub rib_file_url: Option<String>,
    pub is_paid: bool,
    pub volunteer_attestation_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<Uuid>,
}

impl TrainerRegistration {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// NewTrainerRegistration DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrainerRegistration {
    pub workshop_date: String,
    pub trainer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub legal_form: Option<String>,
    pub share_capital: Option<String>,
    pub rcs_city: Option<String>,
    pub rcs_number: Option<String>,
    pub head_office_address: Option<String>,
    pub representative_name: Option<String>,
    pub representative_role: Option<String>,
    pub company_short_name: Option<String>,
    pub representative_email: Option<String>,
    pub volunteer_attestation_accepted: Option<bool>,
    pub created_by_user_id: Option<Uuid>,
}

impl Validate for NewTrainerRegistration {
    fn validate(&self) -> DomainResult<()> {
        common::validate_date_format(&self.workshop_date, "workshop_date")?;
        common::validate_trainer_code(&self.trainer_code, "trainer_code")?;

        ValidationBuilder::new("first_name", Some(self.first_name.clone()))
            .required()
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("last_name", Some(self.last_name.clone()))
            .required()
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("email", Some(self.email.clone()))
            .required()
            .email()
            .validate()?;
        if let Some(rep_email) = &self.representative_email {
            ValidationBuilder::new("representative_email", Some(rep_email.clone()))
                .email()
                .validate()?;
        }
        Ok(())
    }
}

/// UpdateTrainerRegistration DTO - partial update of an existing registration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTrainerRegistration {
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub legal_form: Option<String>,
    pub share_capital: Option<String>,
    pub rcs_city: Option<String>,
    pub rcs_number: Option<String>,
    pub head_office_address: Option<String>,
    pub representative_name: Option<String>,
    pub representative_role: Option<String>,
    pub company_short_name: Option<String>,
    pub representative_email: Option<String>,
    pub invoice_file_url: Option<String>,
    pub rib_file_url: Option<String>,
}

impl Validate for UpdateTrainerRegistration {
    fn validate(&self) -> DomainResult<()> {
        if let Some(rep_email) = &self.representative_email {
            ValidationBuilder::new("representative_email", Some(rep_email.clone()))
                .email()
                .validate()?;
        }
        Ok(())
    }
}

/// TrainerRegistrationRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct TrainerRegistrationRow {
    pub id: String,
    pub workshop_date: String,
    pub trainer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub legal_form: Option<String>,
    pub share_capital: Option<String>,
    pub rcs_city: Option<String>,
    pub rcs_number: Option<String>,
    pub head_office_address: Option<String>,
    pub representative_name: Option<String>,
    pub representative_role: Option<String>,
    pub company_short_name: Option<String>,
    pub representative_email: Option<String>,
    pub contract_accepted: i64,
    pub invoice_file_url: Option<String>,
    pub rib_file_url: Option<String>,
    pub is_paid: i64,
    pub volunteer_attestation_accepted: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl TrainerRegistrationRow {
    pub fn into_entity(self) -> DomainResult<TrainerRegistration> {
        Ok(TrainerRegistration {
            id: parse_required_uuid(&self.id, "TrainerRegistration.id")?,
            workshop_date: self.workshop_date,
            trainer_code: self.trainer_code,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company_name: self.company_name,
            legal_form: self.legal_form,
            share_capital: self.share_capital,
            rcs_city: self.rcs_city,
            rcs_number: self.rcs_number,
            head_office_address: self.head_office_address,
            representative_name: self.representative_name,
            representative_role: self.representative_role,
            company_short_name: self.company_short_name,
            representative_email: self.representative_email,
            contract_accepted: self.contract_accepted != 0,
            invoice_file_url: self.invoice_file_url,
            rib_file_url: self.rib_file_url,
            is_paid: self.is_paid != 0,
            volunteer_attestation_accepted: self.volunteer_attestation_accepted != 0,
            created_at: parse_required_datetime(&self.created_at, "TrainerRegistration.created_at")?,
            updated_at: parse_required_datetime(&self.updated_at, "TrainerRegistration.updated_at")?,
            created_by_user_id: parse_uuid_opt(&self.created_by_user_id)?,
            updated_by_user_id: parse_uuid_opt(&self.updated_by_user_id)?,
            deleted_at: parse_datetime_opt(&self.deleted_at)?,
            deleted_by_user_id: parse_uuid_opt(&self.deleted_by_user_id)?,
        })
    }
}

// Shared row-parsing helpers for this domain

pub(crate) fn parse_required_uuid(value: &str, field: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| {
        DomainError::Internal(format!("Invalid UUID format for {} '{}': {}", field, value, e))
    })
}

pub(crate) fn parse_uuid_opt(value: &Option<String>) -> DomainResult<Option<Uuid>> {
    value
        .as_ref()
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|e| DomainError::Internal(format!("Invalid UUID format '{}' in DB: {}", s, e)))
        })
        .transpose()
}

pub(crate) fn parse_required_datetime(value: &str, field: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DomainError::Internal(format!(
                "Invalid RFC3339 format for {} '{}': {}",
                field, value, e
            ))
        })
}

pub(crate) fn parse_datetime_opt(value: &Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    value
        .as_ref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    DomainError::Internal(format!("Invalid RFC3339 format '{}' in DB: {}", s, e))
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trainer_validation() {
        let valid = NewWorkshopTrainer {
            workshop_date: "2025-06-14".to_string(),
            trainer_code: Some("FORM01".to_string()),
            created_by_user_id: None,
        };
        assert!(valid.validate().is_ok());

        let bad_date = NewWorkshopTrainer {
            workshop_date: "14/06/2025".to_string(),
            trainer_code: None,
            created_by_user_id: None,
        };
        assert!(bad_date.validate().is_err());

        let bad_code = NewWorkshopTrainer {
            workshop_date: "2025-06-14".to_string(),
            trainer_code: Some("xx".to_string()),
            created_by_user_id: None,
        };
        assert!(bad_code.validate().is_err());
    }

    #[test]
    fn test_registration_validation() {
        let mut reg = NewTrainerRegistration {
            workshop_date: "2025-06-14".to_string(),
            trainer_code: "FORM01".to_string(),
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean.dupont@example.com".to_string(),
            phone: None,
            company_name: None,
            legal_form: None,
            share_capital: None,
            rcs_city: None,
            rcs_number: None,
            head_office_address: None,
            representative_name: None,
            representative_role: None,
            company_short_name: None,
            representative_email: None,
            volunteer_attestation_accepted: None,
            created_by_user_id: None,
        };
        assert!(reg.validate().is_ok());

        reg.email = "not-an-email".to_string();
        assert!(reg.validate().is_err());
    }

    #[test]
    fn test_trainer_row_mapping() {
        let row = WorkshopTrainerRow {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            workshop_date: "2025-06-14".to_string(),
            trainer_code: "FORM01".to_string(),
            is_claimed: 1,
            is_abandoned: 0,
            code_sent: 1,
            created_at: "2025-05-01T10:00:00+00:00".to_string(),
            updated_at: "2025-05-02T10:00:00+00:00".to_string(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deleted_at: None,
            deleted_by_user_id: None,
        };
        let trainer = row.into_entity().unwrap();
        assert!(trainer.is_claimed);
        assert!(!trainer.is_abandoned);
        assert!(trainer.is_active());
        assert!(!trainer.is_deleted());
    }
}
