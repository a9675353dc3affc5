use crate::domains::trainer::types::{
    parse_datetime_opt, parse_required_datetime, parse_required_uuid, parse_uuid_opt,
};
use crate::errors::{DomainResult, ValidationError};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which party a contract template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Trainer,
    Client,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Trainer => "trainer",
            ContractKind::Client => "client",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trainer" => Some(ContractKind::Trainer),
            "client" => Some(ContractKind::Client),
            _ => None,
        }
    }
}

/// ContractTemplate entity - a markdown document with placeholder tokens,
/// owned by a workshop date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub id: Uuid,
    pub workshop_date: String,
    pub name: String,
    pub content_markdown: String,
    pub kind: ContractKind,
    pub is_volunteer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<Uuid>,
}

impl ContractTemplate {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// NewContractTemplate DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContractTemplate {
    pub workshop_date: String,
    pub name: String,
    pub content_markdown: String,
    pub kind: ContractKind,
    pub is_volunteer: bool,
    pub created_by_user_id: Option<Uuid>,
}

impl Validate for NewContractTemplate {
    fn validate(&self) -> DomainResult<()> {
        common::validate_date_format(&self.workshop_date, "workshop_date")?;
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .max_length(200)
            .validate()?;
        ValidationBuilder::new("content_markdown", Some(self.content_markdown.clone()))
            .required()
            .validate()?;
        if self.is_volunteer && self.kind == ContractKind::Client {
            return Err(ValidationError::invalid_value(
                "is_volunteer",
                "only trainer templates can be flagged volunteer",
            )
            .into());
        }
        Ok(())
    }
}

/// UpdateContractTemplate DTO - the template kind is fixed at creation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateContractTemplate {
    pub name: Option<String>,
    pub content_markdown: Option<String>,
    pub is_volunteer: Option<bool>,
}

impl Validate for UpdateContractTemplate {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .required()
                .max_length(200)
                .validate()?;
        }
        if let Some(content) = &self.content_markdown {
            ValidationBuilder::new("content_markdown", Some(content.clone()))
                .required()
                .validate()?;
        }
        Ok(())
    }
}

/// ContractTemplateRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct ContractTemplateRow {
    pub id: String,
    pub workshop_date: String,
    pub name: String,
    pub content_markdown: String,
    pub kind: String,
    pub is_volunteer: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl ContractTemplateRow {
    pub fn into_entity(self) -> DomainResult<ContractTemplate> {
        let kind = ContractKind::from_str(&self.kind).ok_or_else(|| {
            crate::errors::DomainError::Internal(format!(
                "Invalid contract kind '{}' in DB for template {}",
                self.kind, self.id
            ))
        })?;
        Ok(ContractTemplate {
            id: parse_required_uuid(&self.id, "ContractTemplate.id")?,
            workshop_date: self.workshop_date,
            name: self.name,
            content_markdown: self.content_markdown,
            kind,
            is_volunteer: self.is_volunteer != 0,
            created_at: parse_required_datetime(&self.created_at, "ContractTemplate.created_at")?,
            updated_at: parse_required_datetime(&self.updated_at, "ContractTemplate.updated_at")?,
            created_by_user_id: parse_uuid_opt(&self.created_by_user_id)?,
            updated_by_user_id: parse_uuid_opt(&self.updated_by_user_id)?,
            deleted_at: parse_datetime_opt(&self.deleted_at)?,
            deleted_by_user_id: parse_uuid_opt(&self.deleted_by_user_id)?,
        })
    }
}

/// ContractAssignment entity - binds one trainer slot to one contract template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAssignment {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub contract_template_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<Uuid>,
}

/// ContractAssignmentRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct ContractAssignmentRow {
    pub id: String,
    pub trainer_id: String,
    pub contract_template_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl ContractAssignmentRow {
    pub fn into_entity(self) -> DomainResult<ContractAssignment> {
        Ok(ContractAssignment {
            id: parse_required_uuid(&self.id, "ContractAssignment.id")?,
            trainer_id: parse_required_uuid(&self.trainer_id, "ContractAssignment.trainer_id")?,
            contract_template_id: parse_required_uuid(
                &self.contract_template_id,
                "ContractAssignment.contract_template_id",
            )?,
            created_at: parse_required_datetime(&self.created_at, "ContractAssignment.created_at")?,
            updated_at: parse_required_datetime(&self.updated_at, "ContractAssignment.updated_at")?,
            created_by_user_id: parse_uuid_opt(&self.created_by_user_id)?,
            updated_by_user_id: parse_uuid_opt(&self.updated_by_user_id)?,
            deleted_at: parse_datetime_opt(&self.deleted_at)?,
            deleted_by_user_id: parse_uuid_opt(&self.deleted_by_user_id)?,
        })
    }
}

/// The assignment → template join projection the status aggregation consumes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolunteerBinding {
    pub contract_template_id: Uuid,
    pub is_volunteer: bool,
}

/// ClientContract entity - the single per-workshop contract with the paying client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientContract {
    pub id: Uuid,
    pub workshop_date: String,
    pub contract_template_id: Uuid,
    pub client_company_name: String,
    pub client_representative_name: String,
    pub client_address: Option<String>,
    pub client_email: String,
    pub client_company_registration: Option<String>,
    pub signature_code: String,
    pub is_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub code_sent: bool,
    pub payment_received: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<Uuid>,
}

impl ClientContract {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// NewClientContract DTO - the signature code is server-generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClientContract {
    pub workshop_date: String,
    pub contract_template_id: Uuid,
    pub client_company_name: String,
    pub client_representative_name: String,
    pub client_address: Option<String>,
    pub client_email: String,
    pub client_company_registration: Option<String>,
    pub created_by_user_id: Option<Uuid>,
}

impl Validate for NewClientContract {
    fn validate(&self) -> DomainResult<()> {
        common::validate_date_format(&self.workshop_date, "workshop_date")?;
        ValidationBuilder::new("contract_template_id", Some(self.contract_template_id))
            .not_nil()
            .validate()?;
        ValidationBuilder::new("client_company_name", Some(self.client_company_name.clone()))
            .required()
            .max_length(200)
            .validate()?;
        ValidationBuilder::new(
            "client_representative_name",
            Some(self.client_representative_name.clone()),
        )
        .required()
        .max_length(200)
        .validate()?;
        ValidationBuilder::new("client_email", Some(self.client_email.clone()))
            .required()
            .email()
            .validate()?;
        Ok(())
    }
}

/// UpdateClientContract DTO - client identity fields only; signature and
/// payment state move through dedicated operations
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateClientContract {
    pub client_company_name: Option<String>,
    pub client_representative_name: Option<String>,
    pub client_address: Option<String>,
    pub client_email: Option<String>,
    pub client_company_registration: Option<String>,
}

impl Validate for UpdateClientContract {
    fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.client_email {
            ValidationBuilder::new("client_email", Some(email.clone()))
                .email()
                .validate()?;
        }
        Ok(())
    }
}

/// ClientContractRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct ClientContractRow {
    pub id: String,
    pub workshop_date: String,
    pub contract_template_id: String,
    pub client_company_name: String,
    pub client_representative_name: String,
    pub client_address: Option<String>,
    pub client_email: String,
    pub client_company_registration: Option<String>,
    pub signature_code: String,
    pub is_signed: i64,
    pub signed_at: Option<String>,
    pub code_sent: i64,
    pub payment_received: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl ClientContractRow {
    pub fn into_entity(self) -> DomainResult<ClientContract> {
        Ok(ClientContract {
            id: parse_required_uuid(&self.id, "ClientContract.id")?,
            workshop_date: self.workshop_date,
            contract_template_id: parse_required_uuid(
                &self.contract_template_id,
                "ClientContract.contract_template_id",
            )?,
            client_company_name: self.client_company_name,
            client_representative_name: self.client_representative_name,
            client_address: self.client_address,
            client_email: self.client_email,
            client_company_registration: self.client_company_registration,
            signature_code: self.signature_code,
            is_signed: self.is_signed != 0,
            signed_at: parse_datetime_opt(&self.signed_at)?,
            code_sent: self.code_sent != 0,
            payment_received: self.payment_received != 0,
            created_at: parse_required_datetime(&self.created_at, "ClientContract.created_at")?,
            updated_at: parse_required_datetime(&self.updated_at, "ClientContract.updated_at")?,
            created_by_user_id: parse_uuid_opt(&self.created_by_user_id)?,
            updated_by_user_id: parse_uuid_opt(&self.updated_by_user_id)?,
            deleted_at: parse_datetime_opt(&self.deleted_at)?,
            deleted_by_user_id: parse_uuid_opt(&self.deleted_by_user_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_kind_round_trip() {
        assert_eq!(ContractKind::from_str("trainer"), Some(ContractKind::Trainer));
        assert_eq!(ContractKind::from_str("client"), Some(ContractKind::Client));
        assert_eq!(ContractKind::from_str("volunteer"), None);
        assert_eq!(ContractKind::Client.as_str(), "client");
    }

    #[test]
    fn test_new_template_validation() {
        let valid = NewContractTemplate {
            workshop_date: "2025-06-14".to_string(),
            name: "Contrat formateur".to_string(),
            content_markdown: "# Contrat\n[NOM_REPRESENTANT]".to_string(),
            kind: ContractKind::Trainer,
            is_volunteer: false,
            created_by_user_id: None,
        };
        assert!(valid.validate().is_ok());

        let volunteer_client = NewContractTemplate {
            kind: ContractKind::Client,
            is_volunteer: true,
            ..valid.clone()
        };
        assert!(volunteer_client.validate().is_err());

        let empty_content = NewContractTemplate {
            content_markdown: "".to_string(),
            ..valid
        };
        assert!(empty_content.validate().is_err());
    }

    #[test]
    fn test_new_client_contract_validation() {
        let valid = NewClientContract {
            workshop_date: "2025-06-14".to_string(),
            contract_template_id: Uuid::new_v4(),
            client_company_name: "Acme SARL".to_string(),
            client_representative_name: "Marie Curie".to_string(),
            client_address: None,
            client_email: "contact@acme.fr".to_string(),
            client_company_registration: None,
            created_by_user_id: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = NewClientContract {
            client_email: "nope".to_string(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }
}
