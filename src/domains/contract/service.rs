use crate::auth::AuthContext;
use crate::domains::contract::repository::{
    ClientContractRepository, ContractAssignmentRepository, ContractTemplateRepository,
};
use crate::domains::contract::template::{resolve, TemplateContext};
use crate::domains::contract::types::{
    ClientContract, ContractAssignment, ContractKind, ContractTemplate, NewClientContract,
    NewContractTemplate, UpdateClientContract, UpdateContractTemplate,
};
use crate::domains::trainer::registration_repository::TrainerRegistrationRepository;
use crate::domains::trainer::repository::WorkshopTrainerRepository;
use crate::errors::{DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{check_all_dependencies, validate_unique, Validate};
use async_trait::async_trait;
use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

const SIGNATURE_CODE_LEN: usize = 8;

fn generate_signature_code() -> String {
    Alphanumeric
        .sample_string(&mut rand::rng(), SIGNATURE_CODE_LEN)
        .to_uppercase()
}

/// Trait defining contract service operations
#[async_trait]
pub trait ContractService: Send + Sync {
    async fn create_template(
        &self,
        new_template: NewContractTemplate,
        auth: &AuthContext,
    ) -> ServiceResult<ContractTemplate>;

    async fn update_template(
        &self,
        id: Uuid,
        update_data: UpdateContractTemplate,
        auth: &AuthContext,
    ) -> ServiceResult<ContractTemplate>;

    async fn get_template(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<ContractTemplate>;

    async fn list_templates(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<ContractTemplate>>;

    async fn templates_for_workshop(
        &self,
        workshop_date: &str,
        kind: Option<ContractKind>,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<ContractTemplate>>;

    /// Soft delete by default; `hard_delete` requires elevated rights.
    /// Refused while assignments or client contracts still reference it.
    async fn delete_template(
        &self,
        id: Uuid,
        hard_delete: bool,
        auth: &AuthContext,
    ) -> ServiceResult<()>;

    async fn assign_contract(
        &self,
        trainer_id: Uuid,
        contract_template_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ContractAssignment>;

    async fn unassign_contract(&self, trainer_id: Uuid, auth: &AuthContext) -> ServiceResult<()>;

    async fn get_assignment(
        &self,
        trainer_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ContractAssignment>>;

    async fn create_client_contract(
        &self,
        new_contract: NewClientContract,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract>;

    async fn update_client_contract(
        &self,
        id: Uuid,
        update_data: UpdateClientContract,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract>;

    async fn get_client_contract(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ClientContract>>;

    async fn mark_client_code_sent(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract>;

    /// Sign the workshop's client contract after checking the submitted code
    async fn sign_client_contract(
        &self,
        workshop_date: &str,
        signature_code: &str,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract>;

    async fn mark_payment_received(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract>;

    async fn delete_client_contract(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;

    /// Resolve the trainer's assigned template against their registration
    async fn render_trainer_contract(
        &self,
        trainer_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<String>;

    /// Resolve the workshop's client template against its client contract
    async fn render_client_contract(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<String>;
}

/// Implementation of the contract service
#[derive(Clone)]
pub struct ContractServiceImpl {
    pool: SqlitePool,
    template_repo: Arc<dyn ContractTemplateRepository>,
    assignment_repo: Arc<dyn ContractAssignmentRepository>,
    client_repo: Arc<dyn ClientContractRepository>,
    trainer_repo: Arc<dyn WorkshopTrainerRepository>,
    registration_repo: Arc<dyn TrainerRegistrationRepository>,
}

impl ContractServiceImpl {
    pub fn new(
        pool: SqlitePool,
        template_repo: Arc<dyn ContractTemplateRepository>,
        assignment_repo: Arc<dyn ContractAssignmentRepository>,
        client_repo: Arc<dyn ClientContractRepository>,
        trainer_repo: Arc<dyn WorkshopTrainerRepository>,
        registration_repo: Arc<dyn TrainerRegistrationRepository>,
    ) -> Self {
        Self {
            pool,
            template_repo,
            assignment_repo,
            client_repo,
            trainer_repo,
            registration_repo,
        }
    }

    async fn find_template_of_kind(
        &self,
        id: Uuid,
        kind: ContractKind,
    ) -> ServiceResult<ContractTemplate> {
        let template = self.template_repo.find_by_id(id).await?;
        if template.kind != kind {
            return Err(ServiceError::Domain(
                ValidationError::invalid_value(
                    "contract_template_id",
                    &format!("expected a {} template", kind.as_str()),
                )
                .into(),
            ));
        }
        Ok(template)
    }

    /// An assignment is locked once the trainer has accepted the contract
    async fn ensure_assignment_not_locked(&self, trainer_id: Uuid) -> ServiceResult<()> {
        let trainer = self.trainer_repo.find_by_id(trainer_id).await?;
        let registration = self
            .registration_repo
            .find_by_code(&trainer.workshop_date, &trainer.trainer_code)
            .await?;

        if registration.map(|r| r.contract_accepted).unwrap_or(false) {
            return Err(ServiceError::Domain(
                ValidationError::relationship(
                    "contract has been accepted; the assignment can no longer change",
                )
                .into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ContractService for ContractServiceImpl {
    async fn create_template(
        &self,
        new_template: NewContractTemplate,
        auth: &AuthContext,
    ) -> ServiceResult<ContractTemplate> {
        auth.authorize(Permission::ManageContracts)?;
        new_template.validate()?;

        let template = self.template_repo.create(&new_template, auth).await?;
        log::info!(
            "Created {} contract template '{}' for workshop {}",
            template.kind.as_str(),
            template.name,
            template.workshop_date
        );
        Ok(template)
    }

    async fn update_template(
        &self,
        id: Uuid,
        update_data: UpdateContractTemplate,
        auth: &AuthContext,
    ) -> ServiceResult<ContractTemplate> {
        auth.authorize(Permission::ManageContracts)?;
        update_data.validate()?;

        // A trainer template cannot turn volunteer-flagged into a client one,
        // but a client template must never gain the volunteer flag
        if update_data.is_volunteer == Some(true) {
            let current = self.template_repo.find_by_id(id).await?;
            if current.kind == ContractKind::Client {
                return Err(ServiceError::Domain(
                    ValidationError::invalid_value(
                        "is_volunteer",
                        "only trainer templates can be flagged volunteer",
                    )
                    .into(),
                ));
            }
        }

        Ok(self.template_repo.update(id, &update_data, auth).await?)
    }

    async fn get_template(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<ContractTemplate> {
        auth.authorize(Permission::ViewContracts)?;
        Ok(self.template_repo.find_by_id(id).await?)
    }

    async fn list_templates(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<ContractTemplate>> {
        auth.authorize(Permission::ViewContracts)?;
        Ok(self.template_repo.find_all(params, workshop_date).await?)
    }

    async fn templates_for_workshop(
        &self,
        workshop_date: &str,
        kind: Option<ContractKind>,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<ContractTemplate>> {
        auth.authorize(Permission::ViewContracts)?;
        Ok(self
            .template_repo
            .find_by_workshop_date(workshop_date, kind)
            .await?)
    }

    async fn delete_template(
        &self,
        id: Uuid,
        hard_delete: bool,
        auth: &AuthContext,
    ) -> ServiceResult<()> {
        auth.authorize(Permission::ManageContracts)?;
        if hard_delete {
            auth.authorize_hard_delete()?;
        }

        let dependencies = check_all_dependencies(
            &self.pool,
            &id,
            &[
                ("contract_assignments", "contract_template_id"),
                ("client_contracts", "contract_template_id"),
            ],
        )
        .await?;

        if !dependencies.is_empty() {
            return Err(ServiceError::DependenciesPreventDeletion(dependencies));
        }

        if hard_delete {
            self.template_repo.hard_delete(id, auth).await?;
        } else {
            self.template_repo.soft_delete(id, auth).await?;
        }
        log::info!("Deleted contract template {} (hard: {})", id, hard_delete);
        Ok(())
    }

    async fn assign_contract(
        &self,
        trainer_id: Uuid,
        contract_template_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ContractAssignment> {
        auth.authorize(Permission::ManageContracts)?;

        let trainer = self.trainer_repo.find_by_id(trainer_id).await?;
        let template = self
            .find_template_of_kind(contract_template_id, ContractKind::Trainer)
            .await?;

        if template.workshop_date != trainer.workshop_date {
            return Err(ServiceError::Domain(
                ValidationError::relationship(
                    "template and trainer belong to different workshops",
                )
                .into(),
            ));
        }

        if self.assignment_repo.find_for_trainer(trainer_id).await?.is_some() {
            return Err(ServiceError::Domain(
                ValidationError::relationship(
                    "trainer already has a contract assigned; unassign it first",
                )
                .into(),
            ));
        }

        Ok(self
            .assignment_repo
            .assign(trainer_id, contract_template_id, auth)
            .await?)
    }

    async fn unassign_contract(&self, trainer_id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageContracts)?;
        self.ensure_assignment_not_locked(trainer_id).await?;
        Ok(self.assignment_repo.unassign(trainer_id, auth).await?)
    }

    async fn get_assignment(
        &self,
        trainer_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ContractAssignment>> {
        auth.authorize(Permission::ViewContracts)?;
        Ok(self.assignment_repo.find_for_trainer(trainer_id).await?)
    }

    async fn create_client_contract(
        &self,
        new_contract: NewClientContract,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract> {
        auth.authorize(Permission::ManageContracts)?;
        new_contract.validate()?;

        self.find_template_of_kind(new_contract.contract_template_id, ContractKind::Client)
            .await?;

        // One client contract per workshop date
        validate_unique(
            &self.pool,
            "client_contracts",
            "workshop_date",
            &new_contract.workshop_date,
            None,
            "workshop_date",
        )
        .await?;

        let signature_code = generate_signature_code();
        let contract = self
            .client_repo
            .create(&new_contract, &signature_code, auth)
            .await?;
        log::info!(
            "Created client contract for workshop {} ({})",
            contract.workshop_date,
            contract.client_company_name
        );
        Ok(contract)
    }

    async fn update_client_contract(
        &self,
        id: Uuid,
        update_data: UpdateClientContract,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract> {
        auth.authorize(Permission::ManageContracts)?;
        update_data.validate()?;
        Ok(self.client_repo.update(id, &update_data, auth).await?)
    }

    async fn get_client_contract(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ClientContract>> {
        auth.authorize(Permission::ViewContracts)?;
        Ok(self.client_repo.find_by_workshop_date(workshop_date).await?)
    }

    async fn mark_client_code_sent(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract> {
        auth.authorize(Permission::ManageContracts)?;
        Ok(self.client_repo.set_code_sent(id, auth).await?)
    }

    async fn sign_client_contract(
        &self,
        workshop_date: &str,
        signature_code: &str,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract> {
        auth.authorize(Permission::ManageContracts)?;

        let contract = self
            .client_repo
            .find_by_workshop_date(workshop_date)
            .await?
            .ok_or_else(|| {
                DomainError::EntityNotFoundByDate(
                    "ClientContract".to_string(),
                    workshop_date.to_string(),
                )
            })?;

        if contract.signature_code != signature_code {
            return Err(ServiceError::Domain(
                ValidationError::invalid_value("signature_code", "code does not match").into(),
            ));
        }

        if contract.is_signed {
            // Re-submitting a valid code is a no-op
            return Ok(contract);
        }

        let signed = self
            .client_repo
            .set_signed(contract.id, Utc::now(), auth)
            .await?;
        log::info!("Client contract signed for workshop {}", workshop_date);
        Ok(signed)
    }

    async fn mark_payment_received(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ClientContract> {
        auth.authorize(Permission::ManageContracts)?;
        Ok(self.client_repo.set_payment_received(id, auth).await?)
    }

    async fn delete_client_contract(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageContracts)?;
        Ok(self.client_repo.soft_delete(id, auth).await?)
    }

    async fn render_trainer_contract(
        &self,
        trainer_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<String> {
        auth.authorize(Permission::RenderContracts)?;

        let trainer = self.trainer_repo.find_by_id(trainer_id).await?;

        let assignment = self
            .assignment_repo
            .find_for_trainer(trainer_id)
            .await?
            .ok_or_else(|| {
                DomainError::Validation(ValidationError::relationship(
                    "trainer has no contract assigned",
                ))
            })?;

        let template = self
            .find_template_of_kind(assignment.contract_template_id, ContractKind::Trainer)
            .await?;

        let registration = self
            .registration_repo
            .find_by_code(&trainer.workshop_date, &trainer.trainer_code)
            .await?
            .ok_or_else(|| {
                DomainError::EntityNotFoundByDate(
                    "TrainerRegistration".to_string(),
                    trainer.workshop_date.clone(),
                )
            })?;

        let context = TemplateContext::for_trainer(&registration);
        Ok(resolve(&template.content_markdown, &context))
    }

    async fn render_client_contract(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<String> {
        auth.authorize(Permission::RenderContracts)?;

        let contract = self
            .client_repo
            .find_by_workshop_date(workshop_date)
            .await?
            .ok_or_else(|| {
                DomainError::EntityNotFoundByDate(
                    "ClientContract".to_string(),
                    workshop_date.to_string(),
                )
            })?;

        let template = self
            .find_template_of_kind(contract.contract_template_id, ContractKind::Client)
            .await?;

        let context = TemplateContext::for_client(&contract);
        Ok(resolve(&template.content_markdown, &context))
    }
}
