use crate::auth::AuthContext;
use crate::domains::contract::repository::ContractAssignmentRepository;
use crate::domains::trainer::registration_repository::TrainerRegistrationRepository;
use crate::domains::trainer::repository::{TrainerFlag, WorkshopTrainerRepository};
use crate::domains::trainer::types::{
    NewTrainerRegistration, NewWorkshopTrainer, TrainerRegistration, UpdateTrainerRegistration,
    WorkshopTrainer,
};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{check_all_dependencies, Validate};
use async_trait::async_trait;
use rand::distr::{Alphanumeric, SampleString};
use sqlx::{query_scalar, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

const TRAINER_CODE_LEN: usize = 6;
const CODE_GENERATION_ATTEMPTS: usize = 5;

/// Trait defining trainer service operations
#[async_trait]
pub trait TrainerService: Send + Sync {
    /// Create a trainer slot; the code is generated when the caller does
    /// not supply one, and must be unique within the workshop either way
    async fn create_trainer(
        &self,
        new_trainer: NewWorkshopTrainer,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopTrainer>;

    async fn get_trainer(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<WorkshopTrainer>;

    async fn list_trainers(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<WorkshopTrainer>>;

    async fn trainers_for_workshop(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<WorkshopTrainer>>;

    async fn claim_trainer(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<WorkshopTrainer>;

    async fn abandon_trainer(&self, id: Uuid, auth: &AuthContext)
        -> ServiceResult<WorkshopTrainer>;

    async fn mark_code_sent(&self, id: Uuid, auth: &AuthContext)
        -> ServiceResult<WorkshopTrainer>;

    async fn delete_trainer(
        &self,
        id: Uuid,
        hard_delete: bool,
        auth: &AuthContext,
    ) -> ServiceResult<()>;

    /// Register a trainer against an existing slot; also claims the slot
    async fn create_registration(
        &self,
        new_registration: NewTrainerRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration>;

    async fn update_registration(
        &self,
        id: Uuid,
        update_data: UpdateTrainerRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration>;

    async fn get_registration(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration>;

    async fn registrations_for_workshop(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<TrainerRegistration>>;

    /// Record the trainer's acceptance of their assigned contract.
    /// Requires a live assignment; acceptance then locks that assignment.
    async fn accept_contract(
        &self,
        registration_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration>;

    async fn mark_paid(
        &self,
        registration_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration>;
}

/// Implementation of the trainer service
#[derive(Clone)]
pub struct TrainerServiceImpl {
    pool: SqlitePool,
    trainer_repo: Arc<dyn WorkshopTrainerRepository>,
    registration_repo: Arc<dyn TrainerRegistrationRepository>,
    assignment_repo: Arc<dyn ContractAssignmentRepository>,
}

impl TrainerServiceImpl {
    pub fn new(
        pool: SqlitePool,
        trainer_repo: Arc<dyn WorkshopTrainerRepository>,
        registration_repo: Arc<dyn TrainerRegistrationRepository>,
        assignment_repo: Arc<dyn ContractAssignmentRepository>,
    ) -> Self {
        Self {
            pool,
            trainer_repo,
            registration_repo,
            assignment_repo,
        }
    }

    async fn code_in_use(&self, workshop_date: &str, trainer_code: &str) -> ServiceResult<bool> {
        let count: i64 = query_scalar(
            "SELECT COUNT(*) FROM workshop_trainers
             WHERE workshop_date = ? AND trainer_code = ? AND deleted_at IS NULL",
        )
        .bind(workshop_date)
        .bind(trainer_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Database(DbError::from(e)))?;

        Ok(count > 0)
    }

    async fn resolve_trainer_code(
        &self,
        new_trainer: &NewWorkshopTrainer,
    ) -> ServiceResult<String> {
        if let Some(code) = &new_trainer.trainer_code {
            if self.code_in_use(&new_trainer.workshop_date, code).await? {
                return Err(ServiceError::Domain(
                    ValidationError::unique("trainer_code").into(),
                ));
            }
            return Ok(code.clone());
        }

        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = Alphanumeric
                .sample_string(&mut rand::rng(), TRAINER_CODE_LEN)
                .to_uppercase();
            if !self.code_in_use(&new_trainer.workshop_date, &code).await? {
                return Ok(code);
            }
        }

        Err(ServiceError::Domain(DomainError::Internal(
            "could not generate a unique trainer code".to_string(),
        )))
    }
}

#[async_trait]
impl TrainerService for TrainerServiceImpl {
    async fn create_trainer(
        &self,
        new_trainer: NewWorkshopTrainer,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopTrainer> {
        auth.authorize(Permission::ManageTrainers)?;
        new_trainer.validate()?;

        let trainer_code = self.resolve_trainer_code(&new_trainer).await?;
        let trainer = self
            .trainer_repo
            .create(&new_trainer, &trainer_code, auth)
            .await?;
        log::info!(
            "Created trainer slot {} for workshop {}",
            trainer.trainer_code,
            trainer.workshop_date
        );
        Ok(trainer)
    }

    async fn get_trainer(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<WorkshopTrainer> {
        auth.authorize(Permission::ViewTrainers)?;
        Ok(self.trainer_repo.find_by_id(id).await?)
    }

    async fn list_trainers(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<WorkshopTrainer>> {
        auth.authorize(Permission::ViewTrainers)?;
        Ok(self.trainer_repo.find_all(params, workshop_date).await?)
    }

    async fn trainers_for_workshop(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<WorkshopTrainer>> {
        auth.authorize(Permission::ViewTrainers)?;
        Ok(self.trainer_repo.find_by_workshop_date(workshop_date).await?)
    }

    async fn claim_trainer(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<WorkshopTrainer> {
        auth.authorize(Permission::ManageTrainers)?;
        Ok(self.trainer_repo.set_flag(id, TrainerFlag::Claimed, auth).await?)
    }

    async fn abandon_trainer(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopTrainer> {
        auth.authorize(Permission::ManageTrainers)?;
        let trainer = self
            .trainer_repo
            .set_flag(id, TrainerFlag::Abandoned, auth)
            .await?;
        log::info!(
            "Trainer slot {} for workshop {} marked abandoned",
            trainer.trainer_code,
            trainer.workshop_date
        );
        Ok(trainer)
    }

    async fn mark_code_sent(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopTrainer> {
        auth.authorize(Permission::ManageTrainers)?;
        Ok(self.trainer_repo.set_flag(id, TrainerFlag::CodeSent, auth).await?)
    }

    async fn delete_trainer(
        &self,
        id: Uuid,
        hard_delete: bool,
        auth: &AuthContext,
    ) -> ServiceResult<()> {
        auth.authorize(Permission::ManageTrainers)?;
        if hard_delete {
            auth.authorize_hard_delete()?;
        }

        let trainer = self.trainer_repo.find_by_id(id).await?;

        let mut dependencies =
            check_all_dependencies(&self.pool, &id, &[("contract_assignments", "trainer_id")])
                .await?;
        // Registrations reference the slot by code, not by id, so the
        // generic FK check cannot see them
        if self
            .registration_repo
            .find_by_code(&trainer.workshop_date, &trainer.trainer_code)
            .await?
            .is_some()
        {
            dependencies.push("trainer_registrations".to_string());
        }
        if !dependencies.is_empty() {
            return Err(ServiceError::DependenciesPreventDeletion(dependencies));
        }

        if hard_delete {
            self.trainer_repo.hard_delete(id, auth).await?;
        } else {
            self.trainer_repo.soft_delete(id, auth).await?;
        }
        Ok(())
    }

    async fn create_registration(
        &self,
        new_registration: NewTrainerRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration> {
        auth.authorize(Permission::ManageRegistrations)?;
        new_registration.validate()?;

        // The slot must exist, and must not be registered against twice
        let trainer = self
            .trainer_repo
            .find_by_code(&new_registration.workshop_date, &new_registration.trainer_code)
            .await?;

        if self
            .registration_repo
            .find_by_code(&new_registration.workshop_date, &new_registration.trainer_code)
            .await?
            .is_some()
        {
            return Err(ServiceError::Domain(
                ValidationError::unique("trainer_code").into(),
            ));
        }

        let registration = self
            .registration_repo
            .create(&new_registration, auth)
            .await?;

        if !trainer.is_claimed {
            self.trainer_repo
                .set_flag(trainer.id, TrainerFlag::Claimed, auth)
                .await?;
        }

        log::info!(
            "Registered {} against slot {} for workshop {}",
            registration.full_name(),
            registration.trainer_code,
            registration.workshop_date
        );
        Ok(registration)
    }

    async fn update_registration(
        &self,
        id: Uuid,
        update_data: UpdateTrainerRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration> {
        auth.authorize(Permission::ManageRegistrations)?;
        update_data.validate()?;
        Ok(self.registration_repo.update(id, &update_data, auth).await?)
    }

    async fn get_registration(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration> {
        auth.authorize(Permission::ViewTrainers)?;
        Ok(self.registration_repo.find_by_id(id).await?)
    }

    async fn registrations_for_workshop(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<TrainerRegistration>> {
        auth.authorize(Permission::ViewTrainers)?;
        Ok(self
            .registration_repo
            .find_by_workshop_date(workshop_date)
            .await?)
    }

    async fn accept_contract(
        &self,
        registration_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration> {
        auth.authorize(Permission::ManageRegistrations)?;

        let registration = self.registration_repo.find_by_id(registration_id).await?;
        let trainer = self
            .trainer_repo
            .find_by_code(&registration.workshop_date, &registration.trainer_code)
            .await?;

        if self.assignment_repo.find_for_trainer(trainer.id).await?.is_none() {
            return Err(ServiceError::Domain(
                ValidationError::relationship("no contract assigned to accept").into(),
            ));
        }

        let accepted = self
            .registration_repo
            .set_contract_accepted(registration_id, auth)
            .await?;
        log::info!(
            "Contract accepted by {} for workshop {}",
            accepted.full_name(),
            accepted.workshop_date
        );
        Ok(accepted)
    }

    async fn mark_paid(
        &self,
        registration_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<TrainerRegistration> {
        auth.authorize(Permission::ManageRegistrations)?;
        Ok(self.registration_repo.set_paid(registration_id, auth).await?)
    }
}
