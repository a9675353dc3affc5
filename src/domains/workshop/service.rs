use crate::auth::AuthContext;
use crate::domains::contract::repository::{ClientContractRepository, ContractAssignmentRepository};
use crate::domains::trainer::registration_repository::TrainerRegistrationRepository;
use crate::domains::trainer::repository::WorkshopTrainerRepository;
use crate::domains::workshop::status::compute_workshop_status;
use crate::domains::workshop::types::WorkshopStatus;
use crate::errors::ServiceResult;
use crate::types::Permission;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait defining workshop status operations
#[async_trait]
pub trait WorkshopStatusService: Send + Sync {
    /// Aggregate registration and payment status for one workshop date
    async fn workshop_status(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopStatus>;
}

/// Implementation of the workshop status service
#[derive(Clone)]
pub struct WorkshopStatusServiceImpl {
    trainer_repo: Arc<dyn WorkshopTrainerRepository>,
    registration_repo: Arc<dyn TrainerRegistrationRepository>,
    assignment_repo: Arc<dyn ContractAssignmentRepository>,
    client_repo: Arc<dyn ClientContractRepository>,
}

impl WorkshopStatusServiceImpl {
    pub fn new(
        trainer_repo: Arc<dyn WorkshopTrainerRepository>,
        registration_repo: Arc<dyn TrainerRegistrationRepository>,
        assignment_repo: Arc<dyn ContractAssignmentRepository>,
        client_repo: Arc<dyn ClientContractRepository>,
    ) -> Self {
        Self {
            trainer_repo,
            registration_repo,
            assignment_repo,
            client_repo,
        }
    }
}

#[async_trait]
impl WorkshopStatusService for WorkshopStatusServiceImpl {
    async fn workshop_status(
        &self,
        workshop_date: &str,
        auth: &AuthContext,
    ) -> ServiceResult<WorkshopStatus> {
        auth.authorize(Permission::ViewWorkshops)?;

        let trainers = self.trainer_repo.find_by_workshop_date(workshop_date).await?;
        let registrations = self
            .registration_repo
            .find_by_workshop_date(workshop_date)
            .await?;
        let client_contract = self.client_repo.find_by_workshop_date(workshop_date).await?;

        // One assignment lookup per active trainer; a single failed lookup
        // must not sink the whole snapshot, so results stay per-trainer
        let active: Vec<_> = trainers.iter().filter(|t| t.is_active()).collect();
        let lookups = join_all(
            active
                .iter()
                .map(|t| self.assignment_repo.find_volunteer_binding(t.id)),
        )
        .await;

        let mut assignments = HashMap::with_capacity(active.len());
        for (trainer, result) in active.iter().zip(lookups) {
            if let Err(e) = &result {
                log::warn!(
                    "Assignment lookup failed for trainer {} ({}): {}",
                    trainer.trainer_code,
                    trainer.id,
                    e
                );
            }
            assignments.insert(trainer.id, result);
        }

        Ok(compute_workshop_status(
            &trainers,
            &registrations,
            &assignments,
            client_contract.as_ref(),
        ))
    }
}
