use crate::domains::contract::types::{ClientContract, VolunteerBinding};
use crate::domains::trainer::types::{TrainerRegistration, WorkshopTrainer};
use crate::domains::workshop::types::WorkshopStatus;
use crate::errors::DomainResult;
use std::collections::HashMap;
use uuid::Uuid;

/// Compute a workshop's status from already-fetched rows.
///
/// Abandoned trainer slots are excluded from every figure. Registrations are
/// joined to slots by `trainer_code`. A trainer whose assigned template is
/// volunteer-flagged is never counted unpaid; when the assignment lookup
/// failed or found nothing, the trainer is treated as non-volunteer so the
/// payment check stays on the safe side.
pub fn compute_workshop_status(
    trainers: &[WorkshopTrainer],
    registrations: &[TrainerRegistration],
    assignments: &HashMap<Uuid, DomainResult<Option<VolunteerBinding>>>,
    client_contract: Option<&ClientContract>,
) -> WorkshopStatus {
    let active: Vec<&WorkshopTrainer> = trainers.iter().filter(|t| t.is_active()).collect();

    let registrations_by_code: HashMap<&str, &TrainerRegistration> = registrations
        .iter()
        .map(|r| (r.trainer_code.as_str(), r))
        .collect();

    let total_trainers = active.len();
    let all_claimed = active.iter().all(|t| t.is_claimed);

    let mut registered_trainers = 0;
    let mut unpaid_count = 0;

    for trainer in &active {
        let registration = match registrations_by_code.get(trainer.trainer_code.as_str()) {
            Some(r) => r,
            None => continue,
        };
        registered_trainers += 1;

        if registration.is_paid {
            continue;
        }

        let is_volunteer = match assignments.get(&trainer.id) {
            Some(Ok(Some(binding))) => binding.is_volunteer,
            // No assignment, lookup failure, or no entry at all: fall back
            // to non-volunteer and keep the trainer in the unpaid figure
            _ => false,
        };
        if !is_volunteer {
            unpaid_count += 1;
        }
    }

    let client_settled = client_contract.map(|c| c.payment_received).unwrap_or(true);
    let all_paid = unpaid_count == 0 && client_settled;

    WorkshopStatus {
        total_trainers,
        registered_trainers,
        all_claimed,
        unpaid_count,
        all_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DbError, DomainError};
    use chrono::Utc;

    const DATE: &str = "2025-06-14";

    fn trainer(code: &str, claimed: bool, abandoned: bool) -> WorkshopTrainer {
        WorkshopTrainer {
            id: Uuid::new_v4(),
            workshop_date: DATE.to_string(),
            trainer_code: code.to_string(),
            is_claimed: claimed,
            is_abandoned: abandoned,
            code_sent: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deleted_at: None,
            deleted_by_user_id: None,
        }
    }

    fn registration(code: &str, paid: bool) -> TrainerRegistration {
        TrainerRegistration {
            id: Uuid::new_v4(),
            workshop_date: DATE.to_string(),
            trainer_code: code.to_string(),
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean@example.com".to_string(),
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
            contract_accepted: false,
            invoice_file_url: None,
            rib_file_url: None,
            is_paid: paid,
            volunteer_attestation_accepted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deleted_at: None,
            deleted_by_user_id: None,
        }
    }

    fn client_contract(payment_received: bool) -> ClientContract {
        ClientContract {
            id: Uuid::new_v4(),
            workshop_date: DATE.to_string(),
            contract_template_id: Uuid::new_v4(),
            client_company_name: "Globex".to_string(),
            client_representative_name: "Marie Curie".to_string(),
            client_address: None,
            client_email: "marie@globex.fr".to_string(),
            client_company_registration: None,
            signature_code: "AB12CD34".to_string(),
            is_signed: payment_received,
            signed_at: None,
            code_sent: false,
            payment_received,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deleted_at: None,
            deleted_by_user_id: None,
        }
    }

    fn volunteer_entry(
        trainer_id: Uuid,
        is_volunteer: bool,
    ) -> (Uuid, DomainResult<Option<VolunteerBinding>>) {
        (
            trainer_id,
            Ok(Some(VolunteerBinding {
                contract_template_id: Uuid::new_v4(),
                is_volunteer,
            })),
        )
    }

    #[test]
    fn test_empty_workshop_is_vacuously_complete() {
        let status = compute_workshop_status(&[], &[], &HashMap::new(), None);
        assert_eq!(
            status,
            WorkshopStatus {
                total_trainers: 0,
                registered_trainers: 0,
                all_claimed: true,
                unpaid_count: 0,
                all_paid: true,
            }
        );
    }

    #[test]
    fn test_registered_never_exceeds_total() {
        let trainers = vec![trainer("FORM01", true, false), trainer("FORM02", false, false)];
        // A registration without a matching active slot does not count
        let registrations = vec![registration("FORM01", true), registration("ORPHAN", true)];

        let status = compute_workshop_status(&trainers, &registrations, &HashMap::new(), None);
        assert_eq!(status.total_trainers, 2);
        assert_eq!(status.registered_trainers, 1);
        assert!(status.registered_trainers <= status.total_trainers);
    }

    #[test]
    fn test_abandoned_trainers_are_excluded() {
        let abandoned = trainer("FORM03", false, true);
        let trainers = vec![trainer("FORM01", true, false), abandoned];
        // The abandoned trainer's registration and unpaid state are invisible
        let registrations = vec![registration("FORM01", true), registration("FORM03", false)];

        let status = compute_workshop_status(&trainers, &registrations, &HashMap::new(), None);
        assert_eq!(status.total_trainers, 1);
        assert_eq!(status.registered_trainers, 1);
        assert!(status.all_claimed);
        assert_eq!(status.unpaid_count, 0);
        assert!(status.all_paid);
    }

    #[test]
    fn test_volunteer_assignment_is_never_unpaid() {
        let t1 = trainer("FORM01", true, false);
        let t2 = trainer("FORM02", true, false);
        let registrations = vec![registration("FORM01", false), registration("FORM02", false)];
        let assignments: HashMap<_, _> = vec![
            volunteer_entry(t1.id, true),
            volunteer_entry(t2.id, false),
        ]
        .into_iter()
        .collect();

        let status =
            compute_workshop_status(&[t1, t2], &registrations, &assignments, None);
        assert_eq!(status.unpaid_count, 1);
    }

    #[test]
    fn test_failed_assignment_lookup_falls_back_to_non_volunteer() {
        let t1 = trainer("FORM01", true, false);
        let t2 = trainer("FORM02", true, false);
        let registrations = vec![registration("FORM01", false), registration("FORM02", false)];

        let mut assignments: HashMap<Uuid, DomainResult<Option<VolunteerBinding>>> = HashMap::new();
        assignments.insert(
            t1.id,
            Err(DomainError::Database(DbError::Other("lookup failed".to_string()))),
        );
        assignments.insert(t2.id, Ok(None));

        let status = compute_workshop_status(&[t1, t2], &registrations, &assignments, None);
        assert_eq!(status.unpaid_count, 2);
        assert!(!status.all_paid);
    }

    #[test]
    fn test_mixed_workshop_snapshot() {
        let trainers = vec![
            trainer("FORM01", true, false),
            trainer("FORM02", true, false),
            trainer("FORM03", false, false),
        ];
        let registrations = vec![registration("FORM01", true), registration("FORM02", false)];

        let status = compute_workshop_status(&trainers, &registrations, &HashMap::new(), None);
        assert_eq!(
            status,
            WorkshopStatus {
                total_trainers: 3,
                registered_trainers: 2,
                all_claimed: false,
                unpaid_count: 1,
                all_paid: false,
            }
        );
    }

    #[test]
    fn test_client_payment_gates_all_paid() {
        let trainers = vec![trainer("FORM01", true, false)];
        let registrations = vec![registration("FORM01", true)];

        let pending = client_contract(false);
        let status =
            compute_workshop_status(&trainers, &registrations, &HashMap::new(), Some(&pending));
        assert_eq!(status.unpaid_count, 0);
        assert!(!status.all_paid);

        let settled = client_contract(true);
        let status =
            compute_workshop_status(&trainers, &registrations, &HashMap::new(), Some(&settled));
        assert!(status.all_paid);

        // Without a client contract, trainer payments alone decide
        let status = compute_workshop_status(&trainers, &registrations, &HashMap::new(), None);
        assert!(status.all_paid);
    }
}
