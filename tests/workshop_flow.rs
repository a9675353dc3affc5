use backoffice_core::auth::AuthContext;
use backoffice_core::domains::contract::repository::{
    SqliteClientContractRepository, SqliteContractAssignmentRepository,
    SqliteContractTemplateRepository,
};
use backoffice_core::domains::contract::types::{
    ContractKind, NewClientContract, NewContractTemplate, UpdateClientContract,
    UpdateContractTemplate,
};
use backoffice_core::domains::contract::{ContractService, ContractServiceImpl};
use backoffice_core::domains::core::repository::SoftDeletable;
use backoffice_core::domains::trainer::registration_repository::SqliteTrainerRegistrationRepository;
use backoffice_core::domains::trainer::repository::SqliteWorkshopTrainerRepository;
use backoffice_core::domains::trainer::types::{
    NewTrainerRegistration, NewWorkshopTrainer, UpdateTrainerRegistration,
};
use backoffice_core::domains::trainer::{TrainerService, TrainerServiceImpl};
use backoffice_core::domains::workshop::{WorkshopStatusService, WorkshopStatusServiceImpl};
use backoffice_core::errors::ServiceError;
use backoffice_core::types::UserRole;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

const DATE: &str = "2025-06-14";

struct Harness {
    pool: SqlitePool,
    trainer_service: TrainerServiceImpl,
    contract_service: ContractServiceImpl,
    status_service: WorkshopStatusServiceImpl,
    auth: AuthContext,
}

async fn harness() -> Harness {
    backoffice_core::init_logging();
    let pool: SqlitePool = backoffice_core::initialize("sqlite::memory:").await.unwrap();

    let trainer_repo = Arc::new(SqliteWorkshopTrainerRepository::new(pool.clone()));
    let registration_repo = Arc::new(SqliteTrainerRegistrationRepository::new(pool.clone()));
    let template_repo = Arc::new(SqliteContractTemplateRepository::new(pool.clone()));
    let assignment_repo = Arc::new(SqliteContractAssignmentRepository::new(pool.clone()));
    let client_repo = Arc::new(SqliteClientContractRepository::new(pool.clone()));

    Harness {
        pool: pool.clone(),
        trainer_service: TrainerServiceImpl::new(
            pool.clone(),
            trainer_repo.clone(),
            registration_repo.clone(),
            assignment_repo.clone(),
        ),
        contract_service: ContractServiceImpl::new(
            pool.clone(),
            template_repo,
            assignment_repo.clone(),
            client_repo.clone(),
            trainer_repo.clone(),
            registration_repo.clone(),
        ),
        status_service: WorkshopStatusServiceImpl::new(
            trainer_repo,
            registration_repo,
            assignment_repo,
            client_repo,
        ),
        auth: AuthContext::new(Uuid::new_v4(), UserRole::Admin),
    }
}

fn new_trainer(code: &str) -> NewWorkshopTrainer {
    NewWorkshopTrainer {
        workshop_date: DATE.to_string(),
        trainer_code: Some(code.to_string()),
        created_by_user_id: None,
    }
}

fn new_registration(code: &str) -> NewTrainerRegistration {
    NewTrainerRegistration {
        workshop_date: DATE.to_string(),
        trainer_code: code.to_string(),
        first_name: "Jean".to_string(),
        last_name: "Dupont".to_string(),
        email: "jean.dupont@example.com".to_string(),
        phone: None,
        company_name: Some("Acme SARL".to_string()),
        legal_form: Some("SARL".to_string()),
        share_capital: Some("10 000 €".to_string()),
        rcs_city: Some("Paris".to_string()),
        rcs_number: Some("123 456 789".to_string()),
        head_office_address: None,
        representative_name: Some("Jean Dupont".to_string()),
        representative_role: Some("Gérant".to_string()),
        company_short_name: None,
        representative_email: None,
        volunteer_attestation_accepted: None,
        created_by_user_id: None,
    }
}

fn trainer_template(is_volunteer: bool) -> NewContractTemplate {
    NewContractTemplate {
        workshop_date: DATE.to_string(),
        name: "Contrat formateur".to_string(),
        content_markdown:
            "Entre [NOM_ENTREPRISE] ([FORME_JURIDIQUE]), représentée par [NOM_REPRESENTANT], le [DATE_DU_JOUR]."
                .to_string(),
        kind: ContractKind::Trainer,
        is_volunteer,
        created_by_user_id: None,
    }
}

fn client_template() -> NewContractTemplate {
    NewContractTemplate {
        workshop_date: DATE.to_string(),
        name: "Contrat client".to_string(),
        content_markdown:
            "Atelier du [WORKSHOP_DATE] pour [CLIENT_COMPANY_NAME]. Code : [SIGNATURE_CODE]. [SIGNATURE_STATUS]."
                .to_string(),
        kind: ContractKind::Client,
        is_volunteer: false,
        created_by_user_id: None,
    }
}

fn new_client_contract(template_id: Uuid) -> NewClientContract {
    NewClientContract {
        workshop_date: DATE.to_string(),
        contract_template_id: template_id,
        client_company_name: "Globex".to_string(),
        client_representative_name: "Marie Curie".to_string(),
        client_address: None,
        client_email: "marie@globex.fr".to_string(),
        client_company_registration: None,
        created_by_user_id: None,
    }
}

#[tokio::test]
async fn trainer_lifecycle_and_rendering() {
    let h = harness().await;

    let trainer = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    assert_eq!(trainer.trainer_code, "FORM01");
    assert!(!trainer.is_claimed);

    // Duplicate code within the same workshop is rejected
    let dup = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await;
    assert!(dup.is_err());

    // Omitted code is generated server-side
    let generated = h
        .trainer_service
        .create_trainer(
            NewWorkshopTrainer {
                workshop_date: DATE.to_string(),
                trainer_code: None,
                created_by_user_id: None,
            },
            &h.auth,
        )
        .await
        .unwrap();
    assert_eq!(generated.trainer_code.len(), 6);

    // Registering claims the slot
    let registration = h
        .trainer_service
        .create_registration(new_registration("FORM01"), &h.auth)
        .await
        .unwrap();
    let trainer = h.trainer_service.get_trainer(trainer.id, &h.auth).await.unwrap();
    assert!(trainer.is_claimed);

    // Accepting a contract requires an assignment
    let err = h
        .trainer_service
        .accept_contract(registration.id, &h.auth)
        .await;
    assert!(err.is_err());

    let template = h
        .contract_service
        .create_template(trainer_template(false), &h.auth)
        .await
        .unwrap();
    h.contract_service
        .assign_contract(trainer.id, template.id, &h.auth)
        .await
        .unwrap();

    let rendered = h
        .contract_service
        .render_trainer_contract(trainer.id, &h.auth)
        .await
        .unwrap();
    assert!(rendered.contains("Acme SARL"));
    assert!(rendered.contains("SARL"));
    assert!(rendered.contains("Jean Dupont"));
    assert!(!rendered.contains("[NOM_ENTREPRISE]"));
    assert!(!rendered.contains("[DATE_DU_JOUR]"));

    // Acceptance locks the assignment
    h.trainer_service
        .accept_contract(registration.id, &h.auth)
        .await
        .unwrap();
    let locked = h.contract_service.unassign_contract(trainer.id, &h.auth).await;
    assert!(locked.is_err());
}

#[tokio::test]
async fn client_contract_signature_and_payment() {
    let h = harness().await;

    let template = h
        .contract_service
        .create_template(client_template(), &h.auth)
        .await
        .unwrap();
    let contract = h
        .contract_service
        .create_client_contract(new_client_contract(template.id), &h.auth)
        .await
        .unwrap();
    assert_eq!(contract.signature_code.len(), 8);
    assert!(!contract.is_signed);

    // A second client contract for the same workshop is rejected
    let dup = h
        .contract_service
        .create_client_contract(new_client_contract(template.id), &h.auth)
        .await;
    assert!(dup.is_err());

    // Wrong code
    let err = h
        .contract_service
        .sign_client_contract(DATE, "WRONG123", &h.auth)
        .await;
    assert!(err.is_err());

    let signed = h
        .contract_service
        .sign_client_contract(DATE, &contract.signature_code, &h.auth)
        .await
        .unwrap();
    assert!(signed.is_signed);
    assert!(signed.signed_at.is_some());

    // Re-submitting a valid code is a no-op
    let again = h
        .contract_service
        .sign_client_contract(DATE, &contract.signature_code, &h.auth)
        .await
        .unwrap();
    assert_eq!(again.signed_at, signed.signed_at);

    let rendered = h
        .contract_service
        .render_client_contract(DATE, &h.auth)
        .await
        .unwrap();
    assert!(rendered.contains("14 juin 2025"));
    assert!(rendered.contains("Globex"));
    assert!(rendered.contains(&contract.signature_code));
    assert!(rendered.contains("Signé le"));
}

#[tokio::test]
async fn workshop_status_aggregation() {
    let h = harness().await;

    // Three slots: one registered and unpaid, one registered volunteer,
    // one abandoned
    let t1 = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    let t2 = h
        .trainer_service
        .create_trainer(new_trainer("FORM02"), &h.auth)
        .await
        .unwrap();
    let t3 = h
        .trainer_service
        .create_trainer(new_trainer("FORM03"), &h.auth)
        .await
        .unwrap();
    h.trainer_service.abandon_trainer(t3.id, &h.auth).await.unwrap();

    let r1 = h
        .trainer_service
        .create_registration(new_registration("FORM01"), &h.auth)
        .await
        .unwrap();
    h.trainer_service
        .create_registration(new_registration("FORM02"), &h.auth)
        .await
        .unwrap();

    let paid_template = h
        .contract_service
        .create_template(trainer_template(false), &h.auth)
        .await
        .unwrap();
    let volunteer_template = h
        .contract_service
        .create_template(trainer_template(true), &h.auth)
        .await
        .unwrap();
    h.contract_service
        .assign_contract(t1.id, paid_template.id, &h.auth)
        .await
        .unwrap();
    h.contract_service
        .assign_contract(t2.id, volunteer_template.id, &h.auth)
        .await
        .unwrap();

    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert_eq!(status.total_trainers, 2);
    assert_eq!(status.registered_trainers, 2);
    assert!(status.all_claimed);
    // Volunteer (FORM02) is never unpaid; FORM01 still is
    assert_eq!(status.unpaid_count, 1);
    assert!(!status.all_paid);

    h.trainer_service.mark_paid(r1.id, &h.auth).await.unwrap();
    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert_eq!(status.unpaid_count, 0);
    assert!(status.all_paid);

    // A pending client contract blocks all_paid again
    let client_tpl = h
        .contract_service
        .create_template(client_template(), &h.auth)
        .await
        .unwrap();
    let client = h
        .contract_service
        .create_client_contract(new_client_contract(client_tpl.id), &h.auth)
        .await
        .unwrap();
    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert!(!status.all_paid);

    h.contract_service
        .mark_payment_received(client.id, &h.auth)
        .await
        .unwrap();
    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert!(status.all_paid);
}

#[tokio::test]
async fn template_deletion_blocked_by_dependents() {
    let h = harness().await;

    let trainer = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    let template = h
        .contract_service
        .create_template(trainer_template(false), &h.auth)
        .await
        .unwrap();
    h.contract_service
        .assign_contract(trainer.id, template.id, &h.auth)
        .await
        .unwrap();

    let err = h
        .contract_service
        .delete_template(template.id, false, &h.auth)
        .await;
    match err {
        Err(ServiceError::DependenciesPreventDeletion(deps)) => {
            assert!(deps.contains(&"contract_assignments".to_string()));
        }
        other => panic!("expected dependency error, got {:?}", other),
    }

    h.contract_service.unassign_contract(trainer.id, &h.auth).await.unwrap();
    h.contract_service
        .delete_template(template.id, false, &h.auth)
        .await
        .unwrap();
}

#[tokio::test]
async fn trainer_deletion_blocked_by_live_registration() {
    let h = harness().await;

    let trainer = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    let registration = h
        .trainer_service
        .create_registration(new_registration("FORM01"), &h.auth)
        .await
        .unwrap();

    // The registration is linked by code, not id, and must still block
    // slot deletion
    let err = h
        .trainer_service
        .delete_trainer(trainer.id, false, &h.auth)
        .await;
    match err {
        Err(ServiceError::DependenciesPreventDeletion(deps)) => {
            assert!(deps.contains(&"trainer_registrations".to_string()));
        }
        other => panic!("expected dependency error, got {:?}", other),
    }

    // The slot survives, so its code stays taken and the aggregate
    // keeps reflecting the real registration
    let dup = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await;
    assert!(dup.is_err());
    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert_eq!(status.registered_trainers, 1);

    // Removing the registration unblocks the slot
    let registration_repo = SqliteTrainerRegistrationRepository::new(h.pool.clone());
    registration_repo
        .soft_delete(registration.id, &h.auth)
        .await
        .unwrap();
    h.trainer_service
        .delete_trainer(trainer.id, false, &h.auth)
        .await
        .unwrap();

    // A fresh slot reusing the code starts with a clean slate
    h.trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    let status = h.status_service.workshop_status(DATE, &h.auth).await.unwrap();
    assert_eq!(status.total_trainers, 1);
    assert_eq!(status.registered_trainers, 0);
    assert_eq!(status.unpaid_count, 0);
}

#[tokio::test]
async fn partial_updates_round_trip() {
    let h = harness().await;

    // Registration: file URLs and phone land, everything else untouched
    h.trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();
    let registration = h
        .trainer_service
        .create_registration(new_registration("FORM01"), &h.auth)
        .await
        .unwrap();
    let updated = h
        .trainer_service
        .update_registration(
            registration.id,
            UpdateTrainerRegistration {
                phone: Some("+33 6 12 34 56 78".to_string()),
                invoice_file_url: Some("https://files.example.com/facture.pdf".to_string()),
                ..Default::default()
            },
            &h.auth,
        )
        .await
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+33 6 12 34 56 78"));
    assert_eq!(
        updated.invoice_file_url.as_deref(),
        Some("https://files.example.com/facture.pdf")
    );
    assert_eq!(updated.company_name.as_deref(), Some("Acme SARL"));
    let fetched = h
        .trainer_service
        .get_registration(registration.id, &h.auth)
        .await
        .unwrap();
    assert_eq!(fetched.invoice_file_url, updated.invoice_file_url);

    // Template: name and content change, kind stays fixed
    let template = h
        .contract_service
        .create_template(trainer_template(false), &h.auth)
        .await
        .unwrap();
    let updated = h
        .contract_service
        .update_template(
            template.id,
            UpdateContractTemplate {
                name: Some("Contrat formateur v2".to_string()),
                content_markdown: Some("Nouveau texte pour [NOM_ENTREPRISE].".to_string()),
                ..Default::default()
            },
            &h.auth,
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Contrat formateur v2");
    assert!(updated.content_markdown.contains("Nouveau texte"));
    assert_eq!(updated.kind, ContractKind::Trainer);

    // An empty update is a no-op returning the current row
    let same = h
        .contract_service
        .update_template(template.id, UpdateContractTemplate::default(), &h.auth)
        .await
        .unwrap();
    assert_eq!(same.name, "Contrat formateur v2");

    // Client contract: identity fields change, signature code survives
    let client_tpl = h
        .contract_service
        .create_template(client_template(), &h.auth)
        .await
        .unwrap();
    let contract = h
        .contract_service
        .create_client_contract(new_client_contract(client_tpl.id), &h.auth)
        .await
        .unwrap();
    let updated = h
        .contract_service
        .update_client_contract(
            contract.id,
            UpdateClientContract {
                client_address: Some("1 rue de la Paix, 75002 Paris".to_string()),
                client_email: Some("compta@globex.fr".to_string()),
                ..Default::default()
            },
            &h.auth,
        )
        .await
        .unwrap();
    assert_eq!(
        updated.client_address.as_deref(),
        Some("1 rue de la Paix, 75002 Paris")
    );
    assert_eq!(updated.client_email, "compta@globex.fr");
    assert_eq!(updated.client_company_name, "Globex");
    assert_eq!(updated.signature_code, contract.signature_code);
}

#[tokio::test]
async fn coordinator_cannot_hard_delete() {
    let h = harness().await;
    let coordinator = AuthContext::new(Uuid::new_v4(), UserRole::Coordinator);

    let trainer = h
        .trainer_service
        .create_trainer(new_trainer("FORM01"), &h.auth)
        .await
        .unwrap();

    let err = h
        .trainer_service
        .delete_trainer(trainer.id, true, &coordinator)
        .await;
    assert!(matches!(err, Err(ServiceError::PermissionDenied(_))));

    // Soft delete is allowed
    h.trainer_service
        .delete_trainer(trainer.id, false, &coordinator)
        .await
        .unwrap();
}
