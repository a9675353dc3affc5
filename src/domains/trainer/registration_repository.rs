use crate::auth::AuthContext;
use crate::domains::core::repository::{FindById, SoftDeletable};
use crate::domains::trainer::types::{
    NewTrainerRegistration, TrainerRegistration, TrainerRegistrationRow, UpdateTrainerRegistration,
};
use crate::errors::{DbError, DomainError, DomainResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteArguments;
use sqlx::{query, query_as, Arguments, SqlitePool};
use uuid::Uuid;

/// Trait defining trainer registration repository operations
#[async_trait]
pub trait TrainerRegistrationRepository:
    FindById<TrainerRegistration> + SoftDeletable + Send + Sync
{
    async fn create(
        &self,
        new_registration: &NewTrainerRegistration,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateTrainerRegistration,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration>;

    async fn find_by_workshop_date(
        &self,
        workshop_date: &str,
    ) -> DomainResult<Vec<TrainerRegistration>>;

    /// Natural-key lookup: registrations are linked to trainer slots by code
    async fn find_by_code(
        &self,
        workshop_date: &str,
        trainer_code: &str,
    ) -> DomainResult<Option<TrainerRegistration>>;

    async fn set_contract_accepted(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration>;

    async fn set_paid(&self, id: Uuid, auth: &AuthContext) -> DomainResult<TrainerRegistration>;
}

/// SQLite implementation for TrainerRegistrationRepository
#[derive(Debug, Clone)]
pub struct SqliteTrainerRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteTrainerRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: TrainerRegistrationRow) -> DomainResult<TrainerRegistration> {
        row.into_entity()
    }

    async fn set_bool_column(
        &self,
        id: Uuid,
        column: &'static str,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration> {
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let query_str = format!(
            "UPDATE trainer_registrations SET {} = 1, updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND deleted_at IS NULL",
            column
        );

        let result = query(&query_str)
            .bind(&now_str)
            .bind(&user_id_str)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound(
                "TrainerRegistration".to_string(),
                id,
            ));
        }

        self.find_by_id(id).await
    }
}

#[async_trait]
impl FindById<TrainerRegistration> for SqliteTrainerRegistrationRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<TrainerRegistration> {
        let row = query_as::<_, TrainerRegistrationRow>(
            "SELECT * FROM trainer_registrations WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("TrainerRegistration".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl SoftDeletable for SqliteTrainerRegistrationRepository {
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let deleted_by = auth.user_id.to_string();

        let result = query(
            "UPDATE trainer_registrations SET
             deleted_at = ?,
             deleted_by_user_id = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(deleted_by)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound(
                "TrainerRegistration".to_string(),
                id,
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TrainerRegistrationRepository for SqliteTrainerRegistrationRepository {
    async fn create(
        &self,
        new_registration: &NewTrainerRegistration,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();
        let attestation = new_registration.volunteer_attestation_accepted.unwrap_or(false) as i64;

        query(
            r#"
            INSERT INTO trainer_registrations (
                id, workshop_date, trainer_code,
                first_name, last_name, email, phone,
                company_name, legal_form, share_capital, rcs_city, rcs_number,
                head_office_address, representative_name, representative_role,
                company_short_name, representative_email,
                contract_accepted, invoice_file_url, rib_file_url, is_paid,
                volunteer_attestation_accepted,
                created_at, updated_at, created_by_user_id, updated_by_user_id,
                deleted_at, deleted_by_user_id
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                0, NULL, NULL, 0, ?,
                ?, ?, ?, ?, NULL, NULL
            )
            "#,
        )
        .bind(id.to_string())
        .bind(&new_registration.workshop_date)
        .bind(&new_registration.trainer_code)
        .bind(&new_registration.first_name)
        .bind(&new_registration.last_name)
        .bind(&new_registration.email)
        .bind(&new_registration.phone)
        .bind(&new_registration.company_name)
        .bind(&new_registration.legal_form)
        .bind(&new_registration.share_capital)
        .bind(&new_registration.rcs_city)
        .bind(&new_registration.rcs_number)
        .bind(&new_registration.head_office_address)
        .bind(&new_registration.representative_name)
        .bind(&new_registration.representative_role)
        .bind(&new_registration.company_short_name)
        .bind(&new_registration.representative_email)
        .bind(attestation)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateTrainerRegistration,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration> {
        // Ensure it exists before building the dynamic update
        let _current = self.find_by_id(id).await?;

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut set_clauses: Vec<String> = Vec::new();
        let mut args = SqliteArguments::default();

        macro_rules! add_update {
            ($field:ident) => {
                if let Some(val) = &update_data.$field {
                    set_clauses.push(format!("{} = ?", stringify!($field)));
                    let _ = args.add(val);
                }
            };
        }

        add_update!(phone);
        add_update!(company_name);
        add_update!(legal_form);
        add_update!(share_capital);
        add_update!(rcs_city);
        add_update!(rcs_number);
        add_update!(head_office_address);
        add_update!(representative_name);
        add_update!(representative_role);
        add_update!(company_short_name);
        add_update!(representative_email);
        add_update!(invoice_file_url);
        add_update!(rib_file_url);

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(&now_str);
        set_clauses.push("updated_by_user_id = ?".to_string());
        let _ = args.add(&user_id_str);

        let query_str = format!(
            "UPDATE trainer_registrations SET {} WHERE id = ? AND deleted_at IS NULL",
            set_clauses.join(", ")
        );
        let _ = args.add(id.to_string());

        let result = sqlx::query_with(&query_str, args)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound(
                "TrainerRegistration".to_string(),
                id,
            ));
        }

        self.find_by_id(id).await
    }

    async fn find_by_workshop_date(
        &self,
        workshop_date: &str,
    ) -> DomainResult<Vec<TrainerRegistration>> {
        let rows = query_as::<_, TrainerRegistrationRow>(
            "SELECT * FROM trainer_registrations
             WHERE workshop_date = ? AND deleted_at IS NULL
             ORDER BY trainer_code ASC",
        )
        .bind(workshop_date)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter().map(Self::map_row_to_entity).collect()
    }

    async fn find_by_code(
        &self,
        workshop_date: &str,
        trainer_code: &str,
    ) -> DomainResult<Option<TrainerRegistration>> {
        let row = query_as::<_, TrainerRegistrationRow>(
            "SELECT * FROM trainer_registrations
             WHERE workshop_date = ? AND trainer_code = ? AND deleted_at IS NULL",
        )
        .bind(workshop_date)
        .bind(trainer_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.map(Self::map_row_to_entity).transpose()
    }

    async fn set_contract_accepted(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> DomainResult<TrainerRegistration> {
        self.set_bool_column(id, "contract_accepted", auth).await
    }

    async fn set_paid(&self, id: Uuid, auth: &AuthContext) -> DomainResult<TrainerRegistration> {
        self.set_bool_column(id, "is_paid", auth).await
    }
}
