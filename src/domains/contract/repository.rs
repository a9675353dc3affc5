use crate::auth::AuthContext;
use crate::domains::core::repository::{FindById, HardDeletable, SoftDeletable};
use crate::domains::contract::types::{
    ClientContract, ClientContractRow, ContractAssignment, ContractAssignmentRow, ContractKind,
    ContractTemplate, ContractTemplateRow, NewClientContract, NewContractTemplate,
    UpdateClientContract, UpdateContractTemplate, VolunteerBinding,
};
use crate::domains::trainer::types::parse_required_uuid;
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteArguments;
use sqlx::{query, query_as, query_scalar, Arguments, FromRow, SqlitePool};
use uuid::Uuid;

/// Trait defining contract template repository operations
#[async_trait]
pub trait ContractTemplateRepository:
    FindById<ContractTemplate> + SoftDeletable + HardDeletable + Send + Sync
{
    async fn create(
        &self,
        new_template: &NewContractTemplate,
        auth: &AuthContext,
    ) -> DomainResult<ContractTemplate>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateContractTemplate,
        auth: &AuthContext,
    ) -> DomainResult<ContractTemplate>;

    async fn find_by_workshop_date(
        &self,
        workshop_date: &str,
        kind: Option<ContractKind>,
    ) -> DomainResult<Vec<ContractTemplate>>;

    async fn find_all(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
    ) -> DomainResult<PaginatedResult<ContractTemplate>>;
}

/// SQLite implementation for ContractTemplateRepository
#[derive(Debug, Clone)]
pub struct SqliteContractTemplateRepository {
    pool: SqlitePool,
}

impl SqliteContractTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: ContractTemplateRow) -> DomainResult<ContractTemplate> {
        row.into_entity()
    }
}

#[async_trait]
impl FindById<ContractTemplate> for SqliteContractTemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<ContractTemplate> {
        let row = query_as::<_, ContractTemplateRow>(
            "SELECT * FROM contract_templates WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("ContractTemplate".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl SoftDeletable for SqliteContractTemplateRepository {
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let deleted_by = auth.user_id.to_string();

        let result = query(
            "UPDATE contract_templates SET
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
            Err(DomainError::EntityNotFound("ContractTemplate".to_string(), id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HardDeletable for SqliteContractTemplateRepository {
    fn entity_name(&self) -> &'static str {
        "contract_templates"
    }

    async fn hard_delete(&self, id: Uuid, _auth: &AuthContext) -> DomainResult<()> {
        let result = query("DELETE FROM contract_templates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("ContractTemplate".to_string(), id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContractTemplateRepository for SqliteContractTemplateRepository {
    async fn create(
        &self,
        new_template: &NewContractTemplate,
        auth: &AuthContext,
    ) -> DomainResult<ContractTemplate> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO contract_templates (
                id, workshop_date, name, content_markdown, kind, is_volunteer,
                created_at, updated_at, created_by_user_id, updated_by_user_id,
                deleted_at, deleted_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_template.workshop_date)
        .bind(&new_template.name)
        .bind(&new_template.content_markdown)
        .bind(new_template.kind.as_str())
        .bind(new_template.is_volunteer as i64)
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
        update_data: &UpdateContractTemplate,
        auth: &AuthContext,
    ) -> DomainResult<ContractTemplate> {
        let _current = self.find_by_id(id).await?;

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut set_clauses: Vec<String> = Vec::new();
        let mut args = SqliteArguments::default();

        if let Some(name) = &update_data.name {
            set_clauses.push("name = ?".to_string());
            let _ = args.add(name);
        }
        if let Some(content) = &update_data.content_markdown {
            set_clauses.push("content_markdown = ?".to_string());
            let _ = args.add(content);
        }
        if let Some(is_volunteer) = update_data.is_volunteer {
            set_clauses.push("is_volunteer = ?".to_string());
            let _ = args.add(is_volunteer as i64);
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(&now_str);
        set_clauses.push("updated_by_user_id = ?".to_string());
        let _ = args.add(&user_id_str);

        let query_str = format!(
            "UPDATE contract_templates SET {} WHERE id = ? AND deleted_at IS NULL",
            set_clauses.join(", ")
        );
        let _ = args.add(id.to_string());

        let result = sqlx::query_with(&query_str, args)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("ContractTemplate".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find_by_workshop_date(
        &self,
        workshop_date: &str,
        kind: Option<ContractKind>,
    ) -> DomainResult<Vec<ContractTemplate>> {
        let rows = match kind {
            Some(kind) => {
                query_as::<_, ContractTemplateRow>(
                    "SELECT * FROM contract_templates
                     WHERE workshop_date = ? AND kind = ? AND deleted_at IS NULL
                     ORDER BY name ASC",
                )
                .bind(workshop_date)
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, ContractTemplateRow>(
                    "SELECT * FROM contract_templates
                     WHERE workshop_date = ? AND deleted_at IS NULL
                     ORDER BY name ASC",
                )
                .bind(workshop_date)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(DbError::from)?;

        rows.into_iter().map(Self::map_row_to_entity).collect()
    }

    async fn find_all(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
    ) -> DomainResult<PaginatedResult<ContractTemplate>> {
        let offset = (params.page - 1) * params.per_page;

        let mut conditions = vec!["deleted_at IS NULL"];
        let mut bind_values: Vec<String> = Vec::new();

        if let Some(date) = workshop_date {
            conditions.push("workshop_date = ?");
            bind_values.push(date.to_string());
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let count_query_str = format!("SELECT COUNT(*) FROM contract_templates {}", where_clause);
        let mut count_query = query_scalar(&count_query_str);
        for val in &bind_values {
            count_query = count_query.bind(val);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await.map_err(DbError::from)?;

        let select_query_str = format!(
            "SELECT * FROM contract_templates {} ORDER BY workshop_date DESC, name ASC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut select_query = query_as::<_, ContractTemplateRow>(&select_query_str);
        for val in &bind_values {
            select_query = select_query.bind(val);
        }
        select_query = select_query.bind(params.per_page as i64);
        select_query = select_query.bind(offset as i64);

        let rows = select_query.fetch_all(&self.pool).await.map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<ContractTemplate>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}

/// Trait defining contract assignment repository operations
#[async_trait]
pub trait ContractAssignmentRepository: Send + Sync {
    async fn assign(
        &self,
        trainer_id: Uuid,
        contract_template_id: Uuid,
        auth: &AuthContext,
    ) -> DomainResult<ContractAssignment>;

    /// The live assignment for a trainer, if any. More than one live row
    /// violates the one-assignment-per-trainer invariant and is reported as
    /// a conflict instead of silently picking one.
    async fn find_for_trainer(&self, trainer_id: Uuid) -> DomainResult<Option<ContractAssignment>>;

    /// Assignment joined with its template's volunteer flag, for aggregation
    async fn find_volunteer_binding(
        &self,
        trainer_id: Uuid,
    ) -> DomainResult<Option<VolunteerBinding>>;

    async fn unassign(&self, trainer_id: Uuid, auth: &AuthContext) -> DomainResult<()>;
}

#[derive(Debug, Clone, FromRow)]
struct VolunteerBindingRow {
    contract_template_id: String,
    is_volunteer: i64,
}

/// SQLite implementation for ContractAssignmentRepository
#[derive(Debug, Clone)]
pub struct SqliteContractAssignmentRepository {
    pool: SqlitePool,
}

impl SqliteContractAssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractAssignmentRepository for SqliteContractAssignmentRepository {
    async fn assign(
        &self,
        trainer_id: Uuid,
        contract_template_id: Uuid,
        auth: &AuthContext,
    ) -> DomainResult<ContractAssignment> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO contract_assignments (
                id, trainer_id, contract_template_id,
                created_at, updated_at, created_by_user_id, updated_by_user_id,
                deleted_at, deleted_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(trainer_id.to_string())
        .bind(contract_template_id.to_string())
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = query_as::<_, ContractAssignmentRow>(
            "SELECT * FROM contract_assignments WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.into_entity()
    }

    async fn find_for_trainer(&self, trainer_id: Uuid) -> DomainResult<Option<ContractAssignment>> {
        let rows = query_as::<_, ContractAssignmentRow>(
            "SELECT * FROM contract_assignments
             WHERE trainer_id = ? AND deleted_at IS NULL
             ORDER BY created_at DESC",
        )
        .bind(trainer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        if rows.len() > 1 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "trainer {} has {} live contract assignments, expected at most one",
                trainer_id,
                rows.len()
            ))));
        }

        rows.into_iter().next().map(|r| r.into_entity()).transpose()
    }

    async fn find_volunteer_binding(
        &self,
        trainer_id: Uuid,
    ) -> DomainResult<Option<VolunteerBinding>> {
        let rows = query_as::<_, VolunteerBindingRow>(
            r#"
            SELECT ca.contract_template_id AS contract_template_id,
                   ct.is_volunteer AS is_volunteer
            FROM contract_assignments ca
            JOIN contract_templates ct ON ct.id = ca.contract_template_id
            WHERE ca.trainer_id = ? AND ca.deleted_at IS NULL AND ct.deleted_at IS NULL
            "#,
        )
        .bind(trainer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        if rows.len() > 1 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "trainer {} has {} live contract assignments, expected at most one",
                trainer_id,
                rows.len()
            ))));
        }

        rows.into_iter()
            .next()
            .map(|row| {
                Ok(VolunteerBinding {
                    contract_template_id: parse_required_uuid(
                        &row.contract_template_id,
                        "ContractAssignment.contract_template_id",
                    )?,
                    is_volunteer: row.is_volunteer != 0,
                })
            })
            .transpose()
    }

    async fn unassign(&self, trainer_id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let deleted_by = auth.user_id.to_string();

        let result = query(
            "UPDATE contract_assignments SET
             deleted_at = ?,
             deleted_by_user_id = ?
             WHERE trainer_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(deleted_by)
        .bind(trainer_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound(
                "ContractAssignment".to_string(),
                trainer_id,
            ))
        } else {
            Ok(())
        }
    }
}

/// Trait defining client contract repository operations
#[async_trait]
pub trait ClientContractRepository: FindById<ClientContract> + SoftDeletable + Send + Sync {
    async fn create(
        &self,
        new_contract: &NewClientContract,
        signature_code: &str,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateClientContract,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract>;

    /// The single live client contract for a workshop date, if any
    async fn find_by_workshop_date(&self, workshop_date: &str)
        -> DomainResult<Option<ClientContract>>;

    async fn set_code_sent(&self, id: Uuid, auth: &AuthContext) -> DomainResult<ClientContract>;

    async fn set_signed(
        &self,
        id: Uuid,
        signed_at: DateTime<Utc>,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract>;

    async fn set_payment_received(&self, id: Uuid, auth: &AuthContext)
        -> DomainResult<ClientContract>;
}

/// SQLite implementation for ClientContractRepository
#[derive(Debug, Clone)]
pub struct SqliteClientContractRepository {
    pool: SqlitePool,
}

impl SqliteClientContractRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: ClientContractRow) -> DomainResult<ClientContract> {
        row.into_entity()
    }

    async fn set_bool_column(
        &self,
        id: Uuid,
        column: &'static str,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract> {
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let query_str = format!(
            "UPDATE client_contracts SET {} = 1, updated_at = ?, updated_by_user_id = ?
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
            return Err(DomainError::EntityNotFound("ClientContract".to_string(), id));
        }

        self.find_by_id(id).await
    }
}

#[async_trait]
impl FindById<ClientContract> for SqliteClientContractRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<ClientContract> {
        let row = query_as::<_, ClientContractRow>(
            "SELECT * FROM client_contracts WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("ClientContract".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl SoftDeletable for SqliteClientContractRepository {
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let deleted_by = auth.user_id.to_string();

        let result = query(
            "UPDATE client_contracts SET
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
            Err(DomainError::EntityNotFound("ClientContract".to_string(), id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClientContractRepository for SqliteClientContractRepository {
    async fn create(
        &self,
        new_contract: &NewClientContract,
        signature_code: &str,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO client_contracts (
                id, workshop_date, contract_template_id,
                client_company_name, client_representative_name, client_address,
                client_email, client_company_registration,
                signature_code, is_signed, signed_at, code_sent, payment_received,
                created_at, updated_at, created_by_user_id, updated_by_user_id,
                deleted_at, deleted_by_user_id
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, 0, 0,
                ?, ?, ?, ?, NULL, NULL
            )
            "#,
        )
        .bind(id.to_string())
        .bind(&new_contract.workshop_date)
        .bind(new_contract.contract_template_id.to_string())
        .bind(&new_contract.client_company_name)
        .bind(&new_contract.client_representative_name)
        .bind(&new_contract.client_address)
        .bind(&new_contract.client_email)
        .bind(&new_contract.client_company_registration)
        .bind(signature_code)
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
        update_data: &UpdateClientContract,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract> {
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

        add_update!(client_company_name);
        add_update!(client_representative_name);
        add_update!(client_address);
        add_update!(client_email);
        add_update!(client_company_registration);

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(&now_str);
        set_clauses.push("updated_by_user_id = ?".to_string());
        let _ = args.add(&user_id_str);

        let query_str = format!(
            "UPDATE client_contracts SET {} WHERE id = ? AND deleted_at IS NULL",
            set_clauses.join(", ")
        );
        let _ = args.add(id.to_string());

        let result = sqlx::query_with(&query_str, args)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("ClientContract".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find_by_workshop_date(
        &self,
        workshop_date: &str,
    ) -> DomainResult<Option<ClientContract>> {
        let rows = query_as::<_, ClientContractRow>(
            "SELECT * FROM client_contracts
             WHERE workshop_date = ? AND deleted_at IS NULL
             ORDER BY created_at DESC",
        )
        .bind(workshop_date)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        if rows.len() > 1 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "workshop {} has {} live client contracts, expected at most one",
                workshop_date,
                rows.len()
            ))));
        }

        rows.into_iter().next().map(Self::map_row_to_entity).transpose()
    }

    async fn set_code_sent(&self, id: Uuid, auth: &AuthContext) -> DomainResult<ClientContract> {
        self.set_bool_column(id, "code_sent", auth).await
    }

    async fn set_signed(
        &self,
        id: Uuid,
        signed_at: DateTime<Utc>,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract> {
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let result = query(
            "UPDATE client_contracts SET
             is_signed = 1, signed_at = ?, updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(signed_at.to_rfc3339())
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("ClientContract".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn set_payment_received(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> DomainResult<ClientContract> {
        self.set_bool_column(id, "payment_received", auth).await
    }
}
