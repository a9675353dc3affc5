use crate::auth::AuthContext;
use crate::domains::core::repository::{FindById, HardDeletable, SoftDeletable};
use crate::domains::trainer::types::{NewWorkshopTrainer, WorkshopTrainer, WorkshopTrainerRow};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, SqlitePool};
use uuid::Uuid;

/// Flags a trainer slot can move through after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerFlag {
    Claimed,
    Abandoned,
    CodeSent,
}

impl TrainerFlag {
    fn column(&self) -> &'static str {
        match self {
            TrainerFlag::Claimed => "is_claimed",
            TrainerFlag::Abandoned => "is_abandoned",
            TrainerFlag::CodeSent => "code_sent",
        }
    }
}

/// Trait defining workshop trainer repository operations
#[async_trait]
pub trait WorkshopTrainerRepository:
    FindById<WorkshopTrainer> + SoftDeletable + HardDeletable + Send + Sync
{
    async fn create(
        &self,
        new_trainer: &NewWorkshopTrainer,
        trainer_code: &str,
        auth: &AuthContext,
    ) -> DomainResult<WorkshopTrainer>;

    /// All trainer slots for one workshop date, abandoned ones included
    async fn find_by_workshop_date(&self, workshop_date: &str) -> DomainResult<Vec<WorkshopTrainer>>;

    async fn find_by_code(
        &self,
        workshop_date: &str,
        trainer_code: &str,
    ) -> DomainResult<WorkshopTrainer>;

    async fn find_all(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
    ) -> DomainResult<PaginatedResult<WorkshopTrainer>>;

    async fn set_flag(&self, id: Uuid, flag: TrainerFlag, auth: &AuthContext) -> DomainResult<WorkshopTrainer>;
}

/// SQLite implementation for WorkshopTrainerRepository
#[derive(Debug, Clone)]
pub struct SqliteWorkshopTrainerRepository {
    pool: SqlitePool,
}

impl SqliteWorkshopTrainerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: WorkshopTrainerRow) -> DomainResult<WorkshopTrainer> {
        row.into_entity()
    }
}

#[async_trait]
impl FindById<WorkshopTrainer> for SqliteWorkshopTrainerRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<WorkshopTrainer> {
        let row = query_as::<_, WorkshopTrainerRow>(
            "SELECT * FROM workshop_trainers WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("WorkshopTrainer".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl SoftDeletable for SqliteWorkshopTrainerRepository {
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let deleted_by = auth.user_id.to_string();

        let result = query(
            "UPDATE workshop_trainers SET
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
            // Either not found or already deleted
            Err(DomainError::EntityNotFound("WorkshopTrainer".to_string(), id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HardDeletable for SqliteWorkshopTrainerRepository {
    fn entity_name(&self) -> &'static str {
        "workshop_trainers"
    }

    async fn hard_delete(&self, id: Uuid, _auth: &AuthContext) -> DomainResult<()> {
        let result = query("DELETE FROM workshop_trainers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("WorkshopTrainer".to_string(), id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WorkshopTrainerRepository for SqliteWorkshopTrainerRepository {
    async fn create(
        &self,
        new_trainer: &NewWorkshopTrainer,
        trainer_code: &str,
        auth: &AuthContext,
    ) -> DomainResult<WorkshopTrainer> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO workshop_trainers (
                id, workshop_date, trainer_code,
                is_claimed, is_abandoned, code_sent,
                created_at, updated_at, created_by_user_id, updated_by_user_id,
                deleted_at, deleted_by_user_id
            ) VALUES (?, ?, ?, 0, 0, 0, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_trainer.workshop_date)
        .bind(trainer_code)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_workshop_date(&self, workshop_date: &str) -> DomainResult<Vec<WorkshopTrainer>> {
        let rows = query_as::<_, WorkshopTrainerRow>(
            "SELECT * FROM workshop_trainers
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
    ) -> DomainResult<WorkshopTrainer> {
        let row = query_as::<_, WorkshopTrainerRow>(
            "SELECT * FROM workshop_trainers
             WHERE workshop_date = ? AND trainer_code = ? AND deleted_at IS NULL",
        )
        .bind(workshop_date)
        .bind(trainer_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| {
            DomainError::EntityNotFoundByDate("WorkshopTrainer".to_string(), workshop_date.to_string())
        })?;

        Self::map_row_to_entity(row)
    }

    async fn find_all(
        &self,
        params: PaginationParams,
        workshop_date: Option<&str>,
    ) -> DomainResult<PaginatedResult<WorkshopTrainer>> {
        let offset = (params.page - 1) * params.per_page;

        let mut conditions = vec!["deleted_at IS NULL"];
        let mut bind_values: Vec<String> = Vec::new();

        if let Some(date) = workshop_date {
            conditions.push("workshop_date = ?");
            bind_values.push(date.to_string());
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let count_query_str = format!("SELECT COUNT(*) FROM workshop_trainers {}", where_clause);
        let mut count_query = query_scalar(&count_query_str);
        for val in &bind_values {
            count_query = count_query.bind(val);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await.map_err(DbError::from)?;

        let select_query_str = format!(
            "SELECT * FROM workshop_trainers {} ORDER BY workshop_date DESC, trainer_code ASC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut select_query = query_as::<_, WorkshopTrainerRow>(&select_query_str);
        for val in &bind_values {
            select_query = select_query.bind(val);
        }
        select_query = select_query.bind(params.per_page as i64);
        select_query = select_query.bind(offset as i64);

        let rows = select_query.fetch_all(&self.pool).await.map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<WorkshopTrainer>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }

    async fn set_flag(&self, id: Uuid, flag: TrainerFlag, auth: &AuthContext) -> DomainResult<WorkshopTrainer> {
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        // Column name comes from the closed TrainerFlag set, never from input
        let query_str = format!(
            "UPDATE workshop_trainers SET {} = 1, updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND deleted_at IS NULL",
            flag.column()
        );

        let result = query(&query_str)
            .bind(&now_str)
            .bind(&user_id_str)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("WorkshopTrainer".to_string(), id));
        }

        self.find_by_id(id).await
    }
}
