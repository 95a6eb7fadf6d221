//! Repository for the `applications` table.

use mimaropa_core::types::DbId;
use sqlx::PgPool;

use super::province_condition;
use crate::models::application::{Application, ApplicationFilter, CreateApplication};

/// Column list for `applications` queries.
const COLUMNS: &str =
    "id, proponent_id, program_name, enterprise_name, status, created_at, updated_at";

/// Provides CRUD operations for applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Submit a new application for `proponent_id`.
    pub async fn create(
        pool: &PgPool,
        proponent_id: DbId,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (proponent_id, program_name, enterprise_name) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(proponent_id)
            .bind(&input.program_name)
            .bind(input.enterprise_name.trim())
            .fetch_one(pool)
            .await
    }

    /// Find an application by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List applications, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if filter.proponent_id.is_some() {
            conditions.push(format!("proponent_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.province.is_some() {
            conditions.push(province_condition(param_idx));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM applications {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Application>(&query);
        if let Some(pid) = filter.proponent_id {
            q = q.bind(pid);
        }
        if let Some(province) = &filter.province {
            q = q.bind(province);
        }
        q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await
    }
}
