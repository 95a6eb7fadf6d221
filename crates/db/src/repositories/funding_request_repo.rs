//! Repository for the `funding_document_requests` table.

use mimaropa_core::funding::FundingDocument;
use mimaropa_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use super::province_condition;
use crate::models::funding_request::{FundingRequest, FundingRequestFilter, NewFundingRequest};

/// Column list for `funding_document_requests` queries.
const COLUMNS: &str = "\
    id, tna_id, application_id, proponent_id, requested_by, status, requested_at, \
    due_date, notes, funding_documents, created_at, updated_at";

/// Provides reads and guarded updates for funding document requests.
pub struct FundingRequestRepo;

impl FundingRequestRepo {
    /// Insert a new request.
    ///
    /// Fails with a unique violation on `uq_funding_document_requests_tna_id`
    /// when the TNA already has a request.
    pub async fn create(
        pool: &PgPool,
        input: &NewFundingRequest,
    ) -> Result<FundingRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO funding_document_requests \
                (tna_id, application_id, proponent_id, requested_by, status, \
                 due_date, notes, funding_documents) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FundingRequest>(&query)
            .bind(input.tna_id)
            .bind(input.application_id)
            .bind(input.proponent_id)
            .bind(input.requested_by)
            .bind(&input.status)
            .bind(input.due_date)
            .bind(&input.notes)
            .bind(Json(&input.funding_documents))
            .fetch_one(pool)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FundingRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM funding_document_requests WHERE id = $1");
        sqlx::query_as::<_, FundingRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the request created for a TNA, if any.
    pub async fn find_by_tna_id(
        pool: &PgPool,
        tna_id: DbId,
    ) -> Result<Option<FundingRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM funding_document_requests WHERE tna_id = $1");
        sqlx::query_as::<_, FundingRequest>(&query)
            .bind(tna_id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &FundingRequestFilter,
    ) -> Result<Vec<FundingRequest>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if filter.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
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
            "SELECT {COLUMNS} FROM funding_document_requests {where_clause} \
             ORDER BY requested_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, FundingRequest>(&query);
        if let Some(s) = &filter.status {
            q = q.bind(s);
        }
        if let Some(pid) = filter.proponent_id {
            q = q.bind(pid);
        }
        if let Some(province) = &filter.province {
            q = q.bind(province);
        }
        q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await
    }

    /// Guarded request-level status move.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<Option<FundingRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE funding_document_requests SET status = $3 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FundingRequest>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }

    /// Replace the document list while the request is in one of `statuses`.
    ///
    /// Returns `None` if the row is missing or its status is not listed.
    pub async fn update_documents(
        pool: &PgPool,
        id: DbId,
        documents: &[FundingDocument],
        statuses: &[String],
    ) -> Result<Option<FundingRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE funding_document_requests SET funding_documents = $2 \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FundingRequest>(&query)
            .bind(id)
            .bind(Json(documents))
            .bind(statuses)
            .fetch_optional(pool)
            .await
    }
}
