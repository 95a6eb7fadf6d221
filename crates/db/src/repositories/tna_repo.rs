//! Repository for the `tnas` table.
//!
//! Every status-changing method takes the expected current status and the
//! target status resolved by the core transition table, and only writes when
//! the row is still in the expected status.

use mimaropa_core::application::ApplicationStatus;
use mimaropa_core::attachment::FileAttachment;
use mimaropa_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use super::province_condition;
use crate::models::tna::{NewTna, Tna, TnaFilter};

/// Column list for `tnas` queries.
const COLUMNS: &str = "\
    id, application_id, proponent_id, scheduled_by, completed_by, updated_by, \
    forwarded_by, reviewed_by, program_name, scheduled_date, scheduled_time, \
    location, contact_person, contact_phone, email, assessment_team, notes, \
    status, tna_report, report_summary, report_recommendations, signed_tna_report, \
    forwarded_to_dost_mimaropa_at, completed_at, reviewed_at, signed_at, \
    created_at, updated_at";

/// Provides reads and guarded status updates for TNAs.
pub struct TnaRepo;

impl TnaRepo {
    /// Insert a `scheduled` TNA and mark its application `tna_scheduled`.
    ///
    /// Both writes happen in one transaction.
    pub async fn schedule(pool: &PgPool, input: &NewTna) -> Result<Tna, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO tnas \
                (application_id, proponent_id, scheduled_by, updated_by, program_name, \
                 scheduled_date, scheduled_time, location, contact_person, contact_phone, \
                 email, assessment_team, notes) \
             VALUES ($1, $2, $3, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        let tna = sqlx::query_as::<_, Tna>(&insert_query)
            .bind(input.application_id)
            .bind(input.proponent_id)
            .bind(input.scheduled_by)
            .bind(&input.program_name)
            .bind(input.scheduled_date)
            .bind(&input.scheduled_time)
            .bind(&input.location)
            .bind(&input.contact_person)
            .bind(&input.contact_phone)
            .bind(&input.email)
            .bind(Json(&input.assessment_team))
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE applications SET status = $2 WHERE id = $1")
            .bind(input.application_id)
            .bind(ApplicationStatus::TnaScheduled.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(tna)
    }

    /// Find a TNA by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tnas WHERE id = $1");
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List TNAs matching `filter`, most recently updated first.
    pub async fn list(pool: &PgPool, filter: &TnaFilter) -> Result<Vec<Tna>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if filter.statuses.is_some() {
            conditions.push(format!("status = ANY(${param_idx})"));
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
            "SELECT {COLUMNS} FROM tnas {where_clause} \
             ORDER BY updated_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Tna>(&query);
        if let Some(statuses) = &filter.statuses {
            q = q.bind(statuses);
        }
        if let Some(pid) = filter.proponent_id {
            q = q.bind(pid);
        }
        if let Some(province) = &filter.province {
            q = q.bind(province);
        }
        q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await
    }

    /// Plain status move, stamping `updated_by`.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, updated_by = $4 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Move to `completed`, recording who completed it and when.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, completed_by = $4, completed_at = NOW(), updated_by = $4 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Attach the assessment report and move to `report_uploaded`.
    #[allow(clippy::too_many_arguments)]
    pub async fn attach_report(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        report: &FileAttachment,
        summary: Option<&str>,
        recommendations: Option<&str>,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, tna_report = $4, \
                report_summary = COALESCE($5, report_summary), \
                report_recommendations = COALESCE($6, report_recommendations), \
                updated_by = $7 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(Json(report))
            .bind(summary)
            .bind(recommendations)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Move to `forwarded_to_dost_mimaropa`, stamping the forward time.
    pub async fn forward(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, forwarded_by = $4, \
                forwarded_to_dost_mimaropa_at = NOW(), updated_by = $4 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Record a central-office review decision.
    ///
    /// `comments` overwrite `notes` only when supplied.
    pub async fn record_review(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        comments: Option<&str>,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, notes = COALESCE($4, notes), \
                reviewed_by = $5, reviewed_at = NOW(), updated_by = $5 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(comments)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Attach the RD-signed report and move to `signed_by_rd`.
    pub async fn attach_signed_report(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        report: &FileAttachment,
        actor: DbId,
    ) -> Result<Option<Tna>, sqlx::Error> {
        let query = format!(
            "UPDATE tnas SET status = $3, signed_tna_report = $4, signed_at = NOW(), \
                updated_by = $5 \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tna>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(Json(report))
            .bind(actor)
            .fetch_optional(pool)
            .await
    }
}
