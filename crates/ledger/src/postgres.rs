use async_trait::async_trait;
use common::{CourseId, LectureId, Money, PaymentId, ProgressId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::records::{PaymentRecord, ProgressRecord};
use crate::store::EnrollmentStore;
use crate::Result;

/// PostgreSQL-backed enrollment store.
///
/// The uniqueness invariants live in the schema: `payments_intent_id_key`
/// on the payment's intent identity and `progress_user_course_key` on the
/// (user, course) pair. Conflicts on those constraints are converted to
/// typed results rather than surfaced as raw database errors.
#[derive(Clone)]
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    /// Creates a new PostgreSQL enrollment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_payment(row: &PgRow) -> Result<PaymentRecord> {
        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            intent_id: row.try_get("intent_id")?,
            amount: Money::from_cents(row.try_get("amount_cents")?),
            currency: row.try_get("currency")?,
            status: row.try_get("status")?,
            course_id: CourseId::from_uuid(row.try_get::<Uuid, _>("course_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_progress(row: &PgRow) -> Result<ProgressRecord> {
        let lectures: Vec<Uuid> = row.try_get("completed_lectures")?;
        Ok(ProgressRecord {
            id: ProgressId::from_uuid(row.try_get::<Uuid, _>("id")?),
            course_id: CourseId::from_uuid(row.try_get::<Uuid, _>("course_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            completed_lectures: lectures.into_iter().map(LectureId::from_uuid).collect(),
        })
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn insert_payment(&self, record: PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, intent_id, amount_cents, currency, status, course_id, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.intent_id)
        .bind(record.amount.cents())
        .bind(&record.currency)
        .bind(&record.status)
        .bind(record.course_id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("payments_intent_id_key")
            {
                return LedgerError::DuplicateIntent {
                    intent_id: record.intent_id.clone(),
                };
            }
            LedgerError::Database(e)
        })?;

        Ok(())
    }

    async fn payment_by_intent(&self, intent_id: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            "SELECT id, intent_id, amount_cents, currency, status, course_id, user_id, created_at \
             FROM payments WHERE intent_id = $1",
        )
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }

    async fn succeeded_payments(&self) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            "SELECT id, intent_id, amount_cents, currency, status, course_id, user_id, created_at \
             FROM payments WHERE status = 'succeeded' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    async fn insert_progress_if_absent(&self, record: ProgressRecord) -> Result<bool> {
        let lectures: Vec<Uuid> = record
            .completed_lectures
            .iter()
            .map(|l| l.as_uuid())
            .collect();

        let result = sqlx::query(
            r#"
            INSERT INTO progress (id, course_id, user_id, completed_lectures)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT progress_user_course_key DO NOTHING
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.course_id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(&lectures)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn progress_for(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        let row = sqlx::query(
            "SELECT id, course_id, user_id, completed_lectures \
             FROM progress WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_progress).transpose()
    }

    async fn complete_lecture(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lecture_id: LectureId,
    ) -> Result<ProgressRecord> {
        // Append-if-absent in one statement; a no-op when the lecture is
        // already recorded.
        sqlx::query(
            r#"
            UPDATE progress
            SET completed_lectures = array_append(completed_lectures, $3)
            WHERE user_id = $1 AND course_id = $2
              AND NOT (completed_lectures @> ARRAY[$3]::uuid[])
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .bind(lecture_id.as_uuid())
        .execute(&self.pool)
        .await?;

        self.progress_for(user_id, course_id)
            .await?
            .ok_or(LedgerError::ProgressNotFound { user_id, course_id })
    }
}
