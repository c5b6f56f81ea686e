//! # Report Repository
//!
//! Report rows are written only by the aggregator; everything else reads.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Report;

/// Repository for report reads.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Gets the report for a date, if one has been built.
    pub async fn get(&self, date: NaiveDate) -> DbResult<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT date, selling, benefit, expenses, order_count, generated_at
            FROM reports
            WHERE date = ?1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    /// Reports within an inclusive date range; either bound may be open.
    pub async fn range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT date, selling, benefit, expenses, order_count, generated_at
            FROM reports
            WHERE (?1 IS NULL OR date >= ?1)
            AND (?2 IS NULL OR date <= ?2)
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}

/// Ensures a row exists for `date`, taking SQLite's write lock.
///
/// Run first in a rebuild transaction so that concurrent rebuilds of the
/// same date queue up behind each other instead of interleaving.
pub async fn claim(conn: &mut SqliteConnection, date: NaiveDate, now: DateTime<Utc>) -> DbResult<()> {
    debug!(date = %date, "Claiming report row");

    sqlx::query(
        r#"
        INSERT INTO reports (date, selling, benefit, expenses, order_count, generated_at)
        VALUES (?1, 0, 0, 0, 0, ?2)
        ON CONFLICT(date) DO UPDATE SET generated_at = excluded.generated_at
        "#,
    )
    .bind(date)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Overwrites every figure of the row for `report.date`.
pub async fn save(conn: &mut SqliteConnection, report: &Report) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO reports (date, selling, benefit, expenses, order_count, generated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(date) DO UPDATE SET
            selling = excluded.selling,
            benefit = excluded.benefit,
            expenses = excluded.expenses,
            order_count = excluded.order_count,
            generated_at = excluded.generated_at
        "#,
    )
    .bind(report.date)
    .bind(report.selling)
    .bind(report.benefit)
    .bind(report.expenses)
    .bind(report.order_count)
    .bind(report.generated_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    fn report(day: u32, selling: i64) -> Report {
        Report {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            selling,
            benefit: selling / 2,
            expenses: 0,
            order_count: 1,
            generated_at: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_overwrites_and_range_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        for day in 1..=4 {
            save(&mut conn, &report(day, 100)).await.unwrap();
        }
        save(&mut conn, &report(2, 999)).await.unwrap();
        drop(conn);

        let repo = db.reports();
        assert_eq!(repo.get(report(2, 0).date).await.unwrap().unwrap().selling, 999);
        assert!(repo.get(report(9, 0).date).await.unwrap().is_none());

        let days = |reports: Vec<Report>| -> Vec<NaiveDate> { reports.into_iter().map(|r| r.date).collect() };
        assert_eq!(repo.range(None, None).await.unwrap().len(), 4);
        assert_eq!(
            days(repo.range(Some(report(2, 0).date), Some(report(3, 0).date)).await.unwrap()),
            vec![report(2, 0).date, report(3, 0).date]
        );
        assert_eq!(
            days(repo.range(Some(report(4, 0).date), None).await.unwrap()),
            vec![report(4, 0).date]
        );
    }

    #[tokio::test]
    async fn test_claim_keeps_existing_figures() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        save(&mut conn, &report(2, 500)).await.unwrap();
        claim(&mut conn, report(2, 0).date, Utc::now()).await.unwrap();
        claim(&mut conn, report(3, 0).date, Utc::now()).await.unwrap();
        drop(conn);

        assert_eq!(db.reports().get(report(2, 0).date).await.unwrap().unwrap().selling, 500);
        assert_eq!(db.reports().get(report(3, 0).date).await.unwrap().unwrap().selling, 0);
    }
}
