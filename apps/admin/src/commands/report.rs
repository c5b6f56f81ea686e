//! # Report Commands
//!
//! Reports are derived data. `report rebuild` recomputes them from the
//! finished orders and expenses of the date; `show` and `list` read what is
//! stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppConfig, AppState};
use stockroom_core::validation::validate_date_range;
use stockroom_core::{CoreError, Report};

/// Report as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub date: NaiveDate,
    pub selling: i64,
    pub benefit: i64,
    pub expenses: i64,
    pub order_count: i64,
    pub selling_display: String,
    pub benefit_display: String,
    pub expenses_display: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportDto {
    pub fn new(r: Report, config: &AppConfig) -> Self {
        ReportDto {
            selling_display: config.format_currency(r.selling),
            benefit_display: config.format_currency(r.benefit),
            expenses_display: config.format_currency(r.expenses),
            date: r.date,
            selling: r.selling,
            benefit: r.benefit,
            expenses: r.expenses,
            order_count: r.order_count,
            generated_at: r.generated_at,
        }
    }
}

/// `stockroom report rebuild <date>`
pub async fn rebuild(state: &AppState, date: NaiveDate) -> Result<ReportDto, ApiError> {
    let report = state.db().aggregator().rebuild_report(date).await?;
    Ok(ReportDto::new(report, state.config()))
}

/// `stockroom report rebuild <from> <to>`
pub async fn rebuild_range(
    state: &AppState,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ReportDto>, ApiError> {
    let reports = state.db().aggregator().rebuild_range(from, to).await?;
    Ok(reports
        .into_iter()
        .map(|r| ReportDto::new(r, state.config()))
        .collect())
}

/// `stockroom report show <date>`
pub async fn show(state: &AppState, date: NaiveDate) -> Result<ReportDto, ApiError> {
    match state.db().reports().get(date).await? {
        Some(report) => Ok(ReportDto::new(report, state.config())),
        None => Err(ApiError::not_found("Report", &date.to_string())),
    }
}

/// `stockroom report list [--from <date>] [--to <date>]`
pub async fn list(
    state: &AppState,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ReportDto>, ApiError> {
    if let (Some(from), Some(to)) = (from, to) {
        validate_date_range(from, to).map_err(CoreError::from)?;
    }

    let reports = state.db().reports().range(from, to).await?;
    debug!(count = reports.len(), ?from, ?to, "Listed reports");
    Ok(reports
        .into_iter()
        .map(|r| ReportDto::new(r, state.config()))
        .collect())
}
