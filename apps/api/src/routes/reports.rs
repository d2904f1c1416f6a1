//! Report API handlers.
//!
//! Read-only projections over items and movements. Time-bounded reports
//! default to the trailing 30 days; `from`/`to` take `YYYY-MM-DD`.
//!
//! `/export` streams the movement log as CSV with the legacy header row
//! (`fecha,tipo,...`) - downstream spreadsheets were built against those
//! column names and keeping them was the price of a drop-in replacement.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::validation::clamp_limit;
use stockroom_core::MovementKind;
use stockroom_db::repository::report::{
    CategoryConsumptionRow, ConsumptionRow, DailyFlowRow, ExportRow, Kpis, LowStockRow,
    StockRankRow, UserFlowRow,
};
use stockroom_db::{MovementFilter, ReportWindow};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/total-items", get(total_items))
        .route("/total-units", get(total_units))
        .route("/inventory-value", get(inventory_value))
        .route("/top-stock", get(top_stock))
        .route("/bottom-stock", get(bottom_stock))
        .route("/low-stock", get(low_stock))
        .route("/kpis", get(kpis))
        .route("/daily-series", get(daily_series))
        .route("/top-consumption", get(top_consumption))
        .route("/consumption-by-category", get(consumption_by_category))
        .route("/movements-by-user", get(movements_by_user))
        .route("/export", get(export))
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Shared query parameters; each endpoint reads the ones it cares about.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub actor_id: Option<i64>,
    /// Movement kind filter; unknown values are ignored rather than
    /// rejected.
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

impl ReportQuery {
    fn window(&self) -> ReportWindow {
        ReportWindow::resolve(Utc::now().date_naive(), self.from, self.to)
    }

    fn filter(&self) -> MovementFilter {
        MovementFilter {
            actor_id: self.actor_id,
            kind: self.kind.as_deref().and_then(MovementKind::from_wire),
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Serialize)]
struct TotalItems {
    total_items: i64,
}

#[derive(Serialize)]
struct TotalUnits {
    total_units: i64,
}

#[derive(Serialize)]
struct InventoryValue {
    inventory_value: Decimal,
}

/// GET /api/reports/total-items
async fn total_items(State(state): State<AppState>) -> ApiResult<Json<TotalItems>> {
    let total_items = state.db.reports().total_items().await?;
    Ok(Json(TotalItems { total_items }))
}

/// GET /api/reports/total-units
async fn total_units(State(state): State<AppState>) -> ApiResult<Json<TotalUnits>> {
    let total_units = state.db.reports().total_units().await?;
    Ok(Json(TotalUnits { total_units }))
}

/// GET /api/reports/inventory-value
async fn inventory_value(State(state): State<AppState>) -> ApiResult<Json<InventoryValue>> {
    let inventory_value = state.db.reports().inventory_value().await?;
    Ok(Json(InventoryValue { inventory_value }))
}

// =============================================================================
// Rankings
// =============================================================================

/// GET /api/reports/top-stock?limit=5
async fn top_stock(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<StockRankRow>>> {
    let limit = clamp_limit(query.limit, 5, 100);
    Ok(Json(state.db.reports().top_stock(limit).await?))
}

/// GET /api/reports/bottom-stock?limit=5
async fn bottom_stock(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<StockRankRow>>> {
    let limit = clamp_limit(query.limit, 5, 100);
    Ok(Json(state.db.reports().bottom_stock(limit).await?))
}

/// GET /api/reports/low-stock
async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<LowStockRow>>> {
    Ok(Json(state.db.reports().low_stock().await?))
}

// =============================================================================
// Windowed Reports
// =============================================================================

#[derive(Serialize)]
struct KpisResponse {
    range: ReportWindow,
    #[serde(flatten)]
    kpis: Kpis,
}

#[derive(Serialize)]
struct SeriesResponse {
    range: ReportWindow,
    series: Vec<DailyFlowRow>,
}

#[derive(Serialize)]
struct WindowedItems<T: Serialize> {
    range: ReportWindow,
    items: Vec<T>,
}

/// GET /api/reports/kpis?from=&to=
async fn kpis(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<KpisResponse>> {
    let range = query.window();
    let kpis = state.db.reports().kpis(range).await?;
    Ok(Json(KpisResponse { range, kpis }))
}

/// GET /api/reports/daily-series?from=&to=&actor_id=&kind=
async fn daily_series(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<SeriesResponse>> {
    let range = query.window();
    let series = state.db.reports().daily_series(range, query.filter()).await?;
    Ok(Json(SeriesResponse { range, series }))
}

/// GET /api/reports/top-consumption?from=&to=&limit=
async fn top_consumption(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<WindowedItems<ConsumptionRow>>> {
    let range = query.window();
    let limit = clamp_limit(query.limit, 5, 50);
    let items = state.db.reports().top_consumption(range, limit).await?;
    Ok(Json(WindowedItems { range, items }))
}

/// GET /api/reports/consumption-by-category?from=&to=
async fn consumption_by_category(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<WindowedItems<CategoryConsumptionRow>>> {
    let range = query.window();
    let items = state.db.reports().consumption_by_category(range).await?;
    Ok(Json(WindowedItems { range, items }))
}

/// GET /api/reports/movements-by-user?from=&to=
async fn movements_by_user(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<WindowedItems<UserFlowRow>>> {
    let range = query.window();
    let items = state.db.reports().movements_by_user(range).await?;
    Ok(Json(WindowedItems { range, items }))
}

// =============================================================================
// CSV Export
// =============================================================================

/// Legacy header row; data columns are emitted in this exact order.
const EXPORT_HEADER: &str =
    "fecha,tipo,codigo,producto,cantidad,precio_unitario,total,categoria,usuario";

/// GET /api/reports/export?from=&to=&actor_id=&kind=
async fn export(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let rows = state
        .db
        .reports()
        .export_rows(query.window(), query.filter())
        .await?;

    let csv = write_movements_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"movements.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Renders export rows as CSV: plain header line, then data rows with every
/// field double-quoted (internal quotes doubled by the writer).
fn write_movements_csv(rows: &[ExportRow]) -> Result<String, ApiError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    for row in rows {
        let quantity = row.quantity.to_string();
        let unit_price = row.unit_price.to_string();
        let total = row.total.to_string();
        writer
            .write_record([
                row.occurred_at.as_str(),
                row.kind.as_str(),
                row.code.as_str(),
                row.item.as_str(),
                quantity.as_str(),
                unit_price.as_str(),
                total.as_str(),
                row.category.as_deref().unwrap_or(""),
                row.actor.as_deref().unwrap_or(""),
            ])
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let data = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let data = String::from_utf8(data).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(format!("{EXPORT_HEADER}\n{data}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(item: &str, category: Option<&str>) -> ExportRow {
        ExportRow {
            occurred_at: "2026-08-01 12:30:00".to_string(),
            kind: MovementKind::Outbound,
            code: "TORN-M8".to_string(),
            item: item.to_string(),
            quantity: 3,
            unit_price: Decimal::new(1050, 2),
            total: Decimal::new(3150, 2),
            category: category.map(String::from),
            actor: Some("ana".to_string()),
        }
    }

    #[test]
    fn empty_export_is_exactly_the_header_line() {
        let csv = write_movements_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "fecha,tipo,codigo,producto,cantidad,precio_unitario,total,categoria,usuario\n"
        );
    }

    #[test]
    fn data_rows_are_fully_quoted() {
        let csv = write_movements_csv(&[row("Tornillo M8", Some("Ferretería"))]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("fecha,tipo,codigo,producto,cantidad,precio_unitario,total,categoria,usuario")
        );
        assert_eq!(
            lines.next(),
            Some(
                "\"2026-08-01 12:30:00\",\"outbound\",\"TORN-M8\",\"Tornillo M8\",\"3\",\"10.50\",\"31.50\",\"Ferretería\",\"ana\""
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn internal_quotes_are_doubled() {
        let csv = write_movements_csv(&[row("Tornillo \"especial\"", None)]).unwrap();
        assert!(csv.contains("\"Tornillo \"\"especial\"\"\""));
        // Absent category renders as an empty quoted field.
        assert!(csv.contains(",\"\","));
    }

    #[test]
    fn unknown_kind_filter_is_ignored() {
        let query = ReportQuery {
            kind: Some("entrada".to_string()),
            ..Default::default()
        };
        assert!(query.filter().kind.is_none());

        let query = ReportQuery {
            kind: Some("outbound".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().kind, Some(MovementKind::Outbound));
    }
}
