//! # Report Repository
//!
//! Stateless read projections over items and movements. No invariants beyond
//! correct aggregation - every query here is a plain filtered aggregate.
//!
//! ## Windows
//! Time-bounded reports default to the trailing 30 days. A window covers
//! whole days: `[from 00:00, to + 1 day)` - the half-open upper bound avoids
//! fencepost games with the last second of the day.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::DbResult;
use stockroom_core::MovementKind;

// =============================================================================
// Windows & Filters
// =============================================================================

/// An inclusive day range for time-bounded reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportWindow {
    /// Resolves an optional request range against today's date.
    ///
    /// Missing `to` means today; missing `from` means 30 days before today
    /// (not before `to` - matching the behavior clients already rely on).
    pub fn resolve(today: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or_else(|| today - chrono::Duration::days(30));
        ReportWindow { from, to }
    }

    /// First instant inside the window.
    pub fn start_at(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant *after* the window (exclusive upper bound).
    pub fn end_at(&self) -> DateTime<Utc> {
        // Saturates at the calendar edge; nobody reports on year 262143.
        let next_day = self
            .to
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        next_day.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Optional movement filters shared by the series and export reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementFilter {
    pub actor_id: Option<i64>,
    pub kind: Option<MovementKind>,
}

// =============================================================================
// Rows
// =============================================================================

/// One end of the stock ranking (top or bottom N by quantity).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockRankRow {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
}

/// An item at or below its minimum threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockRow {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub stock_min: i64,
}

/// Headline figures for a dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub inventory_value: Decimal,
    /// Items strictly below their minimum threshold.
    pub alert_count: i64,
    pub inbound_units: i64,
    pub outbound_units: i64,
    /// Value of outbound movements at current unit prices.
    pub outbound_cost: Decimal,
}

/// One day of inbound/outbound totals.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyFlowRow {
    pub day: NaiveDate,
    pub inbound: i64,
    pub outbound: i64,
}

/// Outbound total for one item over a window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConsumptionRow {
    pub id: i64,
    pub name: String,
    pub total_outbound: i64,
}

/// Outbound total for one category over a window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryConsumptionRow {
    pub category_id: Option<i64>,
    pub category: Option<String>,
    pub total: i64,
}

/// Per-user inbound/outbound totals over a window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserFlowRow {
    pub actor_id: Option<i64>,
    pub name: Option<String>,
    pub inbound: i64,
    pub outbound: i64,
}

/// One movement prepared for CSV export, already joined and priced.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExportRow {
    /// Pre-formatted `YYYY-MM-DD HH:MM:SS`.
    pub occurred_at: String,
    pub kind: MovementKind,
    pub code: String,
    pub item: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub category: Option<String>,
    pub actor: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: PgPool) -> Self {
        ReportRepository { pool }
    }

    /// Total number of items.
    pub async fn total_items(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Total units on the shelves across all items.
    pub async fn total_units(&self) -> DbResult<i64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM items")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    /// Total inventory value: Σ quantity × unit price.
    pub async fn inventory_value(&self) -> DbResult<Decimal> {
        let value = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(quantity * unit_price), 0) FROM items",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    /// The `limit` items holding the most stock.
    pub async fn top_stock(&self, limit: i64) -> DbResult<Vec<StockRankRow>> {
        let rows = sqlx::query_as::<_, StockRankRow>(
            "SELECT id, name, quantity FROM items ORDER BY quantity DESC, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The `limit` items holding the least stock.
    pub async fn bottom_stock(&self, limit: i64) -> DbResult<Vec<StockRankRow>> {
        let rows = sqlx::query_as::<_, StockRankRow>(
            "SELECT id, name, quantity FROM items ORDER BY quantity ASC, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Items at or below their minimum threshold, worst deficit first.
    pub async fn low_stock(&self) -> DbResult<Vec<LowStockRow>> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT id, name, quantity, stock_min
            FROM items
            WHERE quantity <= stock_min
            ORDER BY (stock_min - quantity) DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Headline figures: current inventory value and alert count, plus
    /// inbound/outbound totals and outbound cost over the window.
    pub async fn kpis(&self, window: ReportWindow) -> DbResult<Kpis> {
        let inventory_value = self.inventory_value().await?;

        let alert_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM items WHERE quantity < stock_min",
        )
        .fetch_one(&self.pool)
        .await?;

        let inbound_units = self
            .units_in_window(MovementKind::Inbound, window)
            .await?;
        let outbound_units = self
            .units_in_window(MovementKind::Outbound, window)
            .await?;

        let outbound_cost = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(m.quantity * i.unit_price), 0)
            FROM movements m
            JOIN items i ON i.id = m.item_id
            WHERE m.kind = 'outbound'
              AND m.occurred_at >= $1 AND m.occurred_at < $2
            "#,
        )
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(Kpis {
            inventory_value,
            alert_count,
            inbound_units,
            outbound_units,
            outbound_cost,
        })
    }

    async fn units_in_window(&self, kind: MovementKind, window: ReportWindow) -> DbResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT
            FROM movements
            WHERE kind = $1 AND occurred_at >= $2 AND occurred_at < $3
            "#,
        )
        .bind(kind)
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Per-day inbound/outbound totals over the window, oldest day first.
    pub async fn daily_series(
        &self,
        window: ReportWindow,
        filter: MovementFilter,
    ) -> DbResult<Vec<DailyFlowRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                m.occurred_at::date AS day,
                COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'inbound'), 0)::BIGINT AS inbound,
                COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'outbound'), 0)::BIGINT AS outbound
            FROM movements m
            WHERE m.occurred_at >= "#,
        );
        qb.push_bind(window.start_at());
        qb.push(" AND m.occurred_at < ");
        qb.push_bind(window.end_at());
        push_movement_filter(&mut qb, filter);
        qb.push(" GROUP BY day ORDER BY day");

        let rows = qb
            .build_query_as::<DailyFlowRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// The `limit` most-consumed items over the window.
    pub async fn top_consumption(
        &self,
        window: ReportWindow,
        limit: i64,
    ) -> DbResult<Vec<ConsumptionRow>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(
            r#"
            SELECT i.id, i.name, COALESCE(SUM(m.quantity), 0)::BIGINT AS total_outbound
            FROM movements m
            JOIN items i ON i.id = m.item_id
            WHERE m.kind = 'outbound'
              AND m.occurred_at >= $1 AND m.occurred_at < $2
            GROUP BY i.id, i.name
            ORDER BY total_outbound DESC
            LIMIT $3
            "#,
        )
        .bind(window.start_at())
        .bind(window.end_at())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Outbound totals grouped by category over the window. Items without a
    /// category group under a null category.
    pub async fn consumption_by_category(
        &self,
        window: ReportWindow,
    ) -> DbResult<Vec<CategoryConsumptionRow>> {
        let rows = sqlx::query_as::<_, CategoryConsumptionRow>(
            r#"
            SELECT
                c.id AS category_id,
                c.name AS category,
                COALESCE(SUM(m.quantity), 0)::BIGINT AS total
            FROM movements m
            JOIN items i ON i.id = m.item_id
            LEFT JOIN categories c ON c.id = i.category_id
            WHERE m.kind = 'outbound'
              AND m.occurred_at >= $1 AND m.occurred_at < $2
            GROUP BY c.id, c.name
            ORDER BY total DESC
            "#,
        )
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Per-user inbound/outbound totals over the window.
    pub async fn movements_by_user(&self, window: ReportWindow) -> DbResult<Vec<UserFlowRow>> {
        let rows = sqlx::query_as::<_, UserFlowRow>(
            r#"
            SELECT
                u.id AS actor_id,
                u.name,
                COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'inbound'), 0)::BIGINT AS inbound,
                COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'outbound'), 0)::BIGINT AS outbound
            FROM movements m
            LEFT JOIN users u ON u.id = m.actor_id
            WHERE m.occurred_at >= $1 AND m.occurred_at < $2
            GROUP BY u.id, u.name
            ORDER BY outbound DESC, inbound DESC
            "#,
        )
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Movement rows for CSV export: joined, priced, newest first.
    ///
    /// Inner-joins the item table, so movements whose item has been deleted
    /// fall out of the export (there is no price left to report).
    pub async fn export_rows(
        &self,
        window: ReportWindow,
        filter: MovementFilter,
    ) -> DbResult<Vec<ExportRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                to_char(m.occurred_at, 'YYYY-MM-DD HH24:MI:SS') AS occurred_at,
                m.kind,
                i.code,
                i.name AS item,
                m.quantity,
                i.unit_price,
                (m.quantity * i.unit_price) AS total,
                c.name AS category,
                u.name AS actor
            FROM movements m
            JOIN items i ON i.id = m.item_id
            LEFT JOIN categories c ON c.id = i.category_id
            LEFT JOIN users u ON u.id = m.actor_id
            WHERE m.occurred_at >= "#,
        );
        qb.push_bind(window.start_at());
        qb.push(" AND m.occurred_at < ");
        qb.push_bind(window.end_at());
        push_movement_filter(&mut qb, filter);
        qb.push(" ORDER BY m.occurred_at DESC, m.id DESC");

        let rows = qb
            .build_query_as::<ExportRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Appends the optional actor/kind conditions shared by series and export.
fn push_movement_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: MovementFilter) {
    if let Some(actor_id) = filter.actor_id {
        qb.push(" AND m.actor_id = ");
        qb.push_bind(actor_id);
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND m.kind = ");
        qb.push_bind(kind);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_defaults_to_trailing_30_days() {
        let today = date(2026, 8, 6);
        let window = ReportWindow::resolve(today, None, None);
        assert_eq!(window.to, today);
        assert_eq!(window.from, date(2026, 7, 7));
    }

    #[test]
    fn explicit_bounds_win() {
        let today = date(2026, 8, 6);
        let window =
            ReportWindow::resolve(today, Some(date(2026, 1, 1)), Some(date(2026, 1, 31)));
        assert_eq!(window.from, date(2026, 1, 1));
        assert_eq!(window.to, date(2026, 1, 31));
    }

    #[test]
    fn missing_from_is_relative_to_today_not_to() {
        let today = date(2026, 8, 6);
        let window = ReportWindow::resolve(today, None, Some(date(2026, 2, 1)));
        assert_eq!(window.from, date(2026, 7, 7));
        assert_eq!(window.to, date(2026, 2, 1));
    }

    #[test]
    fn window_bounds_cover_whole_days() {
        let window = ReportWindow {
            from: date(2026, 3, 1),
            to: date(2026, 3, 2),
        };
        assert_eq!(window.start_at().to_rfc3339(), "2026-03-01T00:00:00+00:00");
        // Exclusive upper bound: the first instant of March 3rd.
        assert_eq!(window.end_at().to_rfc3339(), "2026-03-03T00:00:00+00:00");
    }

    #[test]
    fn single_day_window_is_nonempty() {
        let day = date(2026, 5, 10);
        let window = ReportWindow { from: day, to: day };
        assert!(window.start_at() < window.end_at());
    }
}
