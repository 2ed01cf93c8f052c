//! # Discount Repository
//!
//! Promotions and their active windows. Combo item sets are stored as a JSON
//! array in `combo_item_ids`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use canteen_core::{decode_item_set, encode_item_set, Discount, DiscountKind};

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    name: String,
    kind: DiscountKind,
    value: f64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    combo_item_ids: Option<String>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Discount {
            id: row.id,
            name: row.name,
            kind: row.kind,
            value: row.value,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            combo_item_ids: decode_item_set(row.combo_item_ids.as_deref()),
        }
    }
}

/// Repository for discounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountRepository;

impl DiscountRepository {
    pub async fn insert(conn: &mut SqliteConnection, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, kind = ?discount.kind, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (id, name, kind, value, starts_at, ends_at, combo_item_ids, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(combo_column(discount))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Replaces every editable field. Returns false if the discount does not
    /// exist.
    pub async fn update(conn: &mut SqliteConnection, discount: &Discount) -> DbResult<bool> {
        debug!(id = %discount.id, "Updating discount");

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                name = ?2,
                kind = ?3,
                value = ?4,
                starts_at = ?5,
                ends_at = ?6,
                combo_item_ids = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(combo_column(discount))
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(
            r#"
            SELECT id, name, kind, value, starts_at, ends_at, combo_item_ids
            FROM discounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Discount::from))
    }

    /// All discounts ordered by start of window.
    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(
            r#"
            SELECT id, name, kind, value, starts_at, ends_at, combo_item_ids
            FROM discounts
            ORDER BY starts_at, id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Discount::from).collect())
    }
}

/// Combo sets go to the column; other kinds store NULL.
fn combo_column(discount: &Discount) -> Option<String> {
    match discount.kind {
        DiscountKind::Combo => Some(encode_item_set(&discount.combo_item_ids)),
        _ => None,
    }
}
