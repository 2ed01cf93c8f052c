//! Discount catalogue.

use chrono::Utc;
use tracing::info;

use canteen_core::validation::validate_discount;
use canteen_core::{new_id, Capability, CoreError, Discount, DiscountDraft};
use canteen_db::DiscountRepository;

use crate::context::Canteen;
use crate::error::EngineResult;

pub struct DiscountBook<'a> {
    ctx: &'a Canteen,
}

impl<'a> DiscountBook<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        DiscountBook { ctx }
    }

    pub async fn add(&self, actor: &str, draft: DiscountDraft) -> EngineResult<String> {
        self.ctx.authorize(actor, Capability::ManageDiscounts)?;
        validate_discount(&draft)?;

        let discount = from_draft(new_id(), draft);
        let mut conn = self.ctx.db().acquire().await?;
        DiscountRepository::insert(&mut conn, &discount).await?;

        info!(discount_id = %discount.id, kind = ?discount.kind, value = discount.value, "Discount added");
        self.ctx
            .record(Some(actor), format!("Added discount {}", discount.name));
        Ok(discount.id)
    }

    pub async fn edit(&self, actor: &str, id: &str, draft: DiscountDraft) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageDiscounts)?;
        validate_discount(&draft)?;

        let discount = from_draft(id.to_string(), draft);
        let mut conn = self.ctx.db().acquire().await?;
        if !DiscountRepository::update(&mut conn, &discount).await? {
            return Err(CoreError::not_found("discount", id).into());
        }

        info!(discount_id = %id, "Discount updated");
        self.ctx
            .record(Some(actor), format!("Edited discount {}", discount.name));
        Ok(())
    }

    pub async fn remove(&self, actor: &str, id: &str) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageDiscounts)?;

        let mut conn = self.ctx.db().acquire().await?;
        if !DiscountRepository::delete(&mut conn, id).await? {
            return Err(CoreError::not_found("discount", id).into());
        }

        info!(discount_id = %id, "Discount removed");
        self.ctx.record(Some(actor), format!("Removed discount {id}"));
        Ok(())
    }

    /// All discounts, or only those whose window contains now.
    pub async fn list(&self, active_only: bool) -> EngineResult<Vec<Discount>> {
        let mut conn = self.ctx.db().acquire().await?;
        let mut discounts = DiscountRepository::list(&mut conn).await?;

        if active_only {
            let now = Utc::now();
            discounts.retain(|d| d.is_active_at(now));
        }

        Ok(discounts)
    }

    pub async fn get(&self, id: &str) -> EngineResult<Discount> {
        let mut conn = self.ctx.db().acquire().await?;
        DiscountRepository::get(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("discount", id).into())
    }
}

fn from_draft(id: String, draft: DiscountDraft) -> Discount {
    Discount {
        id,
        name: draft.name.trim().to_string(),
        kind: draft.kind,
        value: draft.value,
        starts_at: draft.starts_at,
        ends_at: draft.ends_at,
        combo_item_ids: draft.combo_item_ids,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::config::EngineConfig;
    use canteen_core::{DiscountKind, ErrorKind, NullAuditSink, Role, StaticDirectory};
    use canteen_db::DbConfig;

    async fn canteen() -> Canteen {
        let directory = StaticDirectory::new()
            .with_operator("manager", Role::Manager)
            .with_operator("biller", Role::Biller);
        Canteen::open_with(
            DbConfig::in_memory(),
            EngineConfig::default(),
            Arc::new(directory),
            Arc::new(NullAuditSink),
        )
        .await
        .unwrap()
    }

    fn draft(name: &str, offset_hours: i64) -> DiscountDraft {
        let now = Utc::now();
        DiscountDraft {
            name: name.to_string(),
            kind: DiscountKind::Percentage,
            value: 10.0,
            starts_at: now + Duration::hours(offset_hours) - Duration::hours(1),
            ends_at: now + Duration::hours(offset_hours) + Duration::hours(1),
            combo_item_ids: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_active_filter() {
        let canteen = canteen().await;
        let book = canteen.discounts();

        let live = book.add("manager", draft("Lunch", 0)).await.unwrap();
        book.add("manager", draft("Tomorrow", 48)).await.unwrap();

        assert_eq!(book.list(false).await.unwrap().len(), 2);
        let active = book.list(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live);
    }

    #[tokio::test]
    async fn test_validation_and_capability() {
        let canteen = canteen().await;
        let book = canteen.discounts();

        let mut bad = draft("Too much", 0);
        bad.value = 120.0;
        let err = book.add("manager", bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = book.add("biller", draft("Lunch", 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_edit_and_remove() {
        let canteen = canteen().await;
        let book = canteen.discounts();
        let id = book.add("manager", draft("Lunch", 0)).await.unwrap();

        let mut changed = draft("Lunch", 0);
        changed.kind = DiscountKind::Fixed;
        changed.value = 15.0;
        book.edit("manager", &id, changed).await.unwrap();

        let stored = book.get(&id).await.unwrap();
        assert_eq!(stored.kind, DiscountKind::Fixed);
        assert_eq!(stored.value, 15.0);

        book.remove("manager", &id).await.unwrap();
        assert_eq!(book.get(&id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(book.remove("manager", &id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
