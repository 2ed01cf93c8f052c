//! Business settings: tax rate and loyalty earn rate.
//!
//! Stored as key/value rows. A missing row reads as the built-in default.

use tracing::info;

use canteen_core::validation::{validate_loyalty_earn_rate, validate_tax_rate};
use canteen_core::{Capability, Settings, DEFAULT_LOYALTY_EARN_RATE, DEFAULT_TAX_RATE};
use canteen_db::repository::settings::{LOYALTY_EARN_RATE_KEY, TAX_RATE_KEY};
use canteen_db::{SettingsRepository, SqliteConnection};

use crate::context::Canteen;
use crate::error::EngineResult;

pub struct SettingsService<'a> {
    ctx: &'a Canteen,
}

impl<'a> SettingsService<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        SettingsService { ctx }
    }

    pub async fn tax_rate(&self) -> EngineResult<f64> {
        Ok(self.snapshot().await?.tax_rate)
    }

    pub async fn loyalty_earn_rate(&self) -> EngineResult<f64> {
        Ok(self.snapshot().await?.loyalty_earn_rate)
    }

    pub async fn snapshot(&self) -> EngineResult<Settings> {
        let mut conn = self.ctx.db().acquire().await?;
        read_in(&mut conn).await
    }

    /// Requires `ManageSettings`. `0 <= rate <= 1`.
    pub async fn set_tax_rate(&self, actor: &str, rate: f64) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageSettings)?;
        validate_tax_rate(rate)?;

        let mut conn = self.ctx.db().acquire().await?;
        SettingsRepository::set(&mut conn, TAX_RATE_KEY, rate).await?;

        info!(rate, "Tax rate updated");
        self.ctx.record(Some(actor), format!("Set tax rate to {rate}"));
        Ok(())
    }

    /// Requires `ManageSettings`. `rate > 0`.
    pub async fn set_loyalty_earn_rate(&self, actor: &str, rate: f64) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageSettings)?;
        validate_loyalty_earn_rate(rate)?;

        let mut conn = self.ctx.db().acquire().await?;
        SettingsRepository::set(&mut conn, LOYALTY_EARN_RATE_KEY, rate).await?;

        info!(rate, "Loyalty earn rate updated");
        self.ctx.record(Some(actor), format!("Set loyalty earn rate to {rate}"));
        Ok(())
    }
}

pub(crate) async fn read_in(conn: &mut SqliteConnection) -> EngineResult<Settings> {
    let tax_rate = SettingsRepository::get(conn, TAX_RATE_KEY)
        .await?
        .unwrap_or(DEFAULT_TAX_RATE);
    let loyalty_earn_rate = SettingsRepository::get(conn, LOYALTY_EARN_RATE_KEY)
        .await?
        .unwrap_or(DEFAULT_LOYALTY_EARN_RATE);

    Ok(Settings {
        tax_rate,
        loyalty_earn_rate,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use canteen_core::{ErrorKind, NullAuditSink, Role, StaticDirectory};
    use canteen_db::DbConfig;

    async fn canteen() -> Canteen {
        let directory = StaticDirectory::new()
            .with_operator("admin", Role::Admin)
            .with_operator("manager", Role::Manager);
        Canteen::open_with(
            DbConfig::in_memory(),
            EngineConfig::default(),
            Arc::new(directory),
            Arc::new(NullAuditSink),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let canteen = canteen().await;
        assert_eq!(canteen.settings().snapshot().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_only_admin_writes() {
        let canteen = canteen().await;
        let settings = canteen.settings();

        let err = settings.set_tax_rate("manager", 0.05).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        settings.set_tax_rate("admin", 0.05).await.unwrap();
        assert_eq!(settings.tax_rate().await.unwrap(), 0.05);
    }

    #[tokio::test]
    async fn test_range_checks() {
        let canteen = canteen().await;
        let settings = canteen.settings();

        assert!(settings.set_tax_rate("admin", 1.5).await.is_err());
        assert!(settings.set_loyalty_earn_rate("admin", 0.0).await.is_err());
        settings.set_loyalty_earn_rate("admin", 20.0).await.unwrap();
        assert_eq!(settings.loyalty_earn_rate().await.unwrap(), 20.0);
    }
}
