//! Database layer: SeaORM entities plus the repository the check engine
//! runs against.

pub mod entities;
pub mod services;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};

use crate::monitor::{CheckResult, Monitor, MonitorAggregate, MonitorStore, StoreError};

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(what) => StoreError::NotFound(what),
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// [`MonitorStore`] backed by Postgres through SeaORM.
pub struct MonitorRepo {
    db: DatabaseConnection,
}

impl MonitorRepo {
    pub fn new(db: DatabaseConnection) -> MonitorRepo {
        MonitorRepo { db }
    }
}

#[async_trait]
impl MonitorStore for MonitorRepo {
    async fn list_active(&self) -> Result<Vec<Monitor>, StoreError> {
        Ok(services::monitor_service::list_active_monitors(&self.db).await?)
    }

    async fn record_check(
        &self,
        result: &CheckResult,
        aggregate: &MonitorAggregate,
    ) -> Result<(), StoreError> {
        services::monitor_service::record_check_result(&self.db, result, aggregate).await?;
        Ok(())
    }
}
