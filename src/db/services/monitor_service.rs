//! Monitor persistence: listing, creation and check recording.
//!
//! All SQL for the `monitors` and `check_results` tables lives here as
//! free functions over a [`DatabaseConnection`], so callers never touch
//! query building themselves.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::entities::monitor;
use crate::db::entities::prelude::{CheckResultActiveModel, MonitorColumn};
use crate::monitor::{CheckResult, Monitor, MonitorAggregate};

/// Monitors eligible for checking: active and not soft-deleted, with the
/// rolling aggregate loaded alongside.
pub async fn list_active_monitors(db: &DatabaseConnection) -> Result<Vec<Monitor>, DbErr> {
    let models = monitor::Entity::find()
        .filter(MonitorColumn::IsActive.eq(true))
        .filter(MonitorColumn::DeletedAt.is_null())
        .order_by_asc(MonitorColumn::Id)
        .all(db)
        .await?;

    Ok(models.into_iter().map(monitor_from_model).collect())
}

/// Insert one check row and fold the new aggregate into the monitor row,
/// in a single transaction. The monitor row is locked for the update so
/// counters never lose increments under concurrent writers.
pub async fn record_check_result(
    db: &DatabaseConnection,
    result: &CheckResult,
    aggregate: &MonitorAggregate,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    CheckResultActiveModel {
        monitor_id: Set(result.monitor_id),
        checked_at: Set(result.checked_at),
        status_code: Set(result.status_code),
        response_time_ms: Set(result.response_time_ms),
        is_healthy: Set(result.is_healthy),
        error_message: Set(result.error_message.clone()),
    }
    .insert(&txn)
    .await?;

    let model = monitor::Entity::find_by_id(result.monitor_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("monitor with id {} not found", result.monitor_id))
        })?;

    let mut active: monitor::ActiveModel = model.into();
    active.last_checked_at = Set(aggregate.last_checked_at);
    active.last_healthy_at = Set(aggregate.last_healthy_at);
    active.last_unhealthy_at = Set(aggregate.last_unhealthy_at);
    active.total_checks = Set(aggregate.total_checks);
    active.healthy_checks = Set(aggregate.healthy_checks);
    active.unhealthy_checks = Set(aggregate.unhealthy_checks);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Parameters for registering a monitor. Unset fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct NewMonitor {
    pub url: String,
    pub name: Option<String>,
    pub interval_seconds: Option<i32>,
    pub timeout_seconds: Option<i32>,
    pub is_active: Option<bool>,
}

/// Checks run at most once a minute; shorter requested intervals are
/// raised to this floor.
const MIN_INTERVAL_SECONDS: i32 = 60;

impl NewMonitor {
    fn into_active_model(self, now: DateTime<Utc>) -> monitor::ActiveModel {
        monitor::ActiveModel {
            name: Set(self.name),
            url: Set(self.url),
            interval_seconds: Set(self
                .interval_seconds
                .unwrap_or(MIN_INTERVAL_SECONDS)
                .max(MIN_INTERVAL_SECONDS)),
            timeout_seconds: Set(self.timeout_seconds.unwrap_or(10)),
            is_active: Set(self.is_active.unwrap_or(true)),
            last_checked_at: Set(None),
            last_healthy_at: Set(None),
            last_unhealthy_at: Set(None),
            total_checks: Set(0),
            healthy_checks: Set(0),
            unhealthy_checks: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
    }
}

pub async fn create_monitor(
    db: &DatabaseConnection,
    data: NewMonitor,
) -> Result<monitor::Model, DbErr> {
    data.into_active_model(Utc::now()).insert(db).await
}

fn monitor_from_model(model: monitor::Model) -> Monitor {
    Monitor {
        id: model.id,
        name: model.name,
        url: model.url,
        interval_seconds: model.interval_seconds,
        timeout_seconds: model.timeout_seconds,
        is_active: model.is_active,
        aggregate: MonitorAggregate {
            last_checked_at: model.last_checked_at,
            last_healthy_at: model.last_healthy_at,
            last_unhealthy_at: model.last_unhealthy_at,
            total_checks: model.total_checks,
            healthy_checks: model.healthy_checks,
            unhealthy_checks: model.unhealthy_checks,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sea_orm::ActiveValue;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn model_maps_to_core_monitor_with_aggregate() {
        let model = monitor::Model {
            id: 4,
            name: Some("api".to_string()),
            url: "https://api.example.com/health".to_string(),
            interval_seconds: 120,
            timeout_seconds: 5,
            is_active: true,
            last_checked_at: Some(now()),
            last_healthy_at: Some(now()),
            last_unhealthy_at: None,
            total_checks: 10,
            healthy_checks: 9,
            unhealthy_checks: 1,
            created_at: now(),
            updated_at: now(),
            deleted_at: None,
        };

        let core = monitor_from_model(model);
        assert_eq!(core.id, 4);
        assert_eq!(core.interval_seconds, 120);
        assert_eq!(core.aggregate.total_checks, 10);
        assert_eq!(core.aggregate.healthy_checks, 9);
        assert_eq!(core.aggregate.last_checked_at, Some(now()));
        assert_eq!(core.aggregate.last_unhealthy_at, None);
    }

    #[test]
    fn new_monitor_defaults_are_applied() {
        let active = NewMonitor {
            url: "https://example.com".to_string(),
            ..NewMonitor::default()
        }
        .into_active_model(now());

        assert_eq!(active.interval_seconds, ActiveValue::Set(60));
        assert_eq!(active.timeout_seconds, ActiveValue::Set(10));
        assert_eq!(active.is_active, ActiveValue::Set(true));
        assert_eq!(active.total_checks, ActiveValue::Set(0));
        assert_eq!(active.last_checked_at, ActiveValue::Set(None));
    }

    #[test]
    fn sub_minute_interval_is_raised_to_the_floor() {
        let active = NewMonitor {
            url: "https://example.com".to_string(),
            interval_seconds: Some(5),
            ..NewMonitor::default()
        }
        .into_active_model(now());

        assert_eq!(active.interval_seconds, ActiveValue::Set(60));
    }

    #[test]
    fn explicit_interval_above_floor_is_kept() {
        let active = NewMonitor {
            url: "https://example.com".to_string(),
            interval_seconds: Some(300),
            ..NewMonitor::default()
        }
        .into_active_model(now());

        assert_eq!(active.interval_seconds, ActiveValue::Set(300));
    }
}
