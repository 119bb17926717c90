use async_trait::async_trait;
use chrono::Utc;
use libsql::{Row, params};

use super::error::{RegistryError, RegistryResult};
use super::models::{
    NewSink, NewTarget, Observation, Sink, Target, i64_to_timestamp, timestamp_to_i64,
};
use crate::monitoring::types::SiteStatus;
use crate::pool::{LibsqlManager, LibsqlPool};

const TARGET_COLUMNS: &str =
    "id, url, name, check_interval_seconds, expected_status_code, created_at";
const OBSERVATION_COLUMNS: &str =
    "id, target_id, status, latency_ms, status_code, error_message, checked_at, transition_at";

/// Storage for targets, sinks and the observation history.
///
/// Every call acquires its own connection and returns it before completing,
/// so callers never hold storage across an await on something else.
#[async_trait]
pub trait Registry: Send + Sync {
    /// All registered targets, in registration order
    async fn list_targets(&self) -> RegistryResult<Vec<Target>>;

    /// All registered notification sinks
    async fn list_sinks(&self) -> RegistryResult<Vec<Sink>>;

    /// Persist a new observation and return it with its assigned id
    async fn append_observation(&self, observation: &Observation) -> RegistryResult<Observation>;

    /// Most recent observation for a target, by check time
    async fn latest_observation(&self, target_id: i64) -> RegistryResult<Option<Observation>>;

    async fn create_target(&self, target: &NewTarget) -> RegistryResult<Target>;

    async fn get_target(&self, id: i64) -> RegistryResult<Option<Target>>;

    /// Remove a target together with its history
    async fn delete_target(&self, id: i64) -> RegistryResult<()>;

    async fn list_observations(&self, target_id: i64, limit: usize) -> RegistryResult<Vec<Observation>>;

    async fn create_sink(&self, sink: &NewSink) -> RegistryResult<Sink>;

    async fn delete_sink(&self, id: i64) -> RegistryResult<()>;
}

/// LibSQL registry implementation
pub struct LibsqlRegistry {
    pool: LibsqlPool,
}

impl LibsqlRegistry {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> RegistryResult<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

fn target_from_row(row: &Row) -> RegistryResult<Target> {
    let interval: i64 = row.get(3)?;
    let expected: i64 = row.get(4)?;
    Ok(Target {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        check_interval_seconds: u64::try_from(interval)
            .map_err(|_| RegistryError::CorruptRow(format!("check interval {interval}")))?,
        expected_status_code: u16::try_from(expected)
            .map_err(|_| RegistryError::CorruptRow(format!("status code {expected}")))?,
        created_at: i64_to_timestamp(row.get(5)?),
    })
}

fn observation_from_row(row: &Row) -> RegistryResult<Observation> {
    let status: String = row.get(2)?;
    Ok(Observation {
        id: Some(row.get(0)?),
        target_id: row.get(1)?,
        status: status.parse::<SiteStatus>().map_err(RegistryError::CorruptRow)?,
        latency_ms: row.get::<Option<i64>>(3)?.map(|v| v.max(0) as u64),
        status_code: row.get::<Option<i64>>(4)?.and_then(|v| u16::try_from(v).ok()),
        error_message: row.get(5)?,
        checked_at: i64_to_timestamp(row.get(6)?),
        transition_at: row.get::<Option<i64>>(7)?.map(i64_to_timestamp),
    })
}

fn sink_from_row(row: &Row) -> RegistryResult<Sink> {
    Ok(Sink { id: row.get(0)?, url: row.get(1)?, name: row.get(2)? })
}

#[async_trait]
impl Registry for LibsqlRegistry {
    async fn list_targets(&self) -> RegistryResult<Vec<Target>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY id"), ())
            .await?;

        let mut targets = Vec::new();
        while let Some(row) = rows.next().await? {
            targets.push(target_from_row(&row)?);
        }
        Ok(targets)
    }

    async fn list_sinks(&self) -> RegistryResult<Vec<Sink>> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query("SELECT id, url, name FROM sinks ORDER BY id", ()).await?;

        let mut sinks = Vec::new();
        while let Some(row) = rows.next().await? {
            sinks.push(sink_from_row(&row)?);
        }
        Ok(sinks)
    }

    async fn append_observation(&self, observation: &Observation) -> RegistryResult<Observation> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO observations (target_id, status, latency_ms, status_code, error_message, checked_at, transition_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                observation.target_id,
                observation.status.as_str(),
                observation.latency_ms.map(|v| v as i64),
                observation.status_code.map(|v| v as i64),
                observation.error_message.clone(),
                timestamp_to_i64(observation.checked_at),
                observation.transition_at.map(timestamp_to_i64)
            ],
        )
        .await?;

        // Hand back exactly what a later read will see
        let mut saved = observation.clone();
        saved.id = Some(conn.last_insert_rowid());
        saved.checked_at = i64_to_timestamp(timestamp_to_i64(observation.checked_at));
        saved.transition_at = observation.transition_at.map(|t| i64_to_timestamp(timestamp_to_i64(t)));
        Ok(saved)
    }

    async fn latest_observation(&self, target_id: i64) -> RegistryResult<Option<Observation>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE target_id = ? ORDER BY checked_at DESC, id DESC LIMIT 1"
                ),
                params![target_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(observation_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_target(&self, target: &NewTarget) -> RegistryResult<Target> {
        let interval = i64::try_from(target.check_interval_seconds)
            .map_err(|_| RegistryError::OutOfRange("check interval"))?;
        let conn = self.get_conn().await?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO targets (url, name, check_interval_seconds, expected_status_code, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                target.url.clone(),
                target.name.clone(),
                interval,
                target.expected_status_code as i64,
                timestamp_to_i64(created_at)
            ],
        )
        .await?;

        Ok(Target {
            id: conn.last_insert_rowid(),
            url: target.url.clone(),
            name: target.name.clone(),
            check_interval_seconds: target.check_interval_seconds,
            expected_status_code: target.expected_status_code,
            created_at: i64_to_timestamp(timestamp_to_i64(created_at)),
        })
    }

    async fn get_target(&self, id: i64) -> RegistryResult<Option<Target>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?"), params![id])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(target_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_target(&self, id: i64) -> RegistryResult<()> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let deleted = tx.execute("DELETE FROM targets WHERE id = ?", params![id]).await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Err(RegistryError::NotFound);
        }
        tx.execute("DELETE FROM observations WHERE target_id = ?", params![id]).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_observations(&self, target_id: i64, limit: usize) -> RegistryResult<Vec<Observation>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE target_id = ? ORDER BY checked_at DESC, id DESC LIMIT ?"
                ),
                params![target_id, limit as i64],
            )
            .await?;

        let mut observations = Vec::new();
        while let Some(row) = rows.next().await? {
            observations.push(observation_from_row(&row)?);
        }
        Ok(observations)
    }

    async fn create_sink(&self, sink: &NewSink) -> RegistryResult<Sink> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO sinks (url, name) VALUES (?, ?)",
            params![sink.url.clone(), sink.name.clone()],
        )
        .await?;

        Ok(Sink { id: conn.last_insert_rowid(), url: sink.url.clone(), name: sink.name.clone() })
    }

    async fn delete_sink(&self, id: i64) -> RegistryResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn.execute("DELETE FROM sinks WHERE id = ?", params![id]).await?;
        if deleted == 0 {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::{TempDir, tempdir};

    use crate::monitoring::types::ProbeOutcome;

    async fn create_test_registry() -> (LibsqlRegistry, TempDir) {
        let dir = tempdir().unwrap();
        let pool = crate::pool::open_pool(&dir.path().join("registry.db"), 4).await.unwrap();
        (LibsqlRegistry::new_from_pool(pool), dir)
    }

    #[tokio::test]
    async fn append_then_latest_returns_the_new_row() {
        let (registry, _dir) = create_test_registry().await;
        let target = registry.create_target(&NewTarget::new("https://example.com")).await.unwrap();

        assert!(registry.latest_observation(target.id).await.unwrap().is_none());

        let now = Utc::now();
        let first = Observation::from_outcome(target.id, ProbeOutcome::up(120, 200), now);
        let first = registry.append_observation(&first).await.unwrap();
        assert!(first.id.is_some());

        let second = Observation::from_outcome(
            target.id,
            ProbeOutcome::transport_failure("Connection refused"),
            now + Duration::seconds(300),
        );
        let second = registry.append_observation(&second).await.unwrap();

        let latest = registry.latest_observation(target.id).await.unwrap().unwrap();
        assert_eq!(latest, second);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn latest_orders_by_check_time_not_insert_order() {
        let (registry, _dir) = create_test_registry().await;
        let target = registry.create_target(&NewTarget::new("https://example.com")).await.unwrap();
        let now = Utc::now();

        let newer = Observation::from_outcome(target.id, ProbeOutcome::up(10, 200), now);
        let older = Observation::from_outcome(
            target.id,
            ProbeOutcome::unexpected_status(10, 500),
            now - Duration::seconds(60),
        );
        registry.append_observation(&newer).await.unwrap();
        registry.append_observation(&older).await.unwrap();

        let latest = registry.latest_observation(target.id).await.unwrap().unwrap();
        assert_eq!(latest.status, SiteStatus::Up);
    }

    #[tokio::test]
    async fn duplicate_urls_conflict() {
        let (registry, _dir) = create_test_registry().await;
        registry.create_target(&NewTarget::new("https://example.com")).await.unwrap();

        let err = registry.create_target(&NewTarget::new("https://example.com")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Conflict));

        let sink = NewSink { url: "https://hooks.example.com/a".to_string(), name: None };
        registry.create_sink(&sink).await.unwrap();
        let err = registry.create_sink(&sink).await.unwrap_err();
        assert!(matches!(err, RegistryError::Conflict));
    }

    #[tokio::test]
    async fn delete_target_removes_history() {
        let (registry, _dir) = create_test_registry().await;
        let target = registry.create_target(&NewTarget::new("https://example.com")).await.unwrap();
        let observation = Observation::from_outcome(target.id, ProbeOutcome::up(5, 200), Utc::now());
        registry.append_observation(&observation).await.unwrap();

        registry.delete_target(target.id).await.unwrap();

        assert!(registry.get_target(target.id).await.unwrap().is_none());
        assert!(registry.list_observations(target.id, 10).await.unwrap().is_empty());
        assert!(matches!(registry.delete_target(target.id).await, Err(RegistryError::NotFound)));
    }

    #[tokio::test]
    async fn observation_for_deleted_target_is_rejected() {
        let (registry, _dir) = create_test_registry().await;
        let target = registry.create_target(&NewTarget::new("https://example.com")).await.unwrap();
        registry.delete_target(target.id).await.unwrap();

        let late = Observation::from_outcome(target.id, ProbeOutcome::up(5, 200), Utc::now());
        let err = registry.append_observation(&late).await.unwrap_err();

        assert!(matches!(err, RegistryError::NotFound), "{err}");
        assert!(registry.list_observations(target.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn interval_must_fit_storage() {
        let (registry, _dir) = create_test_registry().await;

        let err = registry
            .create_target(&NewTarget::new("https://example.com").with_interval(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::OutOfRange(_)));
        assert!(registry.list_targets().await.unwrap().is_empty());

        let long = registry
            .create_target(&NewTarget::new("https://example.org").with_interval(i64::MAX as u64))
            .await
            .unwrap();
        assert_eq!(registry.list_targets().await.unwrap(), vec![long]);
    }

    #[tokio::test]
    async fn optional_columns_round_trip() {
        let (registry, _dir) = create_test_registry().await;
        let target = registry
            .create_target(
                &NewTarget::new("https://example.com/health")
                    .with_name("Health")
                    .with_interval(60)
                    .with_expected_status(204),
            )
            .await
            .unwrap();

        let listed = registry.list_targets().await.unwrap();
        assert_eq!(listed, vec![target.clone()]);

        let mut observation = Observation::from_outcome(
            target.id,
            ProbeOutcome::transport_failure("dns error"),
            Utc::now(),
        );
        observation.transition_at = Some(observation.checked_at);
        registry.append_observation(&observation).await.unwrap();

        let history = registry.list_observations(target.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].latency_ms.is_none());
        assert!(history[0].status_code.is_none());
        assert_eq!(history[0].error_message.as_deref(), Some("dns error"));
        assert!(history[0].is_transition());
    }
}
