use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cryptforge_domain::{RunEvent, RunId, RunResult};

use crate::infrastructure::ports::{RepoError, RunRepo};

/// Run storage: terminal results plus per-run event logs.
#[derive(Default)]
pub struct InMemoryRunRepo {
    results: RwLock<HashMap<RunId, RunResult>>,
    events: RwLock<HashMap<RunId, Vec<RunEvent>>>,
}

impl InMemoryRunRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRepo for InMemoryRunRepo {
    async fn save_result(&self, result: &RunResult) -> Result<(), RepoError> {
        let mut results = self.results.write().await;
        if results.contains_key(&result.run_id) {
            return Err(RepoError::constraint(format!(
                "run {} already has a terminal result",
                result.run_id
            )));
        }
        results.insert(result.run_id, result.clone());
        Ok(())
    }

    async fn get_result(&self, run_id: RunId) -> Result<Option<RunResult>, RepoError> {
        Ok(self.results.read().await.get(&run_id).cloned())
    }

    async fn append_events(&self, run_id: RunId, events: &[RunEvent]) -> Result<(), RepoError> {
        self.events
            .write()
            .await
            .entry(run_id)
            .or_default()
            .extend_from_slice(events);
        Ok(())
    }

    async fn get_events(&self, run_id: RunId) -> Result<Vec<RunEvent>, RepoError> {
        Ok(self
            .events
            .read()
            .await
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cryptforge_domain::DungeonId;

    #[tokio::test]
    async fn second_terminal_result_is_rejected() {
        let repo = InMemoryRunRepo::new();
        let run_id = RunId::new();
        let result = RunResult::error(run_id, DungeonId::from("d"), "first", Utc::now());
        repo.save_result(&result).await.unwrap();

        let again = RunResult::error(run_id, DungeonId::from("d"), "second", Utc::now());
        let err = repo.save_result(&again).await.unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));

        let stored = repo.get_result(run_id).await.unwrap().unwrap();
        assert_eq!(stored.events, result.events);
    }

    #[tokio::test]
    async fn events_append_in_order() {
        let repo = InMemoryRunRepo::new();
        let run_id = RunId::new();
        repo.append_events(run_id, &[RunEvent::Rest { level: 1 }])
            .await
            .unwrap();
        repo.append_events(run_id, &[RunEvent::PartyWipe { level: 2 }])
            .await
            .unwrap();
        assert_eq!(
            repo.get_events(run_id).await.unwrap(),
            vec![RunEvent::Rest { level: 1 }, RunEvent::PartyWipe { level: 2 }]
        );
        assert!(repo.get_events(RunId::new()).await.unwrap().is_empty());
    }
}
