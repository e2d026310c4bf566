//! Hero lease locks.
//!
//! A hero may take part in one run at a time. A lease expires on its own
//! after a fixed horizon, so a crashed worker cannot hold a hero forever.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cryptforge_domain::{HeroLock, HeroRef, RunId};

use crate::infrastructure::ports::{ClockPort, LockCoordinator, LockError};

pub struct LeaseLockCoordinator {
    leases: Mutex<HashMap<HeroRef, HeroLock>>,
    clock: Arc<dyn ClockPort>,
    lease: chrono::Duration,
}

impl LeaseLockCoordinator {
    pub fn new(clock: Arc<dyn ClockPort>, lease: std::time::Duration) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            clock,
            lease: chrono::Duration::from_std(lease).unwrap_or(chrono::Duration::hours(1)),
        }
    }

    /// Unexpired leases, ordered by hero.
    pub async fn active_leases(&self) -> Vec<HeroLock> {
        let now = self.clock.now();
        let mut active: Vec<HeroLock> = self
            .leases
            .lock()
            .await
            .values()
            .filter(|lock| !lock.is_expired(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.hero.cmp(&b.hero));
        active
    }
}

#[async_trait]
impl LockCoordinator for LeaseLockCoordinator {
    async fn acquire(&self, run_id: RunId, heroes: &[HeroRef]) -> Result<(), LockError> {
        let now = self.clock.now();
        let mut leases = self.leases.lock().await;

        // Leases left behind by runs that never released expire here
        let before = leases.len();
        leases.retain(|_, lock| !lock.is_expired(now));
        if leases.len() < before {
            tracing::debug!(purged = before - leases.len(), "Dropped expired leases");
        }

        // Check every hero before taking any lease
        for hero in heroes {
            if let Some(lock) = leases.get(hero) {
                if lock.run_id != run_id && !lock.is_expired(now) {
                    tracing::warn!(
                        run_id = %run_id,
                        hero = %hero,
                        held_by = %lock.run_id,
                        "Hero lease conflict"
                    );
                    return Err(LockError::Conflict {
                        hero: hero.clone(),
                        held_by: lock.run_id,
                        expires_at: lock.expires_at,
                    });
                }
            }
        }

        let expires_at = now + self.lease;
        for hero in heroes {
            leases.insert(
                hero.clone(),
                HeroLock {
                    hero: hero.clone(),
                    run_id,
                    acquired_at: now,
                    expires_at,
                },
            );
        }
        tracing::debug!(run_id = %run_id, heroes = heroes.len(), %expires_at, "Leased heroes");
        Ok(())
    }

    async fn release(&self, run_id: RunId, heroes: &[HeroRef]) {
        let mut leases = self.leases.lock().await;
        for hero in heroes {
            if leases.get(hero).is_some_and(|lock| lock.run_id == run_id) {
                leases.remove(hero);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, ManualClock};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn heroes(tokens: &[u64]) -> Vec<HeroRef> {
        tokens.iter().map(|t| HeroRef::new("0xheroes", *t)).collect()
    }

    fn coordinator() -> LeaseLockCoordinator {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        LeaseLockCoordinator::new(Arc::new(FixedClock(now)), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn when_runs_race_for_one_hero_then_exactly_one_wins() {
        let locks = Arc::new(coordinator());
        let contested = heroes(&[7]);

        let attempts = (0..16).map(|_| {
            let locks = locks.clone();
            let contested = contested.clone();
            tokio::spawn(async move { locks.acquire(RunId::new(), &contested).await })
        });
        let results = futures_util::future::join_all(attempts).await;

        let winners = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(locks.active_leases().await.len(), 1);
    }

    #[tokio::test]
    async fn when_any_hero_is_taken_then_nothing_is_acquired() {
        let locks = coordinator();
        let first = RunId::new();
        let second = RunId::new();
        locks.acquire(first, &heroes(&[2])).await.unwrap();

        let err = locks.acquire(second, &heroes(&[1, 2, 3])).await.unwrap_err();

        let LockError::Conflict { hero, held_by, .. } = err;
        assert_eq!(hero, HeroRef::new("0xheroes", 2));
        assert_eq!(held_by, first);
        let active = locks.active_leases().await;
        assert_eq!(active.len(), 1);
        assert!(active.iter().all(|l| l.run_id == first));
    }

    #[tokio::test]
    async fn when_lease_expires_then_hero_is_free_again() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let locks = LeaseLockCoordinator::new(clock.clone(), Duration::from_secs(60));
        let party = heroes(&[1]);

        locks.acquire(RunId::new(), &party).await.unwrap();
        assert!(locks.acquire(RunId::new(), &party).await.is_err());

        clock.advance(chrono::Duration::seconds(60));
        assert!(locks.active_leases().await.is_empty());
        locks.acquire(RunId::new(), &party).await.unwrap();
    }

    #[tokio::test]
    async fn when_released_twice_then_second_release_is_a_no_op() {
        let locks = coordinator();
        let run = RunId::new();
        let party = heroes(&[1, 2]);
        locks.acquire(run, &party).await.unwrap();

        locks.release(run, &party).await;
        locks.release(run, &party).await;

        assert!(locks.active_leases().await.is_empty());
        locks.acquire(RunId::new(), &party).await.unwrap();
    }

    #[tokio::test]
    async fn when_other_run_releases_then_lease_is_kept() {
        let locks = coordinator();
        let owner = RunId::new();
        let party = heroes(&[4]);
        locks.acquire(owner, &party).await.unwrap();

        locks.release(RunId::new(), &party).await;

        assert_eq!(locks.active_leases().await[0].run_id, owner);
    }

    #[tokio::test]
    async fn when_same_run_acquires_again_then_lease_is_refreshed() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let locks = LeaseLockCoordinator::new(clock.clone(), Duration::from_secs(60));
        let run = RunId::new();
        let party = heroes(&[1]);

        locks.acquire(run, &party).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        locks.acquire(run, &party).await.unwrap();

        let lease = &locks.active_leases().await[0];
        assert_eq!(lease.expires_at, start + chrono::Duration::seconds(90));
    }

    #[tokio::test]
    async fn when_acquiring_then_expired_leases_are_dropped() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let locks = LeaseLockCoordinator::new(clock.clone(), Duration::from_secs(60));

        // Never released, as after a crashed run
        locks.acquire(RunId::new(), &heroes(&[1])).await.unwrap();
        clock.advance(chrono::Duration::seconds(45));
        locks.acquire(RunId::new(), &heroes(&[2])).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(locks.leases.lock().await.len(), 2);

        locks.acquire(RunId::new(), &heroes(&[3])).await.unwrap();

        let held: Vec<HeroRef> = locks.leases.lock().await.keys().cloned().collect();
        assert_eq!(held.len(), 2);
        assert!(!held.contains(&HeroRef::new("0xheroes", 1)));
    }
}
