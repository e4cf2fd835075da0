use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio::{self, sync::Mutex},
    Build, Orbit, Rocket,
};

use crate::{
    config::Config,
    engine::Engine,
    model::common::{ElectionId, ElectionStatus},
    scheduled_task::ScheduledTask,
};

/// A lifecycle step an election can be scheduled to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// `upcoming -> active`
    Open,
    /// `-> completed`
    Close,
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Close => "close",
        })
    }
}

/// Map from an election and a transition to the task that will apply it.
type TaskMap = HashMap<(ElectionId, Transition), ScheduledTask<()>>;

/// Scheduled tasks that open elections at their start time and close them at their end time.
pub struct ElectionScheduler {
    engine: Engine,
    tasks: Arc<Mutex<TaskMap>>,
}

impl ElectionScheduler {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            tasks: Default::default(),
        }
    }

    /// Schedule every transition still ahead of each election in the catalog.
    pub async fn schedule_elections(&self) {
        for election in self.engine.elections() {
            match election.status {
                ElectionStatus::Upcoming => {
                    self.schedule(&election.id, Transition::Open, election.start_at)
                        .await;
                    self.schedule(&election.id, Transition::Close, election.end_at)
                        .await;
                }
                ElectionStatus::Active => {
                    self.schedule(&election.id, Transition::Close, election.end_at)
                        .await;
                }
                ElectionStatus::Completed => {}
            }
        }
    }

    /// Schedule a transition for the given election.
    /// If one already exists, it will be rescheduled.
    pub async fn schedule(&self, election_id: &ElectionId, transition: Transition, at: DateTime<Utc>) {
        let key = (election_id.clone(), transition);
        let task = Self::transition_task(
            self.engine.clone(),
            election_id.clone(),
            transition,
            self.tasks.clone(),
        );

        let mut tasks_locked = self.tasks.lock().await;
        if let Some(previous) = tasks_locked.remove(&key) {
            if previous.cancel().await {
                debug!("Replaced an already completed {transition} task for {election_id}");
            }
        }
        trace!("Scheduling {transition} of {election_id} at {at}");
        tasks_locked.insert(key, ScheduledTask::new(task, at));
    }

    /// Is a transition pending for the given election?
    pub async fn is_pending(&self, election_id: &ElectionId, transition: Transition) -> bool {
        self.tasks
            .lock()
            .await
            .contains_key(&(election_id.clone(), transition))
    }

    /// Apply a transition immediately, cancelling the scheduled one.
    /// Closing also cancels a pending open.
    ///
    /// Returns the resulting status, or `None` for an unknown election.
    pub async fn apply_now(
        &self,
        election_id: &ElectionId,
        transition: Transition,
    ) -> Option<ElectionStatus> {
        let mut cancelled = vec![self.take(election_id, transition).await];
        if transition == Transition::Close {
            cancelled.push(self.take(election_id, Transition::Open).await);
        }
        for task in cancelled.into_iter().flatten() {
            task.cancel().await;
        }

        let status = apply(&self.engine, election_id, transition);
        if status.is_some() {
            info!("Applied {transition} of {election_id} on request");
        }
        status
    }

    async fn take(
        &self,
        election_id: &ElectionId,
        transition: Transition,
    ) -> Option<ScheduledTask<()>> {
        self.tasks
            .lock()
            .await
            .remove(&(election_id.clone(), transition))
    }

    /// The task body: apply the transition, then remove itself from the map.
    async fn transition_task(
        engine: Engine,
        election_id: ElectionId,
        transition: Transition,
        tasks: Arc<Mutex<TaskMap>>,
    ) {
        debug!("Running scheduled {transition} of {election_id}");
        apply(&engine, &election_id, transition);
        tasks.lock().await.remove(&(election_id, transition));
        trace!("Transition completed; removed self from list");
    }
}

fn apply(engine: &Engine, election_id: &ElectionId, transition: Transition) -> Option<ElectionStatus> {
    let catalog = &engine.store().catalog;
    let status = match transition {
        Transition::Open => catalog.open(election_id),
        Transition::Close => catalog.close(election_id),
    };
    match status {
        Some(ElectionStatus::Completed) if transition == Transition::Open => {
            warn!("Cannot open {election_id}: it has already closed");
        }
        None => warn!("Cannot {transition} unknown election {election_id}"),
        _ => {}
    }
    status
}

/// A fairing that schedules lifecycle transitions for every election
/// during Rocket ignition, and places an `ElectionScheduler` into managed state.
/// This fairing depends on the engine being available in managed state,
/// and so must be attached after the fairing responsible for that.
pub struct SchedulerFairing;

#[rocket::async_trait]
impl Fairing for SchedulerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election Scheduler",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        info!("Scheduling election transitions...");
        let engine = match rocket.state::<Engine>() {
            Some(engine) => engine.clone(),
            None => {
                error!("Engine was not available when scheduling elections");
                return Err(rocket);
            }
        };
        let scheduler = ElectionScheduler::new(engine);
        scheduler.schedule_elections().await;
        info!("...election transitions scheduled!");

        rocket = rocket.manage(scheduler);
        Ok(rocket)
    }
}

/// A fairing that, once the server is up, periodically purges expired sessions.
pub struct SessionSweeperFairing;

#[rocket::async_trait]
impl Fairing for SessionSweeperFairing {
    fn info(&self) -> Info {
        Info {
            name: "Session Sweeper",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let (engine, config) = match (rocket.state::<Engine>(), rocket.state::<Config>()) {
            (Some(engine), Some(config)) => (engine.clone(), config),
            _ => {
                error!("Engine or config unavailable; expired sessions will only be evicted lazily");
                return;
            }
        };
        // A zero period would make `interval` panic.
        let period = config
            .session_sweep_interval()
            .to_std()
            .unwrap_or_default()
            .max(tokio::time::Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                match engine.store().sessions.purge_expired(Utc::now()) {
                    Ok(0) => trace!("No expired sessions to purge"),
                    Ok(purged) => debug!("Purged {purged} expired sessions"),
                    Err(e) => error!("Session sweep failed: {e}"),
                }
            }
        });
        info!("Sweeping expired sessions every {}s", period.as_secs());
    }
}
