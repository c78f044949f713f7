use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::repository;
use crate::error::AppError;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    date: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date: Mutex::new(date) }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverState {
    Waiting,
    Resetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No reset date was stored yet; today was recorded without clearing flags.
    Initialized,
    Unchanged,
    Reset { cleared: u64 },
}

/// Clears every task's today flag once the calendar date changes.
///
/// The date of the last reset is persisted, so a restart that spans midnight
/// still triggers a reset on the first wake.
pub struct RolloverScheduler {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
    interval: Duration,
    state: RolloverState,
}

impl RolloverScheduler {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            db,
            clock,
            interval,
            state: RolloverState::Waiting,
        }
    }

    pub fn state(&self) -> RolloverState {
        self.state
    }

    /// One wake: compare dates and reset if the day changed.
    pub async fn tick(&mut self) -> Result<TickOutcome, AppError> {
        let today = self.clock.today();

        let mut tx = self.db.begin().await?;
        let last = repository::last_reset_date(&mut tx).await?;

        match last {
            Some(date) if date == today => Ok(TickOutcome::Unchanged),
            None => {
                repository::record_reset_date(&mut tx, today).await?;
                tx.commit().await?;
                debug!("rollover date initialized to {}", today);
                Ok(TickOutcome::Initialized)
            }
            Some(_) => {
                self.state = RolloverState::Resetting;
                let result = async {
                    let cleared = repository::clear_today_flags(&mut tx).await?;
                    repository::record_reset_date(&mut tx, today).await?;
                    tx.commit().await?;
                    Ok::<_, AppError>(cleared)
                }
                .await;
                self.state = RolloverState::Waiting;

                let cleared = result?;
                info!("day rolled over to {}, cleared {} today flags", today, cleared);
                Ok(TickOutcome::Reset { cleared })
            }
        }
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!("Starting day-rollover scheduler (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.tick().await {
                        warn!("Day rollover failed: {:?}", e);
                    }
                }
            }
        }

        info!("Day-rollover scheduler stopped");
    }

    /// Runs the loop on the tokio runtime until the handle is stopped.
    pub fn spawn(self) -> RolloverHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        RolloverHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct RolloverHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RolloverHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!("day-rollover task ended abnormally: {}", e);
        }
    }
}
