//! Periodic background tasks.
//!
//! A [`Task`] is run once per period by [`spawn_periodic`] until the stop
//! signal is raised. Passes never overlap: a pass that takes longer than the
//! period delays the next tick instead of bursting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

/// A unit of work invoked on a fixed schedule.
pub trait Task: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run one pass. Errors are handled (logged) by the task itself.
    fn run(&self) -> impl Future<Output = ()> + Send;
}

/// Spawn `task` on the current runtime, running it every `period`.
///
/// The first pass starts immediately. A pass in progress is allowed to finish
/// when the stop signal arrives; no further pass is started afterwards.
pub fn spawn_periodic<T: Task>(
    task: Arc<T>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("{}: started with period {:?}", task.name(), period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                    trace!("{}: running", task.name());
                    task.run().await;
                }
                _ = stop_rx.changed() => {
                    break;
                }
            }
        }

        debug!("{}: stopped", task.name());
    })
}
