//! Tick scheduler background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace};

use crate::state::AppState;

/// Period between two ticks of the shared countdown clock
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that advances every running timer once per second.
///
/// A single interval drives all timers. Ticks that change nothing produce no
/// broadcast.
pub async fn tick_scheduler_task(state: Arc<AppState>) {
    info!("Starting tick scheduler task");

    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if state.tick() {
            trace!("Tick changed timer state, snapshot broadcast");
        }
    }
}
