//! Autoplay timer: the one repeating interval a carousel may own, plus the
//! settle deadline that ends a transition.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::debug;

/// What woke the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Autoplay interval elapsed
    Tick,
    /// Settle delay after a slide change elapsed
    Settled,
}

pub struct AutoplayTimer {
    period: Duration,
    settle: Duration,
    interval: Option<Interval>,
    settle_deadline: Option<Pin<Box<Sleep>>>,
    arm_count: u64,
}

impl AutoplayTimer {
    pub fn new(period: Duration, settle: Duration) -> Self {
        Self {
            period,
            settle,
            interval: None,
            settle_deadline: None,
            arm_count: 0,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    #[inline]
    pub fn is_settling(&self) -> bool {
        self.settle_deadline.is_some()
    }

    /// How many times the interval has been scheduled
    #[inline]
    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    /// Schedule the repeating tick. First tick is one full period away.
    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }

        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        self.arm_count += 1;
        debug!("Autoplay timer armed ({}ms)", self.period.as_millis());
    }

    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("Autoplay timer stopped");
        }
    }

    /// (Re)arm the settle deadline; replaces any pending one
    pub fn begin_settle(&mut self) {
        self.settle_deadline = Some(Box::pin(time::sleep(self.settle)));
    }

    pub fn cancel_settle(&mut self) {
        self.settle_deadline = None;
    }

    /// Stop everything
    pub fn shutdown(&mut self) {
        self.stop();
        self.cancel_settle();
    }

    /// Wait for the next tick or settle. Never resolves while nothing is
    /// armed. Cancel-safe.
    pub async fn next(&mut self) -> TimerEvent {
        let Self {
            interval,
            settle_deadline,
            ..
        } = &mut *self;

        let event = tokio::select! {
            _ = wait_interval(interval) => TimerEvent::Tick,
            _ = wait_settle(settle_deadline) => TimerEvent::Settled,
        };

        if event == TimerEvent::Settled {
            self.settle_deadline = None;
        }
        event
    }
}

async fn wait_interval(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn wait_settle(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => pending::<()>().await,
    }
}
