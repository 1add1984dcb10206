//! Alarm service
//!
//! Fires the class-time overlay when a routine's time of day matches the
//! clock. `AlarmTrigger` is the state machine; `AlarmService` feeds it from a
//! background tick and publishes events to whoever renders the overlay.
//!
//! Dedup is keyed by (routine id, minute). A routine fires at most once per
//! matching minute and fires again the next day.

use crate::database::ClassRoutine;
use crate::error::Result;
use crate::services::RoutinesService;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A calendar day plus a time of day truncated to the minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MinuteKey {
    date: NaiveDate,
    hour: u32,
    minute: u32,
}

impl MinuteKey {
    pub fn new(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self { date, hour, minute }
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self::new(dt.date(), dt.hour(), dt.minute())
    }

    pub fn naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }

    /// `HH:MM`, the format routines store their time in
    pub fn time_of_day(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl fmt::Display for MinuteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time_of_day())
    }
}

/// Trigger state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmState {
    /// No enabled routine is still ahead today
    Idle,
    /// An enabled routine's time is at or after the current minute
    Armed,
    /// The overlay is showing this routine
    Fired(ClassRoutine),
}

/// Per-minute alarm state machine
#[derive(Debug)]
pub struct AlarmTrigger {
    state: AlarmState,
    window: Option<MinuteKey>,
    consumed: HashSet<String>,
    armed: bool,
}

impl Default for AlarmTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmTrigger {
    pub fn new() -> Self {
        Self {
            state: AlarmState::Idle,
            window: None,
            consumed: HashSet::new(),
            armed: false,
        }
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    /// Routine currently on the overlay
    pub fn fired(&self) -> Option<&ClassRoutine> {
        match &self.state {
            AlarmState::Fired(routine) => Some(routine),
            _ => None,
        }
    }

    /// Evaluate one clock tick. Returns the routine that just fired, if any.
    ///
    /// Only one routine can be on the overlay. When several match the same
    /// minute the first in stored order fires; the others fire on later ticks
    /// in that minute once the overlay is dismissed. A routine due in a later
    /// minute replaces an overlay that is still showing.
    pub fn tick(&mut self, routines: &[ClassRoutine], now: MinuteKey) -> Option<ClassRoutine> {
        let new_window = self.window != Some(now);
        if new_window {
            self.window = Some(now);
            self.consumed.clear();
        }

        self.armed = now
            .naive_time()
            .is_some_and(|time| next_upcoming(routines, time).is_some());

        if self.fired().is_some() && !new_window {
            return None;
        }

        let time = now.time_of_day();
        let due = routines
            .iter()
            .find(|r| r.alarm_active && r.time == time && !self.consumed.contains(&r.id));

        match due {
            Some(routine) => {
                self.consumed.insert(routine.id.clone());
                self.state = AlarmState::Fired(routine.clone());
                Some(routine.clone())
            }
            None => {
                if self.fired().is_none() {
                    self.state = self.resting_state();
                }
                None
            }
        }
    }

    /// Clear the overlay. The routine's `alarm_active` flag is untouched.
    pub fn dismiss(&mut self) -> Option<ClassRoutine> {
        let previous = std::mem::replace(&mut self.state, AlarmState::Idle);
        self.state = self.resting_state();

        match previous {
            AlarmState::Fired(routine) => Some(routine),
            _ => None,
        }
    }

    fn resting_state(&self) -> AlarmState {
        if self.armed {
            AlarmState::Armed
        } else {
            AlarmState::Idle
        }
    }
}

/// Earliest active routine at or after `now` today, first in stored order on ties
pub fn next_upcoming(routines: &[ClassRoutine], now: NaiveTime) -> Option<&ClassRoutine> {
    let now = now.with_second(0).unwrap_or(now).with_nanosecond(0).unwrap_or(now);

    routines
        .iter()
        .filter(|r| r.alarm_active)
        .filter_map(|r| {
            NaiveTime::parse_from_str(&r.time, "%H:%M")
                .ok()
                .map(|t| (t, r))
        })
        .filter(|(t, _)| *t >= now)
        .min_by_key(|(t, _)| *t)
        .map(|(_, r)| r)
}

/// Event published to the overlay renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEvent {
    Fired(ClassRoutine),
    Dismissed(ClassRoutine),
}

/// Alarm service with background scheduler
#[derive(Clone)]
pub struct AlarmService {
    routines: RoutinesService,
    clock: Arc<dyn Clock>,
    trigger: Arc<Mutex<AlarmTrigger>>,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<AlarmEvent>>>>,
    tick_interval: Duration,
}

impl AlarmService {
    pub fn new(routines: RoutinesService, clock: Arc<dyn Clock>, tick_interval: Duration) -> Self {
        Self {
            routines,
            clock,
            trigger: Arc::new(Mutex::new(AlarmTrigger::new())),
            events: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    /// Receive fired/dismissed events. A later call replaces the earlier receiver.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<AlarmEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().await = Some(tx);
        rx
    }

    /// Current trigger state
    pub async fn state(&self) -> AlarmState {
        self.trigger.lock().await.state().clone()
    }

    /// Start the background scheduler
    pub fn start_scheduler(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting alarm scheduler (tick every {:?})", self.tick_interval);

            let mut interval = tokio::time::interval(self.tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                if let Err(e) = self.check_and_trigger().await {
                    tracing::error!("Error checking alarms: {}", e);
                }
            }
        })
    }

    /// Run one tick against the stored routines
    pub async fn check_and_trigger(&self) -> Result<Option<ClassRoutine>> {
        let routines = self.routines.list().await?;
        let now = MinuteKey::from_datetime(self.clock.now());

        let (replaced, fired) = {
            let mut trigger = self.trigger.lock().await;
            let showing = trigger.fired().cloned();
            let fired = trigger.tick(&routines, now);
            (showing.filter(|_| fired.is_some()), fired)
        };

        if let Some(routine) = replaced {
            tracing::info!("Alarm for routine {} replaced by a later class", routine.id);
            self.publish(AlarmEvent::Dismissed(routine)).await;
        }

        if let Some(routine) = &fired {
            tracing::info!(
                "Alarm fired for routine {} (class {} {}) at {}",
                routine.id,
                routine.class_name,
                routine.section,
                now
            );
            self.publish(AlarmEvent::Fired(routine.clone())).await;
        }

        Ok(fired)
    }

    /// Dismiss the overlay, if one is showing
    pub async fn dismiss(&self) -> Option<ClassRoutine> {
        let dismissed = self.trigger.lock().await.dismiss();

        if let Some(routine) = &dismissed {
            tracing::info!("Alarm dismissed for routine {}", routine.id);
            self.publish(AlarmEvent::Dismissed(routine.clone())).await;
        }

        dismissed
    }

    async fn publish(&self, event: AlarmEvent) {
        let events = self.events.lock().await;

        if let Some(tx) = events.as_ref() {
            if tx.send(event).is_err() {
                tracing::debug!("Alarm event dropped, no subscriber");
            }
        }
    }
}
