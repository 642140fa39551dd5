//! Wall-clock countdown that follows remote playback.
//!
//! The countdown cannot observe the player. It advances a cursor over the
//! planned track durations at a fixed tick interval and reports which track
//! should be playing. Time left over when a track ends carries into the next
//! one so the cursor does not fall behind the real playback position.

use std::time::Duration;

use crate::{
    clock::{CancelToken, Clock, sleep_or_cancel},
    config,
    error::Result,
    types::{PlaybackPlan, TrackMetadata},
    utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    pub tick: Duration,
    /// Extra time waited after the last planned track.
    pub margin: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            margin: Duration::from_secs(60),
        }
    }
}

impl CountdownConfig {
    pub fn from_env() -> Self {
        Self {
            margin: config::playback_margin(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownEvent<'a> {
    NowPlaying {
        index: usize,
        track: &'a TrackMetadata,
    },
    Tick {
        tick: u64,
        elapsed: Duration,
        total: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownSummary {
    pub ticks: u64,
    /// Cursor advances after the initial track.
    pub track_changes: usize,
}

/// Pure countdown state. Each [`tick`](Self::tick) moves time forward by one
/// interval.
#[derive(Debug, Clone)]
pub struct Countdown {
    durations: Vec<u64>,
    tick_ms: u64,
    total_ms: u64,
    elapsed_ms: u64,
    in_track_ms: u64,
    cursor: usize,
}

impl Countdown {
    pub fn new(durations: Vec<u64>, tick: Duration, margin: Duration) -> Self {
        let total_ms = durations.iter().sum::<u64>() + margin.as_millis() as u64;
        Self {
            durations,
            tick_ms: (tick.as_millis() as u64).max(1),
            total_ms,
            elapsed_ms: 0,
            in_track_ms: 0,
            cursor: 0,
        }
    }

    /// Index of the track that should be playing, `None` once all ended.
    pub fn current(&self) -> Option<usize> {
        (self.cursor < self.durations.len()).then_some(self.cursor)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn total_ticks(&self) -> u64 {
        utils::ceil_div(self.total_ms, self.tick_ms)
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.total_ms
    }

    /// Advances by one interval and returns the indices of tracks that
    /// became current during it, in order.
    pub fn tick(&mut self) -> Vec<usize> {
        self.elapsed_ms += self.tick_ms;
        self.in_track_ms += self.tick_ms;

        let mut started = Vec::new();
        while let Some(index) = self.current() {
            let duration = self.durations[index];
            if self.in_track_ms < duration {
                break;
            }
            self.in_track_ms -= duration;
            self.cursor += 1;
            if let Some(next) = self.current() {
                started.push(next);
            }
        }
        started
    }
}

/// Runs the countdown for `plan` to completion.
///
/// `observer` sees a `NowPlaying` event for the first track before the first
/// tick, one for every later track as it starts, and a `Tick` event after
/// each interval. Returns [`Error::Cancelled`](crate::error::Error::Cancelled)
/// when `cancel` fires.
pub async fn await_completion<F>(
    clock: &dyn Clock,
    plan: &PlaybackPlan,
    config: CountdownConfig,
    cancel: &CancelToken,
    mut observer: F,
) -> Result<CountdownSummary>
where
    F: FnMut(CountdownEvent<'_>),
{
    let mut countdown = Countdown::new(plan.durations(), config.tick, config.margin);
    let total = Duration::from_millis(countdown.total_ms());
    let mut summary = CountdownSummary {
        ticks: 0,
        track_changes: 0,
    };

    if let Some(index) = countdown.current() {
        observer(CountdownEvent::NowPlaying {
            index,
            track: &plan.tracks()[index],
        });
    }

    while !countdown.is_complete() {
        sleep_or_cancel(clock, config.tick, cancel).await?;

        for index in countdown.tick() {
            summary.track_changes += 1;
            observer(CountdownEvent::NowPlaying {
                index,
                track: &plan.tracks()[index],
            });
        }

        summary.ticks += 1;
        observer(CountdownEvent::Tick {
            tick: summary.ticks,
            elapsed: Duration::from_millis(countdown.elapsed_ms()),
            total,
        });
    }

    Ok(summary)
}
