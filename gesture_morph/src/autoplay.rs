//! Idle-driven slideshow on top of the navigation state.
//!
//! Polled once per render frame after the navigator has run.  Any manual
//! browse or mode switch moves `last_switch`, which restarts the countdown.

use std::time::Duration;

use tracing::debug;

use crate::navigation::{BrowseCause, Mode, NavEvent, SessionState};

#[derive(Clone, Debug)]
pub struct Autoplay {
    idle_interval: Duration,
}

impl Autoplay {
    pub fn new(idle_interval: Duration) -> Self { Autoplay { idle_interval } }

    pub fn idle_interval(&self) -> Duration { self.idle_interval }

    /// Advance to the next photo if the session has been idle for strictly
    /// longer than the idle interval.
    pub fn poll(
        &self,
        state:       &mut SessionState,
        photo_count: usize,
        now:         Duration,
    ) -> Option<NavEvent> {
        let eligible = state.mode == Mode::PhotoView
            && state.autoplay_enabled
            && !state.lock_engaged
            && photo_count > 1;
        if !eligible || now.saturating_sub(state.last_switch) <= self.idle_interval {
            return None;
        }

        let index = state.browse(1, photo_count, now);
        debug!(index, "autoplay advance");
        Some(NavEvent::Browsed { index, cause: BrowseCause::Autoplay })
    }
}
