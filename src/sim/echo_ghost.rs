//! Echo ghost: a delayed replay of the snake
//!
//! Every tick the snake's body is pushed into a fixed ring of samples. Once
//! enough ticks have passed, the ghost shows the body from `delay_ticks`
//! samples ago and acts as a moving hazard. When recording stops the ghost
//! drains what is left of the ring, fading as it goes.

use serde::{Deserialize, Serialize};

use super::grid::GridPosition;
use super::rewind::Rewindable;
use crate::settings::ConfigError;

/// One tick of recorded body, head first
pub type EchoGhostSample = Vec<GridPosition>;

/// Ghost timing and buffer sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoGhostConfig {
    /// How far behind the snake the ghost runs
    pub delay_ms: f64,
    pub tick_duration_ms: f64,
    pub buffer_capacity: usize,
    /// Remaining samples below which the fade-out starts dimming
    pub trail_window: usize,
    pub max_opacity: f32,
}

impl EchoGhostConfig {
    /// Delay rounded to whole ticks
    pub fn delay_ticks(&self) -> u32 {
        if !(self.tick_duration_ms.is_finite() && self.tick_duration_ms > 0.0) {
            return 0;
        }
        // Saturating cast: negative delays become 0
        (self.delay_ms / self.tick_duration_ms).round() as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_duration_ms.is_finite() && self.tick_duration_ms > 0.0) {
            return Err(ConfigError::InvalidStepDuration(self.tick_duration_ms));
        }
        let delay = self.delay_ticks() as usize;
        if delay == 0 {
            return Err(ConfigError::GhostDelayTooShort {
                delay_ms: self.delay_ms,
                tick_ms: self.tick_duration_ms,
            });
        }
        if self.trail_window == 0 {
            return Err(ConfigError::EmptyTrailWindow);
        }
        if !(self.max_opacity > 0.0 && self.max_opacity <= 1.0) {
            return Err(ConfigError::InvalidOpacity(self.max_opacity));
        }
        let required = delay + self.trail_window;
        if self.buffer_capacity < required {
            return Err(ConfigError::GhostCapacityTooSmall {
                capacity: self.buffer_capacity,
                required,
            });
        }
        Ok(())
    }
}

/// Ghost lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EchoGhostState {
    /// Buffering, not yet far enough behind to play
    Recording,
    /// Playing back the delayed body
    Active,
    /// Recording stopped, draining the buffer
    FadingOut,
    /// Nothing left to play until reset
    Expired,
}

#[derive(Debug, Clone)]
pub struct EchoGhost {
    config: EchoGhostConfig,
    delay_ticks: usize,
    /// Ring of samples, `buffer_capacity` long
    slots: Vec<EchoGhostSample>,
    write_index: usize,
    /// Samples stored, at most the ring length
    count: usize,
    /// Distance back from `write_index` to the playback slot
    read_offset: usize,
    state: EchoGhostState,
    opacity: f32,
    current: EchoGhostSample,
    ticks_since_start: u64,
}

/// Rewind capsule for [`EchoGhost`]
#[derive(Debug, Clone, PartialEq)]
pub struct EchoGhostCapsule {
    pub slots: Vec<EchoGhostSample>,
    pub write_index: usize,
    pub count: usize,
    pub read_offset: usize,
    pub state: EchoGhostState,
    pub opacity: f32,
    pub current: EchoGhostSample,
    pub ticks_since_start: u64,
}

impl EchoGhost {
    pub fn new(config: EchoGhostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            delay_ticks: config.delay_ticks() as usize,
            slots: vec![Vec::new(); config.buffer_capacity],
            write_index: 0,
            count: 0,
            read_offset: 0,
            state: EchoGhostState::Recording,
            opacity: 0.0,
            current: Vec::new(),
            ticks_since_start: 0,
        })
    }

    pub fn config(&self) -> &EchoGhostConfig {
        &self.config
    }

    pub fn delay_ticks(&self) -> usize {
        self.delay_ticks
    }

    pub fn state(&self) -> EchoGhostState {
        self.state
    }

    /// True while playback is valid (live or fading)
    pub fn is_active(&self) -> bool {
        matches!(self.state, EchoGhostState::Active | EchoGhostState::FadingOut)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn ticks_since_start(&self) -> u64 {
        self.ticks_since_start
    }

    /// Samples not yet consumed by playback
    pub fn buffered(&self) -> usize {
        match self.state {
            EchoGhostState::Recording => self.count,
            EchoGhostState::Active | EchoGhostState::FadingOut => self.read_offset,
            EchoGhostState::Expired => 0,
        }
    }

    /// Body currently played back, empty while inactive
    pub fn playback_segments(&self) -> &[GridPosition] {
        &self.current
    }

    pub fn playback_head(&self) -> Option<GridPosition> {
        self.current.first().copied()
    }

    fn read_index(&self) -> usize {
        let cap = self.slots.len();
        (self.write_index + cap - self.read_offset) % cap
    }

    fn fade_opacity(&self, remaining: usize) -> f32 {
        let ratio = remaining as f32 / self.config.trail_window as f32;
        self.config.max_opacity * ratio.min(1.0)
    }

    /// Push this tick's body. Overwrites the oldest sample when the ring is
    /// full; ignored once recording has stopped.
    pub fn record(&mut self, segments: &[GridPosition]) {
        if !matches!(self.state, EchoGhostState::Recording | EchoGhostState::Active) {
            return;
        }
        let cap = self.slots.len();
        let slot = &mut self.slots[self.write_index];
        slot.clear();
        slot.extend_from_slice(segments);
        self.write_index = (self.write_index + 1) % cap;
        self.count = (self.count + 1).min(cap);
        self.ticks_since_start += 1;

        if self.ticks_since_start >= self.delay_ticks as u64 {
            if self.state == EchoGhostState::Recording {
                log::debug!("Echo ghost active after {} ticks", self.ticks_since_start);
            }
            self.state = EchoGhostState::Active;
            self.read_offset = self.delay_ticks;
            self.current.clone_from(&self.slots[self.read_index()]);
            self.opacity = self.config.max_opacity;
        }
    }

    /// Stop accepting samples and start draining
    pub fn stop_recording(&mut self) {
        match self.state {
            EchoGhostState::Recording => {
                // Never played: drain everything from the oldest sample
                self.read_offset = self.count;
            }
            EchoGhostState::Active => {}
            EchoGhostState::FadingOut | EchoGhostState::Expired => return,
        }
        self.state = EchoGhostState::FadingOut;
        if self.read_offset == 0 {
            self.expire();
            return;
        }
        self.current.clone_from(&self.slots[self.read_index()]);
        self.opacity = self.fade_opacity(self.read_offset);
        log::debug!("Echo ghost fading with {} samples", self.read_offset);
    }

    /// Consume one buffered sample. Returns true once the ghost has expired.
    pub fn advance_fade_out(&mut self) -> bool {
        if self.state != EchoGhostState::FadingOut {
            return self.state == EchoGhostState::Expired;
        }
        self.read_offset -= 1;
        if self.read_offset == 0 {
            self.expire();
            return true;
        }
        self.current.clone_from(&self.slots[self.read_index()]);
        self.opacity = self.fade_opacity(self.read_offset);
        false
    }

    fn expire(&mut self) {
        self.state = EchoGhostState::Expired;
        self.read_offset = 0;
        self.opacity = 0.0;
        self.current.clear();
        log::debug!("Echo ghost expired");
    }

    /// Discard all history and start recording again
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.write_index = 0;
        self.count = 0;
        self.read_offset = 0;
        self.state = EchoGhostState::Recording;
        self.opacity = 0.0;
        self.current.clear();
        self.ticks_since_start = 0;
    }
}

impl Rewindable for EchoGhost {
    type Capsule = EchoGhostCapsule;

    fn snapshot(&self) -> EchoGhostCapsule {
        EchoGhostCapsule {
            slots: self.slots.clone(),
            write_index: self.write_index,
            count: self.count,
            read_offset: self.read_offset,
            state: self.state,
            opacity: self.opacity,
            current: self.current.clone(),
            ticks_since_start: self.ticks_since_start,
        }
    }

    fn restore(&mut self, capsule: &EchoGhostCapsule) {
        self.slots.clone_from(&capsule.slots);
        self.write_index = capsule.write_index;
        self.count = capsule.count;
        self.read_offset = capsule.read_offset;
        self.state = capsule.state;
        self.opacity = capsule.opacity;
        self.current.clone_from(&capsule.current);
        self.ticks_since_start = capsule.ticks_since_start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(delay_ticks: usize, capacity: usize, trail_window: usize) -> EchoGhostConfig {
        EchoGhostConfig {
            delay_ms: delay_ticks as f64 * 125.0,
            tick_duration_ms: 125.0,
            buffer_capacity: capacity,
            trail_window,
            max_opacity: 0.4,
        }
    }

    fn body(col: i32, row: i32) -> Vec<GridPosition> {
        vec![GridPosition::new(col, row), GridPosition::new(col - 1, row)]
    }

    #[test]
    fn test_one_tick_delay_plays_each_sample() {
        let mut ghost = EchoGhost::new(config(1, 4, 2)).unwrap();
        assert_eq!(ghost.delay_ticks(), 1);
        assert!(!ghost.is_active());

        ghost.record(&[GridPosition::new(10, 10)]);
        assert!(ghost.is_active());
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(10, 10)));

        ghost.record(&[GridPosition::new(11, 10)]);
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(11, 10)));

        ghost.record(&[GridPosition::new(12, 10)]);
        assert_eq!(ghost.playback_segments(), &[GridPosition::new(12, 10)]);
    }

    #[test]
    fn test_inactive_until_delay_reached() {
        let mut ghost = EchoGhost::new(config(3, 8, 2)).unwrap();
        ghost.record(&body(1, 0));
        ghost.record(&body(2, 0));
        assert_eq!(ghost.state(), EchoGhostState::Recording);
        assert!(ghost.playback_segments().is_empty());
        assert_eq!(ghost.opacity(), 0.0);

        ghost.record(&body(3, 0));
        assert_eq!(ghost.state(), EchoGhostState::Active);
        assert_eq!(ghost.playback_segments(), body(1, 0).as_slice());
        assert_eq!(ghost.opacity(), 0.4);
    }

    #[test]
    fn test_recorded_sample_is_a_copy() {
        let mut ghost = EchoGhost::new(config(1, 3, 1)).unwrap();
        let mut segments = body(4, 4);
        ghost.record(&segments);
        segments[0] = GridPosition::new(0, 0);
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(4, 4)));
    }

    #[test]
    fn test_overflow_keeps_delay() {
        let mut ghost = EchoGhost::new(config(2, 3, 1)).unwrap();
        for col in 0..20 {
            ghost.record(&body(col, 1));
        }
        // 20 samples through a 3-slot ring
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(18, 1)));
        assert_eq!(ghost.snapshot().count, 3);
    }

    #[test]
    fn test_fade_out_takes_buffered_calls() {
        let mut ghost = EchoGhost::new(config(5, 12, 3)).unwrap();
        for col in 0..9 {
            ghost.record(&body(col, 2));
        }
        ghost.stop_recording();
        assert_eq!(ghost.state(), EchoGhostState::FadingOut);
        let k = ghost.buffered();
        assert_eq!(k, 5);
        // Still showing the sample that was live when recording stopped
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(4, 2)));

        let mut last = ghost.opacity();
        for call in 1..=k {
            let expired = ghost.advance_fade_out();
            assert_eq!(expired, call == k);
            assert!(ghost.opacity() <= last);
            last = ghost.opacity();
        }
        assert_eq!(ghost.state(), EchoGhostState::Expired);
        assert!(!ghost.is_active());
        assert_eq!(ghost.opacity(), 0.0);
        assert!(ghost.playback_segments().is_empty());
    }

    #[test]
    fn test_fade_out_plays_newer_samples() {
        let mut ghost = EchoGhost::new(config(3, 6, 2)).unwrap();
        for col in 0..5 {
            ghost.record(&body(col, 0));
        }
        ghost.stop_recording();
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(2, 0)));
        ghost.advance_fade_out();
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(3, 0)));
        assert!((ghost.opacity() - 0.4).abs() < 1e-6);
        ghost.advance_fade_out();
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(4, 0)));
        assert!((ghost.opacity() - 0.2).abs() < 1e-6);
        assert!(ghost.advance_fade_out());
    }

    #[test]
    fn test_opacity_capped_at_live_value() {
        let mut ghost = EchoGhost::new(config(8, 12, 2)).unwrap();
        for col in 0..10 {
            ghost.record(&body(col, 0));
        }
        let live = ghost.opacity();
        ghost.stop_recording();
        assert!(ghost.opacity() <= live);
        assert_eq!(ghost.opacity(), live);
    }

    #[test]
    fn test_stop_before_activation_drains_recorded() {
        let mut ghost = EchoGhost::new(config(4, 8, 2)).unwrap();
        ghost.record(&body(1, 1));
        ghost.record(&body(2, 1));
        ghost.stop_recording();
        assert!(ghost.is_active());
        assert_eq!(ghost.buffered(), 2);
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(1, 1)));
        assert!(!ghost.advance_fade_out());
        assert!(ghost.advance_fade_out());
    }

    #[test]
    fn test_stop_with_empty_buffer_expires() {
        let mut ghost = EchoGhost::new(config(2, 4, 1)).unwrap();
        ghost.stop_recording();
        assert_eq!(ghost.state(), EchoGhostState::Expired);
    }

    #[test]
    fn test_record_ignored_after_stop() {
        let mut ghost = EchoGhost::new(config(1, 3, 1)).unwrap();
        ghost.record(&body(1, 1));
        ghost.stop_recording();
        ghost.record(&body(9, 9));
        assert_eq!(ghost.ticks_since_start(), 1);
        assert!(ghost.advance_fade_out());
        ghost.record(&body(9, 9));
        assert_eq!(ghost.state(), EchoGhostState::Expired);
        assert!(ghost.playback_segments().is_empty());
    }

    #[test]
    fn test_reset_restarts_recording() {
        let mut ghost = EchoGhost::new(config(1, 3, 1)).unwrap();
        ghost.record(&body(1, 1));
        ghost.stop_recording();
        ghost.advance_fade_out();
        ghost.reset();
        assert_eq!(ghost.state(), EchoGhostState::Recording);
        assert_eq!(ghost.ticks_since_start(), 0);
        ghost.record(&body(5, 5));
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(5, 5)));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut ghost = EchoGhost::new(config(2, 5, 2)).unwrap();
        for col in 0..4 {
            ghost.record(&body(col, 3));
        }
        let capsule = ghost.snapshot();
        for col in 10..17 {
            ghost.record(&body(col, 7));
        }
        ghost.stop_recording();
        ghost.advance_fade_out();

        ghost.restore(&capsule);
        assert_eq!(ghost.snapshot(), capsule);
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(2, 3)));
        ghost.record(&body(4, 3));
        assert_eq!(ghost.playback_head(), Some(GridPosition::new(3, 3)));
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            EchoGhost::new(config(0, 4, 1)),
            Err(ConfigError::GhostDelayTooShort { .. })
        ));
        assert!(matches!(
            EchoGhost::new(config(3, 4, 2)),
            Err(ConfigError::GhostCapacityTooSmall {
                capacity: 4,
                required: 5
            })
        ));
        assert!(matches!(
            EchoGhost::new(config(1, 4, 0)),
            Err(ConfigError::EmptyTrailWindow)
        ));
        let mut bright = config(1, 4, 1);
        bright.max_opacity = 1.5;
        assert!(matches!(
            EchoGhost::new(bright),
            Err(ConfigError::InvalidOpacity(_))
        ));
    }

    #[test]
    fn test_delay_rounds_to_nearest_tick() {
        let mut cfg = config(1, 8, 1);
        cfg.delay_ms = 190.0;
        assert_eq!(cfg.delay_ticks(), 2);
        cfg.delay_ms = 180.0;
        assert_eq!(cfg.delay_ticks(), 1);
    }

    proptest! {
        #[test]
        fn prop_playback_lags_by_delay(
            delay in 1usize..8,
            spare in 0usize..6,
            cols in proptest::collection::vec(0i32..50, 1..60),
        ) {
            let mut ghost = EchoGhost::new(config(delay, delay + 1 + spare, 1)).unwrap();
            for (i, col) in cols.iter().enumerate() {
                ghost.record(&[GridPosition::new(*col, i as i32)]);
                let t = i + 1;
                if t >= delay {
                    let j = t - delay;
                    prop_assert!(ghost.is_active());
                    prop_assert_eq!(
                        ghost.playback_segments(),
                        &[GridPosition::new(cols[j], j as i32)][..]
                    );
                } else {
                    prop_assert!(!ghost.is_active());
                    prop_assert!(ghost.playback_segments().is_empty());
                }
            }
        }

        #[test]
        fn prop_fade_out_needs_exactly_buffered_calls(
            delay in 1usize..6,
            recorded in 0usize..20,
        ) {
            let mut ghost = EchoGhost::new(config(delay, delay + 4, 4)).unwrap();
            for col in 0..recorded {
                ghost.record(&body(col as i32, 0));
            }
            ghost.stop_recording();
            let k = ghost.buffered();
            prop_assert_eq!(k, recorded.min(delay));
            let mut last = ghost.opacity();
            for _ in 0..k {
                prop_assert_ne!(ghost.state(), EchoGhostState::Expired);
                ghost.advance_fade_out();
                prop_assert!(ghost.opacity() <= last);
                last = ghost.opacity();
            }
            prop_assert_eq!(ghost.state(), EchoGhostState::Expired);
            prop_assert_eq!(ghost.opacity(), 0.0);
        }
    }
}
