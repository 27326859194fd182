//! Per-side temporal smoothing with hold-last-good and expiry.
//!
//! Each side keeps a FIFO of the most recent accepted fits. The emitted line
//! is the simple mean of the history, averaged in the `x = a * y + c` form so
//! that steep lines average well. When a frame has no fit, the previous output
//! is held for up to `max_missed_frames` consecutive frames; the next miss
//! clears the side back to no history.

use crate::ConfigError;
use lane_detect_core::{ExtrapolationWindow, LaneLine, LaneSide};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Number of accepted fits averaged per side (>= 1).
    pub window: usize,
    /// Consecutive misses bridged before a side is dropped; `None` holds forever.
    pub max_missed_frames: Option<usize>,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            window: 8,
            max_missed_frames: Some(8),
        }
    }
}

impl SmoothingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::InvalidHistoryWindow(self.window));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    NoHistory,
    Tracking,
}

/// History and last output of one lane side.
#[derive(Clone, Debug, Default)]
pub struct LaneState {
    history: VecDeque<LaneLine>,
    smoothed: Option<LaneLine>,
    missed_frames: usize,
}

impl LaneState {
    pub fn track_state(&self) -> TrackState {
        if self.history.is_empty() {
            TrackState::NoHistory
        } else {
            TrackState::Tracking
        }
    }

    /// Accepted fits, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &LaneLine> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent emitted line.
    pub fn smoothed(&self) -> Option<&LaneLine> {
        self.smoothed.as_ref()
    }

    /// Consecutive frames without a fit since the last accepted one.
    pub fn missed_frames(&self) -> usize {
        self.missed_frames
    }

    fn clear(&mut self) {
        self.history.clear();
        self.smoothed = None;
        self.missed_frames = 0;
    }
}

/// Left and right [`LaneState`]s of one video stream.
#[derive(Clone, Debug)]
pub struct TemporalSmoother {
    params: SmoothingParams,
    left: LaneState,
    right: LaneState,
}

impl TemporalSmoother {
    pub fn new(params: SmoothingParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            left: LaneState::default(),
            right: LaneState::default(),
        })
    }

    #[inline]
    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    pub fn state(&self, side: LaneSide) -> &LaneState {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    fn state_mut(&mut self, side: LaneSide) -> &mut LaneState {
        match side {
            LaneSide::Left => &mut self.left,
            LaneSide::Right => &mut self.right,
        }
    }

    /// Feed this frame's fit for `side` and return the line to report.
    pub fn update(
        &mut self,
        side: LaneSide,
        fit: Option<LaneLine>,
        window: &ExtrapolationWindow,
    ) -> Option<LaneLine> {
        let cap = self.params.window;
        let max_missed = self.params.max_missed_frames;
        let state = self.state_mut(side);

        match fit {
            Some(line) => {
                if state.history.len() == cap {
                    state.history.pop_front();
                }
                state.history.push_back(line);
                state.missed_frames = 0;
                state.smoothed = mean_line(&state.history, window);
            }
            None => {
                if state.history.is_empty() {
                    return None;
                }
                state.missed_frames += 1;
                if max_missed.is_some_and(|m| state.missed_frames > m) {
                    debug!(
                        "{} lane expired after {} missed frames",
                        side.as_str(),
                        state.missed_frames
                    );
                    state.clear();
                }
            }
        }
        state.smoothed.clone()
    }

    /// Drop both sides' history.
    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

/// Mean of the history in `x = a * y + c` form, re-extrapolated over `window`.
///
/// Falls back to the newest entry if the mean is not a usable line.
fn mean_line(history: &VecDeque<LaneLine>, window: &ExtrapolationWindow) -> Option<LaneLine> {
    let newest = history.back()?;
    let n = history.len() as f64;
    let (sum_a, sum_c) = history.iter().fold((0.0f64, 0.0f64), |(sa, sc), l| {
        let (a, c) = l.inverse_form();
        (sa + a as f64, sc + c as f64)
    });
    LaneLine::from_inverse((sum_a / n) as f32, (sum_c / n) as f32, window)
        .or_else(|| Some(newest.clone()))
}
