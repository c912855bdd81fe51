//! Sample classification: speed smoothing, cadence windows and spam detection.

use log::debug;

use crate::config::GestureConfig;
use crate::input::PointerSample;
use crate::tracker::TaskRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Good,
    Bad,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReading {
    pub instantaneous: f32,
    pub smoothed: f32,
    pub classification: Classification,
}

#[derive(Debug, Clone)]
pub struct GestureValidator {
    cfg: GestureConfig,
}

impl GestureValidator {
    pub fn new(cfg: GestureConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.cfg
    }

    /// Classify a pointer move against the previous sample held in `state`.
    ///
    /// Returns `None` and leaves `state` untouched when the sample is malformed
    /// or does not advance time. With no baseline yet, the sample becomes the
    /// baseline and is not classified.
    pub fn classify_motion(
        &self,
        state: &mut TaskRuntimeState,
        sample: PointerSample,
    ) -> Option<MotionReading> {
        if !sample.is_finite() {
            return None;
        }
        let Some(prev) = state.last_sample else {
            state.last_sample = Some(sample);
            return None;
        };
        let dt = sample.t - prev.t;
        if dt.is_nan() || dt <= 0.0 {
            return None;
        }

        let instantaneous = sample.distance_to(&prev) / dt as f32;
        let k = self.cfg.speed_smoothing_factor.clamp(0.0, 1.0);
        let smoothed = state.smoothed_speed + (instantaneous - state.smoothed_speed) * k;
        state.smoothed_speed = smoothed;
        state.last_sample = Some(sample);

        let classification = if smoothed > self.cfg.aggressive_speed_threshold {
            Classification::Aggressive
        } else {
            Classification::Good
        };
        if classification == Classification::Aggressive {
            debug!(
                "aggressive motion: smoothed {smoothed:.1} > {:.1} (raw {instantaneous:.1})",
                self.cfg.aggressive_speed_threshold
            );
        }
        Some(MotionReading {
            instantaneous,
            smoothed,
            classification,
        })
    }

    /// Classify a click at `t`.
    ///
    /// Spam takes priority: once the clicks retained inside the spam window
    /// reach the threshold the click is `Aggressive` and is not scored.
    /// Otherwise the gap since the last scored click is compared with the
    /// ideal interval; the first click of a stage has no gap and is `Good`,
    /// as is every click when no ideal interval is configured.
    pub fn classify_click(&self, state: &mut TaskRuntimeState, t: f64) -> Option<Classification> {
        if !t.is_finite() {
            return None;
        }
        if let Some(latest) = state.latest_click() {
            if t <= latest {
                return None;
            }
        }

        let retained = state.record_click(t, self.cfg.spam_window_duration);
        if retained >= self.cfg.spam_count_threshold as usize {
            debug!("spam: {retained} clicks within {:.2}s", self.cfg.spam_window_duration);
            return Some(Classification::Aggressive);
        }

        let good = match (state.last_click_at, self.cfg.ideal_interval) {
            (Some(last), Some(ideal)) => {
                let gap = (t - last) as f32;
                (gap - ideal).abs() <= self.cfg.interval_tolerance
            }
            _ => true,
        };
        state.last_click_at = Some(t);
        Some(if good {
            Classification::Good
        } else {
            Classification::Bad
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence_cfg() -> GestureConfig {
        GestureConfig {
            ideal_interval: Some(1.0),
            interval_tolerance: 0.3,
            spam_count_threshold: 4,
            spam_window_duration: 1.0,
            ..GestureConfig::default()
        }
    }

    #[test]
    fn non_advancing_samples_are_ignored() {
        let v = GestureValidator::new(GestureConfig::default());
        let mut st = TaskRuntimeState::new();
        st.begin_motion(PointerSample::new(0.0, 0.0, 1.0));
        st.smoothed_speed = 42.0;

        for t in [1.0, 0.5, f64::NAN] {
            assert_eq!(v.classify_motion(&mut st, PointerSample::new(300.0, 0.0, t)), None);
            assert_eq!(st.smoothed_speed, 42.0);
            assert_eq!(st.last_sample, Some(PointerSample::new(0.0, 0.0, 1.0)));
        }
    }

    #[test]
    fn first_motion_sample_sets_baseline() {
        let v = GestureValidator::new(GestureConfig::default());
        let mut st = TaskRuntimeState::new();
        assert_eq!(v.classify_motion(&mut st, PointerSample::new(5.0, 5.0, 0.0)), None);
        assert_eq!(st.last_sample, Some(PointerSample::new(5.0, 5.0, 0.0)));
    }

    #[test]
    fn smoothing_absorbs_a_single_spike() {
        let cfg = GestureConfig {
            aggressive_speed_threshold: 1000.0,
            speed_smoothing_factor: 0.25,
            ..GestureConfig::default()
        };
        let v = GestureValidator::new(cfg);
        let mut st = TaskRuntimeState::new();
        st.begin_motion(PointerSample::new(0.0, 0.0, 0.0));

        // 30 px in 10 ms = 3000 px/s, smoothed to 750
        let r = v
            .classify_motion(&mut st, PointerSample::new(30.0, 0.0, 0.01))
            .unwrap();
        assert!((r.instantaneous - 3000.0).abs() < 1.0);
        assert!((r.smoothed - 750.0).abs() < 1.0);
        assert_eq!(r.classification, Classification::Good);

        // sustained, it becomes aggressive
        let r = v
            .classify_motion(&mut st, PointerSample::new(60.0, 0.0, 0.02))
            .unwrap();
        assert_eq!(r.classification, Classification::Aggressive);
    }

    #[test]
    fn raw_speed_when_smoothing_is_one() {
        let cfg = GestureConfig {
            aggressive_speed_threshold: 100.0,
            speed_smoothing_factor: 1.0,
            ..GestureConfig::default()
        };
        let v = GestureValidator::new(cfg);
        let mut st = TaskRuntimeState::new();
        st.begin_motion(PointerSample::new(0.0, 0.0, 0.0));
        let r = v
            .classify_motion(&mut st, PointerSample::new(3.0, 4.0, 0.1))
            .unwrap();
        assert!((r.smoothed - 50.0).abs() < 1e-3);
        assert_eq!(r.classification, Classification::Good);
    }

    #[test]
    fn cadence_window() {
        let v = GestureValidator::new(cadence_cfg());
        let mut st = TaskRuntimeState::new();
        let got: Vec<_> = [0.0, 1.0, 2.05, 3.9]
            .into_iter()
            .map(|t| v.classify_click(&mut st, t).unwrap())
            .collect();
        assert_eq!(
            got,
            vec![
                Classification::Good,
                Classification::Good,
                Classification::Good,
                Classification::Bad
            ]
        );
    }

    #[test]
    fn spam_overrides_interval_timing() {
        let v = GestureValidator::new(cadence_cfg());
        let mut st = TaskRuntimeState::new();
        assert_eq!(v.classify_click(&mut st, 0.0), Some(Classification::Good));
        assert_eq!(v.classify_click(&mut st, 0.3), Some(Classification::Bad));
        assert_eq!(v.classify_click(&mut st, 0.6), Some(Classification::Bad));
        assert_eq!(v.classify_click(&mut st, 0.9), Some(Classification::Aggressive));
        // the spam click is not scored
        assert_eq!(st.last_click_at, Some(0.6));
    }

    #[test]
    fn clicks_out_of_order_are_discarded() {
        let v = GestureValidator::new(cadence_cfg());
        let mut st = TaskRuntimeState::new();
        v.classify_click(&mut st, 2.0);
        assert_eq!(v.classify_click(&mut st, 1.5), None);
        assert_eq!(v.classify_click(&mut st, 2.0), None);
        assert_eq!(v.classify_click(&mut st, f64::INFINITY), None);
        assert_eq!(st.recent_click_count(), 1);
        assert_eq!(st.last_click_at, Some(2.0));
    }
}
