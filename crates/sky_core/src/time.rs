//! Variable-timestep frame clock.
//!
//! The host hands us a monotonically increasing timestamp once per display
//! refresh. `advance()` turns it into an elapsed delta, guarding the first tick
//! (no previous timestamp) and non-finite input so callers never see NaN.

const FPS_SAMPLE_COUNT: usize = 60;

pub struct FrameClock {
    pub max_frame_dt: f64,
    last_timestamp: Option<f64>,
    pub frame_count: u64,
    pub capped_frames: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new(max_frame_dt: f64) -> Self {
        Self {
            max_frame_dt,
            last_timestamp: None,
            frame_count: 0,
            capped_frames: 0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Feed the host timestamp (seconds) and get the elapsed seconds to simulate.
    pub fn advance(&mut self, timestamp_secs: f64) -> f64 {
        let raw = match self.last_timestamp {
            Some(last) => timestamp_secs - last,
            None => 0.0,
        };
        if timestamp_secs.is_finite() {
            self.last_timestamp = Some(timestamp_secs);
        }

        let mut dt = if raw.is_finite() && raw > 0.0 { raw } else { 0.0 };
        if dt > self.max_frame_dt {
            log::warn!(
                "Frame took {:.1}ms, capping delta to {:.0}ms",
                dt * 1000.0,
                self.max_frame_dt * 1000.0
            );
            dt = self.max_frame_dt;
            self.capped_frames += 1;
        }

        self.frame_count += 1;

        if dt > 0.0 {
            self.fps_samples[self.fps_sample_index] = dt;
            self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
            let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
            self.smoothed_frame_time_ms = avg_dt * 1000.0;
            self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        }

        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(0.25)
    }
}

/// Split `dt` into equal slices no longer than `max_step`.
///
/// Returns `(count, step)`; `count` is 0 when there is nothing to simulate.
pub fn substeps(dt: f64, max_step: f64) -> (u32, f64) {
    if !dt.is_finite() || dt <= 0.0 {
        return (0, 0.0);
    }
    if !max_step.is_finite() || max_step <= 0.0 {
        return (1, dt);
    }
    let count = (dt / max_step).ceil().max(1.0) as u32;
    (count, dt / count as f64)
}
