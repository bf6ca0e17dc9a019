use std::time::{Duration, Instant};

/// Longest step handed to the simulation, avoids a jump after a stall.
const MAX_DELTA_TIME: f32 = 0.1;

/// Pace of frames that render nothing when the framerate is uncapped.
const IDLE_FRAMERATE: u32 = 30;

pub struct Framepacer {
    frame_start: Instant,
    frametime: f32,
}

impl Framepacer {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            frametime: 0.0,
        }
    }

    /// Time between the last two frame starts, in seconds.
    pub fn frametime(&self) -> f32 {
        self.frametime
    }

    pub fn framerate(&self) -> f32 {
        if self.frametime > 0.0 {
            1.0 / self.frametime
        } else {
            0.0
        }
    }

    /// Starts a frame and returns the simulation step for it.
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        self.frametime = (now - self.frame_start).as_secs_f32();
        self.frame_start = now;

        self.frametime.min(MAX_DELTA_TIME)
    }

    /// Blocks until the frame has lasted `1 / framerate` seconds, `0` doesn't wait.
    pub fn end_frame(&self, framerate: u32) {
        if framerate == 0 {
            return;
        }

        const ACCURACY: Duration = Duration::from_micros(100);
        let target = Duration::from_secs_f32(1.0 / framerate as f32);
        let elapsed = self.frame_start.elapsed();

        if let Some(sleep_time) = target.checked_sub(elapsed + ACCURACY) {
            std::thread::sleep(sleep_time);
        }

        while self.frame_start.elapsed() < target {
            std::thread::yield_now();
        }
    }

    /// Ends a frame that presented nothing, never returning immediately.
    pub fn skip_frame(&self, framerate: u32) {
        self.end_frame(if framerate == 0 {
            IDLE_FRAMERATE
        } else {
            framerate
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_frame_holds_the_target_framerate() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        pacer.end_frame(100);

        assert!(pacer.frame_start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn uncapped_frames_do_not_wait() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        pacer.end_frame(0);

        assert!(pacer.frame_start.elapsed() < Duration::from_millis(10));
    }

    #[test]
    fn skipped_frames_wait_even_when_uncapped() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        pacer.skip_frame(0);

        assert!(
            pacer.frame_start.elapsed()
                >= Duration::from_secs_f32(1.0 / IDLE_FRAMERATE as f32)
        );
    }

    #[test]
    fn skipped_frames_keep_a_fixed_framerate() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        pacer.skip_frame(100);

        assert!(pacer.frame_start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn delta_time_is_measured_and_clamped() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        std::thread::sleep(Duration::from_millis(5));
        let dt = pacer.begin_frame();
        assert!(dt >= 0.005);
        assert!(pacer.framerate() > 0.0);

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(pacer.begin_frame(), MAX_DELTA_TIME);
        assert!(pacer.frametime() >= 0.15);
    }
}
