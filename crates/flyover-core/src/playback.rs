//! Route progress over time.

use crate::config::PlaybackConfig;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    config: PlaybackConfig,
    route_length_km: f64,
    progress: f64,
    speed_multiplier: f64,
    playing: bool,
}

impl PlaybackClock {
    pub fn new(config: PlaybackConfig, route_length_km: f64) -> Self {
        let route_length_km = if route_length_km.is_finite() {
            route_length_km.max(0.0)
        } else {
            0.0
        };
        Self {
            config,
            route_length_km,
            progress: 0.0,
            speed_multiplier: 1.0,
            playing: false,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn distance_km(&self) -> f64 {
        self.progress * self.route_length_km
    }

    pub fn route_length_km(&self) -> f64 {
        self.route_length_km
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Seconds for a full traversal at speed 1.
    pub fn traversal_duration_s(&self) -> f64 {
        let scaled = self.route_length_km / 100.0 * self.config.base_duration_per_100km_s;
        scaled.max(self.config.min_duration_s)
    }

    /// Clamp and store the multiplier. Non-finite values are ignored.
    pub fn set_speed_multiplier(&mut self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        self.speed_multiplier = value.clamp(
            self.config.min_speed_multiplier,
            self.config.max_speed_multiplier,
        );
        Some(self.speed_multiplier)
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Jump to `progress`, clamped to [0, 1]. Non-finite values are ignored.
    pub fn seek(&mut self, progress: f64) -> Option<f64> {
        if !progress.is_finite() {
            return None;
        }
        self.progress = progress.clamp(0.0, 1.0);
        Some(self.progress)
    }

    /// Advance while playing. Reaching the end stops playback.
    pub fn advance(&mut self, dt_s: f64) -> f64 {
        if !self.playing || !dt_s.is_finite() || dt_s <= 0.0 {
            return self.progress;
        }
        let duration = self.traversal_duration_s();
        self.progress = (self.progress + dt_s / duration * self.speed_multiplier).clamp(0.0, 1.0);
        if self.progress >= 1.0 {
            self.playing = false;
        }
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_km_takes_five_minutes() {
        let mut clock = PlaybackClock::new(PlaybackConfig::default(), 50.0);
        assert!((clock.traversal_duration_s() - 300.0).abs() < 1e-9);
        clock.play();
        for _ in 0..(150 * 60) {
            clock.advance(1.0 / 60.0);
        }
        assert!((clock.progress() - 0.5).abs() < 1e-6);
        assert!((clock.distance_km() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn short_route_uses_minimum_duration() {
        let clock = PlaybackClock::new(PlaybackConfig::default(), 5.0);
        assert!((clock.traversal_duration_s() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn speed_multiplier_scales_rate() {
        let mut clock = PlaybackClock::new(PlaybackConfig::default(), 50.0);
        clock.play();
        clock.set_speed_multiplier(2.0);
        clock.advance(30.0);
        assert!((clock.progress() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn reaching_the_end_stops() {
        let mut clock = PlaybackClock::new(PlaybackConfig::default(), 50.0);
        clock.play();
        clock.advance(1_000.0);
        assert_eq!(clock.progress(), 1.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut clock = PlaybackClock::new(PlaybackConfig::default(), 50.0);
        clock.advance(10.0);
        assert_eq!(clock.progress(), 0.0);
    }

    #[test]
    fn seek_and_multiplier_are_clamped() {
        let mut clock = PlaybackClock::new(PlaybackConfig::default(), 50.0);
        assert_eq!(clock.seek(1.5), Some(1.0));
        assert_eq!(clock.seek(-0.5), Some(0.0));
        assert_eq!(clock.seek(f64::NAN), None);
        assert_eq!(clock.set_speed_multiplier(100.0), Some(10.0));
        assert_eq!(clock.set_speed_multiplier(f64::INFINITY), None);
        assert_eq!(clock.speed_multiplier(), 10.0);
    }
}
