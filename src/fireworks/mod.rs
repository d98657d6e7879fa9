pub mod frame;
pub mod random;
pub mod surface;

pub use frame::{FrameHandle, FrameScheduler};
pub use random::RandomSource;
pub use surface::{Hsl, Surface};

use crate::config::ConfigError;
use serde::Deserialize;
use std::f64::consts::TAU;

/// Saturation and lightness shared by every burst; only the hue varies.
const BURST_SATURATION: f64 = 1.0;
const BURST_LIGHTNESS: f64 = 0.6;

/// Bursts open in the upper part of the surface.
const SKY_FRACTION: f64 = 0.6;

/// Largest `max_particles` a config may ask for.
pub const PARTICLE_LIMIT: usize = 100_000;

/// Tuning knobs for the fireworks celebration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    /// Upper bound on live particles
    pub max_particles: usize,
    /// Chance per frame of a new burst while below the cap
    pub spawn_probability: f64,
    /// Downward acceleration in pixels/frame²
    pub gravity: f64,
    /// Drawn circle radius in pixels
    pub particle_radius: f64,
    /// Inclusive min/max particles per burst
    pub burst_size_range: (usize, usize),
    /// Min/max initial speed in pixels/frame
    pub speed_range: (f64, f64),
    /// Min/max alpha lost per frame
    pub decay_range: (f64, f64),
}

impl Default for FireworksConfig {
    fn default() -> Self {
        FireworksConfig {
            max_particles: 200,
            spawn_probability: 0.2,
            gravity: 0.02,
            particle_radius: 3.0,
            burst_size_range: (30, 50),
            speed_range: (1.0, 4.0),
            decay_range: (0.01, 0.025),
        }
    }
}

impl FireworksConfig {
    /// Reject settings that would break the animation invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::Fireworks(reason.to_string()));

        if self.max_particles > PARTICLE_LIMIT {
            return invalid("max_particles must be at most 100000");
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return invalid("spawn_probability must be within 0..=1");
        }
        if !self.gravity.is_finite() {
            return invalid("gravity must be finite");
        }
        if self.particle_radius.is_nan() || self.particle_radius <= 0.0 {
            return invalid("particle_radius must be positive");
        }
        let (min_burst, max_burst) = self.burst_size_range;
        if min_burst == 0 || min_burst > max_burst {
            return invalid("burst_size_range must be a non-empty range of at least one particle");
        }
        let (min_speed, max_speed) = self.speed_range;
        if min_speed.is_nan() || min_speed < 0.0 || min_speed > max_speed || !max_speed.is_finite() {
            return invalid("speed_range must be ordered and non-negative");
        }
        let (min_decay, max_decay) = self.decay_range;
        if min_decay.is_nan() || min_decay <= 0.0 || min_decay > max_decay || !max_decay.is_finite() {
            return invalid("decay_range must be ordered and strictly positive");
        }
        Ok(())
    }
}

/// One fading spark.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub alpha: f64,
    pub color: Hsl,
    pub decay: f64,
}

impl Particle {
    fn advance(&mut self, gravity: f64) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;
        self.alpha -= self.decay;
    }
}

/// Fireworks that run while the routine is complete.
///
/// Inactive until `start()`. While active, every fired frame re-requests the
/// next one, so the loop keeps itself alive until `stop()` cancels it.
pub struct Animator<S, R> {
    config: FireworksConfig,
    surface: Option<S>,
    rng: R,
    frames: FrameScheduler,
    active: bool,
    particles: Vec<Particle>,
    frame: Option<FrameHandle>,
    resize_listener: bool,
    viewport: (usize, usize),
}

impl<S: Surface, R: RandomSource> Animator<S, R> {
    /// `surface` may be `None`, in which case the animator never runs.
    pub fn new(config: FireworksConfig, surface: Option<S>, rng: R) -> Self {
        let capacity = config.max_particles.min(PARTICLE_LIMIT);
        Animator {
            config,
            surface,
            rng,
            frames: FrameScheduler::new(),
            active: false,
            particles: Vec::with_capacity(capacity),
            frame: None,
            resize_listener: false,
            viewport: (0, 0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn is_listening_for_resize(&self) -> bool {
        self.resize_listener
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        let (cols, rows) = self.viewport;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        self.active = true;
        self.particles.clear();
        self.resize_listener = true;
        surface.fit_viewport(cols, rows);
        surface.set_visible(true);
        self.frame = Some(self.frames.request());
        tracing::info!(cols, rows, "fireworks started");
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.resize_listener = false;
        if let Some(handle) = self.frame.take() {
            self.frames.cancel(handle);
        }
        self.particles.clear();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            surface.set_visible(false);
        }
        tracing::info!("fireworks stopped");
    }

    /// Viewport changed to `cols` x `rows` cells. Follows the viewport only
    /// while started.
    pub fn viewport_resized(&mut self, cols: usize, rows: usize) {
        self.viewport = (cols, rows);
        if !self.resize_listener {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.fit_viewport(cols, rows);
        }
    }

    /// Display refresh. Runs one tick if our frame is due; returns whether it did.
    pub fn on_frame(&mut self) -> bool {
        let Some(fired) = self.frames.fire() else {
            return false;
        };
        if self.frame != Some(fired) {
            return false;
        }
        self.frame = None;
        self.tick()
    }

    fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.frame = Some(self.frames.request());

        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        surface.clear();
        let (width, height) = surface.dimensions();

        if self.particles.len() < self.config.max_particles
            && self.rng.unit() < self.config.spawn_probability
        {
            let x = self.rng.between(0.0, width as f64);
            let y = self.rng.between(0.0, height as f64 * SKY_FRACTION);
            let hue = self.rng.between(0.0, 360.0);
            self.spawn_burst(x, y, hue);
        }

        let gravity = self.config.gravity;
        for p in &mut self.particles {
            p.advance(gravity);
        }
        self.particles.retain(|p| p.alpha > 0.0);

        let radius = self.config.particle_radius;
        if let Some(surface) = self.surface.as_mut() {
            for p in &self.particles {
                surface.fill_circle(p.x, p.y, radius, p.color.to_rgb(), p.alpha);
            }
        }
        true
    }

    /// Radial burst at (`x`, `y`). Trimmed to the room left under the cap.
    fn spawn_burst(&mut self, x: f64, y: f64, hue: f64) {
        let (min_size, max_size) = self.config.burst_size_range;
        let drawn = self.rng.count_between(min_size, max_size);
        let room = self.config.max_particles.saturating_sub(self.particles.len());
        let count = drawn.min(room);
        if count == 0 {
            return;
        }

        let color = Hsl::new(hue, BURST_SATURATION, BURST_LIGHTNESS);
        let (min_speed, max_speed) = self.config.speed_range;
        let (min_decay, max_decay) = self.config.decay_range;
        for i in 0..count {
            let angle = TAU * i as f64 / count as f64;
            let speed = self.rng.between(min_speed, max_speed);
            let decay = self.rng.between(min_decay, max_decay);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                alpha: 1.0,
                color,
                decay,
            });
        }
        tracing::debug!(x, y, hue, count, live = self.particles.len(), "burst");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Fit(usize, usize),
        Clear,
        Circle { x: f64, y: f64, alpha: f64 },
        Visible(bool),
    }

    struct Recording {
        width: usize,
        height: usize,
        ops: Vec<Op>,
    }

    impl Recording {
        fn new() -> Self {
            Recording {
                width: 200,
                height: 100,
                ops: Vec::new(),
            }
        }
    }

    impl Surface for Recording {
        fn dimensions(&self) -> (usize, usize) {
            (self.width, self.height)
        }

        fn fit_viewport(&mut self, cols: usize, rows: usize) {
            self.ops.push(Op::Fit(cols, rows));
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn fill_circle(&mut self, x: f64, y: f64, _radius: f64, _color: (u8, u8, u8), alpha: f64) {
            self.ops.push(Op::Circle { x, y, alpha });
        }

        fn set_visible(&mut self, visible: bool) {
            self.ops.push(Op::Visible(visible));
        }
    }

    /// Replays a fixed list of samples, wrapping around.
    struct Scripted {
        values: Vec<f64>,
        next: usize,
    }

    impl Scripted {
        fn new(values: Vec<f64>) -> Self {
            Scripted { values, next: 0 }
        }
    }

    impl RandomSource for Scripted {
        fn unit(&mut self) -> f64 {
            let v = self.values[self.next % self.values.len()];
            self.next += 1;
            v
        }
    }

    /// Small deterministic generator for long runs.
    struct Lcg(u64);

    impl RandomSource for Lcg {
        fn unit(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn animator(config: FireworksConfig) -> Animator<Recording, Lcg> {
        let mut anim = Animator::new(config, Some(Recording::new()), Lcg(7));
        anim.viewport_resized(100, 25);
        anim
    }

    fn ops(anim: &Animator<Recording, Lcg>) -> &[Op] {
        &anim.surface().unwrap().ops
    }

    #[test]
    fn test_start_activates_and_schedules() {
        let mut anim = animator(FireworksConfig::default());
        assert!(!anim.is_active());
        anim.start();
        assert!(anim.is_active());
        assert!(anim.is_listening_for_resize());
        assert!(anim.pending_frame().is_some());
        assert_eq!(ops(&anim), &[Op::Fit(100, 25), Op::Visible(true)]);
    }

    #[test]
    fn test_start_twice_is_start_once() {
        let mut anim = animator(FireworksConfig::default());
        anim.start();
        let handle = anim.pending_frame();
        let op_count = ops(&anim).len();
        anim.start();
        assert_eq!(anim.pending_frame(), handle);
        assert_eq!(anim.frames().requests(), 1);
        assert_eq!(ops(&anim).len(), op_count);
        assert!(anim.particles().is_empty());
    }

    #[test]
    fn test_stop_while_inactive_does_nothing() {
        let mut anim = animator(FireworksConfig::default());
        anim.stop();
        assert!(!anim.is_active());
        assert_eq!(anim.frames().requests(), 0);
        assert_eq!(anim.frames().cancels(), 0);
        assert!(ops(&anim).is_empty());
    }

    #[test]
    fn test_stop_clears_everything_and_halts_drawing() {
        let mut anim = animator(FireworksConfig {
            spawn_probability: 1.0,
            ..FireworksConfig::default()
        });
        anim.start();
        for _ in 0..5 {
            assert!(anim.on_frame());
        }
        assert!(!anim.particles().is_empty());

        anim.stop();
        assert!(!anim.is_active());
        assert!(anim.particles().is_empty());
        assert!(anim.pending_frame().is_none());
        assert!(!anim.is_listening_for_resize());
        let tail: Vec<Op> = ops(&anim).iter().rev().take(2).cloned().collect();
        assert_eq!(tail, vec![Op::Visible(false), Op::Clear]);

        let op_count = ops(&anim).len();
        for _ in 0..10 {
            assert!(!anim.on_frame());
        }
        assert_eq!(ops(&anim).len(), op_count);
    }

    #[test]
    fn test_missing_surface_is_a_no_op() {
        let mut anim: Animator<Recording, Lcg> =
            Animator::new(FireworksConfig::default(), None, Lcg(1));
        anim.start();
        assert!(!anim.is_active());
        assert!(anim.pending_frame().is_none());
        assert!(!anim.on_frame());
        anim.stop();
        assert!(!anim.is_active());
    }

    #[test]
    fn test_resize_follows_viewport_only_while_active() {
        let mut anim = animator(FireworksConfig::default());
        anim.viewport_resized(80, 24);
        assert!(ops(&anim).is_empty());

        anim.start();
        anim.viewport_resized(120, 40);
        assert!(ops(&anim).contains(&Op::Fit(120, 40)));

        anim.stop();
        let op_count = ops(&anim).len();
        anim.viewport_resized(60, 20);
        assert_eq!(ops(&anim).len(), op_count);
    }

    #[test]
    fn test_forced_burst_first_step() {
        let config = FireworksConfig {
            spawn_probability: 1.0,
            burst_size_range: (30, 30),
            speed_range: (1.0, 3.0),
            decay_range: (0.01, 0.02),
            ..FireworksConfig::default()
        };
        // roll, origin x, origin y, hue, burst size, then (speed, decay) per particle
        let mut script = vec![0.0, 0.5, 0.5, 0.25, 0.0];
        for i in 0..30 {
            script.push(i as f64 / 30.0);
            script.push(0.5);
        }
        let mut anim = Animator::new(config, Some(Recording::new()), Scripted::new(script));
        anim.start();
        assert!(anim.on_frame());

        let origin_x = 100.0;
        let origin_y = 30.0;
        let particles = anim.particles();
        assert_eq!(particles.len(), 30);
        for (i, p) in particles.iter().enumerate() {
            let angle = TAU * i as f64 / 30.0;
            let speed = 1.0 + 2.0 * (i as f64 / 30.0);
            let vx0 = angle.cos() * speed;
            let vy0 = angle.sin() * speed;
            assert!((p.x - (origin_x + vx0)).abs() < 1e-12, "particle {i} x");
            assert!((p.y - (origin_y + vy0)).abs() < 1e-12, "particle {i} y");
            assert!((p.vx - vx0).abs() < 1e-12);
            assert!((p.vy - (vy0 + 0.02)).abs() < 1e-12, "particle {i} vy");
            assert!((p.alpha - (1.0 - 0.015)).abs() < 1e-12);
            assert_eq!(p.color, Hsl::new(90.0, 1.0, 0.6));
        }
    }

    #[test]
    fn test_zero_cap_never_spawns() {
        let mut anim = animator(FireworksConfig {
            max_particles: 0,
            spawn_probability: 1.0,
            ..FireworksConfig::default()
        });
        anim.start();
        for _ in 0..100 {
            assert!(anim.on_frame());
            assert!(anim.particles().is_empty());
        }
        assert!(!ops(&anim).iter().any(|op| matches!(op, Op::Circle { .. })));
    }

    #[test]
    fn test_count_never_exceeds_cap() {
        let mut anim = animator(FireworksConfig {
            max_particles: 75,
            spawn_probability: 1.0,
            burst_size_range: (30, 50),
            ..FireworksConfig::default()
        });
        anim.start();
        for _ in 0..500 {
            anim.on_frame();
            assert!(anim.particles().len() <= 75);
        }
    }

    #[test]
    fn test_alpha_strictly_decreases_and_dead_particles_are_not_drawn() {
        let mut anim = animator(FireworksConfig {
            spawn_probability: 0.5,
            ..FireworksConfig::default()
        });
        anim.start();
        anim.on_frame();

        for _ in 0..300 {
            let before: Vec<Particle> = anim.particles().to_vec();
            anim.on_frame();
            // Survivors keep their order, new bursts are appended behind them.
            let mut after = anim.particles().iter();
            for old in &before {
                if old.alpha - old.decay <= 0.0 {
                    continue;
                }
                let new = after.next().unwrap();
                assert!(new.alpha < old.alpha);
                assert!((new.alpha - (old.alpha - old.decay)).abs() < 1e-12);
            }
        }
        for op in ops(&anim) {
            if let Op::Circle { alpha, .. } = op {
                assert!(*alpha > 0.0);
            }
        }
    }

    #[test]
    fn test_restart_matches_single_start() {
        let mut anim = animator(FireworksConfig {
            spawn_probability: 1.0,
            ..FireworksConfig::default()
        });
        anim.start();
        anim.on_frame();
        anim.stop();
        anim.start();

        let mut fresh = animator(FireworksConfig::default());
        fresh.start();

        assert_eq!(anim.is_active(), fresh.is_active());
        assert_eq!(anim.particles(), fresh.particles());
        assert!(anim.pending_frame().is_some());
        assert_eq!(anim.frames().pending(), anim.pending_frame());

        // Exactly one tick runs per refresh; the old cycle left nothing behind.
        assert!(anim.on_frame());
        assert!(anim.frames().pending().is_some());
        assert!(anim.on_frame());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(FireworksConfig::default().validate().is_ok());

        let zero_decay = FireworksConfig {
            decay_range: (0.0, 0.02),
            ..FireworksConfig::default()
        };
        assert!(zero_decay.validate().is_err());

        let inverted = FireworksConfig {
            burst_size_range: (50, 30),
            ..FireworksConfig::default()
        };
        assert!(inverted.validate().is_err());

        let odds = FireworksConfig {
            spawn_probability: 1.5,
            ..FireworksConfig::default()
        };
        assert!(odds.validate().is_err());

        let huge = FireworksConfig {
            max_particles: usize::MAX,
            ..FireworksConfig::default()
        };
        assert!(huge.validate().is_err());
        let at_limit = FireworksConfig {
            max_particles: PARTICLE_LIMIT,
            ..FireworksConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_huge_cap_does_not_preallocate() {
        let config = FireworksConfig {
            max_particles: usize::MAX,
            ..FireworksConfig::default()
        };
        let mut anim = animator(config);
        anim.start();
        assert!(anim.is_active());
        assert!(anim.particles().is_empty());
    }
}
