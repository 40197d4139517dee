use rand::seq::SliceRandom;
use rand::Rng;

/// Particle for the perfect-run celebration overlay
#[derive(Debug, Clone)]
pub struct CelebrationParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl CelebrationParticle {
    fn new(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *['✨', '🎉', '⭐', '💫', '🌟', '✓', '🎊']
                .choose(&mut rng)
                .unwrap_or(&'✨'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += 15.0 * dt; // gravity

        self.age += dt;
        self.age < self.max_age
    }

    pub fn fade(&self) -> f64 {
        1.0 - (self.age / self.max_age)
    }
}

/// Confetti burst shown over the results screen after a 100% accuracy run.
/// Advanced on runtime ticks, culled when every particle has aged out.
#[derive(Debug, Default)]
pub struct CelebrationAnimation {
    pub particles: Vec<CelebrationParticle>,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl CelebrationAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.is_active = true;
        self.width = width.max(1) as f64;
        self.height = height.max(1) as f64;

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;

        for _ in 0..60 {
            let x = center_x + rng.gen_range(-8.0..8.0);
            let y = center_y + rng.gen_range(-2.0..2.0);
            self.particles.push(CelebrationParticle::new(x, y));
        }
    }

    /// Advance the animation by `dt` seconds; drops dead and off-screen
    /// particles and deactivates once none remain.
    pub fn tick(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            p.update(dt) && p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height
        });

        if self.particles.is_empty() {
            self.is_active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let animation = CelebrationAnimation::new();
        assert!(!animation.is_active);
        assert!(animation.particles.is_empty());
    }

    #[test]
    fn start_spawns_particles() {
        let mut animation = CelebrationAnimation::new();
        animation.start(80, 24);

        assert!(animation.is_active);
        assert!(!animation.particles.is_empty());
    }

    #[test]
    fn particles_age_out_and_animation_stops() {
        let mut animation = CelebrationAnimation::new();
        animation.start(80, 24);

        // Well past every particle's max_age.
        for _ in 0..100 {
            animation.tick(0.1);
        }

        assert!(!animation.is_active);
        assert!(animation.particles.is_empty());
    }

    #[test]
    fn tick_is_a_no_op_when_inactive() {
        let mut animation = CelebrationAnimation::new();
        animation.tick(0.1);
        assert!(!animation.is_active);
    }

    #[test]
    fn fade_decreases_with_age() {
        let mut particle = CelebrationParticle::new(10.0, 10.0);
        let before = particle.fade();
        particle.update(0.5);
        assert!(particle.fade() < before);
    }
}
