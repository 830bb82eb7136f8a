use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::limits::{
    GENERATOR_ALTITUDE, GENERATOR_CEILING_FT, GENERATOR_O2_FLOOR, GENERATOR_PULSE, GENERATOR_SPO2,
};
use crate::physiology::{generator_saturation, inspired_o2, AA_GRADIENT_MMHG};
use crate::types::LiveSample;

/// Chance per tick that the altitude walk turns around on its own.
const DIRECTION_FLIP_PROBABILITY: f64 = 0.02;
const SEA_LEVEL_O2_PERCENT: f64 = 20.9;
const MIN_PAO2_MMHG: f64 = 20.0;
const BASE_PULSE_BPM: f64 = 72.0;
const BASE_BLP_MMHG: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Ascending => 1.0,
            Direction::Descending => -1.0,
        }
    }

    fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// Synthetic device: a bounded random walk in altitude with vitals derived
/// from the altitude physiology plus Gaussian noise.
pub struct SampleGenerator<R: Rng = StdRng> {
    rng: R,
    current_altitude: f64,
    direction: Direction,
}

impl SampleGenerator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for playback and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SampleGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SampleGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            current_altitude: 0.0,
            direction: Direction::Ascending,
        }
    }

    pub fn current_altitude(&self) -> f64 {
        self.current_altitude
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Back to sea level, climbing.
    pub fn reset(&mut self) {
        self.current_altitude = 0.0;
        self.direction = Direction::Ascending;
    }

    pub fn generate(&mut self) -> LiveSample {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(&mut self, timestamp: DateTime<Utc>) -> LiveSample {
        let altitude = self.step_altitude();

        let o2_conc = (SEA_LEVEL_O2_PERCENT - (altitude / 1000.0) * 0.5 + self.gaussian(0.0, 0.3))
            .max(GENERATOR_O2_FLOOR);

        let blp = BASE_BLP_MMHG + self.gaussian(0.0, 0.5).abs();

        let pao2 = (inspired_o2(altitude) - AA_GRADIENT_MMHG).max(MIN_PAO2_MMHG);
        let spo2 = GENERATOR_SPO2.clamp(generator_saturation(pao2) + self.gaussian(0.0, 1.0));

        let pulse = GENERATOR_PULSE
            .clamp(BASE_PULSE_BPM + (altitude / 5000.0) * 5.0 + self.gaussian(0.0, 3.0));

        let error_percent = self.gaussian(0.0, 0.5).abs();

        LiveSample {
            timestamp,
            altitude,
            o2_conc,
            blp,
            spo2,
            pulse,
            o2_voltage: Some(o2_conc / 10.0),
            error_percent: Some(error_percent),
        }
    }

    fn step_altitude(&mut self) -> f64 {
        let delta = (self.rng.gen::<f64>() * 500.0 - 100.0) * self.direction.sign();
        self.current_altitude = GENERATOR_ALTITUDE.clamp(self.current_altitude + delta);

        if self.rng.gen::<f64>() < DIRECTION_FLIP_PROBABILITY {
            self.direction = self.direction.flipped();
        }
        // boundary reflection wins over the random flip
        if self.current_altitude <= GENERATOR_ALTITUDE.min {
            self.direction = Direction::Ascending;
        }
        if self.current_altitude >= GENERATOR_CEILING_FT {
            self.direction = Direction::Descending;
        }
        self.current_altitude
    }

    /// Box-Muller transform over two uniform draws.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // gen::<f64>() is in [0, 1); flip it to (0, 1] so ln never sees 0
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + z * std_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_samples_stay_in_generator_bounds() {
        let mut gen = SampleGenerator::seeded(7);
        for _ in 0..5000 {
            let s = gen.generate();
            assert!(GENERATOR_ALTITUDE.contains(s.altitude), "altitude {}", s.altitude);
            assert!(s.o2_conc >= GENERATOR_O2_FLOOR);
            assert!(GENERATOR_SPO2.contains(s.spo2), "spo2 {}", s.spo2);
            assert!(GENERATOR_PULSE.contains(s.pulse), "pulse {}", s.pulse);
            assert!(s.blp >= BASE_BLP_MMHG);
            assert_eq!(s.o2_voltage, Some(s.o2_conc / 10.0));
            assert!(s.error_percent.unwrap_or(-1.0) >= 0.0);
        }
    }

    #[test]
    fn walk_reflects_at_the_ceiling() {
        let mut gen = SampleGenerator::seeded(11);
        let mut reached_ceiling = false;
        for _ in 0..20_000 {
            let s = gen.generate();
            if s.altitude >= GENERATOR_CEILING_FT {
                reached_ceiling = true;
                assert_eq!(gen.direction(), Direction::Descending);
            }
            if s.altitude <= 0.0 {
                assert_eq!(gen.direction(), Direction::Ascending);
            }
        }
        assert!(reached_ceiling);
    }

    #[test]
    fn same_seed_same_walk() {
        let t = Utc::now();
        let mut a = SampleGenerator::seeded(3);
        let mut b = SampleGenerator::seeded(3);
        for _ in 0..50 {
            assert_eq!(a.generate_at(t), b.generate_at(t));
        }
    }

    #[test]
    fn reset_returns_to_sea_level() {
        let mut gen = SampleGenerator::seeded(5);
        for _ in 0..20 {
            gen.generate();
        }
        assert!(gen.current_altitude() > 0.0);
        gen.reset();
        assert_eq!(gen.current_altitude(), 0.0);
        assert_eq!(gen.direction(), Direction::Ascending);
    }

    #[test]
    fn gaussian_has_expected_moments() {
        let mut gen = SampleGenerator::seeded(99);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| gen.gaussian(10.0, 2.0)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.1, "mean {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std {}", var.sqrt());
        assert!(draws.iter().all(|v| v.is_finite()));
    }
}
