//! Random number source handed to brains and navigation

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

/// Uniform random values used by agent behaviour and destination picking.
///
/// Object safe so brains can hold `&mut dyn RandomSource`; every `rand::Rng`
/// implements it, which lets tests inject a seeded `StdRng`.
pub trait RandomSource {
    /// Uniform real in `[min, max)`, or `min` when the range is empty
    fn real(&mut self, min: f32, max: f32) -> f32;

    /// Uniform integer in `[min, max]`
    fn int(&mut self, min: i32, max: i32) -> i32;

    /// Uniform unit direction
    fn direction(&mut self) -> Vec2;

    /// Uniform real within an inclusive `(min, max)` pair
    fn real_in(&mut self, range: (f32, f32)) -> f32 {
        self.real(range.0, range.1)
    }

    /// Fair coin flip
    fn chance(&mut self) -> bool {
        self.int(0, 1) == 1
    }
}

impl<R: Rng> RandomSource for R {
    fn real(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.gen_range(min..max)
    }

    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.gen_range(min..=max)
    }

    fn direction(&mut self) -> Vec2 {
        Vec2::from_angle(self.gen_range(0.0..TAU))
    }
}
