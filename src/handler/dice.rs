//! `/d20` endpoint
//!
//! Rolls a twenty-sided die numbered 0 through 19.

use rand::Rng;

pub const D20_PATH: &str = "/d20";

pub const D20_MIN: u32 = 0;
pub const D20_MAX: u32 = 19;

/// Roll once, uniformly over `D20_MIN..=D20_MAX`
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(D20_MIN..=D20_MAX)
}
