//! Per-character typing delays.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Default delay between two revealed characters.
pub const DEFAULT_BASE_SPEED: Duration = Duration::from_millis(25);

/// Default jitter applied to every character, in milliseconds either way.
pub const DEFAULT_JITTER_MS: i64 = 5;

/// Decides how long to wait after revealing a character.
pub trait DelayPolicy {
    fn delay(&mut self, ch: char, base: Duration) -> Duration;
}

impl<F> DelayPolicy for F
where
    F: FnMut(char, Duration) -> Duration,
{
    fn delay(&mut self, ch: char, base: Duration) -> Duration {
        self(ch, base)
    }
}

/// Pause multiplier for a character: punctuation lingers, whitespace hurries.
pub fn char_multiplier(ch: char) -> f64 {
    match ch {
        '.' | ',' | '!' | '?' | ';' | ':' | '…' | '—' => 2.0,
        c if c.is_whitespace() => 0.5,
        _ => 1.0,
    }
}

/// The default policy: character-class multiplier plus a little jitter so the
/// rhythm does not feel mechanical.
pub struct NaturalPacing {
    jitter_ms: i64,
    rng: StdRng,
}

impl NaturalPacing {
    pub fn new() -> Self {
        Self {
            jitter_ms: DEFAULT_JITTER_MS,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            jitter_ms: DEFAULT_JITTER_MS,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_jitter(mut self, jitter_ms: i64) -> Self {
        self.jitter_ms = jitter_ms.abs();
        self
    }
}

impl Default for NaturalPacing {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayPolicy for NaturalPacing {
    fn delay(&mut self, ch: char, base: Duration) -> Duration {
        let scaled = base.as_millis() as f64 * char_multiplier(ch);
        let jitter = if self.jitter_ms > 0 {
            self.rng.gen_range(-self.jitter_ms..=self.jitter_ms)
        } else {
            0
        };
        let millis = (scaled.round() as i64 + jitter).max(0);
        Duration::from_millis(millis as u64)
    }
}

/// Multipliers only, no jitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPacing;

impl DelayPolicy for FixedPacing {
    fn delay(&mut self, ch: char, base: Duration) -> Duration {
        let millis = (base.as_millis() as f64 * char_multiplier(ch)).round();
        Duration::from_millis(millis as u64)
    }
}
