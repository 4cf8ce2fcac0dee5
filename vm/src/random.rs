//! Pluggable source for the `Lr` opcode. A `RandomSource` yields raw
//! decimal-literal strings, mirroring the language-neutral contract: the
//! executor is responsible for parsing and validating each value.

use rand::Rng;

pub trait RandomSource {
    /// Returns the next value, or `None` if the source is exhausted.
    fn next_value(&mut self) -> Option<String>;
}

/// The process-wide default: a uniformly drawn integer `k` in `[0, 10^9)`
/// rendered as `k / 10^9`, regenerated forever.
pub struct DefaultRandomSource;

impl RandomSource for DefaultRandomSource {
    fn next_value(&mut self) -> Option<String> {
        let k: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        Some(format!("0.{:09}", k))
    }
}

/// A finite, explicit sequence — used by callers (and tests) that want
/// deterministic replay instead of the default generator.
pub struct FixedRandomSource {
    values: std::vec::IntoIter<String>,
}

impl FixedRandomSource {
    pub fn new<I, S>(values: I) -> FixedRandomSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        FixedRandomSource {
            values: values.into_iter(),
        }
    }

    /// Cycles the given values forever instead of exhausting.
    pub fn cycling<I, S>(values: I) -> CyclingRandomSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CyclingRandomSource {
            values: values.into_iter().map(Into::into).collect(),
            position: 0,
        }
    }
}

impl RandomSource for FixedRandomSource {
    fn next_value(&mut self) -> Option<String> {
        self.values.next()
    }
}

pub struct CyclingRandomSource {
    values: Vec<String>,
    position: usize,
}

impl RandomSource for CyclingRandomSource {
    fn next_value(&mut self) -> Option<String> {
        if self.values.is_empty() {
            return None;
        }
        let value = self.values[self.position].clone();
        self.position = (self.position + 1) % self.values.len();
        Some(value)
    }
}
