use std::fmt;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;

/// Difficulty level in `[1, 10]`. Drives question generation parameters and
/// moves one step up or down after each graded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    /// Clamp an arbitrary value into the valid range.
    pub fn new(value: u8) -> Self {
        Self(value.clamp(MIN_LEVEL, MAX_LEVEL))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Pure level transition: one step up on a correct answer, one step down
    /// otherwise, clamped to the `[1, 10]` range.
    #[must_use]
    pub fn advance(self, was_correct: bool) -> Self {
        if was_correct {
            Self((self.0 + 1).min(MAX_LEVEL))
        } else {
            Self((self.0 - 1).max(MIN_LEVEL))
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(MIN_LEVEL)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_one_step_and_clamps() {
        for raw in MIN_LEVEL..=MAX_LEVEL {
            let level = Level::new(raw);
            assert_eq!(level.advance(true).get(), (raw + 1).min(MAX_LEVEL));
            assert_eq!(level.advance(false).get(), (raw - 1).max(MIN_LEVEL));
        }
    }

    #[test]
    fn new_clamps_out_of_range_values() {
        assert_eq!(Level::new(0).get(), 1);
        assert_eq!(Level::new(99).get(), 10);
    }
}
