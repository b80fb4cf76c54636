// ABOUTME: Dice rolling: parses die identifiers (d4..d100) and rolls them uniformly.
// ABOUTME: Pure local computation; no network interaction.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

/// The dice a player can roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Die {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl Die {
    pub const ALL: [Die; 7] = [
        Die::D4,
        Die::D6,
        Die::D8,
        Die::D10,
        Die::D12,
        Die::D20,
        Die::D100,
    ];

    pub fn faces(self) -> u32 {
        match self {
            Die::D4 => 4,
            Die::D6 => 6,
            Die::D8 => 8,
            Die::D10 => 10,
            Die::D12 => 12,
            Die::D20 => 20,
            Die::D100 => 100,
        }
    }

    /// Roll with the thread-local generator.
    pub fn roll(self) -> u32 {
        self.roll_with(&mut rand::rng())
    }

    /// Roll with a caller-supplied generator; result is in `1..=faces`.
    pub fn roll_with<R: Rng>(self, rng: &mut R) -> u32 {
        rng.random_range(1..=self.faces())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid die type '{0}' (expected one of d4, d6, d8, d10, d12, d20, d100)")]
pub struct DiceError(pub String);

impl FromStr for Die {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d4" => Ok(Die::D4),
            "d6" => Ok(Die::D6),
            "d8" => Ok(Die::D8),
            "d10" => Ok(Die::D10),
            "d12" => Ok(Die::D12),
            "d20" => Ok(Die::D20),
            "d100" => Ok(Die::D100),
            _ => Err(DiceError(s.to_string())),
        }
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.faces())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parse_every_supported_die() {
        for die in Die::ALL {
            assert_eq!(die.to_string().parse::<Die>(), Ok(die));
        }
    }

    #[test]
    fn parse_rejects_unsupported() {
        for bad in [
            "", "d", "d3", "d7", "20", "D20", "d20x", "x20", "d020", "d+20", " d20 ", "d0100",
        ] {
            assert!(bad.parse::<Die>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for die in Die::ALL {
            for _ in 0..500 {
                let n = die.roll_with(&mut rng);
                assert!((1..=die.faces()).contains(&n), "{die} rolled {n}");
            }
        }
    }

    #[test]
    fn d4_hits_every_face() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[(Die::D4.roll_with(&mut rng) - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
