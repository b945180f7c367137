//! Level and rank derivation.
//!
//! ## XP Curve
//!
//! Level L starts at `100 * L^2` total XP, so `level = floor(sqrt(xp / 100))`:
//! - Level 1: 100 XP
//! - Level 2: 400 XP
//! - Level 10: 10,000 XP
//! - Level 50: 250,000 XP
//!
//! ## Ranks
//!
//! | Levels | Rank   |
//! |--------|--------|
//! | 50+    | Kage   |
//! | 20-49  | Jonin  |
//! | 10-19  | Chunin |
//! | 0-9    | Genin  |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// XP unit of the curve (XP needed to reach level 1)
pub const BASE_XP: u64 = 100;

/// Rank bands as (minimum level, rank), checked top-down
pub const RANK_BANDS: &[(u32, Rank)] = &[
    (50, Rank::Kage),
    (20, Rank::Jonin),
    (10, Rank::Chunin),
    (0, Rank::Genin),
];

/// A user's level, derived from total XP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub u32);

impl Level {
    /// Calculate level from total XP
    pub fn from_xp(total_xp: u64) -> Self {
        let level = isqrt(total_xp / BASE_XP);
        Self(u32::try_from(level).unwrap_or(u32::MAX))
    }

    /// Level from a signed wire value; negatives clamp to 0
    pub fn from_signed(level: i64) -> Self {
        Self(u32::try_from(level.max(0)).unwrap_or(u32::MAX))
    }

    /// Rank for this level
    pub fn rank(&self) -> Rank {
        Rank::from_level(*self)
    }

    /// Total XP at which this level starts
    pub fn xp_required(&self) -> u64 {
        xp_for_level(self.0)
    }

    /// Total XP at which the next level starts
    pub fn xp_for_next(&self) -> u64 {
        xp_for_level(self.0.saturating_add(1))
    }

    /// Progress through this level as a percentage (0.0 - 100.0), one decimal
    pub fn progress_percent(&self, current_xp: u64) -> f64 {
        let start = self.xp_required();
        let next = self.xp_for_next();
        if next <= start {
            return 0.0;
        }

        let ratio = current_xp.saturating_sub(start) as f64 / (next - start) as f64;
        let pct = (ratio * 100.0).clamp(0.0, 100.0);
        (pct * 10.0).round() / 10.0
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rank label derived from level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    Genin,
    Chunin,
    Jonin,
    Kage,
}

impl Rank {
    /// Get rank from level (first matching band wins)
    pub fn from_level(level: Level) -> Self {
        RANK_BANDS
            .iter()
            .find(|(min, _)| level.0 >= *min)
            .map(|(_, rank)| *rank)
            .unwrap_or(Rank::Genin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Genin => "Genin",
            Rank::Chunin => "Chunin",
            Rank::Jonin => "Jonin",
            Rank::Kage => "Kage",
        }
    }

    /// Lowest level of this rank's band
    pub fn min_level(&self) -> Level {
        RANK_BANDS
            .iter()
            .find(|(_, rank)| rank == self)
            .map(|(min, _)| Level(*min))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for rank labels the client does not know (e.g. "ronin")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRank(pub String);

impl std::fmt::Display for UnknownRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown rank '{}'", self.0)
    }
}

impl std::error::Error for UnknownRank {}

impl FromStr for Rank {
    type Err = UnknownRank;

    /// Case-insensitive; the service stores ranks in lowercase
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "genin" => Ok(Rank::Genin),
            "chunin" => Ok(Rank::Chunin),
            "jonin" => Ok(Rank::Jonin),
            "kage" => Ok(Rank::Kage),
            _ => Err(UnknownRank(s.to_string())),
        }
    }
}

/// Clamp a signed XP value into the non-negative domain
pub fn clamp_xp(xp: i64) -> u64 {
    u64::try_from(xp).unwrap_or(0)
}

/// Total XP at which `level` starts: `100 * level^2`
pub fn xp_for_level(level: u32) -> u64 {
    let l = u64::from(level);
    BASE_XP.saturating_mul(l.saturating_mul(l))
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = (n as f64).sqrt() as u64;
    // f64 rounding can land one off in either direction
    while x.saturating_mul(x) > n {
        x -= 1;
    }
    while (x + 1).saturating_mul(x + 1) <= n {
        x += 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_xp_exact() {
        assert_eq!(Level::from_xp(0).0, 0);
        assert_eq!(Level::from_xp(99).0, 0);
        assert_eq!(Level::from_xp(100).0, 1);
        assert_eq!(Level::from_xp(399).0, 1);
        assert_eq!(Level::from_xp(400).0, 2);
        assert_eq!(Level::from_xp(2500).0, 5);
        assert_eq!(Level::from_xp(10_000).0, 10);
        assert_eq!(Level::from_xp(25_000).0, 15);
        assert_eq!(Level::from_xp(250_000).0, 50);
    }

    #[test]
    fn test_level_monotonic() {
        let mut prev = Level::from_xp(0);
        for xp in (0..300_000u64).step_by(37) {
            let level = Level::from_xp(xp);
            assert!(level >= prev, "level dropped at {} xp", xp);
            prev = level;
        }
    }

    #[test]
    fn test_level_boundaries_match_curve() {
        for l in 1..200u32 {
            let start = xp_for_level(l);
            assert_eq!(Level::from_xp(start).0, l);
            assert_eq!(Level::from_xp(start - 1).0, l - 1);
        }
    }

    #[test]
    fn test_negative_xp_clamps() {
        assert_eq!(Level::from_xp(clamp_xp(-1)), Level(0));
        assert_eq!(Level::from_xp(clamp_xp(i64::MIN)), Level(0));
        assert_eq!(Level::from_xp(clamp_xp(400)), Level(2));
        assert_eq!(Level::from_signed(-3).0, 0);
    }

    #[test]
    fn test_huge_xp_does_not_overflow() {
        let level = Level::from_xp(u64::MAX);
        assert_eq!(level.0, 429_496_729);
        assert_eq!(level.xp_for_next(), u64::MAX);
    }

    #[test]
    fn test_rank_bands() {
        assert_eq!(Rank::from_level(Level(0)), Rank::Genin);
        assert_eq!(Rank::from_level(Level(9)), Rank::Genin);
        assert_eq!(Rank::from_level(Level(10)), Rank::Chunin);
        assert_eq!(Rank::from_level(Level(19)), Rank::Chunin);
        assert_eq!(Rank::from_level(Level(20)), Rank::Jonin);
        assert_eq!(Rank::from_level(Level(49)), Rank::Jonin);
        assert_eq!(Rank::from_level(Level(50)), Rank::Kage);
        assert_eq!(Rank::from_level(Level(999)), Rank::Kage);
    }

    #[test]
    fn test_rank_parse() {
        assert_eq!("genin".parse::<Rank>(), Ok(Rank::Genin));
        assert_eq!("Chunin".parse::<Rank>(), Ok(Rank::Chunin));
        assert_eq!(" JONIN ".parse::<Rank>(), Ok(Rank::Jonin));
        assert_eq!("kage".parse::<Rank>(), Ok(Rank::Kage));
        assert!("ronin".parse::<Rank>().is_err());
    }

    #[test]
    fn test_rank_min_level() {
        assert_eq!(Rank::Genin.min_level(), Level(0));
        assert_eq!(Rank::Chunin.min_level(), Level(10));
        assert_eq!(Rank::Kage.min_level(), Level(50));
    }

    #[test]
    fn test_xp_for_next() {
        assert_eq!(Level(0).xp_for_next(), 100);
        assert_eq!(Level(1).xp_for_next(), 400);
        assert_eq!(Level(4).xp_for_next(), 2500);
    }

    #[test]
    fn test_progress_percent() {
        // Level 1 spans 100..400
        assert_eq!(Level(1).progress_percent(100), 0.0);
        assert_eq!(Level(1).progress_percent(250), 50.0);
        assert_eq!(Level(1).progress_percent(200), 33.3);
        assert_eq!(Level(1).progress_percent(10_000), 100.0);
    }
}
