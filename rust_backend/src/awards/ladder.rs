//! Threshold ladders.
//!
//! A ladder is a list of half-open bands `[from, next_from)`, the last one
//! unbounded. Each band caps the award tier; a value below the lowest band
//! caps it at `None`. Applying a ladder never raises the tier, so a `Gold`
//! reached earlier survives a later band that would allow `Platinum`.

use crate::core::domain::AwardTier;

/// Cap used by bands that leave the current tier unchanged.
pub const HOLD: AwardTier = AwardTier::Diamond;

/// One band of a ladder, inclusive at its lower bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub from: f64,
    pub cap: AwardTier,
}

impl Band {
    /// Band starting at `from` (inclusive).
    pub fn at(from: f64, cap: AwardTier) -> Self {
        Self { from, cap }
    }

    /// Band with no lower bound.
    pub fn below(cap: AwardTier) -> Self {
        Self {
            from: f64::NEG_INFINITY,
            cap,
        }
    }
}

/// Ordered set of bands.
///
/// # Examples
///
/// ```
/// use resq_rust::awards::ladder::{Band, Ladder, HOLD};
/// use resq_rust::core::domain::AwardTier;
///
/// let ladder = Ladder::new(vec![
///     Band::at(80.0, AwardTier::Gold),
///     Band::at(85.0, AwardTier::Platinum),
///     Band::at(90.0, HOLD),
/// ]);
/// assert_eq!(ladder.cap_for(79.99), AwardTier::None);
/// assert_eq!(ladder.cap_for(84.995), AwardTier::Gold);
/// assert_eq!(ladder.apply(AwardTier::Diamond, 86.0), AwardTier::Platinum);
/// assert_eq!(ladder.apply(AwardTier::Gold, 95.0), AwardTier::Gold);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    bands: Vec<Band>,
}

impl Ladder {
    pub fn new(mut bands: Vec<Band>) -> Self {
        bands.sort_by(|a, b| a.from.total_cmp(&b.from));
        Self { bands }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Highest tier the band containing `value` allows.
    pub fn cap_for(&self, value: f64) -> AwardTier {
        self.bands
            .iter()
            .rev()
            .find(|band| value >= band.from)
            .map(|band| band.cap)
            .unwrap_or(AwardTier::None)
    }

    /// Narrow `current` by the band containing `value`.
    pub fn apply(&self, current: AwardTier, value: f64) -> AwardTier {
        current.min(self.cap_for(value))
    }
}
