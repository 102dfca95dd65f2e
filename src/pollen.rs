//! Heuristic pollen index estimation
//!
//! The index is a synthetic 0-10 risk score derived from current temperature,
//! relative humidity, and wind speed. It is not a measured quantity: warm,
//! dry, moderately windy conditions score highest because they favor
//! airborne allergen dispersal.

use rand::RngExt;
use serde::{Deserialize, Serialize};

/// Temperature at which the temperature score starts rising (Celsius)
pub const TEMP_BASE: f64 = 10.0;
/// Degrees per score point above the base temperature
pub const TEMP_DIVISOR: f64 = 5.0;
/// Humidity below this scores as "dry" (percent)
pub const HUMIDITY_LOW: f64 = 40.0;
/// Humidity below this (and at least `HUMIDITY_LOW`) scores as "medium"
pub const HUMIDITY_MED: f64 = 70.0;
/// Wind below this scores as "calm" (km/h)
pub const WIND_LOW: f64 = 5.0;
/// Wind at or above this scores as "strong" (km/h)
pub const WIND_HIGH: f64 = 20.0;

/// Upper bound of the index
pub const MAX_INDEX: f64 = 10.0;

/// Estimate the pollen index with the thread-local random generator.
///
/// Non-deterministic: a uniform jitter in [0,1) is added to the combined
/// score. Use [`estimate_with`] with a seeded generator when reproducibility
/// matters.
#[must_use]
pub fn estimate(temperature_c: f64, relative_humidity_pct: f64, wind_speed_kmh: f64) -> f64 {
    estimate_with(
        temperature_c,
        relative_humidity_pct,
        wind_speed_kmh,
        &mut rand::rng(),
    )
}

/// Estimate the pollen index, drawing the jitter term from `rng`.
///
/// Score components:
/// - temperature: `clamp((t - 10) / 5, 0, 3)` — nothing below 10°C, saturating at 25°C
/// - humidity: 3 when dry (< 40%), 2 when medium (< 70%), 1 otherwise
/// - wind: 1 when calm (< 5 km/h), 3 when moderate (< 20 km/h), 2 when strong
///
/// The jitter is added before the single top clamp, so a nominal band score
/// can read up to one point higher. The result is always within [0, 10].
#[must_use]
pub fn estimate_with<R: RngExt>(
    temperature_c: f64,
    relative_humidity_pct: f64,
    wind_speed_kmh: f64,
    rng: &mut R,
) -> f64 {
    let raw = temperature_score(temperature_c)
        + f64::from(humidity_score(relative_humidity_pct))
        + f64::from(wind_score(wind_speed_kmh))
        + rng.random_range(0.0..1.0);
    raw.min(MAX_INDEX)
}

/// Temperature contribution, clamped to [0, 3]
#[must_use]
pub fn temperature_score(temperature_c: f64) -> f64 {
    ((temperature_c - TEMP_BASE) / TEMP_DIVISOR).clamp(0.0, 3.0)
}

/// Humidity contribution: dry air disperses pollen best.
/// Thresholds are strict, so exactly 40% scores as the medium tier.
#[must_use]
pub fn humidity_score(relative_humidity_pct: f64) -> u8 {
    if relative_humidity_pct < HUMIDITY_LOW {
        3
    } else if relative_humidity_pct < HUMIDITY_MED {
        2
    } else {
        1
    }
}

/// Wind contribution: moderate wind spreads pollen, strong wind clears it
#[must_use]
pub fn wind_score(wind_speed_kmh: f64) -> u8 {
    if wind_speed_kmh < WIND_LOW {
        1
    } else if wind_speed_kmh < WIND_HIGH {
        3
    } else {
        2
    }
}

/// Qualitative risk band for a computed index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Band an index: below 4 is low, below 7 moderate, everything else high
    #[must_use]
    pub fn for_index(index: f64) -> Self {
        if index < 4.0 {
            Self::Low
        } else if index < 7.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// Health and activity recommendations derived from the index and UV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub outdoor_activity: OutdoorAdvice,
    pub mask: MaskAdvice,
    pub windows: WindowAdvice,
    pub uv: UvBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutdoorAdvice {
    Good,
    Moderation,
    NotRecommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskAdvice {
    Optional,
    Recommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAdvice {
    CanOpen,
    KeepClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvBand {
    Low,
    High,
    Extreme,
}

impl Recommendations {
    #[must_use]
    pub fn for_conditions(pollen_index: f64, uv_index: f64) -> Self {
        Self {
            outdoor_activity: if pollen_index < 4.0 {
                OutdoorAdvice::Good
            } else if pollen_index < 7.0 {
                OutdoorAdvice::Moderation
            } else {
                OutdoorAdvice::NotRecommended
            },
            mask: if pollen_index < 7.0 {
                MaskAdvice::Optional
            } else {
                MaskAdvice::Recommended
            },
            windows: if pollen_index < 5.0 {
                WindowAdvice::CanOpen
            } else {
                WindowAdvice::KeepClosed
            },
            uv: if uv_index < 3.0 {
                UvBand::Low
            } else if uv_index < 8.0 {
                UvBand::High
            } else {
                UvBand::Extreme
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 3)]
    #[case(39.9, 3)]
    #[case(40.0, 2)] // exact threshold takes the lower-scoring branch
    #[case(55.0, 2)]
    #[case(69.9, 2)]
    #[case(70.0, 1)]
    #[case(100.0, 1)]
    fn test_humidity_score_tiers(#[case] humidity: f64, #[case] expected: u8) {
        assert_eq!(humidity_score(humidity), expected);
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(4.9, 1)]
    #[case(5.0, 3)]
    #[case(19.9, 3)]
    #[case(20.0, 2)]
    #[case(80.0, 2)]
    fn test_wind_score_tiers(#[case] wind: f64, #[case] expected: u8) {
        assert_eq!(wind_score(wind), expected);
    }

    #[rstest]
    #[case(10.0, 0.0)]
    #[case(0.0, 0.0)] // clamped at the bottom
    #[case(-20.0, 0.0)]
    #[case(12.5, 0.5)]
    #[case(25.0, 3.0)]
    #[case(40.0, 3.0)] // clamped at the top
    fn test_temperature_score(#[case] temp: f64, #[case] expected: f64) {
        assert!((temperature_score(temp) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_estimate_stays_within_jitter_band() {
        // 25°C, 30% humidity, 10 km/h wind: 3 + 3 + 3 = 9 before jitter
        let mut rng = rand::rng();
        for _ in 0..200 {
            let index = estimate_with(25.0, 30.0, 10.0, &mut rng);
            assert!((9.0..MAX_INDEX).contains(&index));
        }
    }

    #[test]
    fn test_estimate_never_exceeds_ten() {
        // Even the worst realistic conditions clamp to 10
        let mut rng = rand::rng();
        for _ in 0..200 {
            let index = estimate(45.0, 10.0, 12.0);
            assert!(index <= MAX_INDEX);
            let injected = estimate_with(45.0, 10.0, 12.0, &mut rng);
            assert!(injected <= MAX_INDEX);
        }
    }

    #[test]
    fn test_estimate_never_negative_for_realistic_inputs() {
        for _ in 0..200 {
            // Coldest realistic case still carries at least the humidity and wind floor
            let index = estimate(-50.0, 100.0, 0.0);
            assert!(index >= 0.0);
            // 0 + 1 + 1 + U, so the floor is actually 2
            assert!(index >= 2.0);
        }
    }

    #[rstest]
    #[case(0.0, RiskTier::Low)]
    #[case(3.9, RiskTier::Low)]
    #[case(4.0, RiskTier::Moderate)]
    #[case(6.9, RiskTier::Moderate)]
    #[case(7.0, RiskTier::High)]
    #[case(10.0, RiskTier::High)]
    fn test_risk_tier_bands(#[case] index: f64, #[case] expected: RiskTier) {
        assert_eq!(RiskTier::for_index(index), expected);
    }

    #[test]
    fn test_recommendations_for_high_risk() {
        let rec = Recommendations::for_conditions(8.2, 9.0);
        assert_eq!(rec.outdoor_activity, OutdoorAdvice::NotRecommended);
        assert_eq!(rec.mask, MaskAdvice::Recommended);
        assert_eq!(rec.windows, WindowAdvice::KeepClosed);
        assert_eq!(rec.uv, UvBand::Extreme);
    }

    #[test]
    fn test_recommendations_for_low_risk() {
        let rec = Recommendations::for_conditions(2.5, 1.0);
        assert_eq!(rec.outdoor_activity, OutdoorAdvice::Good);
        assert_eq!(rec.mask, MaskAdvice::Optional);
        assert_eq!(rec.windows, WindowAdvice::CanOpen);
        assert_eq!(rec.uv, UvBand::Low);
    }
}
