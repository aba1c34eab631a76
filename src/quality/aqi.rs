//! Air-quality index scoring.
//!
//! The index runs from 0 (ideal) to 100 (worst). Each dimension yields a
//! sub-score in `[0, 100]`; the composite is a fixed weighted sum rounded to
//! one decimal place.

const CO2_BASELINE_PPM: f64 = 400.0;
const CO2_SATURATION_PPM: f64 = 2000.0;

const TEMPERATURE_COMFORT: (f64, f64) = (20.0, 24.0);
const TEMPERATURE_CENTRE: f64 = 22.0;
const TEMPERATURE_PENALTY_PER_DEGREE: f64 = 10.0;

const HUMIDITY_COMFORT: (f64, f64) = (40.0, 60.0);
const HUMIDITY_CENTRE: f64 = 50.0;
const HUMIDITY_PENALTY_PER_PERCENT: f64 = 2.0;

const CO2_WEIGHT: f64 = 0.7;
const TEMPERATURE_WEIGHT: f64 = 0.2;
const HUMIDITY_WEIGHT: f64 = 0.1;

const MAX_SUB_SCORE: f64 = 100.0;

/// Linear ramp from 0 at 400 ppm to 100 at 2000 ppm.
pub fn co2_sub_score(co2_ppm: f64) -> f64 {
    let slope = (CO2_SATURATION_PPM - CO2_BASELINE_PPM) / MAX_SUB_SCORE;
    ((co2_ppm - CO2_BASELINE_PPM) / slope).clamp(0.0, MAX_SUB_SCORE)
}

/// Zero inside 20–24 °C (inclusive), otherwise 10 points per degree away
/// from 22 °C.
pub fn temperature_sub_score(temperature_c: f64) -> f64 {
    band_penalty(
        temperature_c,
        TEMPERATURE_COMFORT,
        TEMPERATURE_CENTRE,
        TEMPERATURE_PENALTY_PER_DEGREE,
    )
}

/// Zero inside 40–60 % (inclusive), otherwise 2 points per percent away
/// from 50 %.
pub fn humidity_sub_score(humidity_pct: f64) -> f64 {
    band_penalty(
        humidity_pct,
        HUMIDITY_COMFORT,
        HUMIDITY_CENTRE,
        HUMIDITY_PENALTY_PER_PERCENT,
    )
}

/// Composite index for a single reading. Higher is worse.
pub fn score(co2_ppm: f64, temperature_c: f64, humidity_pct: f64) -> f64 {
    let total = co2_sub_score(co2_ppm) * CO2_WEIGHT
        + temperature_sub_score(temperature_c) * TEMPERATURE_WEIGHT
        + humidity_sub_score(humidity_pct) * HUMIDITY_WEIGHT;
    round_to_tenth(total)
}

fn band_penalty(value: f64, (low, high): (f64, f64), centre: f64, per_unit: f64) -> f64 {
    if (low..=high).contains(&value) {
        0.0
    } else {
        ((value - centre).abs() * per_unit).min(MAX_SUB_SCORE)
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co2_below_baseline_scores_zero() {
        for co2 in [0.0, 100.0, 250.5, 399.9, 400.0] {
            assert_eq!(co2_sub_score(co2), 0.0, "co2 = {co2}");
        }
    }

    #[test]
    fn co2_ramp_points() {
        assert_eq!(co2_sub_score(1200.0), 50.0);
        assert_eq!(co2_sub_score(2000.0), 100.0);
        assert_eq!(co2_sub_score(5000.0), 100.0);
    }

    #[test]
    fn temperature_band_is_inclusive() {
        assert_eq!(temperature_sub_score(20.0), 0.0);
        assert_eq!(temperature_sub_score(22.0), 0.0);
        assert_eq!(temperature_sub_score(24.0), 0.0);
        assert_eq!(temperature_sub_score(25.0), 30.0);
        assert_eq!(temperature_sub_score(18.0), 40.0);
    }

    #[test]
    fn temperature_penalty_saturates() {
        assert_eq!(temperature_sub_score(40.0), 100.0);
        assert_eq!(temperature_sub_score(-30.0), 100.0);
    }

    #[test]
    fn humidity_band_is_inclusive() {
        assert_eq!(humidity_sub_score(40.0), 0.0);
        assert_eq!(humidity_sub_score(60.0), 0.0);
        assert_eq!(humidity_sub_score(70.0), 40.0);
        assert_eq!(humidity_sub_score(30.0), 40.0);
        assert_eq!(humidity_sub_score(0.0), 100.0);
        assert_eq!(humidity_sub_score(200.0), 100.0);
    }

    #[test]
    fn comfortable_reading_scores_zero() {
        assert_eq!(score(400.0, 22.0, 50.0), 0.0);
        for (co2, t, h) in [(0.0, 20.0, 40.0), (350.0, 24.0, 60.0), (400.0, 21.3, 55.5)] {
            assert_eq!(score(co2, t, h), 0.0);
        }
    }

    #[test]
    fn co2_saturation_contributes_seventy() {
        assert_eq!(score(2000.0, 22.0, 50.0), 70.0);
    }

    #[test]
    fn composite_is_rounded_to_one_decimal() {
        // 43.75 * 0.7 + 100 * 0.2 + 100 * 0.1 = 60.625
        assert_eq!(score(1100.0, 40.0, 0.0), 60.6);
    }

    #[test]
    fn composite_stays_within_bounds() {
        let extremes = [-1.0e9, -40.0, 0.0, 22.0, 1.0e4, 1.0e9];
        for co2 in extremes {
            for t in extremes {
                for h in extremes {
                    let s = score(co2, t, h);
                    assert!((0.0..=100.0).contains(&s), "score({co2}, {t}, {h}) = {s}");
                }
            }
        }
        assert_eq!(score(1.0e9, 1.0e9, 1.0e9), 100.0);
    }

    #[test]
    fn score_is_deterministic() {
        let a = score(987.6, 26.3, 71.2);
        let b = score(987.6, 26.3, 71.2);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
