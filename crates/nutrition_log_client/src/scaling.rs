//! Scaling per-100g nutrient profiles to the mass actually eaten.

use crate::ledger::LedgerEntry;
use crate::normalize::NutrientProfile;

/// Scale `profile` to `grams` of food.
///
/// Each nutrient is `per_100g * (grams / 100)`. Non-finite results are
/// coerced to `0`. Zero grams yields an all-zero entry; rejecting it is the
/// caller's job.
pub fn scale(profile: &NutrientProfile, grams: u32) -> LedgerEntry {
    let factor = f64::from(grams) / 100.0;
    LedgerEntry {
        food_name: profile.name().to_string(),
        grams,
        calories: scaled(profile.calories_per_100g(), factor),
        fat: scaled(profile.fat_per_100g(), factor),
        carbs: scaled(profile.carbs_per_100g(), factor),
        protein: scaled(profile.protein_per_100g(), factor),
    }
}

fn scaled(per_100g: f64, factor: f64) -> f64 {
    let v = per_100g * factor;
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn apple() -> NutrientProfile {
        NutrientProfile::new("Apple", 52.0, 0.2, 14.0, 0.3)
    }

    #[test]
    fn scales_150_grams() {
        let e = scale(&apple(), 150);
        assert_eq!(e.food_name, "Apple");
        assert_eq!(e.grams, 150);
        assert!((e.calories - 78.0).abs() < EPS);
        assert!((e.fat - 0.3).abs() < EPS);
        assert!((e.carbs - 21.0).abs() < EPS);
        assert!((e.protein - 0.45).abs() < EPS);
    }

    #[test]
    fn zero_grams_is_all_zero() {
        let e = scale(&apple(), 0);
        assert_eq!(
            (e.calories, e.fat, e.carbs, e.protein),
            (0.0, 0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn overflow_is_coerced_to_zero() {
        let huge = NutrientProfile::new("Lard", f64::MAX, 1.0, 0.0, 0.0);
        let e = scale(&huge, u32::MAX);
        assert_eq!(e.calories, 0.0);
        assert!(e.fat.is_finite());
    }

    #[test]
    fn scaling_is_deterministic() {
        let a = scale(&apple(), 137);
        let b = scale(&apple(), 137);
        assert_eq!(a.calories.to_bits(), b.calories.to_bits());
        assert_eq!(a.protein.to_bits(), b.protein.to_bits());
    }
}
