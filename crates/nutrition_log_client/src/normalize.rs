//! Tolerant normalization of food-database payloads.
//!
//! Remote nutrient records are untrusted: numbers may arrive as strings with
//! unit suffixes (`"52 kcal"`), fields may be absent, and bodies may carry
//! bare `NaN` tokens that are not valid JSON. Parsing happens in two stages,
//! [`sanitize`] then structural parsing, and every entry point here is total:
//! malformed input degrades to zero-valued fields, never to an error.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::FoodSuggestion;

/// Calorie and macronutrient values per 100 g of a food.
///
/// Every numeric field is finite and non-negative. The serialized form uses
/// the remote field names, so a serialized profile normalizes back to itself.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NutrientProfile {
    #[serde(default, deserialize_with = "deserialize_name")]
    name: String,
    #[serde(rename = "calories", default, deserialize_with = "deserialize_nutrient")]
    calories_per_100g: f64,
    #[serde(rename = "total_fat", default, deserialize_with = "deserialize_nutrient")]
    fat_per_100g: f64,
    #[serde(
        rename = "carbohydrate",
        default,
        deserialize_with = "deserialize_nutrient"
    )]
    carbs_per_100g: f64,
    #[serde(rename = "protein", default, deserialize_with = "deserialize_nutrient")]
    protein_per_100g: f64,
}

impl NutrientProfile {
    /// Build a profile, forcing each value into the finite non-negative range.
    pub fn new(
        name: impl Into<String>,
        calories_per_100g: f64,
        fat_per_100g: f64,
        carbs_per_100g: f64,
        protein_per_100g: f64,
    ) -> Self {
        Self {
            name: name.into(),
            calories_per_100g: nutrient_value(calories_per_100g),
            fat_per_100g: nutrient_value(fat_per_100g),
            carbs_per_100g: nutrient_value(carbs_per_100g),
            protein_per_100g: nutrient_value(protein_per_100g),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calories_per_100g(&self) -> f64 {
        self.calories_per_100g
    }

    pub fn fat_per_100g(&self) -> f64 {
        self.fat_per_100g
    }

    pub fn carbs_per_100g(&self) -> f64 {
        self.carbs_per_100g
    }

    pub fn protein_per_100g(&self) -> f64 {
        self.protein_per_100g
    }
}

// Bare non-finite tokens outside string literals. String literals are matched
// first so their contents are left alone.
static NON_FINITE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|-?Infinity|NaN"#).expect("valid non-finite token pattern")
});

/// Rewrite bare `NaN`, `Infinity` and `-Infinity` tokens to `null`.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    NON_FINITE_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[0];
        if token.starts_with('"') {
            token.to_string()
        } else {
            "null".to_string()
        }
    })
}

/// Sanitize then parse a textual payload. `None` when it still isn't JSON.
pub fn parse_payload(text: &str) -> Option<Value> {
    match serde_json::from_str(&sanitize(text)) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("discarding malformed food payload: {}", e);
            None
        }
    }
}

/// Normalize one raw food record into a canonical profile.
///
/// Accepts an object or a string holding a serialized object; anything else
/// yields the empty profile.
pub fn normalize(raw: &Value) -> NutrientProfile {
    match raw {
        Value::Object(_) => NutrientProfile::deserialize(raw).unwrap_or_else(|e| {
            tracing::warn!("unreadable food record, using empty profile: {}", e);
            NutrientProfile::default()
        }),
        Value::String(text) => normalize_text(text),
        _ => NutrientProfile::default(),
    }
}

pub fn normalize_text(text: &str) -> NutrientProfile {
    parse_payload(text)
        .map(|v| normalize(&v))
        .unwrap_or_default()
}

/// Normalize a suggestion list. Entries without a usable `fdcId` are dropped
/// since they cannot be selected afterwards.
pub fn suggestions_from_value(raw: &Value) -> Vec<FoodSuggestion> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let fdc_id = item.get("fdcId").and_then(extract_fdc_id);
                if fdc_id.is_none() {
                    tracing::debug!("dropping suggestion without fdcId");
                }
                fdc_id.map(|fdc_id| FoodSuggestion {
                    fdc_id,
                    profile: normalize(item),
                })
            })
            .collect(),
        Value::String(text) => suggestions_from_text(text),
        other => {
            tracing::warn!("suggestion payload is not an array: {}", value_kind(other));
            Vec::new()
        }
    }
}

pub fn suggestions_from_text(text: &str) -> Vec<FoodSuggestion> {
    parse_payload(text)
        .map(|v| suggestions_from_value(&v))
        .unwrap_or_default()
}

/// Resolve one nutrient field. Numbers pass through; text keeps only digits
/// and decimal points before parsing. Anything unusable becomes `0`.
pub fn extract_nutrient(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };
    nutrient_value(parsed.unwrap_or(0.0))
}

/// Clamp to the canonical range: non-finite and negative values become `0`.
pub fn nutrient_value(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}

fn extract_fdc_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn deserialize_nutrient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(extract_nutrient(value.as_ref()))
}

fn deserialize_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_canonical(p: &NutrientProfile) {
        for v in [
            p.calories_per_100g(),
            p.fat_per_100g(),
            p.carbs_per_100g(),
            p.protein_per_100g(),
        ] {
            assert!(v.is_finite() && v >= 0.0, "non-canonical value {v}");
        }
    }

    #[test]
    fn strips_units_from_text_values() {
        let p = normalize(&json!({
            "name": "Apple",
            "calories": "52 kcal",
            "total_fat": "0.2g",
            "carbohydrate": "14g",
            "protein": "0.3g"
        }));
        assert_eq!(p, NutrientProfile::new("Apple", 52.0, 0.2, 14.0, 0.3));
    }

    #[test]
    fn total_over_hostile_inputs() {
        let inputs = [
            json!({}),
            json!({"name": null, "calories": null}),
            json!({"calories": "NaN", "total_fat": "", "protein": true}),
            json!({"calories": "1.2.3", "carbohydrate": [1, 2], "protein": {"x": 1}}),
            json!({"calories": -40, "total_fat": "-3g"}),
            json!(null),
            json!(42),
            json!([1, 2, 3]),
            json!("{\"calories\": NaN}"),
            json!("not json at all"),
        ];
        for raw in &inputs {
            assert_canonical(&normalize(raw));
        }
    }

    #[test]
    fn missing_or_nan_calories_resolve_to_zero() {
        for raw in [
            json!({"name": "x"}),
            json!({"name": "x", "calories": "NaN"}),
            json!({"name": "x", "calories": ""}),
        ] {
            assert_eq!(normalize(&raw).calories_per_100g(), 0.0);
        }
        assert_eq!(normalize_text(r#"{"name":"x","calories":NaN}"#).calories_per_100g(), 0.0);
    }

    #[test]
    fn negative_numbers_clamp_to_zero() {
        let p = normalize(&json!({"calories": -40, "total_fat": "-3g"}));
        assert_eq!(p.calories_per_100g(), 0.0);
        // text extraction drops the sign character entirely
        assert_eq!(p.fat_per_100g(), 3.0);
    }

    #[test]
    fn name_is_copied_verbatim() {
        assert_eq!(normalize(&json!({"name": "  Brie, NaN-free "})).name(), "  Brie, NaN-free ");
        assert_eq!(normalize(&json!({"name": 1234})).name(), "1234");
        assert_eq!(normalize(&json!({"calories": 3})).name(), "");
    }

    #[test]
    fn normalize_is_idempotent_on_its_output() {
        let once = normalize_text(
            r#"{"name":"Oats","calories":"389 kcal","total_fat":NaN,"carbohydrate":"66.3g","protein":16.9}"#,
        );
        let serialized = serde_json::to_value(&once).expect("serialize");
        assert_eq!(normalize(&serialized), once);
    }

    #[test]
    fn sanitize_rewrites_bare_tokens_only() {
        let out = sanitize(r#"[{"name":"NaN bread","calories":NaN,"fat":-Infinity,"p":Infinity}]"#);
        assert_eq!(
            out,
            r#"[{"name":"NaN bread","calories":null,"fat":null,"p":null}]"#
        );
        let escaped = sanitize(r#"{"name":"say \"NaN\"","x":NaN}"#);
        assert_eq!(escaped, r#"{"name":"say \"NaN\"","x":null}"#);
    }

    #[test]
    fn unparsable_text_yields_empty_profile() {
        assert_eq!(normalize_text("{\"name\": \"Apple\", "), NutrientProfile::default());
    }

    #[test]
    fn string_wrapped_record_is_unwrapped() {
        let raw = json!(r#"{"name":"Kiwi","calories":"61","protein":NaN}"#);
        let p = normalize(&raw);
        assert_eq!(p.name(), "Kiwi");
        assert_eq!(p.calories_per_100g(), 61.0);
        assert_eq!(p.protein_per_100g(), 0.0);
    }

    #[test]
    fn suggestions_keep_selectable_items() {
        let list = suggestions_from_text(
            r#"[
                {"fdcId": 1, "name": "Apple", "calories": 52, "total_fat": NaN},
                {"fdcId": "2", "name": "Apple juice", "calories": "46 kcal"},
                {"name": "No id"},
                {"fdcId": 3.0, "name": "Applesauce"}
            ]"#,
        );
        let ids: Vec<i64> = list.iter().map(|s| s.fdc_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list[0].profile.fat_per_100g(), 0.0);
        assert_eq!(list[1].profile.calories_per_100g(), 46.0);
    }

    #[test]
    fn non_array_suggestions_are_empty() {
        assert!(suggestions_from_text(r#"{"error": "Food database is empty"}"#).is_empty());
        assert!(suggestions_from_text("<html>").is_empty());
    }
}
