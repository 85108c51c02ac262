use nutrition_log_client::NutritionError;
use nutrition_log_client::utils::parse_grams;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mass as sent by MCP clients: a JSON number or free text such as `"150g"`.
/// Fractional grams are truncated the same way in both forms.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum GramsInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl GramsInput {
    pub fn to_grams(&self) -> Result<u32, NutritionError> {
        match self {
            GramsInput::Int(v) if *v <= 0 => Err(NutritionError::Validation(
                "mass must be greater than zero".into(),
            )),
            GramsInput::Int(v) => u32::try_from(*v)
                .map_err(|_| NutritionError::Validation(format!("mass out of range: {v}"))),
            GramsInput::Float(v) if !v.is_finite() || *v < 0.0 => Err(NutritionError::Validation(
                format!("mass must be a whole number of grams, got {v}"),
            )),
            GramsInput::Float(v) => match v.trunc() {
                w if w < 1.0 => Err(NutritionError::Validation(
                    "mass must be greater than zero".into(),
                )),
                w if w > f64::from(u32::MAX) => Err(NutritionError::Validation(format!(
                    "mass out of range: {v}"
                ))),
                w => Ok(w as u32),
            },
            GramsInput::Text(s) => parse_grams(s),
        }
    }
}
