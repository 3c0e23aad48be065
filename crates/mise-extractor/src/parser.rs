//! Validate completion output against the recipe schema

use crate::error::FallbackError;
use mise_domain::{Confidence, FieldName, FieldValue, IngredientEntry, StepEntry};
use serde::Deserialize;

/// A schema-valid generative answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerativeRecipe {
    /// Title, if the text has one
    pub title: Option<String>,
    /// Servings
    pub servings: Option<u32>,
    /// Preparation minutes
    pub prep_time: Option<u32>,
    /// Cooking minutes
    pub cook_time: Option<u32>,
    /// Ingredients in order
    pub ingredients: Vec<GenerativeIngredient>,
    /// Step texts in order
    pub steps: Vec<String>,
}

/// One ingredient in a generative answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerativeIngredient {
    /// Amount
    pub amount: Option<f64>,
    /// Unit as written
    pub unit: Option<String>,
    /// Name
    pub name: String,
}

impl GenerativeRecipe {
    fn validate(&self) -> Result<(), String> {
        if self.servings == Some(0) {
            return Err("servings must be at least 1".to_string());
        }
        for (idx, ingredient) in self.ingredients.iter().enumerate() {
            if ingredient.name.trim().is_empty() {
                return Err(format!("ingredient {} has an empty name", idx));
            }
            if let Some(amount) = ingredient.amount {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(format!("ingredient {} has invalid amount {}", idx, amount));
                }
            }
        }
        if let Some(idx) = self.steps.iter().position(|s| s.trim().is_empty()) {
            return Err(format!("step {} is empty", idx));
        }
        Ok(())
    }

    /// Value for one field, every entry at `confidence`; `None` when absent
    pub fn value(&self, field: FieldName, confidence: Confidence) -> Option<FieldValue> {
        match field {
            FieldName::Title => self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| FieldValue::Text(t.to_string())),
            FieldName::Servings => self.servings.map(FieldValue::Count),
            FieldName::PrepTime => self.prep_time.map(FieldValue::Minutes),
            FieldName::CookTime => self.cook_time.map(FieldValue::Minutes),
            FieldName::Ingredients if !self.ingredients.is_empty() => Some(FieldValue::Ingredients(
                self.ingredients
                    .iter()
                    .map(|i| IngredientEntry {
                        amount: i.amount,
                        unit: i
                            .unit
                            .as_deref()
                            .map(str::trim)
                            .filter(|u| !u.is_empty())
                            .map(str::to_string),
                        name: i.name.trim().to_string(),
                        confidence,
                    })
                    .collect(),
            )),
            FieldName::Steps if !self.steps.is_empty() => Some(FieldValue::Steps(
                self.steps
                    .iter()
                    .map(|s| StepEntry {
                        text: s.trim().to_string(),
                        confidence,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// Parse and validate one completion
///
/// Anything that does not match the schema exactly is a violation; nothing
/// from a malformed answer is kept.
pub fn parse_completion(response: &str) -> Result<GenerativeRecipe, FallbackError> {
    let json = extract_json(response)?;
    let recipe: GenerativeRecipe = serde_json::from_str(json)
        .map_err(|e| FallbackError::SchemaViolation(format!("JSON does not match schema: {}", e)))?;
    recipe.validate().map_err(FallbackError::SchemaViolation)?;
    Ok(recipe)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<&str, FallbackError> {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return Ok(trimmed);
    }

    let body = trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end();
    let body = body.strip_suffix("```").unwrap_or(body).trim();
    if body.is_empty() {
        return Err(FallbackError::SchemaViolation("empty code block".to_string()));
    }
    Ok(body)
}
