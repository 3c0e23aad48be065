//! Prompt and schema for the generative fallback

use crate::locale::Locale;
use mise_domain::FieldName;

/// JSON schema every completion must satisfy
pub const RECIPE_SCHEMA: &str = r#"{
  "type": "object",
  "additionalProperties": false,
  "required": ["ingredients", "steps"],
  "properties": {
    "title": {"type": ["string", "null"]},
    "servings": {"type": ["integer", "null"], "minimum": 1},
    "prep_time": {"type": ["integer", "null"], "minimum": 0},
    "cook_time": {"type": ["integer", "null"], "minimum": 0},
    "ingredients": {
      "type": "array",
      "items": {
        "type": "object",
        "additionalProperties": false,
        "required": ["name"],
        "properties": {
          "amount": {"type": ["number", "null"], "minimum": 0},
          "unit": {"type": ["string", "null"]},
          "name": {"type": "string", "minLength": 1}
        }
      }
    },
    "steps": {"type": "array", "items": {"type": "string", "minLength": 1}}
  }
}"#;

/// Builds the completion prompt for one segment
pub struct PromptBuilder<'a> {
    segment_text: &'a str,
    fields: &'a [FieldName],
    locale: Locale,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt for the given segment and the fields still in doubt
    pub fn new(segment_text: &'a str, fields: &'a [FieldName], locale: Locale) -> Self {
        Self {
            segment_text,
            fields,
            locale,
        }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n\n");

        let language = match self.locale {
            Locale::De => "German",
            Locale::En => "English",
        };
        prompt.push_str(&format!(
            "The recipe is written in {}. Keep names and steps in that language.\n",
            language
        ));

        let names: Vec<&str> = self.fields.iter().map(FieldName::as_str).collect();
        prompt.push_str(&format!("Fields needed most: {}\n\n", names.join(", ")));

        prompt.push_str("Recipe text:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.segment_text);
        prompt.push_str("\n---\n\n");

        prompt.push_str("Respond with JSON matching this schema and nothing else:\n");
        prompt.push_str(RECIPE_SCHEMA);
        prompt
    }
}

const INSTRUCTIONS: &str = r#"Extract the structured recipe from the text below.

Rules:
- Only report what the text states. Use null for a title, servings or time that is not there.
- Times are whole minutes.
- Ingredients keep their order; amount is a number, unit is the unit as written.
- Steps keep their order, one instruction per entry, without numbering.
- Do not add fields that are not in the schema."#;
