//! Locale vocabularies for the heuristic and pattern parsers

use serde::{Deserialize, Serialize};

/// Language of the cookbook being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// German
    #[default]
    De,
    /// English
    En,
}

/// Word lists for one locale, all lowercase
#[derive(Debug)]
pub struct Vocabulary {
    /// Measurement units, abbreviated and spelled out
    pub units: &'static [&'static str],
    /// Words that sit next to a servings count
    pub servings_markers: &'static [&'static str],
    /// Words that introduce a preparation time
    pub prep_markers: &'static [&'static str],
    /// Words that introduce a cooking time
    pub cook_markers: &'static [&'static str],
    /// Openers of an ingredient section
    pub ingredient_headings: &'static [&'static str],
    /// Openers of a step section
    pub step_headings: &'static [&'static str],
    /// Verbs that mark an instruction line
    pub imperative_verbs: &'static [&'static str],
}

static DE: Vocabulary = Vocabulary {
    units: &[
        "g", "gr", "gramm", "kg", "kilogramm", "mg", "ml", "cl", "dl", "l", "liter", "el",
        "esslöffel", "tl", "teelöffel", "msp", "messerspitze", "prise", "prisen", "stk",
        "stück", "becher", "bund", "dose", "dosen", "pck", "päckchen", "packung", "tasse",
        "tassen", "zehe", "zehen", "scheibe", "scheiben", "glas", "handvoll", "blatt",
        "blätter", "zweig", "zweige", "würfel",
    ],
    servings_markers: &["personen", "person", "portionen", "portion"],
    prep_markers: &[
        "zubereitung", "zubereitungszeit", "vorbereitung", "vorbereitungszeit", "arbeitszeit",
    ],
    cook_markers: &["backzeit", "garzeit", "kochzeit", "bratzeit", "backen"],
    ingredient_headings: &["zutaten", "für den teig", "für die füllung", "für die sauce"],
    step_headings: &["zubereitung", "anleitung", "so geht's", "so wird's gemacht"],
    imperative_verbs: &[
        "mischen", "vermischen", "rühren", "verrühren", "unterrühren", "geben", "hinzufügen",
        "schneiden", "hacken", "backen", "kochen", "braten", "anbraten", "sieben", "schlagen",
        "kneten", "würzen", "abschmecken", "servieren", "erhitzen", "vorheizen", "abgießen",
        "unterheben", "verteilen", "garen", "schälen", "waschen", "stellen", "lassen",
        "gießen", "füllen", "bestreuen", "zugeben", "aufkochen", "köcheln", "ziehen",
    ],
};

static EN: Vocabulary = Vocabulary {
    units: &[
        "g", "gram", "grams", "kg", "mg", "ml", "l", "liter", "litre", "cup", "cups", "tbsp",
        "tablespoon", "tablespoons", "tsp", "teaspoon", "teaspoons", "oz", "ounce", "ounces",
        "lb", "lbs", "pound", "pounds", "pinch", "clove", "cloves", "can", "cans", "slice",
        "slices", "bunch", "stick", "sticks", "pint", "quart", "dash", "handful",
    ],
    servings_markers: &[
        "serves", "servings", "serving", "portions", "people", "persons", "makes", "yield",
        "yields",
    ],
    prep_markers: &["prep", "preparation", "active"],
    cook_markers: &["cook", "cooking", "bake", "baking", "roast", "roasting"],
    ingredient_headings: &["ingredients", "for the dough", "for the filling", "for the sauce"],
    step_headings: &["method", "directions", "instructions", "steps", "preparation"],
    imperative_verbs: &[
        "mix", "stir", "add", "combine", "whisk", "bake", "cook", "fry", "chop", "slice",
        "pour", "preheat", "heat", "serve", "season", "simmer", "boil", "beat", "fold",
        "knead", "place", "remove", "let", "cover", "bring", "sift", "spread", "transfer",
        "melt", "grease", "drain", "roll", "cut", "reduce",
    ],
};

impl Locale {
    /// Word lists for this locale
    pub fn vocabulary(&self) -> &'static Vocabulary {
        match self {
            Locale::De => &DE,
            Locale::En => &EN,
        }
    }
}

impl Vocabulary {
    /// Whether `token` (any case, trailing '.' ignored) is a known unit
    pub fn is_unit(&self, token: &str) -> bool {
        let token = normalize_token(token);
        self.units.contains(&token.as_str())
    }

    /// Whether `token` is a known imperative verb
    pub fn is_imperative(&self, token: &str) -> bool {
        let token = normalize_token(token);
        self.imperative_verbs.contains(&token.as_str())
    }
}

/// Lowercase and strip surrounding punctuation
pub fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_ignore_case_and_dot() {
        let de = Locale::De.vocabulary();
        assert!(de.is_unit("g"));
        assert!(de.is_unit("EL"));
        assert!(de.is_unit("Pck."));
        assert!(!de.is_unit("cup"));
        assert!(Locale::En.vocabulary().is_unit("Cups"));
    }

    #[test]
    fn test_imperatives() {
        assert!(Locale::De.vocabulary().is_imperative("sieben."));
        assert!(Locale::En.vocabulary().is_imperative("Preheat"));
        assert!(!Locale::En.vocabulary().is_imperative("flour"));
    }

    #[test]
    fn test_default_locale_is_german() {
        assert_eq!(Locale::default(), Locale::De);
    }
}
