//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use mise_domain::{
    DraftField, DraftState, IngredientOrder, MergedRecipeDraft, PatternRule, StepStyle,
};
use mise_extractor::{CorrectionReport, ParsedDocument};
use mise_miner::MiningOutcome;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a parsed document.
    pub fn format_document(&self, document: &ParsedDocument) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
            OutputFormat::Quiet => Ok(document
                .drafts()
                .map(|d| d.draft_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_document_table(document)),
        }
    }

    fn format_document_table(&self, document: &ParsedDocument) -> String {
        let header = self.info(&format!(
            "Document {} ({}, library v{}, fingerprint {})",
            document.document_id, document.state, document.library_version, document.fingerprint
        ));

        let mut builder = Builder::default();
        builder.push_record([
            "#",
            "Draft",
            "Title",
            "Servings",
            "Prep",
            "Cook",
            "Ingredients",
            "Steps",
            "State",
            "Review",
        ]);

        for draft in document.drafts() {
            let review = draft
                .review_fields
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            builder.push_record([
                draft.segment_index.to_string(),
                short_id(draft.draft_id.as_str()).to_string(),
                field_text(&draft.title, |t| t.clone()),
                field_text(&draft.servings, u32::to_string),
                field_text(&draft.prep_time, |m| format!("{} min", m)),
                field_text(&draft.cook_time, |m| format!("{} min", m)),
                draft.ingredients.len().to_string(),
                draft.steps.len().to_string(),
                self.draft_state(draft),
                review,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("{}\n{}", header, table)
    }

    /// Format pattern rules.
    pub fn format_rules(&self, version: u64, rules: &[&PatternRule]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rules)?),
            OutputFormat::Quiet => Ok(rules
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_rules_table(version, rules)),
        }
    }

    fn format_rules_table(&self, version: u64, rules: &[&PatternRule]) -> String {
        if rules.is_empty() {
            return self.colorize(&format!("No rules in library v{}.", version), "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "ID",
            "Fingerprint",
            "Success",
            "Samples",
            "Status",
            "Layout",
            "Markers",
        ]);

        for rule in rules {
            let definition = &rule.rule_definition;
            let layout = format!(
                "title@{} {} {}",
                definition.title_line,
                match definition.step_style {
                    StepStyle::Numbered => "numbered",
                    StepStyle::Bulleted => "bulleted",
                    StepStyle::Paragraph => "paragraph",
                },
                match definition.ingredient_order {
                    IngredientOrder::AmountFirst => "amount-first",
                    IngredientOrder::NameFirst => "name-first",
                },
            );
            let markers = definition
                .servings_markers
                .iter()
                .chain(&definition.prep_time_markers)
                .chain(&definition.cook_time_markers)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let status = if rule.retired {
                self.colorize("retired", "red")
            } else {
                self.colorize("active", "green")
            };
            builder.push_record([
                rule.id.to_string(),
                short_id(rule.fingerprint.as_str()).to_string(),
                format!("{:.2}", rule.success_rate),
                rule.sample_count.to_string(),
                status,
                layout,
                markers,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("Library v{}\n{}", version, table)
    }

    /// Format the result of submitting corrections.
    pub fn format_report(&self, report: &CorrectionReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "recorded": report.recorded.iter().map(|e| serde_json::json!({
                        "id": e.id,
                        "draft_id": e.example.draft_id,
                        "changed_fields": e.example.diff.fields(),
                    })).collect::<Vec<_>>(),
                    "dropped": report.dropped.iter().map(|(draft_id, err)| serde_json::json!({
                        "draft_id": draft_id,
                        "error": err.to_string(),
                    })).collect::<Vec<_>>(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(report
                .recorded
                .iter()
                .map(|e| e.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!(
                    "Recorded {} training example(s)",
                    report.recorded.len()
                ))];
                for (draft_id, err) in &report.dropped {
                    let message = format!("Dropped correction for {}: {}", draft_id, err);
                    lines.push(self.warning(&message));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a mining pass.
    pub fn format_outcome(&self, outcome: &MiningOutcome, dry_run: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "version": outcome.library.version,
                    "published": outcome.has_new_version() && !dry_run,
                    "examples_consumed": outcome.examples_consumed,
                    "created": outcome.created,
                    "revised": outcome.revised,
                    "retired": outcome.retired,
                    "replayed": outcome.replayed,
                    "reproduced": outcome.reproduced,
                    "regressed": outcome.regressed,
                    "active_rules": outcome.library.active_rule_count(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(outcome.library.version.to_string()),
            OutputFormat::Table => {
                if !outcome.has_new_version() {
                    return Ok(self.info(&format!(
                        "Nothing new to mine (library v{})",
                        outcome.library.version
                    )));
                }
                let verb = if dry_run { "Would publish" } else { "Published" };
                Ok([
                    self.success(&format!(
                        "{} library v{} ({} active rules)",
                        verb,
                        outcome.library.version,
                        outcome.library.active_rule_count()
                    )),
                    format!("  Examples consumed: {}", outcome.examples_consumed),
                    format!(
                        "  Earlier examples: {} replayed, {} reproduced, {} regressed",
                        outcome.replayed, outcome.reproduced, outcome.regressed
                    ),
                    format!("  Created: {}", id_list(&outcome.created)),
                    format!("  Revised: {}", id_list(&outcome.revised)),
                    format!("  Retired: {}", id_list(&outcome.retired)),
                ]
                .join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn draft_state(&self, draft: &MergedRecipeDraft) -> String {
        let color = match draft.overall_state {
            DraftState::Complete => "green",
            DraftState::NeedsReview => "yellow",
            DraftState::Incomplete => "red",
        };
        self.colorize(draft.overall_state.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn field_text<T>(field: &Option<DraftField<T>>, show: impl Fn(&T) -> String) -> String {
    match field {
        Some(f) => format!("{} ({})", show(&f.value), f.confidence),
        None => "-".to_string(),
    }
}

/// Truncate long ids for readability
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn id_list(ids: &[u64]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mise_domain::{
        Confidence, DocumentId, DocumentState, DraftId, FieldName, FieldValue, Fingerprint,
        PatternLibraryVersion, RuleDefinition, Segment,
    };
    use mise_extractor::ParsedSegment;

    fn document() -> ParsedDocument {
        let mut draft =
            MergedRecipeDraft::empty(DraftId::new("doc-0"), 0, Fingerprint::new("fp"), 3);
        let title = FieldValue::Text("Brot".into());
        draft.set_field(FieldName::Title, Some(title), Confidence::new(0.9), None);
        draft.assess(0.5);
        ParsedDocument {
            document_id: DocumentId::new(),
            fingerprint: Fingerprint::new("fp"),
            library_version: 3,
            state: DocumentState::ReviewPending,
            segments: vec![ParsedSegment {
                segment: Segment::standalone("Brot"),
                draft,
                candidates: Vec::new(),
                fallback_fields: Vec::new(),
                fallback_error: None,
            }],
        }
    }

    fn rule(id: u64, retired: bool) -> PatternRule {
        PatternRule {
            id,
            fingerprint: Fingerprint::new("family"),
            rule_definition: RuleDefinition {
                servings_markers: vec!["personen".into()],
                ..Default::default()
            },
            success_rate: 0.72,
            sample_count: 5,
            retired,
            updated_at: 0,
        }
    }

    #[test]
    fn test_document_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_document(&document()).unwrap();
        assert!(output.contains("library v3"));
        assert!(output.contains("Brot (0.90)"));
        assert!(output.contains("Ingredients"));
    }

    #[test]
    fn test_document_json_round_trips() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let doc = document();
        let output = formatter.format_document(&doc).unwrap();
        let parsed: ParsedDocument = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_document_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.format_document(&document()).unwrap(), "doc-0");
    }

    #[test]
    fn test_rules_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let rules = [rule(1, false), rule(2, true)];
        let refs: Vec<&PatternRule> = rules.iter().collect();
        let output = formatter.format_rules(4, &refs).unwrap();
        assert!(output.contains("Library v4"));
        assert!(output.contains("0.72"));
        assert!(output.contains("retired"));
        assert!(output.contains("personen"));
    }

    #[test]
    fn test_empty_rules() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_rules(0, &[]).unwrap();
        assert!(output.contains("No rules"));
    }

    #[test]
    fn test_outcome_without_new_version() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let outcome = MiningOutcome {
            library: PatternLibraryVersion { version: 2, ..Default::default() },
            examples_consumed: 0,
            created: Vec::new(),
            revised: Vec::new(),
            retired: Vec::new(),
            replayed: 0,
            reproduced: 0,
            regressed: 0,
        };
        let output = formatter.format_outcome(&outcome, false).unwrap();
        assert_eq!(output, "ℹ Nothing new to mine (library v2)");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
    }
}
