//! Metrics collection for mining runs

/// Counters accumulated across mining passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinerMetrics {
    /// Mining passes started, including ones with nothing to mine
    pub runs: usize,

    /// Versions published to the live library
    pub versions_published: usize,

    /// Training examples folded into rules
    pub examples_consumed: usize,

    /// Rules created
    pub rules_created: usize,

    /// Existing rules revised
    pub rules_revised: usize,

    /// Rules retired under the success floor
    pub rules_retired: usize,
}

impl MinerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mining pass
    pub fn record_run(&mut self) {
        self.runs += 1;
    }

    /// Record a published version
    pub fn record_published(&mut self) {
        self.versions_published += 1;
    }

    /// Record consumed examples
    pub fn record_examples(&mut self, count: usize) {
        self.examples_consumed += count;
    }

    /// Record created rules
    pub fn record_created(&mut self, count: usize) {
        self.rules_created += count;
    }

    /// Record revised rules
    pub fn record_revised(&mut self, count: usize) {
        self.rules_revised += count;
    }

    /// Record retired rules
    pub fn record_retired(&mut self, count: usize) {
        self.rules_retired += count;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Miner Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Mining runs: {}", self.runs),
            format!("Versions published: {}", self.versions_published),
            format!("Examples consumed: {}", self.examples_consumed),
            String::new(),
            "Rules:".to_string(),
            format!("  Created: {}", self.rules_created),
            format!("  Revised: {}", self.rules_revised),
            format!("  Retired: {}", self.rules_retired),
        ]
        .join("\n")
    }
}
