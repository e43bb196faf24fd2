//! Picks the generation path for a request and runs it.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::interpreter;
use crate::schema::{self, CustomSchema};
use crate::templates::TemplateLibrary;
use crate::types::{GenerationPlan, PatternSummary, Record};

/// The ways a dataset can be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    LearnedPatterns,
    CustomSchema,
    Template,
}

impl GenerationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStrategy::LearnedPatterns => "learned_patterns",
            GenerationStrategy::CustomSchema => "custom_schema",
            GenerationStrategy::Template => "template",
        }
    }
}

impl fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategies in the order they are tried; the first applicable one runs
pub const PRECEDENCE: &[GenerationStrategy] = &[
    GenerationStrategy::LearnedPatterns,
    GenerationStrategy::CustomSchema,
    GenerationStrategy::Template,
];

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDataset {
    pub plan: GenerationPlan,
    pub strategy: GenerationStrategy,
    pub records: Vec<Record>,
}

impl GeneratedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    templates: TemplateLibrary,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_time(reference_time: DateTime<Utc>) -> Self {
        Self {
            templates: TemplateLibrary::with_reference_time(reference_time),
        }
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.templates.reference_time()
    }

    /// Generates the dataset for `raw_text`.
    ///
    /// The record count always comes from the text, whichever path runs.
    /// An errored summary is skipped rather than failing the call.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        raw_text: &str,
        custom_schema: Option<&CustomSchema>,
        pattern_summary: Option<&PatternSummary>,
        rng: &mut R,
    ) -> Result<GeneratedDataset> {
        let plan = interpreter::interpret(raw_text);
        info!(
            "Generating {} records (category {}, schema: {}, patterns: {})",
            plan.record_count,
            plan.category,
            custom_schema.is_some(),
            pattern_summary.is_some()
        );

        let strategy = select_strategy(custom_schema, pattern_summary);
        let now = self.reference_time();
        let count = plan.record_count;

        let records = match (strategy, pattern_summary, custom_schema) {
            (GenerationStrategy::LearnedPatterns, Some(summary), _) => {
                schema::generate_from_patterns(rng, now, summary, count)?
            }
            (GenerationStrategy::CustomSchema, _, Some(custom)) => {
                schema::generate_from_schema(rng, now, custom.fields(), count)
            }
            _ => self.templates.generate(plan.category, rng, count),
        };

        debug!("Strategy {} produced {} records", strategy, records.len());
        Ok(GeneratedDataset {
            plan,
            strategy,
            records,
        })
    }
}

/// First strategy in [`PRECEDENCE`] whose inputs are present and usable
pub fn select_strategy(
    custom_schema: Option<&CustomSchema>,
    pattern_summary: Option<&PatternSummary>,
) -> GenerationStrategy {
    PRECEDENCE
        .iter()
        .copied()
        .find(|strategy| match strategy {
            GenerationStrategy::LearnedPatterns => match pattern_summary {
                Some(summary) if !summary.is_ok() => {
                    warn!(
                        "Skipping learned patterns: {}",
                        summary.error.as_deref().unwrap_or("unknown error")
                    );
                    false
                }
                other => other.is_some(),
            },
            GenerationStrategy::CustomSchema => custom_schema.is_some(),
            GenerationStrategy::Template => true,
        })
        .unwrap_or(GenerationStrategy::Template)
}
