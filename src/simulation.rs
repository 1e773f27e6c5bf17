//! What-if simulation engine.
//!
//! Given a baseline student record and its predicted score, the engine
//! walks a fixed, ordered catalog of counterfactual rules. Each rule gates
//! on the unmodified baseline, perturbs exactly one field on a fresh clone,
//! asks the oracle for a new prediction and keeps the scenario only when
//! the new score strictly beats the baseline. Results come back in catalog
//! order, each carrying the rule identifier, the raw predicted value and a
//! rendered narrative with the value formatted to one decimal place.

use serde::Serialize;
use thiserror::Error;

use crate::features::{Field, MissingField, StudentFeatures};
use crate::model::{Oracle, OracleError};

pub const STUDY_HOURS_DELTA: f64 = 5.0;
pub const ATTENDANCE_GATE: f64 = 95.0;
pub const ATTENDANCE_TARGET: f64 = 98.0;
pub const PARTICIPATION_GATE: f64 = 9.0;
pub const PARTICIPATION_TARGET: f64 = 10.0;
pub const ENGLISH_GATE: f64 = 60.0;
pub const ENGLISH_DELTA: f64 = 20.0;

/// Identifies one counterfactual rule in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    IncreaseStudyLoad,
    MaximizeAttendance,
    MaximizeParticipation,
    ImproveEnglish,
}

/// Gate evaluated against the unmodified baseline: the rule runs only
/// while `field` is still below `below`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precondition {
    pub field: Field,
    pub below: f64,
}

/// The single-field perturbation a rule applies to a clone of the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    Increase(Field, f64),
    Assign(Field, f64),
}

/// One counterfactual as configuration data: gate, perturbation and the
/// narrative template it renders when accepted.
#[derive(Debug, Clone)]
pub struct ScenarioRule {
    pub kind: ScenarioKind,
    pub precondition: Option<Precondition>,
    pub mutation: Mutation,
    /// Arabic narrative; `{score}` is replaced with the predicted value
    /// formatted to one decimal place. Plain text only, markup belongs to
    /// the presentation layer.
    pub template: &'static str,
}

impl ScenarioRule {
    fn render(&self, predicted: f64) -> String {
        self.template
            .replace("{score}", &format!("{:.1}", predicted))
    }
}

/// An accepted scenario: the rule improved on the baseline prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub kind: ScenarioKind,
    pub predicted: f64,
    pub narrative: String,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    MissingField(#[from] MissingField),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

const STUDY_TEMPLATE: &str = "تشير البيانات إلى أن تكثيف الساعات الدراسية بمعدل (5) ساعات أسبوعياً قد يرفع المعدل المتوقع إلى {score}%";
const ATTENDANCE_TEMPLATE: &str =
    "الالتزام التام بحضور المحاضرات النظرية والعملية من شأنه تحسين النتيجة لتصل إلى {score}%";
const PARTICIPATION_TEMPLATE: &str =
    "تحسين مستوى التفاعل والمشاركة الصفية إلى الحد الأقصى قد يساهم في وصول النتيجة إلى {score}%";
const ENGLISH_TEMPLATE: &str =
    "رفع مستوى الكفاءة في اللغة الإنجليزية من شأنه تحسين المعدل المتوقع ليصل إلى {score}%";

/// Fixed, ordered set of counterfactual rules. The order is part of the
/// observable contract: accepted scenarios come back in exactly this order.
pub struct ScenarioCatalog {
    rules: Vec<ScenarioRule>,
}

impl ScenarioCatalog {
    pub fn new(rules: Vec<ScenarioRule>) -> Self {
        Self { rules }
    }

    /// Catalog for deployments that do not collect an English score.
    pub fn base() -> Self {
        Self::new(vec![
            ScenarioRule {
                kind: ScenarioKind::IncreaseStudyLoad,
                precondition: None,
                mutation: Mutation::Increase(Field::StudyHoursPerWeek, STUDY_HOURS_DELTA),
                template: STUDY_TEMPLATE,
            },
            ScenarioRule {
                kind: ScenarioKind::MaximizeAttendance,
                precondition: Some(Precondition {
                    field: Field::AttendanceRate,
                    below: ATTENDANCE_GATE,
                }),
                mutation: Mutation::Assign(Field::AttendanceRate, ATTENDANCE_TARGET),
                template: ATTENDANCE_TEMPLATE,
            },
            ScenarioRule {
                kind: ScenarioKind::MaximizeParticipation,
                precondition: Some(Precondition {
                    field: Field::ParticipationScore,
                    below: PARTICIPATION_GATE,
                }),
                mutation: Mutation::Assign(Field::ParticipationScore, PARTICIPATION_TARGET),
                template: PARTICIPATION_TEMPLATE,
            },
        ])
    }

    /// Full catalog including the English-proficiency rule.
    pub fn standard() -> Self {
        let mut catalog = Self::base();
        catalog.rules.push(ScenarioRule {
            kind: ScenarioKind::ImproveEnglish,
            precondition: Some(Precondition {
                field: Field::EnglishScore,
                below: ENGLISH_GATE,
            }),
            mutation: Mutation::Increase(Field::EnglishScore, ENGLISH_DELTA),
            template: ENGLISH_TEMPLATE,
        });
        catalog
    }

    pub fn for_deployment(english_track: bool) -> Self {
        if english_track {
            Self::standard()
        } else {
            Self::base()
        }
    }

    pub fn rules(&self) -> &[ScenarioRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule against `baseline` and returns the improving
    /// scenarios in catalog order.
    ///
    /// `baseline_prediction` must be the oracle's score for `baseline`;
    /// the engine trusts it and never re-predicts the baseline, so a rule
    /// whose gate fails costs zero oracle calls and every other rule costs
    /// exactly one. A missing field or an oracle failure aborts the whole
    /// call; a non-finite oracle score only drops that one scenario.
    pub fn simulate(
        &self,
        baseline: &StudentFeatures,
        baseline_prediction: f64,
        oracle: &dyn Oracle,
    ) -> Result<Vec<ScenarioOutcome>, SimulationError> {
        let mut outcomes = Vec::new();

        for rule in &self.rules {
            if let Some(gate) = rule.precondition {
                let current = baseline.get(gate.field).ok_or(MissingField(gate.field))?;
                if current >= gate.below {
                    continue;
                }
            }

            // Each rule perturbs its own clone of the original baseline;
            // scenarios never compound.
            let mut candidate = baseline.clone();
            match rule.mutation {
                Mutation::Increase(field, delta) => {
                    let current = candidate.get(field).ok_or(MissingField(field))?;
                    candidate.set(field, current + delta)?;
                }
                Mutation::Assign(field, value) => {
                    candidate.set(field, value)?;
                }
            }

            let predicted = oracle.predict(&candidate)?;
            if !predicted.is_finite() {
                log::warn!(
                    "oracle returned a non-finite score for {:?}; scenario dropped",
                    rule.kind
                );
                continue;
            }

            if predicted > baseline_prediction {
                outcomes.push(ScenarioOutcome {
                    kind: rule.kind,
                    predicted,
                    narrative: rule.render(predicted),
                });
            }
        }

        Ok(outcomes)
    }
}
