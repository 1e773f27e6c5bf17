//! Behavioral tests for the what-if simulation engine, driven by a
//! scripted oracle that records every feature vector it is asked about.

use std::cell::RefCell;

use student_pathway::features::{Field, MissingField, StudentFeatures};
use student_pathway::model::{Oracle, OracleError};
use student_pathway::simulation::{ScenarioCatalog, ScenarioKind, SimulationError};

struct ScriptedOracle<F>
where
    F: Fn(&StudentFeatures) -> Result<f64, OracleError>,
{
    script: F,
    calls: RefCell<Vec<StudentFeatures>>,
}

impl<F> ScriptedOracle<F>
where
    F: Fn(&StudentFeatures) -> Result<f64, OracleError>,
{
    fn new(script: F) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl<F> Oracle for ScriptedOracle<F>
where
    F: Fn(&StudentFeatures) -> Result<f64, OracleError>,
{
    fn predict(&self, features: &StudentFeatures) -> Result<f64, OracleError> {
        self.calls.borrow_mut().push(features.clone());
        (self.script)(features)
    }
}

fn baseline() -> StudentFeatures {
    StudentFeatures {
        study_hours_per_week: 10.0,
        attendance_rate: 80.0,
        previous_average: Some(70.0),
        failures_history: 0,
        participation_score: 5.0,
        english_score: Some(50.0),
        marital_status: None,
    }
}

const BASELINE_SCORE: f64 = 45.0;

/// Oracle stipulation: +5 study hours -> 46.2, attendance at 98 -> 44.0,
/// participation at 10 -> 47.5, english +20 -> 60.1, anything else -> 45.0.
fn stipulated() -> ScriptedOracle<impl Fn(&StudentFeatures) -> Result<f64, OracleError>> {
    ScriptedOracle::new(|f: &StudentFeatures| {
        Ok(if f.study_hours_per_week == 15.0 {
            46.2
        } else if f.attendance_rate == 98.0 {
            44.0
        } else if f.participation_score == 10.0 {
            47.5
        } else if f.english_score == Some(70.0) {
            60.1
        } else {
            BASELINE_SCORE
        })
    })
}

fn fields_changed(a: &StudentFeatures, b: &StudentFeatures) -> usize {
    let mut n = 0;
    if a.study_hours_per_week != b.study_hours_per_week {
        n += 1;
    }
    if a.attendance_rate != b.attendance_rate {
        n += 1;
    }
    if a.previous_average != b.previous_average {
        n += 1;
    }
    if a.failures_history != b.failures_history {
        n += 1;
    }
    if a.participation_score != b.participation_score {
        n += 1;
    }
    if a.english_score != b.english_score {
        n += 1;
    }
    if a.marital_status != b.marital_status {
        n += 1;
    }
    n
}

#[test]
fn accepted_scenarios_keep_catalog_order() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();

    let outcomes = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();

    let kinds: Vec<ScenarioKind> = outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ScenarioKind::IncreaseStudyLoad,
            ScenarioKind::MaximizeParticipation,
            ScenarioKind::ImproveEnglish,
        ]
    );
    assert_eq!(outcomes[0].predicted, 46.2);
    assert_eq!(outcomes[1].predicted, 47.5);
    assert_eq!(outcomes[2].predicted, 60.1);
    assert!(outcomes[0].narrative.contains("46.2"));
    assert!(outcomes[1].narrative.contains("47.5"));
    assert!(outcomes[2].narrative.contains("60.1"));
}

#[test]
fn no_accepted_scenario_ties_or_loses_to_baseline() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();

    let outcomes = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();

    assert!(outcomes.iter().all(|o| o.predicted > BASELINE_SCORE));
    // The attendance scenario predicted 44.0 and must be absent.
    assert!(outcomes
        .iter()
        .all(|o| o.kind != ScenarioKind::MaximizeAttendance));
}

#[test]
fn high_attendance_skips_the_rule_without_an_oracle_call() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();
    let mut record = baseline();
    record.attendance_rate = 97.0;

    catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();

    // study + participation + english, never attendance
    assert_eq!(oracle.call_count(), 3);
    assert!(oracle
        .calls
        .borrow()
        .iter()
        .all(|f| f.attendance_rate == 97.0));
}

#[test]
fn high_english_score_skips_the_rule_without_an_oracle_call() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();
    let mut record = baseline();
    record.english_score = Some(75.0);

    catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();

    assert_eq!(oracle.call_count(), 3);
    assert!(oracle
        .calls
        .borrow()
        .iter()
        .all(|f| f.english_score == Some(75.0)));
}

#[test]
fn a_tie_with_the_baseline_is_excluded() {
    let catalog = ScenarioCatalog::standard();
    // Study mutation lands exactly on the baseline score.
    let oracle = ScriptedOracle::new(|f: &StudentFeatures| {
        Ok(if f.study_hours_per_week == 15.0 {
            BASELINE_SCORE
        } else {
            40.0
        })
    });

    let outcomes = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn no_improvement_yields_an_empty_sequence() {
    let catalog = ScenarioCatalog::standard();
    let oracle = ScriptedOracle::new(|_: &StudentFeatures| Ok(40.0));

    let outcomes = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn the_baseline_is_never_mutated() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();
    let record = baseline();
    let snapshot = record.clone();

    catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();

    assert_eq!(record, snapshot);
}

#[test]
fn every_mutation_applies_to_a_fresh_copy_of_the_baseline() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();
    let record = baseline();

    catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();

    for call in oracle.calls.borrow().iter() {
        assert_eq!(fields_changed(call, &record), 1);
    }
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();

    let first = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();
    let second = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();

    assert_eq!(first, second);
}

#[test]
fn batch_rows_are_independent_and_call_counts_add_up() {
    let catalog = ScenarioCatalog::standard();
    let oracle = ScriptedOracle::new(|_: &StudentFeatures| Ok(50.0));

    let mut expected_calls = 0;
    for i in 0..100 {
        let mut record = baseline();
        record.attendance_rate = if i % 2 == 0 { 80.0 } else { 97.0 };
        record.participation_score = if i % 3 == 0 { 9.5 } else { 5.0 };
        record.english_score = Some(if i % 5 == 0 { 75.0 } else { 50.0 });

        expected_calls += 1; // study load is unconditional
        if record.attendance_rate < 95.0 {
            expected_calls += 1;
        }
        if record.participation_score < 9.0 {
            expected_calls += 1;
        }
        if record.english_score.unwrap() < 60.0 {
            expected_calls += 1;
        }

        catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();
    }

    assert_eq!(oracle.call_count(), expected_calls);
}

#[test]
fn a_missing_english_score_aborts_the_call() {
    let catalog = ScenarioCatalog::standard();
    let oracle = stipulated();
    let mut record = baseline();
    record.english_score = None;

    let err = catalog
        .simulate(&record, BASELINE_SCORE, &oracle)
        .unwrap_err();
    match err {
        SimulationError::MissingField(MissingField(field)) => {
            assert_eq!(field, Field::EnglishScore)
        }
        other => panic!("expected a missing-field error, got {other:?}"),
    }
}

#[test]
fn the_base_catalog_accepts_records_without_an_english_score() {
    let catalog = ScenarioCatalog::base();
    let oracle = stipulated();
    let mut record = baseline();
    record.english_score = None;

    let outcomes = catalog.simulate(&record, BASELINE_SCORE, &oracle).unwrap();
    assert!(outcomes
        .iter()
        .all(|o| o.kind != ScenarioKind::ImproveEnglish));
}

#[test]
fn an_oracle_failure_propagates() {
    let catalog = ScenarioCatalog::standard();
    let oracle = ScriptedOracle::new(|f: &StudentFeatures| {
        if f.participation_score == 10.0 {
            Err(OracleError("model backend unavailable".to_string()))
        } else {
            Ok(50.0)
        }
    });

    let err = catalog
        .simulate(&baseline(), BASELINE_SCORE, &oracle)
        .unwrap_err();
    assert!(matches!(err, SimulationError::Oracle(_)));
}

#[test]
fn a_non_finite_score_drops_only_that_scenario() {
    let catalog = ScenarioCatalog::standard();
    let oracle = ScriptedOracle::new(|f: &StudentFeatures| {
        Ok(if f.study_hours_per_week == 15.0 {
            f64::NAN
        } else {
            50.0
        })
    });

    let outcomes = catalog.simulate(&baseline(), BASELINE_SCORE, &oracle).unwrap();

    let kinds: Vec<ScenarioKind> = outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ScenarioKind::MaximizeAttendance,
            ScenarioKind::MaximizeParticipation,
            ScenarioKind::ImproveEnglish,
        ]
    );
}
