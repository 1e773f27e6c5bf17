use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One student's attributes at a single point in time.
///
/// A record is built fresh per analysis request (manual entry or one row of
/// a batch import) and is never modified afterwards; every what-if scenario
/// works on its own clone. `previous_average`, `english_score` and
/// `marital_status` only exist in deployments that collect them, so they
/// stay optional. `marital_status` is informational and feeds the model
/// only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeatures {
    pub study_hours_per_week: f64,
    pub attendance_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_average: Option<f64>,
    pub failures_history: u32,
    pub participation_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<u8>,
}

/// Names the numeric fields a scenario rule may read or perturb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StudyHoursPerWeek,
    AttendanceRate,
    PreviousAverage,
    FailuresHistory,
    ParticipationScore,
    EnglishScore,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::StudyHoursPerWeek => "study_hours_per_week",
            Field::AttendanceRate => "attendance_rate",
            Field::PreviousAverage => "previous_average",
            Field::FailuresHistory => "failures_history",
            Field::ParticipationScore => "participation_score",
            Field::EnglishScore => "english_score",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rule referenced a field this record does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("feature `{0}` is not present in this record")]
pub struct MissingField(pub Field);

impl StudentFeatures {
    /// Reads a field as a plain number; `None` when the optional field was
    /// not collected for this record.
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::StudyHoursPerWeek => Some(self.study_hours_per_week),
            Field::AttendanceRate => Some(self.attendance_rate),
            Field::PreviousAverage => self.previous_average,
            Field::FailuresHistory => Some(self.failures_history as f64),
            Field::ParticipationScore => Some(self.participation_score),
            Field::EnglishScore => self.english_score,
        }
    }

    /// Overwrites a field. Fails when the record never carried the field,
    /// since a perturbation of an absent value has no meaning.
    pub fn set(&mut self, field: Field, value: f64) -> Result<(), MissingField> {
        match field {
            Field::StudyHoursPerWeek => self.study_hours_per_week = value,
            Field::AttendanceRate => self.attendance_rate = value,
            Field::PreviousAverage => match self.previous_average {
                Some(_) => self.previous_average = Some(value),
                None => return Err(MissingField(field)),
            },
            Field::FailuresHistory => self.failures_history = value.max(0.0).round() as u32,
            Field::ParticipationScore => self.participation_score = value,
            Field::EnglishScore => match self.english_score {
                Some(_) => self.english_score = Some(value),
                None => return Err(MissingField(field)),
            },
        }
        Ok(())
    }
}
