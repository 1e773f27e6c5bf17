//! Batch spreadsheet import and silent dataset accumulation.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

use crate::features::StudentFeatures;

/// One row of a batch import spreadsheet. Column names follow the official
/// template file handed to departments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRow {
    #[serde(rename = "Student_Name")]
    pub student_name: String,
    #[serde(rename = "Student_ID")]
    pub student_id: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Study_Hours_Per_Week")]
    pub study_hours_per_week: f64,
    #[serde(rename = "Attendance_Rate")]
    pub attendance_rate: f64,
    #[serde(rename = "Previous_Average", default)]
    pub previous_average: Option<f64>,
    #[serde(rename = "Failures_History")]
    pub failures_history: u32,
    #[serde(rename = "Participation_Score")]
    pub participation_score: f64,
    #[serde(rename = "English_Score", default)]
    pub english_score: Option<f64>,
    #[serde(rename = "Marital_Status", default)]
    pub marital_status: Option<u8>,
}

impl StudentRow {
    pub fn features(&self) -> StudentFeatures {
        StudentFeatures {
            study_hours_per_week: self.study_hours_per_week,
            attendance_rate: self.attendance_rate,
            previous_average: self.previous_average,
            failures_history: self.failures_history,
            participation_score: self.participation_score,
            english_score: self.english_score,
            marital_status: self.marital_status,
        }
    }
}

pub fn read_students_csv<R: Read>(reader: R) -> Result<Vec<StudentRow>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

#[derive(Serialize)]
struct DatasetRow {
    #[serde(rename = "Study_Hours_Per_Week")]
    study_hours_per_week: f64,
    #[serde(rename = "Attendance_Rate")]
    attendance_rate: f64,
    #[serde(rename = "Previous_Average")]
    previous_average: Option<f64>,
    #[serde(rename = "Failures_History")]
    failures_history: u32,
    #[serde(rename = "Participation_Score")]
    participation_score: f64,
    #[serde(rename = "English_Score")]
    english_score: Option<f64>,
    #[serde(rename = "Marital_Status")]
    marital_status: Option<u8>,
    #[serde(rename = "Prediction")]
    prediction: f64,
}

/// Appends one analyzed record to the accumulated dataset file. The header
/// row is written only when the file does not exist yet.
pub fn append_to_dataset(
    path: &Path,
    features: &StudentFeatures,
    prediction: f64,
) -> Result<(), Box<dyn Error>> {
    let write_header = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    wtr.serialize(DatasetRow {
        study_hours_per_week: features.study_hours_per_week,
        attendance_rate: features.attendance_rate,
        previous_average: features.previous_average,
        failures_history: features.failures_history,
        participation_score: features.participation_score,
        english_score: features.english_score,
        marital_status: features.marital_status,
        prediction,
    })?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Student_Name,Student_ID,Department,Study_Hours_Per_Week,Attendance_Rate,Previous_Average,Failures_History,Participation_Score,English_Score
أحمد علي,20231001,هندسة الحاسوب,10,80,70,0,5,50
Sara Hassan,20231002,AI,12.5,92,81,1,7,
";

    #[test]
    fn parses_template_columns_including_optional_ones() {
        let rows = read_students_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].student_name, "أحمد علي");
        assert_eq!(rows[0].study_hours_per_week, 10.0);
        assert_eq!(rows[0].english_score, Some(50.0));
        assert_eq!(rows[0].marital_status, None);

        assert_eq!(rows[1].english_score, None);
        assert_eq!(rows[1].failures_history, 1);
    }

    #[test]
    fn row_converts_into_a_feature_record() {
        let rows = read_students_csv(SAMPLE_CSV.as_bytes()).unwrap();
        let features = rows[0].features();
        assert_eq!(features.attendance_rate, 80.0);
        assert_eq!(features.previous_average, Some(70.0));
    }

    #[test]
    fn dataset_header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collected.csv");
        let features = read_students_csv(SAMPLE_CSV.as_bytes()).unwrap()[0].features();

        append_to_dataset(&path, &features, 72.6).unwrap();
        append_to_dataset(&path, &features, 71.1).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Study_Hours_Per_Week,"));
        assert!(lines[1].ends_with("72.6"));
        assert!(lines[2].ends_with("71.1"));
    }
}
