//! Academic pathway predictor.
//!
//! Predicts a student's expected academic outcome with a pre-trained
//! regression model, explores what-if improvement scenarios against a
//! fixed catalog of counterfactual rules and issues printable bilingual
//! reports. Supports single-student entry and batch CSV import, and
//! silently accumulates analyzed records into a dataset file.

pub mod config;
pub mod data;
pub mod database;
pub mod features;
pub mod model;
pub mod report;
pub mod simulation;
