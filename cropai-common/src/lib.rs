//! # CropAI Common Library
//!
//! Shared code for the CropAI workspace including:
//! - Domain models exchanged with the prediction and persistence services
//! - Event types (CropEvent enum) and the EventBus
//! - Configuration loading
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;

pub use error::{Error, Result};
pub use models::{AnalysisRecord, DiseaseInfo, Prediction, Solution, TreatmentLog};
