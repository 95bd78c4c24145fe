pub mod error;
pub mod config;
pub mod schema;
pub mod llm;
pub mod agent;
pub mod sql;
pub mod pipeline;
pub mod web;
pub mod tracing;

pub use error::{Result, SqlGenError};
pub use pipeline::{Pipeline, PipelineReport, Upload};
