//! Client core for the job board: session handling, job browsing and posting, and the
//! application status workflow with its cached read-models.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
