//! Job postings: employer-side management and the employee-side listing.

pub mod domain;
pub mod overview;
mod service;

pub use domain::{Job, JobDraft, JobId, JobListing};
pub use overview::EmployerOverview;
