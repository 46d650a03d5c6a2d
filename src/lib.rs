//! Client-side sync and grading engine for a microservice e-learning
//! platform: reconstructs enrollments from local state and activity
//! signals, tracks per-course completion, and grades quiz attempts, with
//! every data-bearing operation delegated to the remote services.

pub mod config;
pub mod enrollment;
pub mod error;
pub mod export;
pub mod grading;
pub mod models;
pub mod progress;
pub mod services;
pub mod stats;
pub mod store;
pub mod utils;
