//! # Folio Core
//!
//! The domain layer of the Folio content backend: the content lifecycle state
//! machine, the trash subsystem and the scheduled-publication jobs.
//! This crate is written purely against ports and carries no infrastructure
//! dependencies; storage, clocks and the job runner live in `folio-infra`.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{JobError, LifecycleError, RepoError};
