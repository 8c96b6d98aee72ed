//! # Folio Shared
//!
//! Wire types of the admin API, shared by the server and its clients.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
