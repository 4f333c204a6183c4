//! Clients for the external systems the intelligence operations talk to.
//!
//! Each client is constructed per call; none of them hold state beyond the
//! configured endpoint and credentials.

pub mod calendar;
pub mod llm;
pub mod transcripts;
