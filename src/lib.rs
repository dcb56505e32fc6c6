//! Salesdesk: envelope normalization and staged dependent writes
//!
//! Reads records from a business-management content API, flattens its nested
//! `{data: {id, attributes}}` envelopes into plain records, and turns form
//! submissions into ordered plans of dependent writes executed step by step.

pub mod cli;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod types;
