//! Envelope normalization
//!
//! The content API wraps every entity as `{id, attributes}` and every relation as
//! `{data: null | node | [node]}`. This module parses that shape into a tagged
//! [`Envelope`] tree and collapses it into flat records for screens and plans.

pub mod model;
pub mod normalize;

pub use model::{Envelope, EnvelopeNode, FlatRecord};
pub use normalize::{normalize, normalize_json, AUX_RELATION, PROMOTE_AFTER_RELATIONS};
