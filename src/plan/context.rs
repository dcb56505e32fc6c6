//! Screen contexts: which screen/action produced a submission.

use crate::error::CompositionError;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    CustomerCreate,
    CustomerEdit,
    CustomerYearInfoAdd,
    ProgramCreate,
    ProgramEdit,
    ProposalCreate,
    ProposalEdit,
    ProposalConvert,
    ProjectCreate,
    ProjectEdit,
    ProjectRevenueAdd,
    SalesCreate,
    SalesEdit,
}

impl ContextKind {
    pub const ALL: [ContextKind; 13] = [
        ContextKind::CustomerCreate,
        ContextKind::CustomerEdit,
        ContextKind::CustomerYearInfoAdd,
        ContextKind::ProgramCreate,
        ContextKind::ProgramEdit,
        ContextKind::ProposalCreate,
        ContextKind::ProposalEdit,
        ContextKind::ProposalConvert,
        ContextKind::ProjectCreate,
        ContextKind::ProjectEdit,
        ContextKind::ProjectRevenueAdd,
        ContextKind::SalesCreate,
        ContextKind::SalesEdit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::CustomerCreate => "customer.create",
            ContextKind::CustomerEdit => "customer.edit",
            ContextKind::CustomerYearInfoAdd => "customer.year-info.add",
            ContextKind::ProgramCreate => "program.create",
            ContextKind::ProgramEdit => "program.edit",
            ContextKind::ProposalCreate => "proposal.create",
            ContextKind::ProposalEdit => "proposal.edit",
            ContextKind::ProposalConvert => "proposal.convert",
            ContextKind::ProjectCreate => "project.create",
            ContextKind::ProjectEdit => "project.edit",
            ContextKind::ProjectRevenueAdd => "project.revenue.add",
            ContextKind::SalesCreate => "sales.create",
            ContextKind::SalesEdit => "sales.edit",
        }
    }

    /// Contexts that operate on (or under) an existing record.
    pub fn requires_target(self) -> bool {
        matches!(
            self,
            ContextKind::CustomerEdit
                | ContextKind::CustomerYearInfoAdd
                | ContextKind::ProgramEdit
                | ContextKind::ProposalEdit
                | ContextKind::ProposalConvert
                | ContextKind::ProjectEdit
                | ContextKind::ProjectRevenueAdd
                | ContextKind::SalesEdit
        )
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKind {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ContextKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| CompositionError::UnknownContext(wanted.to_string()))
    }
}

/// The screen context passed explicitly into the composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenContext {
    pub kind: ContextKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
}

impl ScreenContext {
    pub fn new(kind: ContextKind) -> Self {
        Self { kind, target: None }
    }

    pub fn with_target(mut self, target: impl Into<EntityId>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Parse a context name such as `sales.create`.
    pub fn parse(name: &str, target: Option<EntityId>) -> Result<Self, CompositionError> {
        Ok(Self {
            kind: name.parse()?,
            target,
        })
    }

    /// Target identifier, required for edit-style contexts.
    pub fn require_target(&self) -> Result<&EntityId, CompositionError> {
        self.target
            .as_ref()
            .ok_or_else(|| CompositionError::MissingTarget(self.kind.to_string()))
    }
}
