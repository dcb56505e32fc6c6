//! Submission plan composer: raw form payload → ordered write steps.
//!
//! Pure. Each screen context maps to one branch that decides which collections
//! are written, in which order, and which generated identifiers flow between them.

use crate::error::CompositionError;
use crate::plan::context::{ContextKind, ScreenContext};
use crate::plan::fields::{drop_empty, select_fields, transform_fields, EditMask, FieldRules};
use crate::plan::lookup::LookupTables;
use crate::plan::profit::{apply_sales_policy, SalesPolicy};
use crate::plan::step::{ChildWrite, IdSource, NestedWrite, SubmissionPlan, WriteStep};
use crate::types::{EntityId, Payload};
use serde_json::Value;
use tracing::debug;

pub const CUSTOMERS: &str = "customers";
pub const CUSTOMER_YEAR_INFOS: &str = "customer-year-infos";
pub const PROGRAMS: &str = "programs";
pub const PROGRAM_SESSIONS: &str = "program-sessions";
pub const SESSION_ATTENDEES: &str = "session-attendees";
pub const PROPOSALS: &str = "proposals";
pub const PROJECTS: &str = "projects";
pub const PROJECT_CONTRACTS: &str = "project-contracts";
pub const PROJECT_REVENUES: &str = "project-revenues";
pub const PROJECT_REVENUE_HISTORIES: &str = "project-revenue-histories";
pub const SALES_RECORDS: &str = "sales-records";
pub const SALES_PAYMENTS: &str = "sales-payments";

pub const DEFAULT_CONFIRMED_PROBABILITY: &str = "100";
const CONVERTED_STATUS: &str = "converted";

/// Builds submission plans for every known screen context.
#[derive(Debug, Clone)]
pub struct PlanComposer {
    rules: FieldRules,
    confirmed_code: String,
}

impl Default for PlanComposer {
    fn default() -> Self {
        Self::new(FieldRules::default(), DEFAULT_CONFIRMED_PROBABILITY)
    }
}

/// Inputs shared by every branch.
struct Draft<'a> {
    context: &'a ScreenContext,
    /// Full form after empty values are dropped.
    source: Payload,
    /// Fields selected by the edit mask.
    selected: Payload,
    mask: Option<&'a EditMask>,
    lookups: &'a LookupTables,
}

impl PlanComposer {
    pub fn new(rules: FieldRules, confirmed_code: impl Into<String>) -> Self {
        Self {
            rules,
            confirmed_code: confirmed_code.into(),
        }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Compose the plan for one submission. Never performs I/O.
    pub fn compose(
        &self,
        context: &ScreenContext,
        raw: &Payload,
        mask: Option<&EditMask>,
        lookups: &LookupTables,
    ) -> Result<SubmissionPlan, CompositionError> {
        if context.kind.requires_target() {
            context.require_target()?;
        }

        let source = drop_empty(raw.clone());
        let selected = select_fields(&source, mask);
        let mut draft = Draft {
            context,
            source,
            selected,
            mask,
            lookups,
        };

        let plan = match context.kind {
            ContextKind::CustomerCreate => self.customer_create(&mut draft)?,
            ContextKind::CustomerYearInfoAdd => self.customer_year_info_add(&mut draft)?,
            ContextKind::ProgramCreate => self.program_create(&mut draft)?,
            ContextKind::ProposalCreate => self.single_create(&mut draft, PROPOSALS)?,
            ContextKind::ProposalConvert => self.proposal_convert(&mut draft)?,
            ContextKind::ProjectCreate => self.project_create(&mut draft)?,
            ContextKind::ProjectRevenueAdd => self.project_revenue_add(&mut draft)?,
            ContextKind::SalesCreate => self.sales_create(&mut draft)?,
            ContextKind::CustomerEdit => self.single_update(&mut draft, CUSTOMERS)?,
            ContextKind::ProgramEdit => self.single_update(&mut draft, PROGRAMS)?,
            ContextKind::ProposalEdit => self.single_update(&mut draft, PROPOSALS)?,
            ContextKind::ProjectEdit => self.single_update(&mut draft, PROJECTS)?,
            ContextKind::SalesEdit => self.sales_edit(&mut draft)?,
        };

        debug!(
            context = %context.kind,
            steps = plan.len(),
            active_steps = plan.active_steps(),
            "composed submission plan"
        );
        Ok(plan)
    }

    fn transform(&self, payload: Payload, lookups: &LookupTables) -> Result<Payload, CompositionError> {
        transform_fields(drop_empty(payload), &self.rules, lookups)
    }

    fn single_create(&self, draft: &mut Draft<'_>, collection: &str) -> Result<SubmissionPlan, CompositionError> {
        let payload = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(collection, payload));
        Ok(plan)
    }

    fn single_update(&self, draft: &mut Draft<'_>, collection: &str) -> Result<SubmissionPlan, CompositionError> {
        let target = draft.context.require_target()?;
        let payload = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::update(member_path(collection, target), payload));
        Ok(plan)
    }

    fn customer_create(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let year_info = take_object(&mut draft.selected, "year_info")?;
        let customer = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        let year_info = self.transform(year_info, draft.lookups)?;

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(CUSTOMERS, customer));
        plan.push(
            WriteStep::create(CUSTOMER_YEAR_INFOS, year_info).with_relation("customer", IdSource::RootId),
        );
        Ok(plan)
    }

    fn customer_year_info_add(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let target = draft.context.require_target()?;
        let mut payload = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        if !payload.is_empty() {
            payload.insert("customer".to_string(), target.to_json());
        }
        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(CUSTOMER_YEAR_INFOS, payload));
        Ok(plan)
    }

    fn program_create(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let sessions = take_objects(&mut draft.selected, "sessions")?;
        let program = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;

        let mut children = Vec::with_capacity(sessions.len());
        for mut session in sessions {
            let attendees = take_objects(&mut session, "attendees")?;
            let mut child = ChildWrite::new(self.transform(session, draft.lookups)?);
            for attendee in attendees {
                let payload = self.transform(attendee, draft.lookups)?;
                if payload.is_empty() {
                    continue;
                }
                child.dependents.push(NestedWrite {
                    resource_path: SESSION_ATTENDEES.to_string(),
                    parent_field: "session".to_string(),
                    payload,
                });
            }
            if !child.payload.is_empty() {
                children.push(child);
            }
        }

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(PROGRAMS, program));
        plan.push(WriteStep::fanout(PROGRAM_SESSIONS, children).with_relation("program", IdSource::RootId));
        Ok(plan)
    }

    fn proposal_convert(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let target = draft.context.require_target()?.clone();
        let contract = take_object(&mut draft.selected, "contract")?;
        let mut project = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        if project.is_empty() {
            return Err(CompositionError::MissingField {
                context: draft.context.kind.to_string(),
                field: "name".to_string(),
            });
        }
        project.insert("proposal".to_string(), target.to_json());
        let contract = self.transform(contract, draft.lookups)?;

        let mut status = Payload::new();
        status.insert("status".to_string(), Value::String(CONVERTED_STATUS.to_string()));

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(PROJECTS, project));
        plan.push(WriteStep::create(PROJECT_CONTRACTS, contract).with_relation("project", IdSource::PreviousId));
        plan.push(
            WriteStep::update(member_path(PROPOSALS, &target), status).with_relation("project", IdSource::RootId),
        );
        Ok(plan)
    }

    fn project_create(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let revenues = take_objects(&mut draft.selected, "revenues")?;
        let project = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        let revenues = self.transform_children(revenues, draft.lookups)?;

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(PROJECTS, project));
        plan.push(
            revenue_step(revenues).with_relation("project", IdSource::RootId),
        );
        Ok(plan)
    }

    fn project_revenue_add(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let target = draft.context.require_target()?;
        let mut revenue = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        let children = if revenue.is_empty() {
            Vec::new()
        } else {
            revenue.insert("project".to_string(), target.to_json());
            vec![revenue]
        };

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(revenue_step(children));
        Ok(plan)
    }

    fn sales_create(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let payments = take_objects(&mut draft.selected, "payments")?;
        let mut record = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        apply_sales_policy(
            draft.context.kind.as_str(),
            &draft.source,
            draft.mask,
            &mut record,
            SalesPolicy {
                confirmed_code: &self.confirmed_code,
                require_profit: true,
            },
        )?;
        let payments = self
            .transform_children(payments, draft.lookups)?
            .into_iter()
            .map(ChildWrite::new)
            .collect();

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::create(SALES_RECORDS, record));
        plan.push(WriteStep::fanout(SALES_PAYMENTS, payments).with_relation("sales_record", IdSource::RootId));
        Ok(plan)
    }

    fn sales_edit(&self, draft: &mut Draft<'_>) -> Result<SubmissionPlan, CompositionError> {
        let target = draft.context.require_target()?;
        let mut record = self.transform(std::mem::take(&mut draft.selected), draft.lookups)?;
        apply_sales_policy(
            draft.context.kind.as_str(),
            &draft.source,
            draft.mask,
            &mut record,
            SalesPolicy {
                confirmed_code: &self.confirmed_code,
                require_profit: false,
            },
        )?;

        let mut plan = SubmissionPlan::new(draft.context.kind.as_str());
        plan.push(WriteStep::update(member_path(SALES_RECORDS, target), record));
        Ok(plan)
    }

    fn transform_children(
        &self,
        children: Vec<Payload>,
        lookups: &LookupTables,
    ) -> Result<Vec<Payload>, CompositionError> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let child = self.transform(child, lookups)?;
            if !child.is_empty() {
                out.push(child);
            }
        }
        Ok(out)
    }
}

fn revenue_step(children: Vec<Payload>) -> WriteStep {
    WriteStep::dual_path(
        PROJECT_REVENUES,
        PROJECT_REVENUE_HISTORIES,
        Some("project_revenue".to_string()),
        children,
    )
}

fn member_path(collection: &str, id: &EntityId) -> String {
    format!("{}/{}", collection, id)
}

/// Remove a nested object field, treating absence as empty.
fn take_object(payload: &mut Payload, field: &str) -> Result<Payload, CompositionError> {
    match payload.remove(field) {
        None => Ok(Payload::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(CompositionError::InvalidField {
            field: field.to_string(),
            reason: "expected an object".to_string(),
        }),
    }
}

/// Remove a list-of-objects field, treating absence as empty.
fn take_objects(payload: &mut Payload, field: &str) -> Result<Vec<Payload>, CompositionError> {
    match payload.remove(field) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(CompositionError::InvalidField {
                    field: field.to_string(),
                    reason: "expected a list of objects".to_string(),
                }),
            })
            .collect(),
        Some(_) => Err(CompositionError::InvalidField {
            field: field.to_string(),
            reason: "expected a list of objects".to_string(),
        }),
    }
}
