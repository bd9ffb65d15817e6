//! Timeline consistency checking and time-gated eligibility.
//!
//! Both halves are pure functions over a [`Timeline`] snapshot: the validator
//! reports every ordering violation as field-level results instead of
//! mutating shared state, and the eligibility checks take "now" as an
//! explicit argument so callers stay deterministic and testable.

mod policy;
mod rules;

pub use policy::{can_enroll, can_update_group};

use serde::Serialize;

use super::domain::Timeline;

/// The six timeline fields, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimelineField {
    Start,
    End,
    RegistrationsStart,
    RegistrationsEnd,
    EvaluationRequestsEnd,
    EvaluationsEnd,
}

impl TimelineField {
    pub const fn name(self) -> &'static str {
        match self {
            TimelineField::Start => "start",
            TimelineField::End => "end",
            TimelineField::RegistrationsStart => "registrationsStart",
            TimelineField::RegistrationsEnd => "registrationsEnd",
            TimelineField::EvaluationRequestsEnd => "evaluationRequestsEnd",
            TimelineField::EvaluationsEnd => "evaluationsEnd",
        }
    }
}

/// One field-level schedule violation.
///
/// Every violated ordering rule produces two of these, one per participating
/// field, each carrying its own stable code so a form can highlight both
/// offending inputs. The codes round-trip unchanged to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Invalidation {
    pub field: TimelineField,
    pub code: &'static str,
}

/// Check every ordering rule against the timeline.
///
/// Total and deterministic: absent fields simply skip the rules that
/// reference them, and an empty result means the timeline is consistent.
/// Violations accumulate independently, so a field may collect more than one
/// code.
pub fn validate(timeline: &Timeline) -> Vec<Invalidation> {
    rules::check_ordering(timeline)
}
