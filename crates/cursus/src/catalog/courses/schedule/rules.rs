use super::super::domain::Timeline;
use super::{Invalidation, TimelineField};

/// Stable invalidation codes, worded as complementary halves of each
/// violation. Downstream clients match on these strings; do not rename.
pub(crate) mod codes {
    pub const REGISTRATIONS_START_AT_OR_AFTER_REGISTRATIONS_END: &str =
        "registrationsStartAtOrAfterRegistrationsEnd";
    pub const REGISTRATIONS_END_AT_OR_BEFORE_REGISTRATIONS_START: &str =
        "registrationsEndAtOrBeforeRegistrationsStart";

    pub const REGISTRATIONS_START_AFTER_START: &str = "registrationsStartAfterStart";
    pub const START_BEFORE_REGISTRATIONS_START: &str = "startBeforeRegistrationsStart";

    pub const REGISTRATIONS_START_AT_OR_AFTER_END: &str = "registrationsStartAtOrAfterEnd";
    pub const END_AT_OR_BEFORE_REGISTRATIONS_START: &str = "endAtOrBeforeRegistrationsStart";

    pub const REGISTRATIONS_START_AT_OR_AFTER_EVALUATION_REQUESTS_END: &str =
        "registrationsStartAtOrAfterEvaluationRequestsEnd";
    pub const EVALUATION_REQUESTS_END_AT_OR_BEFORE_REGISTRATIONS_START: &str =
        "evaluationRequestsEndAtOrBeforeRegistrationsStart";

    pub const REGISTRATIONS_START_AT_OR_AFTER_EVALUATIONS_END: &str =
        "registrationsStartAtOrAfterEvaluationsEnd";
    pub const EVALUATIONS_END_AT_OR_BEFORE_REGISTRATIONS_START: &str =
        "evaluationsEndAtOrBeforeRegistrationsStart";

    pub const REGISTRATIONS_END_AT_OR_AFTER_END: &str = "registrationsEndAtOrAfterEnd";
    pub const END_AT_OR_BEFORE_REGISTRATIONS_END: &str = "endAtOrBeforeRegistrationsEnd";

    pub const REGISTRATIONS_END_AT_OR_AFTER_EVALUATIONS_END: &str =
        "registrationsEndAtOrAfterEvaluationsEnd";
    pub const EVALUATIONS_END_AT_OR_BEFORE_REGISTRATIONS_END: &str =
        "evaluationsEndAtOrBeforeRegistrationsEnd";

    pub const START_AT_OR_AFTER_END: &str = "startAtOrAfterEnd";
    pub const END_AT_OR_BEFORE_START: &str = "endAtOrBeforeStart";

    pub const START_AT_OR_AFTER_EVALUATION_REQUESTS_END: &str =
        "startAtOrAfterEvaluationRequestsEnd";
    pub const EVALUATION_REQUESTS_END_AT_OR_BEFORE_START: &str =
        "evaluationRequestsEndAtOrBeforeStart";

    pub const START_AT_OR_AFTER_EVALUATIONS_END: &str = "startAtOrAfterEvaluationsEnd";
    pub const EVALUATIONS_END_AT_OR_BEFORE_START: &str = "evaluationsEndAtOrBeforeStart";

    pub const EVALUATION_REQUESTS_END_AT_OR_AFTER_END: &str = "evaluationRequestsEndAtOrAfterEnd";
    pub const END_AT_OR_BEFORE_EVALUATION_REQUESTS_END: &str =
        "endAtOrBeforeEvaluationRequestsEnd";

    pub const END_AT_OR_AFTER_EVALUATIONS_END: &str = "endAtOrAfterEvaluationsEnd";
    pub const EVALUATIONS_END_AT_OR_BEFORE_END: &str = "evaluationsEndAtOrBeforeEnd";

    pub const EVALUATION_REQUESTS_END_AT_OR_AFTER_EVALUATIONS_END: &str =
        "evaluationRequestsEndAtOrAfterEvaluationsEnd";
    pub const EVALUATIONS_END_AT_OR_BEFORE_EVALUATION_REQUESTS_END: &str =
        "evaluationsEndAtOrBeforeEvaluationRequestsEnd";
}

/// Pairwise ordering checks over the timeline fields.
///
/// Each check only fires when both fields are present, and each violation
/// invalidates both sides. The comparison operators are part of the contract:
/// most windows must be strictly ordered, registrations may open exactly at
/// the course start, and the two `end`-anchored checks only apply to
/// timelines without a separate evaluation phase.
pub(crate) fn check_ordering(timeline: &Timeline) -> Vec<Invalidation> {
    let mut violations = Vec::new();

    if let (Some(opens), Some(closes)) = (timeline.registrations_start, timeline.registrations_end)
    {
        if opens >= closes {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsStart,
                code: codes::REGISTRATIONS_START_AT_OR_AFTER_REGISTRATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::RegistrationsEnd,
                code: codes::REGISTRATIONS_END_AT_OR_BEFORE_REGISTRATIONS_START,
            });
        }
    }

    // The only non-strict pairing: registrations may open at the exact start.
    if let (Some(opens), Some(start)) = (timeline.registrations_start, timeline.start) {
        if opens > start {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsStart,
                code: codes::REGISTRATIONS_START_AFTER_START,
            });
            violations.push(Invalidation {
                field: TimelineField::Start,
                code: codes::START_BEFORE_REGISTRATIONS_START,
            });
        }
    }

    if let (Some(opens), Some(end)) = (timeline.registrations_start, timeline.end) {
        if opens >= end {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsStart,
                code: codes::REGISTRATIONS_START_AT_OR_AFTER_END,
            });
            violations.push(Invalidation {
                field: TimelineField::End,
                code: codes::END_AT_OR_BEFORE_REGISTRATIONS_START,
            });
        }
    }

    if let (Some(opens), Some(requests_end)) =
        (timeline.registrations_start, timeline.evaluation_requests_end)
    {
        if opens >= requests_end {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsStart,
                code: codes::REGISTRATIONS_START_AT_OR_AFTER_EVALUATION_REQUESTS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationRequestsEnd,
                code: codes::EVALUATION_REQUESTS_END_AT_OR_BEFORE_REGISTRATIONS_START,
            });
        }
    }

    if let (Some(opens), Some(evaluations_end)) =
        (timeline.registrations_start, timeline.evaluations_end)
    {
        if opens >= evaluations_end {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsStart,
                code: codes::REGISTRATIONS_START_AT_OR_AFTER_EVALUATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationsEnd,
                code: codes::EVALUATIONS_END_AT_OR_BEFORE_REGISTRATIONS_START,
            });
        }
    }

    // Without an evaluation phase the course end is the hard close for
    // registrations.
    if timeline.evaluations_end.is_none() {
        if let (Some(closes), Some(end)) = (timeline.registrations_end, timeline.end) {
            if closes >= end {
                violations.push(Invalidation {
                    field: TimelineField::RegistrationsEnd,
                    code: codes::REGISTRATIONS_END_AT_OR_AFTER_END,
                });
                violations.push(Invalidation {
                    field: TimelineField::End,
                    code: codes::END_AT_OR_BEFORE_REGISTRATIONS_END,
                });
            }
        }
    }

    if let (Some(closes), Some(evaluations_end)) =
        (timeline.registrations_end, timeline.evaluations_end)
    {
        if closes >= evaluations_end {
            violations.push(Invalidation {
                field: TimelineField::RegistrationsEnd,
                code: codes::REGISTRATIONS_END_AT_OR_AFTER_EVALUATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationsEnd,
                code: codes::EVALUATIONS_END_AT_OR_BEFORE_REGISTRATIONS_END,
            });
        }
    }

    if let (Some(start), Some(end)) = (timeline.start, timeline.end) {
        if start >= end {
            violations.push(Invalidation {
                field: TimelineField::Start,
                code: codes::START_AT_OR_AFTER_END,
            });
            violations.push(Invalidation {
                field: TimelineField::End,
                code: codes::END_AT_OR_BEFORE_START,
            });
        }
    }

    if let (Some(start), Some(requests_end)) = (timeline.start, timeline.evaluation_requests_end) {
        if start >= requests_end {
            violations.push(Invalidation {
                field: TimelineField::Start,
                code: codes::START_AT_OR_AFTER_EVALUATION_REQUESTS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationRequestsEnd,
                code: codes::EVALUATION_REQUESTS_END_AT_OR_BEFORE_START,
            });
        }
    }

    if let (Some(start), Some(evaluations_end)) = (timeline.start, timeline.evaluations_end) {
        if start >= evaluations_end {
            violations.push(Invalidation {
                field: TimelineField::Start,
                code: codes::START_AT_OR_AFTER_EVALUATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationsEnd,
                code: codes::EVALUATIONS_END_AT_OR_BEFORE_START,
            });
        }
    }

    if timeline.evaluations_end.is_none() {
        if let (Some(requests_end), Some(end)) = (timeline.evaluation_requests_end, timeline.end) {
            if requests_end >= end {
                violations.push(Invalidation {
                    field: TimelineField::EvaluationRequestsEnd,
                    code: codes::EVALUATION_REQUESTS_END_AT_OR_AFTER_END,
                });
                violations.push(Invalidation {
                    field: TimelineField::End,
                    code: codes::END_AT_OR_BEFORE_EVALUATION_REQUESTS_END,
                });
            }
        }
    }

    if let (Some(end), Some(evaluations_end)) = (timeline.end, timeline.evaluations_end) {
        if end >= evaluations_end {
            violations.push(Invalidation {
                field: TimelineField::End,
                code: codes::END_AT_OR_AFTER_EVALUATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationsEnd,
                code: codes::EVALUATIONS_END_AT_OR_BEFORE_END,
            });
        }
    }

    if let (Some(requests_end), Some(evaluations_end)) =
        (timeline.evaluation_requests_end, timeline.evaluations_end)
    {
        if requests_end >= evaluations_end {
            violations.push(Invalidation {
                field: TimelineField::EvaluationRequestsEnd,
                code: codes::EVALUATION_REQUESTS_END_AT_OR_AFTER_EVALUATIONS_END,
            });
            violations.push(Invalidation {
                field: TimelineField::EvaluationsEnd,
                code: codes::EVALUATIONS_END_AT_OR_BEFORE_EVALUATION_REQUESTS_END,
            });
        }
    }

    violations
}
