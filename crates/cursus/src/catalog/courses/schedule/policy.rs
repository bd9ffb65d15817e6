use chrono::{DateTime, Utc};

use super::super::domain::Timeline;

/// Whether a learner may enroll, or request an invitation, at `now`.
///
/// Each present field contributes one restriction; the first active
/// restriction decides. A course without a timeline is unrestricted. Note the
/// boundary semantics: enrolling at the exact `registrations_end` instant is
/// still permitted, while `now` equal to `registrations_start` or `start` is
/// not yet eligible.
pub fn can_enroll(timeline: Option<&Timeline>, now: DateTime<Utc>) -> bool {
    let Some(timeline) = timeline else {
        return true;
    };

    if let Some(opens) = timeline.registrations_start {
        if now <= opens {
            return false;
        }
    }
    if let Some(start) = timeline.start {
        if now <= start {
            return false;
        }
    }
    if let Some(closes) = timeline.registrations_end {
        if now > closes {
            return false;
        }
    }
    if let Some(evaluations_end) = timeline.evaluations_end {
        if now > evaluations_end {
            return false;
        }
    }
    if let Some(end) = timeline.end {
        if now > end {
            return false;
        }
    }

    true
}

/// Whether a registered learner may still change group assignment at `now`.
///
/// Group changes stay open for the whole run and evaluation phase; only a
/// passed course end or evaluations end closes them.
pub fn can_update_group(timeline: Option<&Timeline>, now: DateTime<Utc>) -> bool {
    let Some(timeline) = timeline else {
        return true;
    };

    if let Some(evaluations_end) = timeline.evaluations_end {
        if now > evaluations_end {
            return false;
        }
    }
    if let Some(end) = timeline.end {
        if now > end {
            return false;
        }
    }

    true
}
