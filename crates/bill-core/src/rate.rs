//! Date-effective hourly rate resolution.

use chrono::NaiveDate;

use crate::model::Rate;
use crate::types::{ProjectId, UserId};

/// Picks the rate in force for `user` on `project` at date `on`.
///
/// A rate applies from its effective date onward, so the winner is the
/// entry with the greatest `effective_from <= on`. Returns `None` when no
/// entry qualifies; callers decide whether that is a missing-precondition
/// or a reporting error.
#[must_use]
pub fn resolve<'a>(
    rates: &'a [Rate],
    project: ProjectId,
    user: UserId,
    on: NaiveDate,
) -> Option<&'a Rate> {
    rates
        .iter()
        .filter(|rate| {
            rate.project_id == project && rate.user_id == user && rate.effective_from <= on
        })
        .max_by_key(|rate| rate.effective_from)
}
