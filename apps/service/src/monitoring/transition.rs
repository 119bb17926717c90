use crate::database::models::Observation;

/// Whether `current` starts a new status period.
///
/// `previous` must be the latest observation checked strictly before
/// `current`; the first observation of a target always counts.
pub fn is_transition(current: &Observation, previous: Option<&Observation>) -> bool {
    previous.is_none_or(|previous| previous.status != current.status)
}

/// Stamp `transition_at` on a fresh observation when it is a transition
pub fn mark_transition(mut current: Observation, previous: Option<&Observation>) -> Observation {
    current.transition_at = is_transition(&current, previous).then_some(current.checked_at);
    current
}
