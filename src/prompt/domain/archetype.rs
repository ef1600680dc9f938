//! Scene archetypes mixed into instructions.

use crate::queue::domain::TaskId;

/// Scene archetypes used when none are configured.
pub const DEFAULT_ARCHETYPES: [&str; 6] = [
    "THE PACK SURGE: a telephoto shot of a dense group of athletes \
     running toward the camera.",
    "SHARED TRIUMPH: a candid medium shot of participants celebrating \
     together mid-race or at the finish.",
    "THE SCENIC ISOLATION: a wide environmental shot with the athlete \
     small against a large landscape.",
    "DYNAMIC TRANSITION: athletes moving between disciplines, leaving the water or mounting bikes.",
    "THE GRITTY CLIMB: a low-angle shot stressing steep terrain and the athlete's effort.",
    "WATER LEVEL ACTION: a surface-level view of open water swimming \
     with splashes and bright caps.",
];

/// Picks the archetype for `task_id`.
///
/// The choice depends only on the identifier, so every retry of a task
/// composes from the same scene. Returns `None` when `archetypes` is empty.
#[must_use]
pub fn select_archetype<S: AsRef<str>>(archetypes: &[S], task_id: TaskId) -> Option<&str> {
    let count = u64::try_from(archetypes.len()).ok()?;
    let id = u64::try_from(task_id.value()).ok()?;
    let index = usize::try_from(id.checked_rem(count)?).ok()?;
    archetypes.get(index).map(AsRef::as_ref)
}
