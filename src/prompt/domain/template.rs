//! Instruction template and the variables rendered into it.

use serde::Serialize;

/// Template rendered when none is configured.
///
/// Available variables: `event_name`, `event_type`, `detailed_context` and
/// `archetype`.
pub const DEFAULT_TEMPLATE: &str = "\
Generate one single documentary-style sports photograph with no text in the image.

It must look like an unstaged shot from a professional event gallery: \
authentic, textured and dynamic, with natural colour grading and no HDR look.

Event: {{ event_name }}
Type: {{ event_type }}
Location data:
{{ detailed_context }}

Match gear, terrain and lighting to the event type. Trail and ultra events \
show hydration vests and dirt paths; triathlons show tri-suits, wetsuits and \
transition zones; fun runs show casual clothing and urban parks; obstacle \
races show mud.

Scene archetype:
{{ archetype }}

Adapt the archetype to the event type. Use the participant count to decide \
crowd density. Bib numbers must be illegible and the scene must be outdoors.

Write a precise, photographer-centric prompt describing subject, action, \
gear, lighting and lens. Output only the prompt text.";

/// Values rendered into the instruction template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptVariables {
    /// Human-readable task name.
    pub event_name: String,
    /// Task category.
    pub event_type: String,
    /// Detailed context block.
    pub detailed_context: String,
    /// Selected scene archetype.
    pub archetype: String,
}
