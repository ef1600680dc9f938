//! Detailed-context block built from task attributes.

use crate::queue::domain::TaskPayload;
use serde_json::Value;

/// Text used when no known attribute is present.
pub const EMPTY_CONTEXT: &str = "No additional detailed data provided.";

/// A contextual attribute looked up in task payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextField {
    /// Canonical camelCase key.
    pub key: &'static str,
    /// Label shown in the context block.
    pub label: &'static str,
    /// Extra keys accepted besides the derived snake_case and lowercase
    /// spellings.
    pub aliases: &'static [&'static str],
}

impl ContextField {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            aliases: &[],
        }
    }

    /// Returns every key this field may be stored under, canonical first.
    #[must_use]
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = vec![
            self.key.to_owned(),
            to_snake_case(self.key),
            self.key.to_ascii_lowercase(),
        ];
        keys.extend(self.aliases.iter().map(|alias| (*alias).to_owned()));
        keys.dedup();
        keys
    }
}

/// Attributes rendered into the context block, in display order.
pub const DEFAULT_CONTEXT_FIELDS: [ContextField; 16] = [
    ContextField::new("city", "City"),
    ContextField::new("organiser", "Organiser"),
    ContextField::new("firstEdition", "First Edition"),
    ContextField::new("lastEdition", "Last Edition"),
    ContextField::new("mode", "Mode"),
    ContextField::new("theme", "Theme"),
    ContextField::new("swimType", "Swim Type"),
    ContextField::new("swimmingLocation", "Swimming Location"),
    ContextField::new("swimCutoff", "Swim Cutoff"),
    ContextField::new("dayTemp", "Day Temp"),
    ContextField::new("cyclingElevation", "Cycling Elevation"),
    ContextField::new("cyclingSurface", "Cycling Surface"),
    ContextField::new("cycleType", "Cycle Type"),
    ContextField::new("runningElevation", "Running Elevation"),
    ContextField::new("runningSurface", "Running Surface"),
    ContextField {
        key: "numberOfParticipants",
        label: "Number Of Participants",
        aliases: &["numberOfparticipants", "participants"],
    },
];

/// Renders one `* **Label:** value` line per known attribute present in
/// `payload`, or [`EMPTY_CONTEXT`] when there is none.
///
/// Null values and empty strings count as absent.
#[must_use]
pub fn detailed_context(payload: &TaskPayload, fields: &[ContextField]) -> String {
    let lines: Vec<String> = fields
        .iter()
        .filter_map(|field| {
            field
                .lookup_keys()
                .iter()
                .find_map(|key| payload.attributes().get(key).and_then(display_value))
                .map(|value| format!("* **{}:** {value}", field.label))
        })
        .collect();

    if lines.is_empty() {
        return EMPTY_CONTEXT.to_owned();
    }
    lines.join("\n")
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

fn to_snake_case(key: &str) -> String {
    key.chars().fold(String::with_capacity(key.len()), |mut out, ch| {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
        out
    })
}
