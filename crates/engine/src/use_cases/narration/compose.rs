//! Player-visible response composition.
//!
//! Removes the control payload from the generated narrative and appends
//! the mutation annotations. Pure string work, no I/O.

use super::extract::{fence_regex, ExtractedPayload};

/// Shown in place of narration when generation fails after all retries.
pub const UNAVAILABILITY_NOTICE: &str = "The narrator gazes into the distance, lost in thought. \
(The storyteller is unavailable right now - please try again in a moment.)";

/// Appended when a payload was present but failed validation.
pub const REJECTED_ANNOTATION: &str =
    "(The narrator attempted stat changes that could not be applied.)";

/// Compose the visible message from the raw narrative.
///
/// Removes exactly the extracted span - the whole fenced block when the
/// span was fenced, otherwise the matched brace span - then cleans up any
/// orphaned fence labels and appends annotations in production order.
pub fn compose_visible(
    narrative: &str,
    extracted: Option<&ExtractedPayload>,
    annotations: &[String],
) -> String {
    let mut visible = match extracted {
        Some(payload) if payload.fenced => fence_regex().replace(narrative, "").into_owned(),
        Some(payload) => match narrative.find(&payload.raw) {
            Some(start) => {
                let mut s = String::with_capacity(narrative.len());
                s.push_str(&narrative[..start]);
                s.push_str(&narrative[start + payload.raw.len()..]);
                s
            }
            None => narrative.to_string(),
        },
        None => narrative.to_string(),
    };

    // A fence opener without a matching close survives span removal.
    // Only when a span was removed: fences in payload-free narration
    // (a code snippet the narrator quoted) belong to the player.
    if extracted.is_some() {
        visible = visible.replace("```json", "").replace("```", "");
    }
    let mut visible = visible.trim().to_string();

    for annotation in annotations {
        if !visible.is_empty() {
            visible.push_str("\n\n");
        }
        visible.push_str(annotation);
    }

    visible
}
