//! Control-payload sanitization and validation.
//!
//! The payload crosses the trust boundary between free narration and
//! structured state mutation, so parsing fails closed: one documented
//! repair (stripping a leading `+` from numeric literals) and otherwise
//! strict JSON against a strict schema. Nothing is guessed at.

use serde::Deserialize;

use super::extract::ExtractedPayload;

/// The validated control-payload wire format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlPayload {
    pub updates: Vec<CharacterUpdate>,
    #[serde(default)]
    pub loot: Vec<LootGrant>,
}

impl ControlPayload {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.loot.is_empty()
    }
}

/// One per-character update directive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterUpdate {
    pub character_name: String,
    #[serde(default)]
    pub hp_change: Option<i64>,
    #[serde(default)]
    pub mp_change: Option<i64>,
    #[serde(default)]
    pub xp_change: Option<i64>,
    #[serde(default)]
    pub status_effect: Option<String>,
    #[serde(default)]
    pub action: Option<StatusAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Add,
    Remove,
}

/// One loot grant directive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootGrant {
    pub character_name: String,
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Result of evaluating an extracted span.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadOutcome {
    /// A schema-valid update-set, ready for the mutation engine.
    Valid(ControlPayload),
    /// The narrator made no state changes this turn (the common case).
    NoPayload,
    /// The span existed but failed parsing or validation; nothing is applied.
    Rejected(String),
}

/// Sanitize and validate an extraction result.
pub fn evaluate(extracted: Option<&ExtractedPayload>) -> PayloadOutcome {
    let Some(extracted) = extracted else {
        return PayloadOutcome::NoPayload;
    };

    let sanitized = strip_plus_signs(&extracted.raw);
    let payload: ControlPayload = match serde_json::from_str(&sanitized) {
        Ok(payload) => payload,
        Err(e) => return PayloadOutcome::Rejected(format!("Invalid payload JSON: {e}")),
    };

    for grant in &payload.loot {
        if grant.quantity < 1 {
            return PayloadOutcome::Rejected(format!(
                "Loot quantity for '{}' must be a positive integer, got {}",
                grant.item_name, grant.quantity
            ));
        }
    }

    PayloadOutcome::Valid(payload)
}

/// Strip explicit `+` signs from numeric literals.
///
/// Models regularly emit `"hpChange": +10`, which strict JSON rejects.
/// The scanner tracks string state so a `+` inside a string value (an
/// item description, say) is left alone. This is the only repair applied.
fn strip_plus_signs(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    // Last non-whitespace character emitted outside a string
    let mut last_significant: Option<char> = None;

    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '+' => {
                let next_is_digit = chars.peek().is_some_and(|c| c.is_ascii_digit());
                let after_value_position =
                    matches!(last_significant, Some(':') | Some(',') | Some('['));
                if next_is_digit && after_value_position {
                    // Drop the sign; the digits follow unchanged
                } else {
                    out.push(ch);
                    last_significant = Some(ch);
                }
            }
            c if c.is_whitespace() => out.push(c),
            c => {
                out.push(c);
                last_significant = Some(c);
            }
        }
    }

    out
}
