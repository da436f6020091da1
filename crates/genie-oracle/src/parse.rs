//! Oracle response parsing into typed payloads.
//!
//! The model returns raw text (ideally JSON). This module recovers the JSON
//! object from it and validates the object against the shape each request
//! kind expects. Classification and fusion are strict: a missing field is a
//! [`OracleError::MalformedResponse`]. Materialization is lenient: bad
//! colors or speed fall back to presentation defaults, since an aura with
//! neutral colors is still an aura.

use genie_types::structs::is_hex_color;
use genie_types::{AuraState, Classification, DEFAULT_AURA_SPEED, Fusion};
use serde_json::Value;
use tracing::warn;

use crate::error::OracleError;

/// Smallest accepted aura speed.
const MIN_SPEED: u8 = 1;

/// Largest accepted aura speed.
const MAX_SPEED: u8 = 10;

/// Intermediate struct for the classification answer.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    valid: bool,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default, alias = "color")]
    color_hex: Option<String>,
}

/// Intermediate struct for the fusion answer.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFusion {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default, alias = "color")]
    color_hex: Option<String>,
}

/// Parse a classification answer.
pub fn parse_classification(raw: &str) -> Result<Classification, OracleError> {
    let value = extract_json_object(raw)?;
    let parsed: RawClassification = serde_json::from_value(value).map_err(|e| {
        OracleError::MalformedResponse(format!("classification has wrong shape: {e}"))
    })?;

    if !parsed.valid {
        return Ok(Classification::Rejected);
    }

    let (label, emoji, color_hex) =
        require_appearance(parsed.label, parsed.emoji, parsed.color_hex, "classification")?;
    Ok(Classification::Valid {
        label,
        emoji,
        color_hex,
    })
}

/// Parse a fusion answer.
pub fn parse_fusion(raw: &str) -> Result<Fusion, OracleError> {
    let value = extract_json_object(raw)?;
    let parsed: RawFusion = serde_json::from_value(value)
        .map_err(|e| OracleError::MalformedResponse(format!("fusion has wrong shape: {e}")))?;

    let (label, emoji, color_hex) =
        require_appearance(parsed.label, parsed.emoji, parsed.color_hex, "fusion")?;
    Ok(Fusion {
        label,
        emoji,
        color_hex,
    })
}

/// Parse a materialization answer, defaulting unusable presentation fields.
///
/// Only text that contains no JSON object at all is rejected.
pub fn parse_aura(raw: &str, requested_label: &str) -> Result<AuraState, OracleError> {
    let value = extract_json_object(raw)?;

    let source_emotion = non_empty_str(value.get("label"))
        .unwrap_or(requested_label)
        .to_owned();

    let colors = value.get("colors").and_then(four_hex_colors).unwrap_or_else(|| {
        warn!(label = requested_label, "aura colors unusable, using neutral palette");
        AuraState::default_colors()
    });

    let speed = value.get("speed").and_then(speed_in_range).unwrap_or_else(|| {
        warn!(label = requested_label, "aura speed unusable, using default");
        DEFAULT_AURA_SPEED
    });

    let chaotic = value
        .get("chaotic")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let tagline = non_empty_str(value.get("tagline")).map(ToOwned::to_owned);

    Ok(AuraState {
        source_emotion,
        colors,
        speed,
        chaotic,
        tagline,
    })
}

/// Check the three appearance fields shared by classification and fusion.
fn require_appearance(
    label: Option<String>,
    emoji: Option<String>,
    color_hex: Option<String>,
    what: &str,
) -> Result<(String, String, String), OracleError> {
    let label = label
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OracleError::MalformedResponse(format!("{what} missing label")))?;
    let emoji = emoji
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OracleError::MalformedResponse(format!("{what} missing emoji")))?;
    let color_hex = color_hex
        .map(|s| s.trim().to_owned())
        .filter(|s| is_hex_color(s))
        .ok_or_else(|| {
            OracleError::MalformedResponse(format!("{what} missing or invalid colorHex"))
        })?;
    Ok((label, emoji, color_hex))
}

/// A trimmed, non-empty string field.
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Exactly four hex colors, or nothing.
fn four_hex_colors(value: &Value) -> Option<[String; 4]> {
    let items = value.as_array()?;
    let colors: Vec<String> = items
        .iter()
        .map(|c| c.as_str().map(str::trim).filter(|c| is_hex_color(c)).map(ToOwned::to_owned))
        .collect::<Option<Vec<_>>>()?;
    <[String; 4]>::try_from(colors).ok()
}

/// An integral speed within `MIN_SPEED..=MAX_SPEED`.
///
/// Accepts `6`, `6.0` and `"6"`; rejects fractions and anything out of range.
fn speed_in_range(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (MIN_SPEED..=MAX_SPEED).find(|&n| (f64::from(n) - number).abs() < 1e-9)
}

/// Recover a JSON object from model text.
///
/// Attempts multiple recovery strategies if the raw text is not clean JSON:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
/// 4. Extract from code block, then strip trailing commas
fn extract_json_object(raw: &str) -> Result<Value, OracleError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    if let Some(value) = parse_object(trimmed) {
        return Ok(value);
    }

    // Strategy 2: extract from markdown code block
    if let Some(json_str) = extract_json_from_codeblock(trimmed)
        && let Some(value) = parse_object(json_str)
    {
        return Ok(value);
    }

    // Strategy 3: strip trailing commas and retry
    let cleaned = strip_trailing_commas(trimmed);
    if let Some(value) = parse_object(&cleaned) {
        return Ok(value);
    }

    // Strategy 4: extract from code block then strip commas
    if let Some(json_str) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(json_str);
        if let Some(value) = parse_object(&cleaned_inner) {
            return Ok(value);
        }
    }

    warn!(raw_response = raw, "failed to recover JSON object from oracle text");
    Err(OracleError::MalformedResponse(format!(
        "no JSON object in oracle text: {trimmed}"
    )))
}

/// Parse text that must hold a JSON object.
fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    // Look for ```json ... ``` or ``` ... ```
    let fence = text.find("```json").map(|i| (i, 7)).or_else(|| text.find("```").map(|i| (i, 3)));
    let (open, tag_len) = fence?;
    let after_tag = open.checked_add(tag_len)?;
    let start = text
        .get(after_tag..)
        .and_then(|s| s.find('\n'))
        .and_then(|nl| after_tag.checked_add(nl))
        .and_then(|pos| pos.checked_add(1))
        .unwrap_or(after_tag);

    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets (common LLM error).
///
/// Commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let rest: String = chars.clone().skip_while(|n| n.is_whitespace()).take(1).collect();
                if rest != "}" && rest != "]" {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_valid() {
        let raw = r##"{"valid": true, "label": "Alegria", "emoji": "😊", "colorHex": "#FFD700"}"##;
        let parsed = parse_classification(raw);
        assert_eq!(
            parsed.ok(),
            Some(Classification::Valid {
                label: "Alegria".to_owned(),
                emoji: "😊".to_owned(),
                color_hex: "#FFD700".to_owned(),
            })
        );
    }

    #[test]
    fn classification_rejected_needs_no_other_fields() {
        let parsed = parse_classification(r#"{"valid": false}"#);
        assert_eq!(parsed.ok(), Some(Classification::Rejected));
    }

    #[test]
    fn classification_valid_without_color_is_malformed() {
        let raw = r#"{"valid": true, "label": "Alegria", "emoji": "😊"}"#;
        assert!(matches!(
            parse_classification(raw),
            Err(OracleError::MalformedResponse(_))
        ));
    }

    #[test]
    fn classification_without_valid_flag_is_malformed() {
        let raw = r##"{"label": "Alegria", "emoji": "😊", "colorHex": "#FFD700"}"##;
        assert!(parse_classification(raw).is_err());
    }

    #[test]
    fn classification_accepts_color_alias() {
        let raw = r##"{"valid": true, "label": "Medo", "emoji": "😨", "color": "#333"}"##;
        assert!(matches!(
            parse_classification(raw),
            Ok(Classification::Valid { ref color_hex, .. }) if color_hex == "#333"
        ));
    }

    #[test]
    fn fusion_from_codeblock() {
        let raw = "Here you go:\n\n```json\n{\"label\": \"Ansiedade\", \"emoji\": \"😰\", \"colorHex\": \"#8B0000\"}\n```\n";
        let parsed = parse_fusion(raw);
        assert_eq!(parsed.map(|f| f.label).ok().as_deref(), Some("Ansiedade"));
    }

    #[test]
    fn fusion_with_trailing_comma() {
        let raw = r##"{"label": "Ciúme", "emoji": "😒", "colorHex": "#2E8B57",}"##;
        assert!(parse_fusion(raw).is_ok());
    }

    #[test]
    fn fusion_garbage_is_malformed() {
        let raw = "I think anger and fear make anxiety.";
        assert!(matches!(parse_fusion(raw), Err(OracleError::MalformedResponse(_))));
    }

    #[test]
    fn aura_full_payload() {
        let raw = r##"{
            "label": "Raiva",
            "colors": ["#FF0000", "#8B0000", "#FF4500", "#2B0000"],
            "speed": 9,
            "chaotic": true,
            "tagline": "Respira, campeão."
        }"##;
        let aura = parse_aura(raw, "Raiva");
        assert!(aura.is_ok());
        let Ok(aura) = aura else {
            return;
        };
        assert_eq!(aura.source_emotion, "Raiva");
        assert_eq!(aura.colors.first().map(String::as_str), Some("#FF0000"));
        assert_eq!(aura.speed, 9);
        assert!(aura.chaotic);
        assert_eq!(aura.tagline.as_deref(), Some("Respira, campeão."));
    }

    #[test]
    fn aura_defaults_bad_presentation_fields() {
        let raw = r##"{"colors": ["#FF0000", "#00FF00"], "speed": 42}"##;
        let aura = parse_aura(raw, "Paz");
        assert!(aura.is_ok());
        let Ok(aura) = aura else {
            return;
        };
        assert_eq!(aura.source_emotion, "Paz");
        assert_eq!(aura.colors, AuraState::default_colors());
        assert_eq!(aura.speed, DEFAULT_AURA_SPEED);
        assert!(!aura.chaotic);
        assert_eq!(aura.tagline, None);
    }

    #[test]
    fn aura_rejects_non_hex_palette_entries() {
        let raw = r##"{"colors": ["#FF0000", "red", "#00FF00", "#0000FF"], "speed": 3}"##;
        let aura = parse_aura(raw, "Paz");
        assert!(aura.is_ok_and(|a| a.colors == AuraState::default_colors() && a.speed == 3));
    }

    #[test]
    fn speed_accepts_integral_forms_only() {
        assert_eq!(speed_in_range(&serde_json::json!(6)), Some(6));
        assert_eq!(speed_in_range(&serde_json::json!(6.0)), Some(6));
        assert_eq!(speed_in_range(&serde_json::json!("7")), Some(7));
        assert_eq!(speed_in_range(&serde_json::json!(6.5)), None);
        assert_eq!(speed_in_range(&serde_json::json!(0)), None);
        assert_eq!(speed_in_range(&serde_json::json!(11)), None);
        assert_eq!(speed_in_range(&serde_json::json!(null)), None);
    }

    #[test]
    fn aura_from_non_object_is_malformed() {
        assert!(parse_aura("[1, 2, 3]", "Paz").is_err());
        assert!(parse_aura("", "Paz").is_err());
    }

    #[test]
    fn extract_json_from_markdown() {
        let text = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn extract_json_from_plain_codeblock() {
        let text = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
    }

    #[test]
    fn strip_trailing_commas_keeps_string_contents() {
        let input = r#"{"tagline": "calma, }", "x": 1,}"#;
        assert_eq!(strip_trailing_commas(input), r#"{"tagline": "calma, }", "x": 1}"#);
    }
}
