use chrono::Utc;
use log::warn;
use serde_json::Value;

use crate::metadata::NOT_AVAILABLE;
use crate::store::DescriptionRecord;

use super::error::GenerationError;

/// Content field keys expected in the model's JSON answer, in record
/// order.
const CONTENT_FIELDS: &[&str] = &[
    "english",
    "german",
    "polish",
    "french",
    "source_info",
    "technical_details",
    "historical_context",
    "conservation_notes",
    "exhibition_history",
    "bibliography",
];

/// Builds a complete record from the model's answer text. A response
/// without any JSON object is fatal for this item; individual missing
/// or empty fields degrade to the "not available" marker with a warning.
pub fn parse_record(object_id: &str, text: &str) -> Result<DescriptionRecord, GenerationError> {
    let json_text = extract_json(text).ok_or_else(|| {
        GenerationError::Payload(format!(
            "response for object {object_id} contains no JSON object"
        ))
    })?;

    let value: Value = serde_json::from_str(&json_text).map_err(|e| {
        GenerationError::Payload(format!(
            "response for object {object_id} is not valid JSON: {e}"
        ))
    })?;

    let mut fields = Vec::with_capacity(CONTENT_FIELDS.len());
    for key in CONTENT_FIELDS {
        let field = match value.get(key).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                warn!("Object {}: response missing field '{}'", object_id, key);
                NOT_AVAILABLE.to_string()
            }
        };
        fields.push(field);
    }

    let mut fields = fields.into_iter();
    // Order matches CONTENT_FIELDS.
    Ok(DescriptionRecord {
        object_id: object_id.to_string(),
        english: fields.next().unwrap_or_default(),
        german: fields.next().unwrap_or_default(),
        polish: fields.next().unwrap_or_default(),
        french: fields.next().unwrap_or_default(),
        source_info: fields.next().unwrap_or_default(),
        technical_details: fields.next().unwrap_or_default(),
        historical_context: fields.next().unwrap_or_default(),
        conservation_notes: fields.next().unwrap_or_default(),
        exhibition_history: fields.next().unwrap_or_default(),
        bibliography: fields.next().unwrap_or_default(),
        generated_at: Utc::now(),
    })
}

/// Extracts the first balanced JSON object from `text`. Models wrap
/// answers in prose or markdown fences; this scans for the outermost
/// `{...}` while respecting string literals and escapes.
pub fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
