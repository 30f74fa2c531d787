use super::{ClassifyError, Intent};

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````) if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse a classifier reply into a normalized [`Intent`].
///
/// Models occasionally wrap the object in prose; if the whole reply does
/// not parse, the outermost `{ ... }` span is tried once.
pub fn parse_intent(raw: &str) -> Result<Intent, ClassifyError> {
    let body = strip_code_fence(raw);
    match serde_json::from_str::<Intent>(body) {
        Ok(intent) => Ok(intent.normalize()),
        Err(first) => {
            let span = match (body.find('{'), body.rfind('}')) {
                (Some(start), Some(end)) if end > start => &body[start..=end],
                _ => return Err(ClassifyError::UnparsableResponse(first.to_string())),
            };
            serde_json::from_str::<Intent>(span)
                .map(Intent::normalize)
                .map_err(|_| ClassifyError::UnparsableResponse(first.to_string()))
        }
    }
}
