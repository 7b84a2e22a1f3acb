//! Response parsing into [`Advice`].
//!
//! Models do not always honour "JSON only". The raw text is tried as-is,
//! then from a fenced code block, then from its outermost braces.

use surgitrack_types::Advice;

use crate::error::AdvisorError;

/// Parse a model response into [`Advice`].
///
/// # Errors
///
/// Returns [`AdvisorError::Parse`] if no strategy yields an object with a
/// non-empty `analysis`.
pub fn parse_advice(raw: &str) -> Result<Advice, AdvisorError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        extract_from_codeblock(trimmed),
        extract_outer_object(trimmed),
    ];

    let mut last_error = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Advice>(candidate) {
            Ok(advice) if !advice.analysis.trim().is_empty() => return Ok(advice),
            Ok(_) => last_error = Some("empty analysis".to_owned()),
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    Err(AdvisorError::Parse(
        last_error.unwrap_or_else(|| "empty response".to_owned()),
    ))
}

fn extract_from_codeblock(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = text.get(start.checked_add(3)?..)?;
    let body_start = after_fence.find('\n')?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

fn extract_outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_parses() {
        let advice = parse_advice(
            r#"{"analysis": "Salle 3 en retard.", "recommendations": ["Décaler la Salle 5"]}"#,
        )
        .unwrap();
        assert_eq!(advice.analysis, "Salle 3 en retard.");
        assert_eq!(advice.recommendations.len(), 1);
    }

    #[test]
    fn fenced_json_parses() {
        let raw = "Voici :\n```json\n{\"analysis\": \"RAS\", \"recommendations\": []}\n```\n";
        assert_eq!(parse_advice(raw).unwrap().analysis, "RAS");
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let raw = "Analyse: {\"analysis\": \"Bloc fluide\"} Fin.";
        let advice = parse_advice(raw).unwrap();
        assert_eq!(advice.analysis, "Bloc fluide");
        assert!(advice.recommendations.is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(parse_advice("no idea"), Err(AdvisorError::Parse(_))));
        assert!(matches!(
            parse_advice(r#"{"analysis": "  "}"#),
            Err(AdvisorError::Parse(_))
        ));
    }
}
