//! Client-side checks run before a job is submitted
//!
//! Everything here is resolved without a network round-trip; a failure never
//! reaches the job service and never starts a timer.

use serde_json::Value;

use crate::constants::{limits::MAX_PROMPT_CHARS, messages};
use crate::error::ErrorInfo;
use crate::service::{JobKind, JobRequest};

/// Validate a request, returning the user-facing validation error on failure
pub fn validate_request(request: &JobRequest) -> Result<(), ErrorInfo> {
    validate_prompt(&request.prompt)?;

    if request.kind == JobKind::RecipeModification {
        let has_recipe = request
            .recipe_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !has_recipe {
            return Err(ErrorInfo::validation(messages::MISSING_RECIPE_ID));
        }
    }

    if let Some(overrides) = &request.overrides {
        validate_overrides(overrides)?;
    }

    Ok(())
}

/// Reject blank prompts and prompts the backend would refuse
pub fn validate_prompt(prompt: &str) -> Result<(), ErrorInfo> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ErrorInfo::validation(messages::EMPTY_PROMPT));
    }
    if trimmed.chars().count() > MAX_PROMPT_CHARS {
        return Err(ErrorInfo::validation(messages::PROMPT_TOO_LONG));
    }
    Ok(())
}

fn validate_overrides(overrides: &Value) -> Result<(), ErrorInfo> {
    match overrides {
        Value::Object(_) | Value::Null => Ok(()),
        _ => Err(ErrorInfo::validation(messages::INVALID_OVERRIDES)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_blank_prompts_are_rejected() {
        for prompt in ["", "   ", "\n\t "] {
            let err = validate_prompt(prompt).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        assert!(validate_prompt("  shakshuka  ").is_ok());
    }

    #[test]
    fn test_prompt_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_PROMPT_CHARS);
        assert!(validate_prompt(&at_limit).is_ok());

        let over = "a".repeat(MAX_PROMPT_CHARS + 1);
        assert_eq!(
            validate_prompt(&over).unwrap_err().message,
            messages::PROMPT_TOO_LONG
        );
    }

    #[test]
    fn test_modification_requires_recipe() {
        let mut request = JobRequest::modify("  ", "make it vegan");
        assert!(validate_request(&request).is_err());

        request.recipe_id = Some("42".to_string());
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_overrides_must_be_an_object() {
        let request = JobRequest::generate("tacos").with_overrides(json!(["spicy"]));
        assert!(validate_request(&request).is_err());

        let request = JobRequest::generate("tacos").with_overrides(json!({"servings": 2}));
        assert!(validate_request(&request).is_ok());
    }
}
