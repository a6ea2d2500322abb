//! Generation query request/response types.

use serde::{Deserialize, Serialize};

/// Shortest accepted prompt, after trimming whitespace.
pub const MIN_PROMPT_CHARS: usize = 3;

/// Longest accepted prompt.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Request body for `POST /api/query`.
///
/// ```json
/// { "prompt": "How do I configure OSPF area 0?" }
/// ```
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub prompt: String,
}

impl QueryRequest {
    /// Check prompt length bounds. Returns a client-facing message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().chars().count() < MIN_PROMPT_CHARS {
            return Err("Prompt is too short".to_string());
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(format!(
                "Prompt is too long (max {MAX_PROMPT_CHARS} characters)"
            ));
        }
        Ok(())
    }
}

/// Text produced by the generation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub elapsed_seconds: f64,
}

/// Response body for `POST /api/query`.
///
/// ```json
/// {
///   "success": true,
///   "text": "router ospf 1 ...",
///   "elapsed_seconds": 12.41,
///   "remaining": 7
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub text: String,
    pub elapsed_seconds: f64,
    pub remaining: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> QueryRequest {
        QueryRequest {
            prompt: prompt.to_string(),
        }
    }

    #[test]
    fn rejects_prompts_outside_bounds() {
        assert!(request("").validate().is_err());
        assert!(request("  hi  ").validate().is_err());
        assert!(request(&"x".repeat(MAX_PROMPT_CHARS + 1)).validate().is_err());
    }

    #[test]
    fn accepts_prompts_within_bounds() {
        assert!(request("VLAN?").validate().is_ok());
        assert!(request(&"x".repeat(MAX_PROMPT_CHARS)).validate().is_ok());
    }
}
