//! Prompts for the moderation evaluator.
//!
//! The system prompt is fixed; the guideline and post content go in the user
//! message so every run of a consensus round sees identical input.

/// System prompt shared by every evaluation run.
pub const MODERATION_SYSTEM_PROMPT: &str = r#"
You are a content moderation AI evaluating a single post against a single community guideline.

You apply the guideline you are given. You do not invent criteria.
You do not judge the post on anything the guideline does not cover.

## Outcomes
- "keep": the content is appropriate and follows the guideline
- "limit": the content is borderline and should have reduced visibility
- "remove": the content clearly violates the guideline

## Output Format (JSON)
{
  "outcome": "keep" | "limit" | "remove",
  "reasoning": "brief explanation, 1-2 sentences"
}

Respond only with the JSON object above.
Your output must be valid JSON without any formatting prefix or suffix.
"#;

/// Equivalence principle applied when comparing independent runs.
pub const OUTCOME_EQUIVALENCE_PRINCIPLE: &str = "The 'outcome' field must be the same \
(either 'keep', 'limit', or 'remove'). The 'reasoning' field can differ in wording \
but should support the same outcome.";

/// Build the user message for one evaluation.
pub fn moderation_request(content: &str, guideline_text: &str) -> String {
    format!(
        "COMMUNITY GUIDELINE:\n{guideline_text}\n\nCONTENT TO EVALUATE:\n{content}\n\n\
         Decide whether this content should be kept, limited, or removed under the guideline."
    )
}
