//! Content generation prompt

use keel_plan::Step;

/// Render the prompt asking the model for a file's full content
///
/// `previous_error` is the failure of the last attempt, so a retry asks for
/// content that avoids it.
#[must_use]
pub fn content_prompt(step: &Step, path: &str, previous_error: Option<&str>) -> String {
    let mut prompt = format!(
        "Write the complete contents of the file `{path}`.\n\
         Task: {}\n\
         Expected outcome: {}\n\
         Respond with the file contents only: no explanations and no markdown fences.",
        step.description, step.expected_outcome
    );
    if let Some(error) = previous_error {
        prompt.push_str("\n\nThe previous attempt was rejected:\n");
        prompt.push_str(error);
        prompt.push_str("\nFix these problems in this attempt.");
    }
    prompt
}

/// Unwrap a reply that is exactly one fenced code block
///
/// Anything else is returned trimmed of surrounding blank lines, fences and
/// all, so content checks can still flag stray fences.
#[must_use]
pub fn unwrap_content(reply: &str) -> String {
    let trimmed = reply.trim();
    let fence_lines = trimmed
        .lines()
        .filter(|line| line.trim_start().starts_with("```"))
        .count();

    if fence_lines == 2 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let body = trimmed
            .split_once('\n')
            .map_or("", |(_, rest)| rest)
            .trim_end()
            .trim_end_matches('`')
            .trim_end_matches(['\r', '\n']);
        let mut content = body.to_string();
        content.push('\n');
        return content;
    }

    let mut content = trimmed.to_string();
    content.push('\n');
    content
}
