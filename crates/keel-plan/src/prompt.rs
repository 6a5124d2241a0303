//! Planning prompt

/// Render the prompt asking the model for a step array
#[must_use]
pub fn planning_prompt(request: &str) -> String {
    format!(
        "Break the following change request into file operations.\n\
         Respond with a single JSON array and nothing else. Each element has:\n\
         - \"step\": 1-based number\n\
         - \"action\": one of \"read\", \"write\", \"run\", \"delete\"\n\
         - \"path\": file path relative to the project root (read/write/delete)\n\
         - \"command\": shell command (run only)\n\
         - \"description\": what the step does\n\
         - \"dependsOn\": array of step numbers that must finish first\n\
         - \"expectedOutcome\": what success looks like\n\
         Never ask a human to act; every step must be executable.\n\n\
         Request:\n{}",
        request.trim()
    )
}
