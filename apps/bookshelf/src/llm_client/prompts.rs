// Prompt text for the generation backend.

/// Instruction prefixed to every piece of content sent for summarization.
pub const SUMMARY_INSTRUCTION: &str =
    "Please provide a concise summary of the following text:";

pub fn summary_prompt(content: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_layout() {
        assert_eq!(
            summary_prompt("A long book text..."),
            "Please provide a concise summary of the following text:\n\nA long book text..."
        );
    }
}
