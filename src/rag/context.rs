//! Prompt construction for grounded chat.

use crate::config::RagPrompts;

/// Build the single-message chat prompt.
///
/// Layout: preamble, the context heading, each retrieved document as a numbered
/// entry followed by a blank line, the literal question, then the closing instruction.
pub fn build_chat_prompt(prompts: &RagPrompts, contexts: &[String], question: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&prompts.preamble);
    prompt.push_str("\n\n");
    prompt.push_str(&prompts.context_heading);
    prompt.push('\n');

    for (i, context) in contexts.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n\n", i + 1, context));
    }

    prompt.push('\n');
    prompt.push_str(&prompts.question_label);
    prompt.push_str(question);
    prompt.push_str("\n\n");
    prompt.push_str(&prompts.closing);

    prompt
}
