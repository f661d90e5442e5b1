//! Prompt composition: pure string rendering, no I/O.
//!
//! Two prompt shapes exist:
//! - the **answer prompt** used by the pipeline: system instruction, then
//!   the transcript of prior turns, then the new user message;
//! - the **structured retrieval prompt**: four labeled lines carrying the
//!   retrieved domain knowledge, the database schema, the retrieved
//!   instruction and the caller's query.

use ragchat_core::message::History;

/// Render a History as `"<Role>: <content>\n"` lines in chronological order.
///
/// An empty History renders as the empty string.
pub fn render_transcript(history: &History) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str(turn.role().label());
        out.push_str(": ");
        out.push_str(turn.content());
        out.push('\n');
    }
    out
}

/// Build the prompt the model answers.
///
/// ```text
/// {system}\n\n{transcript}User: {user_message}\n\nAssistant:
/// ```
pub fn answer_prompt(system: &str, history: &History, user_message: &str) -> String {
    format!(
        "{system}\n\n{}User: {user_message}\n\nAssistant:",
        render_transcript(history)
    )
}

/// Build the structured retrieval prompt.
///
/// Field content passes through verbatim; the lines are joined with `\n`
/// and carry no trailing newline.
pub fn compose(domain: &str, instruction: &str, schema: &str, query: &str) -> String {
    [
        format!("[Domain]: {domain}"),
        format!("[Schema]: {schema}"),
        format!("[Instruction]: {instruction}"),
        format!("[Query]: {query}"),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_renders_empty() {
        assert_eq!(render_transcript(&History::new()), "");
    }

    #[test]
    fn one_exchange_renders_two_lines() {
        let history = History::new().with_exchange("hi", "hello there");
        assert_eq!(render_transcript(&history), "User: hi\nAssistant: hello there\n");
    }

    #[test]
    fn transcript_keeps_chronological_order() {
        let history = History::new()
            .with_exchange("one", "1")
            .with_exchange("two", "2");
        assert_eq!(
            render_transcript(&history),
            "User: one\nAssistant: 1\nUser: two\nAssistant: 2\n"
        );
    }

    #[test]
    fn answer_prompt_layout_without_history() {
        let prompt = answer_prompt("You are a helpful AI assistant.", &History::new(), "hi");
        assert_eq!(
            prompt,
            "You are a helpful AI assistant.\n\nUser: hi\n\nAssistant:"
        );
    }

    #[test]
    fn answer_prompt_layout_with_history() {
        let history = History::new().with_exchange("hi", "hello");
        let prompt = answer_prompt("Be brief.", &history, "again");
        assert_eq!(
            prompt,
            "Be brief.\n\nUser: hi\nAssistant: hello\nUser: again\n\nAssistant:"
        );
    }

    #[test]
    fn compose_matches_literal_layout() {
        let prompt = compose(
            "Orders ship in two days",
            "Write one SELECT statement",
            "orders(id integer, shipped_at date)",
            "How many orders shipped?",
        );
        assert_eq!(
            prompt,
            "[Domain]: Orders ship in two days\n\
             [Schema]: orders(id integer, shipped_at date)\n\
             [Instruction]: Write one SELECT statement\n\
             [Query]: How many orders shipped?"
        );
    }

    #[test]
    fn compose_is_verbatim_and_deterministic() {
        let a = compose("line1\nline2", "  spaced  ", "", "{braces}");
        let b = compose("line1\nline2", "  spaced  ", "", "{braces}");
        assert_eq!(a, b);
        assert!(a.contains("[Domain]: line1\nline2\n"));
        assert!(a.contains("[Schema]: \n"));
        assert!(a.contains("[Instruction]:   spaced  \n"));
        assert!(a.ends_with("[Query]: {braces}"));
    }
}
