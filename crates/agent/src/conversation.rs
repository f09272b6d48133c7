//! Rendering of caller-supplied conversation history into the bounded
//! context block the generator prompt carries. The assistant itself keeps
//! no dialogue state; whatever the caller does not pass in does not exist.

use licibot_core::domain::conversation::ConversationTurn;

#[derive(Clone, Copy, Debug)]
pub struct ContextWindow {
    max_turns: usize,
    char_budget: usize,
}

impl ContextWindow {
    pub fn new(max_turns: usize, char_budget: usize) -> Self {
        Self { max_turns, char_budget }
    }

    /// Render the most recent turns, oldest first, dropping whole turns
    /// from the oldest end once the character budget is exceeded.
    pub fn render(&self, history: &[ConversationTurn]) -> String {
        if self.max_turns == 0 || history.is_empty() {
            return String::new();
        }

        let recent = &history[history.len().saturating_sub(self.max_turns)..];

        let mut kept: Vec<String> = Vec::with_capacity(recent.len());
        let mut used = 0usize;
        for turn in recent.iter().rev() {
            let rendered = render_turn(turn);
            if used + rendered.len() > self.char_budget && !kept.is_empty() {
                break;
            }
            used += rendered.len();
            kept.push(rendered);
            if used >= self.char_budget {
                break;
            }
        }

        kept.reverse();
        kept.join("\n")
    }
}

fn render_turn(turn: &ConversationTurn) -> String {
    let mut lines = format!("Usuario: {}", truncate(&turn.message, 200));
    if let Some(sql) = &turn.sql_used {
        lines.push_str(&format!("\nSQL: {}", truncate(sql, 200)));
    }
    lines.push_str(&format!("\nRespuesta: {}", truncate(&turn.summary, 200)));
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}…")
}
