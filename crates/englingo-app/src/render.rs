//! Plain-text rendering of turns and analyses for the terminal.

use chrono::Local;
use englingo_core::{Analysis, Speaker, Turn};

const DIVIDER: &str = "──────────── new topic ────────────";

/// One line for a turn: time, speaker and text.
pub fn render_turn(turn: &Turn) -> String {
    if turn.is_divider() {
        return DIVIDER.to_string();
    }
    let time = turn.created_at.to_datetime().with_timezone(&Local).format("%H:%M");
    let who = match turn.speaker {
        Speaker::User => "you",
        Speaker::Assistant => "tutor",
        Speaker::System => "system",
    };
    format!("[{time}] {who}> {}", turn.text)
}

/// Indented breakdown: full translation, then one line per segment.
pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = format!("    译: {}", analysis.translation);
    for segment in &analysis.segments {
        out.push_str(&format!(
            "\n    - {:<24} {:<10} {}",
            segment.text,
            segment.role.to_string(),
            segment.label
        ));
        if !segment.part_of_speech.is_empty() {
            out.push_str(&format!(" ({})", segment.part_of_speech));
        }
        if !segment.translation.is_empty() {
            out.push_str(&format!(" = {}", segment.translation));
        }
    }
    out
}

/// Turns with their analyses, or a pending marker where none has arrived.
pub fn render_topic(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(nothing in this topic yet)".to_string();
    }
    turns
        .iter()
        .map(|turn| {
            let head = render_turn(turn);
            match &turn.analysis {
                Some(analysis) => format!("{head}\n{}", render_analysis(analysis)),
                None if turn.is_divider() => head,
                None => format!("{head}\n    (analysis pending)"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
