//! Prompt templates sent to the remote model.

/// Role tags the model may use in a structured analysis, mirroring
/// [`englingo_core::GrammarRole::tag`].
const ROLE_TAGS: &str = "sbj, pred, obj, attr, adv, cmp, oth";

/// Prompt asking for a plain English rendering of `text`.
pub fn translate_to_english(text: &str) -> String {
    format!("Translate to natural English. Return ONLY the English text. Text: \"{text}\"")
}

/// Prompt asking for a compact JSON sentence-component breakdown of `text`.
pub fn analyze_text(text: &str) -> String {
    format!(
        "Analyze this English sentence structure. Break it down into Sentence Components \
(Subject, Predicate, Object, Attribute, Adverbial, Complement, Appositive).
Return JSON with:
- zh: Full Chinese translation.
- s: Array of segments.
For each segment:
- t: The text snippet.
- ty: Component Type ({ROLE_TAGS}).
- lbl: Chinese Component Name (主语, 谓语, 宾语, 定语, 状语, 补语, 同位语).
- pos: Part of Speech in Chinese (名词, 动词, 形容词...).
- zh: Segment translation.

IMPORTANT: Return ONLY valid JSON, no markdown code blocks.

Text: \"{text}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use englingo_core::GrammarRole;

    #[test]
    fn test_translate_prompt_embeds_text() {
        let prompt = translate_to_english("你好");
        assert!(prompt.starts_with("Translate to natural English."));
        assert!(prompt.ends_with("Text: \"你好\""));
    }

    #[test]
    fn test_analyze_prompt_lists_every_role_tag() {
        let prompt = analyze_text("I like tea.");
        for role in GrammarRole::ALL {
            assert!(prompt.contains(role.tag()), "missing tag {}", role.tag());
        }
        assert!(prompt.contains("Text: \"I like tea.\""));
        assert!(prompt.contains("Return ONLY valid JSON"));
    }
}
