//! Analysis engine: structured grammatical breakdown of a sentence.
//!
//! The model is asked for a compact JSON document. Anything that does not
//! parse into that shape is absorbed into [`Analysis::degraded`] here, so
//! callers only ever see configuration or transport failures.

use async_trait::async_trait;
use englingo_core::{Analysis, GrammarRole, Segment};
use serde::Deserialize;

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::ChatError;
use crate::prompts;

/// Low temperature keeps the structured output stable.
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Produces a grammatical breakdown of one sentence.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Analyze `text`.
    ///
    /// Never fails on a malformed model response; that case yields
    /// [`Analysis::degraded`]. Errors are configuration or transport only.
    async fn analyze(&self, text: &str) -> Result<Analysis, ChatError>;
}

/// [`AnalysisEngine`] backed by the remote completion endpoint.
#[derive(Debug, Clone)]
pub struct RemoteAnalyzer {
    client: CompletionClient,
}

impl RemoteAnalyzer {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisEngine for RemoteAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Analysis, ChatError> {
        let request = CompletionRequest::prompt(prompts::analyze_text(text))
            .with_temperature(ANALYSIS_TEMPERATURE);
        let reply = self.client.complete(&request).await?;
        Ok(parse_analysis(&reply, text))
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Deserialize)]
struct WireAnalysis {
    zh: String,
    s: Vec<WireSegment>,
}

#[derive(Deserialize)]
struct WireSegment {
    t: String,
    ty: String,
    lbl: String,
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    zh: Option<String>,
}

/// Parse a model reply into an [`Analysis`], degrading on any failure.
pub fn parse_analysis(raw: &str, source: &str) -> Analysis {
    match try_parse_analysis(raw) {
        Ok(analysis) => analysis,
        Err(reason) => {
            tracing::warn!(reason = %reason, "Failed to parse analysis response, degrading");
            Analysis::degraded(source)
        }
    }
}

fn try_parse_analysis(raw: &str) -> Result<Analysis, String> {
    let cleaned = strip_code_fences(raw);
    let wire: WireAnalysis = serde_json::from_str(cleaned).map_err(|e| e.to_string())?;
    if wire.s.is_empty() {
        return Err("analysis has no segments".to_string());
    }

    let segments = wire
        .s
        .into_iter()
        .map(|seg| {
            let role = GrammarRole::from_tag(seg.ty.trim())
                .ok_or_else(|| format!("unknown grammar tag: {}", seg.ty))?;
            Ok(Segment {
                text: seg.t,
                role,
                label: seg.lbl,
                part_of_speech: seg.pos.unwrap_or_default(),
                translation: seg.zh.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Analysis {
        translation: wire.zh,
        segments,
    })
}

/// Remove a surrounding Markdown code fence (optionally tagged `json`).
pub fn strip_code_fences(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use englingo_core::config::{AiConfig, SharedAiConfig};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GOOD: &str = r#"{
        "zh": "我喜欢茶。",
        "s": [
            { "t": "I", "ty": "sbj", "lbl": "主语", "pos": "代词", "zh": "我" },
            { "t": "like", "ty": "pred", "lbl": "谓语", "pos": "动词", "zh": "喜欢" },
            { "t": "tea", "ty": "obj", "lbl": "宾语" }
        ]
    }"#;

    // ---- Fence stripping ----

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
        assert_eq!(strip_code_fences("{}```"), "{}");
    }

    // ---- Parsing ----

    #[test]
    fn test_parse_well_formed() {
        let analysis = parse_analysis(GOOD, "I like tea");
        assert_eq!(analysis.translation, "我喜欢茶。");
        assert_eq!(analysis.segments.len(), 3);
        assert_eq!(analysis.segments[0].role, GrammarRole::Subject);
        assert_eq!(analysis.segments[0].part_of_speech, "代词");
        assert_eq!(analysis.segments[1].role, GrammarRole::Predicate);
        assert_eq!(analysis.segments[1].translation, "喜欢");
        // Optional keys default to empty.
        assert_eq!(analysis.segments[2].part_of_speech, "");
        assert_eq!(analysis.segments[2].translation, "");
        assert!(!analysis.is_degraded());
    }

    #[test]
    fn test_parse_fenced() {
        let fenced = format!("```json\n{GOOD}\n```");
        let analysis = parse_analysis(&fenced, "I like tea");
        assert_eq!(analysis.segments.len(), 3);
    }

    #[test]
    fn test_parse_non_json_degrades() {
        let analysis = parse_analysis("Sure! Here is the analysis you asked for.", "I like tea");
        assert!(analysis.is_degraded());
        assert_eq!(analysis.segments.len(), 1);
        assert_eq!(analysis.segments[0].text, "I like tea");
        assert_eq!(analysis.segments[0].role, GrammarRole::Other);
    }

    #[test]
    fn test_parse_unknown_tag_degrades() {
        let raw = r#"{"zh":"x","s":[{"t":"I","ty":"noun","lbl":"?"}]}"#;
        assert!(parse_analysis(raw, "I").is_degraded());
    }

    #[test]
    fn test_parse_missing_required_key_degrades() {
        let raw = r#"{"s":[{"t":"I","ty":"sbj","lbl":"主语"}]}"#;
        assert!(parse_analysis(raw, "I").is_degraded());
    }

    #[test]
    fn test_parse_empty_segments_degrades() {
        let raw = r#"{"zh":"x","s":[]}"#;
        assert!(parse_analysis(raw, "I").is_degraded());
    }

    #[test]
    fn test_parse_empty_reply_degrades() {
        let analysis = parse_analysis("", "Hello there");
        assert!(analysis.is_degraded());
        assert_eq!(analysis.segments[0].text, "Hello there");
    }

    // ---- Remote ----

    #[tokio::test]
    async fn test_remote_analyzer_uses_low_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "temperature": 0.1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": GOOD } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(CompletionClient::new(SharedAiConfig::new(AiConfig {
            base_url: server.uri(),
            api_key: "sk-test".to_string(),
            ..AiConfig::default()
        })));
        let analysis = analyzer.analyze("I like tea").await.unwrap();
        assert_eq!(analysis.segments.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_analyzer_malformed_reply_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "{ not json" } }]
            })))
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(CompletionClient::new(SharedAiConfig::new(AiConfig {
            base_url: server.uri(),
            api_key: "sk-test".to_string(),
            ..AiConfig::default()
        })));
        let analysis = analyzer.analyze("Good morning").await.unwrap();
        assert!(analysis.is_degraded());
        assert_eq!(analysis.segments[0].text, "Good morning");
    }

    #[tokio::test]
    async fn test_remote_analyzer_transport_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(CompletionClient::new(SharedAiConfig::new(AiConfig {
            base_url: server.uri(),
            api_key: "sk-test".to_string(),
            ..AiConfig::default()
        })));
        let err = analyzer.analyze("Good morning").await.unwrap_err();
        assert!(err.is_transport());
    }
}
