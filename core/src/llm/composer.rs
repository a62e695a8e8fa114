use crate::config::LlmConfig;
use crate::health::HealthState;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::client::{GeminiClient, TextGenerator};

/// Replies longer than this many characters are cut and get an ellipsis appended.
pub const MAX_REPLY_CHARS: usize = 30;

/// Spoken instead of a generated reply whenever generation fails.
pub const FALLBACK_REPLY: &str = "ごめんね、今ちょっと考え中なの...";

const ELLIPSIS: &str = "...";

/// Reply text plus whether it came from the fallback path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub fallback_used: bool,
}

impl Reply {
    fn fallback() -> Self {
        Self {
            text: FALLBACK_REPLY.to_string(),
            fallback_used: true,
        }
    }
}

/// Builds the medaka persona prompt and turns model output into a short reply
#[derive(Clone)]
pub struct ReplyComposer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ReplyComposer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Gemini-backed composer; degrades to fallback-only when no credential is configured
    pub fn from_config(cfg: LlmConfig) -> Self {
        let generator = match GeminiClient::new(cfg) {
            Ok(client) => {
                info!(target: "reply", model = client.model(), "Gemini text generation enabled");
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            Err(e) => {
                warn!(target: "reply", error = %e, "Text generation disabled; replies will use the fallback");
                None
            }
        };
        Self::new(generator)
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Never fails: generation errors are logged and replaced with `FALLBACK_REPLY`.
    pub async fn compose(&self, user_input: &str, health: HealthState) -> Reply {
        let Some(generator) = &self.generator else {
            warn!(target: "reply", "No text generator configured; using fallback reply");
            return Reply::fallback();
        };

        let prompt = build_prompt(user_input, health);
        let start = Instant::now();
        match generator.generate(&prompt).await {
            Ok(raw) => {
                info!(
                    target: "reply",
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Gemini reply generated"
                );
                Reply {
                    text: truncate_reply(&raw),
                    fallback_used: false,
                }
            }
            Err(e) => {
                warn!(
                    target: "reply",
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Generation failed; using fallback reply"
                );
                Reply::fallback()
            }
        }
    }
}

/// Trim, then cut to `MAX_REPLY_CHARS` characters with `...` appended when longer.
pub fn truncate_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_REPLY_CHARS {
        let mut out: String = trimmed.chars().take(MAX_REPLY_CHARS).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        trimmed.to_string()
    }
}

fn mood_label(health: HealthState) -> &'static str {
    match health {
        HealthState::Active => "元気な時",
        HealthState::Normal => "普通の時",
        HealthState::Lethargic => "元気ない時",
    }
}

/// Persona prompt for キンちゃん with the user's text embedded verbatim
pub fn build_prompt(user_input: &str, health: HealthState) -> String {
    format!(
        r#"
あなたは水槽に住むかわいいメダカ「キンちゃん」です。
ユーザーの質問: 「{user_input}」
今のあなたの様子: {mood}

以下のルールに従って返答してください：
- ユーザーの質問にきちんと答えることを最優先にする
- あなたはメダカです
- {max}文字以内で簡潔に話してください
- 口調は優しく、小学1年生らしく話す
- 絵文字は使わないでください
- たまにちょっとズレた可愛い発言をしてもOK
- 今の様子に合わせた話し方をする

例：
- 元気な時：「わあい！それ知ってるよ〜！」
- 普通の時：「うん、それはね〜」
- 元気ない時：「うーん...そうだね...」
"#,
        mood = mood_label(health),
        max = MAX_REPLY_CHARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MedakaError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned(Result<String>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(MedakaError::GenerationError(e.to_string())),
            }
        }
    }

    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl TextGenerator for Recording {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.0.lock().unwrap().push(prompt.to_string());
            Ok("うん、それはね〜".into())
        }
    }

    #[test]
    fn short_replies_are_only_trimmed() {
        assert_eq!(truncate_reply("  わあい！  \n"), "わあい！");
        let exact = "あ".repeat(MAX_REPLY_CHARS);
        assert_eq!(truncate_reply(&exact), exact);
    }

    #[test]
    fn long_replies_are_cut_by_chars_with_ellipsis() {
        let long = "お".repeat(45);
        let out = truncate_reply(&long);
        assert_eq!(out.chars().count(), MAX_REPLY_CHARS + 3);
        assert!(out.ends_with("..."));
        assert!(out.starts_with(&"お".repeat(MAX_REPLY_CHARS)));
    }

    #[test]
    fn reply_length_never_exceeds_bound() {
        for n in 0..80 {
            let out = truncate_reply(&"x".repeat(n));
            let len = out.chars().count();
            if n > MAX_REPLY_CHARS {
                assert_eq!(len, 33);
            } else {
                assert_eq!(len, n);
            }
        }
    }

    #[test]
    fn prompt_embeds_input_and_mood() {
        let p = build_prompt("メダカは何を食べるの？", HealthState::Lethargic);
        assert!(p.contains("「メダカは何を食べるの？」"));
        assert!(p.contains("今のあなたの様子: 元気ない時"));
        assert!(p.contains("30文字以内"));
    }

    #[tokio::test]
    async fn compose_truncates_model_output() {
        let composer = ReplyComposer::new(Some(Arc::new(Canned(Ok(format!(
            "  {}  ",
            "た".repeat(40)
        ))))));
        let reply = composer.compose("hi", HealthState::Normal).await;
        assert!(!reply.fallback_used);
        assert_eq!(reply.text.chars().count(), 33);
    }

    #[tokio::test]
    async fn compose_falls_back_on_error() {
        let composer = ReplyComposer::new(Some(Arc::new(Canned(Err(
            MedakaError::GenerationError("quota".into()),
        )))));
        let reply = composer.compose("hi", HealthState::Active).await;
        assert_eq!(reply, Reply::fallback());
    }

    #[tokio::test]
    async fn compose_without_generator_uses_fallback() {
        let composer = ReplyComposer::new(None);
        assert!(!composer.is_enabled());
        let reply = composer.compose("hi", HealthState::Normal).await;
        assert!(reply.fallback_used);
        assert_eq!(reply.text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn compose_passes_health_into_prompt() {
        let rec = Arc::new(Recording(Mutex::new(Vec::new())));
        let composer = ReplyComposer::new(Some(rec.clone() as Arc<dyn TextGenerator>));
        composer.compose("こんにちは", HealthState::Active).await;
        let prompts = rec.0.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("今のあなたの様子: 元気な時"));
        assert!(prompts[0].contains("「こんにちは」"));
    }
}
