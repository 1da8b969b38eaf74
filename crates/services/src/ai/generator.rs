use std::env;

use assess_core::model::{Domain, QuestionDraft};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::GeneratorError;

/// Produces unvalidated question candidates for a domain.
#[async_trait::async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Ask for up to `count` drafts tagged with `domain`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the backend is unavailable or its reply unusable.
    async fn generate_questions(
        &self,
        domain: Domain,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError>;
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    /// `None` when `ASSESS_AI_API_KEY` is unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("ASSESS_AI_API_KEY")?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            lookup("ASSESS_AI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into());
        let model = lookup("ASSESS_AI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Chat-completions client that asks a language model for quiz questions.
#[derive(Clone)]
pub struct AiQuestionGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl AiQuestionGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for AiQuestionGenerator {
    async fn generate_questions(
        &self,
        domain: Domain,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(domain, count),
            }],
            temperature: 0.8,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        parse_drafts(&content)
    }
}

fn build_prompt(domain: Domain, count: usize) -> String {
    let domain = domain.as_str();
    format!(
        "You are a quiz question generator. Generate {count} unique multiple-choice questions \
         for a career assessment quiz in the {domain} domain.\n\
         Each question needs a question_text, four options (option_1 to option_4), \
         correct_answer (1, 2, 3 or 4), domain \"{domain}\" and difficulty \
         (easy, medium or hard), with a mix of difficulties.\n\
         Return ONLY a JSON array of objects with exactly these keys: \
         question_text, option_1, option_2, option_3, option_4, correct_answer, domain, difficulty.\n\
         Make questions practical and relevant to real-world {domain} work."
    )
}

/// Parse a model reply into drafts.
///
/// Tolerates a surrounding markdown code fence. Array elements that do not
/// deserialize are skipped so one bad entry does not sink the batch.
pub(crate) fn parse_drafts(content: &str) -> Result<Vec<QuestionDraft>, GeneratorError> {
    let items: Vec<Value> = serde_json::from_str(strip_code_fence(content))?;
    let total = items.len();
    let drafts: Vec<QuestionDraft> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if drafts.len() < total {
        debug!(
            skipped = total - drafts.len(),
            "ignored malformed generated questions"
        );
    }
    Ok(drafts)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"[
        {
            "question_text": "What does CI stand for?",
            "option_1": "Continuous Integration",
            "option_2": "Code Inspection",
            "option_3": "Compiled Interface",
            "option_4": "Central Index",
            "correct_answer": 1,
            "domain": "programmer",
            "difficulty": "easy"
        },
        { "question_text": "Broken", "correct_answer": "two" }
    ]"#;

    #[test]
    fn parses_plain_array_and_skips_malformed_items() {
        let drafts = parse_drafts(REPLY).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].correct_option, 1);
        assert_eq!(drafts[0].domain, "programmer");
    }

    #[test]
    fn parses_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert_eq!(parse_drafts(&fenced).unwrap().len(), 1);

        let bare_fence = format!("```\n{REPLY}```");
        assert_eq!(parse_drafts(&bare_fence).unwrap().len(), 1);
    }

    #[test]
    fn non_array_reply_is_a_parse_error() {
        let err = parse_drafts("Sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)));
    }

    #[test]
    fn missing_key_disables_generator() {
        assert!(GeneratorConfig::from_lookup(|_| None).is_none());
        assert!(
            GeneratorConfig::from_lookup(|key| (key == "ASSESS_AI_API_KEY").then(|| "  ".into()))
                .is_none()
        );
        let config =
            GeneratorConfig::from_lookup(|key| (key == "ASSESS_AI_API_KEY").then(|| "k".into()))
                .unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn disabled_generator_reports_disabled() {
        let generator = AiQuestionGenerator::new(None);
        assert!(!generator.enabled());
        let err = generator
            .generate_questions(Domain::Tester, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
    }
}
