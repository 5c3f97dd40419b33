//! AI writing helpers: hashtags, sentiment, toxicity, translation and image captions.
//!
//! Model access goes through an [`AiProvider`]. The service is built once at
//! start-up and shared through the application state. Provider failures never
//! fail a request; each helper degrades to a neutral answer instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use universe_common::{AppError, AppResult, config::{AiConfig, AiProviderKind}};

/// Characters of input considered by the text helpers.
const MAX_INPUT_CHARS: usize = 500;

/// Hashtags returned per suggestion.
const MAX_HASHTAGS: usize = 5;

/// Default summary length in characters.
pub const DEFAULT_SUMMARY_LENGTH: usize = 100;

/// Default translation target.
pub const DEFAULT_TARGET_LANG: &str = "en";

const STOP_WORDS: &[&str] = &["the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for"];

/// Sentiment classification of a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// `POSITIVE` or `NEGATIVE`
    pub label: String,
    /// Confidence between 0 and 1
    pub score: f64,
}

/// Toxicity classification of a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toxicity {
    pub is_toxic: bool,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for Toxicity {
    fn default() -> Self {
        Self {
            is_toxic: false,
            score: 0.0,
            label: None,
        }
    }
}

/// Writing suggestions for a draft.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    pub hashtags: Vec<String>,
    pub sentiment: Option<Sentiment>,
    pub toxicity: Toxicity,
}

/// Result of a translation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Backend that performs the actual inference.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Describe the image at `image_url`.
    async fn caption_image(&self, image_url: &str) -> AppResult<Option<String>>;

    /// Classify the sentiment of `text`.
    async fn sentiment(&self, text: &str) -> AppResult<Option<Sentiment>>;

    /// Score `text` for toxic content.
    async fn toxicity(&self, text: &str) -> AppResult<Toxicity>;

    /// Detect the language of `text` as an ISO 639-1 code.
    async fn detect_language(&self, text: &str) -> AppResult<String>;

    /// Translate `text` into `target_lang`.
    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String>;
}

/// In-process provider built on word lists and character ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAiProvider;

const POSITIVE_WORDS: &[&str] = &[
    "love", "loved", "great", "good", "happy", "amazing", "awesome", "beautiful", "best",
    "excellent", "fantastic", "fun", "glad", "nice", "wonderful", "excited", "thanks", "enjoy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "hated", "bad", "sad", "awful", "terrible", "worst", "angry", "boring", "ugly",
    "horrible", "annoying", "disappointed", "upset", "poor", "broken", "wrong", "sick",
];

const TOXIC_WORDS: &[&str] = &[
    "idiot", "stupid", "moron", "dumb", "loser", "trash", "shut up", "kill yourself", "scum",
];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn caption_image(&self, _image_url: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn sentiment(&self, text: &str) -> AppResult<Option<Sentiment>> {
        let (mut positive, mut negative) = (0_u32, 0_u32);
        for word in words(text) {
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 {
            return Ok(Some(Sentiment {
                label: "POSITIVE".to_string(),
                score: 0.5,
            }));
        }

        let (label, hits) = if positive >= negative {
            ("POSITIVE", positive)
        } else {
            ("NEGATIVE", negative)
        };
        Ok(Some(Sentiment {
            label: label.to_string(),
            score: f64::from(hits) / f64::from(total),
        }))
    }

    async fn toxicity(&self, text: &str) -> AppResult<Toxicity> {
        let lowered = text.to_lowercase();
        let hits = TOXIC_WORDS.iter().filter(|w| lowered.contains(*w)).count();
        if hits == 0 {
            return Ok(Toxicity {
                is_toxic: false,
                score: 0.0,
                label: Some("non-toxic".to_string()),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let score = (0.6 + 0.2 * hits as f64).min(1.0);
        Ok(Toxicity {
            is_toxic: true,
            score,
            label: Some("toxic".to_string()),
        })
    }

    async fn detect_language(&self, text: &str) -> AppResult<String> {
        let mut counts = [(0_usize, "ja"), (0, "ko"), (0, "zh"), (0, "en"), (0, "ru"), (0, "ar")];

        for c in text.chars() {
            let slot = match c {
                '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => 0,
                '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' => 1,
                '\u{4E00}'..='\u{9FFF}' => 2,
                'A'..='Z' | 'a'..='z' => 3,
                '\u{0400}'..='\u{04FF}' => 4,
                '\u{0600}'..='\u{06FF}' => 5,
                _ => continue,
            };
            counts[slot].0 += 1;
        }

        // Kana anywhere means Japanese even when kanji dominate.
        if counts[0].0 > 0 {
            return Ok("ja".to_string());
        }

        counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .max_by_key(|(n, _)| *n)
            .map(|(_, lang)| (*lang).to_string())
            .ok_or_else(|| AppError::BadRequest("Cannot detect language".to_string()))
    }

    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
        let source = self.detect_language(text).await?;
        if source.eq_ignore_ascii_case(target_lang) {
            return Ok(text.to_string());
        }
        Err(AppError::ExternalService(
            "No local translation model for this language pair".to_string(),
        ))
    }
}

/// Provider backed by a remote model-serving endpoint.
///
/// Expects `POST {endpoint}/{caption,sentiment,toxicity,detect,translate}`
/// accepting and returning JSON.
#[derive(Clone)]
pub struct HttpAiProvider {
    endpoint: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct CaptionResponse {
    caption: Option<String>,
}

#[derive(Deserialize)]
struct DetectResponse {
    language: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

impl HttpAiProvider {
    /// Create a provider for `endpoint`.
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build AI client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            http_client,
        })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> AppResult<T> {
        let mut request = self
            .http_client
            .post(format!("{}/{path}", self.endpoint))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("AI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "AI endpoint error: {status} - {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid AI response: {e}")))
    }
}

#[async_trait]
impl AiProvider for HttpAiProvider {
    async fn caption_image(&self, image_url: &str) -> AppResult<Option<String>> {
        let response: CaptionResponse = self
            .call("caption", serde_json::json!({ "image_url": image_url }))
            .await?;
        Ok(response.caption.filter(|c| !c.trim().is_empty()))
    }

    async fn sentiment(&self, text: &str) -> AppResult<Option<Sentiment>> {
        self.call("sentiment", serde_json::json!({ "text": text }))
            .await
    }

    async fn toxicity(&self, text: &str) -> AppResult<Toxicity> {
        let mut toxicity: Toxicity = self
            .call("toxicity", serde_json::json!({ "text": text }))
            .await?;
        if let Some(label) = &toxicity.label {
            toxicity.is_toxic = label == "toxic";
        }
        Ok(toxicity)
    }

    async fn detect_language(&self, text: &str) -> AppResult<String> {
        let response: DetectResponse = self
            .call("detect", serde_json::json!({ "text": text }))
            .await?;
        Ok(response.language)
    }

    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
        let response: TranslateResponse = self
            .call(
                "translate",
                serde_json::json!({ "text": text, "target_lang": target_lang }),
            )
            .await?;
        Ok(response.translated_text)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    translation: Translation,
    expires_at: Instant,
}

/// AI helper service.
#[derive(Clone)]
pub struct AiService {
    provider: Arc<dyn AiProvider>,
    cache_ttl: Duration,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl AiService {
    /// Create a service around an explicit provider.
    #[must_use]
    pub fn new(provider: Arc<dyn AiProvider>, cache_ttl: Duration) -> Self {
        Self {
            provider,
            cache_ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build the service selected by configuration.
    pub fn from_config(config: &AiConfig) -> AppResult<Self> {
        let provider: Arc<dyn AiProvider> = match config.provider {
            AiProviderKind::Local => Arc::new(LocalAiProvider),
            AiProviderKind::Http => {
                let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                    AppError::Config("ai.endpoint is required for the http provider".to_string())
                })?;
                Arc::new(HttpAiProvider::new(
                    endpoint,
                    config.api_key.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?)
            }
        };

        tracing::info!(provider = ?config.provider, "AI helpers ready");
        Ok(Self::new(
            provider,
            Duration::from_secs(config.cache_ttl_seconds),
        ))
    }

    /// Hashtag, sentiment and toxicity suggestions for a draft.
    pub async fn suggestions(&self, text: &str) -> AppResult<Suggestions> {
        let text = prepare(text)?;
        tracing::debug!(chars = text.chars().count(), "Analyzing draft");

        let sentiment = self.provider.sentiment(&text).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Sentiment analysis failed");
            None
        });
        let toxicity = self.provider.toxicity(&text).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Toxicity detection failed");
            Toxicity::default()
        });

        Ok(Suggestions {
            hashtags: generate_hashtags(&text),
            sentiment,
            toxicity,
        })
    }

    /// Translate `text`, defaulting to English.
    pub async fn translate(&self, text: &str, target_lang: Option<&str>) -> AppResult<Translation> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("No text provided".to_string()));
        }
        let target_lang = target_lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_TARGET_LANG);

        let key = format!("{target_lang}:{text}");
        if let Some(cached) = self.check_cache(&key).await {
            return Ok(cached);
        }

        let source_lang = self.provider.detect_language(text).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Language detection failed");
            DEFAULT_TARGET_LANG.to_string()
        });

        let translated_text = match self.provider.translate(text, target_lang).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, target = %target_lang, "Translation failed");
                // Fallbacks are not cached so a recovered provider is retried.
                return Ok(Translation {
                    translated_text: text.to_string(),
                    source_lang,
                    target_lang: target_lang.to_string(),
                });
            }
        };

        let translation = Translation {
            translated_text,
            source_lang,
            target_lang: target_lang.to_string(),
        };
        self.store_cache(key, translation.clone()).await;
        Ok(translation)
    }

    /// Caption for an image, if the provider can produce one.
    pub async fn analyze_image(&self, image_url: &str) -> Option<String> {
        match self.provider.caption_image(image_url).await {
            Ok(caption) => caption,
            Err(e) => {
                tracing::warn!(error = %e, "Image captioning failed");
                None
            }
        }
    }

    async fn check_cache(&self, key: &str) -> Option<Translation> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.translation.clone())
    }

    async fn store_cache(&self, key: String, translation: Translation) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CacheEntry {
                translation,
                expires_at: Instant::now() + self.cache_ttl,
            },
        );

        if cache.len() > 1000 {
            let now = Instant::now();
            cache.retain(|_, entry| entry.expires_at > now);
        }
    }
}

fn prepare(text: &str) -> AppResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("No text provided".to_string()));
    }
    Ok(text.chars().take(MAX_INPUT_CHARS).collect())
}

/// Keyword hashtags: distinct lowercase words longer than four characters.
#[must_use]
pub fn generate_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in words(text) {
        if word.chars().count() <= 4 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        let tag = format!("#{word}");
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        if tags.len() == MAX_HASHTAGS {
            break;
        }
    }
    tags
}

/// Leading sentences of `text` that fit within `max_length` characters.
#[must_use]
pub fn summarize(text: &str, max_length: usize) -> String {
    let mut summary = String::new();
    let mut length = 0;
    for sentence in text.split('.').filter(|s| !s.trim().is_empty()) {
        let sentence_len = sentence.chars().count();
        if length + sentence_len >= max_length {
            break;
        }
        summary.push_str(sentence);
        summary.push('.');
        length += sentence_len + 1;
    }
    summary.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl AiProvider for FailingProvider {
        async fn caption_image(&self, _: &str) -> AppResult<Option<String>> {
            Err(AppError::ExternalService("down".to_string()))
        }
        async fn sentiment(&self, _: &str) -> AppResult<Option<Sentiment>> {
            Err(AppError::ExternalService("down".to_string()))
        }
        async fn toxicity(&self, _: &str) -> AppResult<Toxicity> {
            Err(AppError::ExternalService("down".to_string()))
        }
        async fn detect_language(&self, _: &str) -> AppResult<String> {
            Err(AppError::ExternalService("down".to_string()))
        }
        async fn translate(&self, _: &str, _: &str) -> AppResult<String> {
            Err(AppError::ExternalService("down".to_string()))
        }
    }

    fn local() -> AiService {
        AiService::new(Arc::new(LocalAiProvider), Duration::from_secs(60))
    }

    #[test]
    fn test_hashtags_skip_short_words_and_duplicates() {
        let tags = generate_hashtags("Coding coding in Rust, wonderful weather for coding today!");
        assert_eq!(tags, vec!["#coding", "#wonderful", "#weather", "#today"]);
    }

    #[test]
    fn test_hashtags_capped() {
        let tags = generate_hashtags("alpha1 bravo2 charlie delta4 echo55 foxtrot golf77");
        assert_eq!(tags.len(), 5);
        assert!(tags.iter().all(|t| t.starts_with('#')));
    }

    #[test]
    fn test_summarize_keeps_whole_sentences() {
        let text = "First sentence here. Second one follows. A third sentence that will not fit.";
        assert_eq!(summarize(text, 45), "First sentence here. Second one follows.");
        assert_eq!(summarize(text, 10), "");
    }

    #[tokio::test]
    async fn test_suggestions_reject_blank() {
        let result = local().suggestions("   ").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_suggestions_local_sentiment() {
        let s = local()
            .suggestions("I love this amazing sunset, truly wonderful")
            .await
            .unwrap();
        let sentiment = s.sentiment.unwrap();
        assert_eq!(sentiment.label, "POSITIVE");
        assert!(!s.toxicity.is_toxic);
    }

    #[tokio::test]
    async fn test_suggestions_flag_toxicity() {
        let s = local().suggestions("you are a stupid idiot").await.unwrap();
        assert!(s.toxicity.is_toxic);
        assert!(s.toxicity.score > 0.5);
    }

    #[tokio::test]
    async fn test_suggestions_degrade_when_provider_fails() {
        let service = AiService::new(Arc::new(FailingProvider), Duration::ZERO);
        let s = service.suggestions("perfectly ordinary words").await.unwrap();
        assert!(s.sentiment.is_none());
        assert_eq!(s.toxicity, Toxicity::default());
        assert_eq!(s.hashtags, vec!["#perfectly", "#ordinary", "#words"]);
    }

    #[tokio::test]
    async fn test_translate_falls_back_to_original() {
        let service = AiService::new(Arc::new(FailingProvider), Duration::ZERO);
        let t = service.translate("bonjour", Some("de")).await.unwrap();
        assert_eq!(t.translated_text, "bonjour");
        assert_eq!(t.source_lang, "en");
        assert_eq!(t.target_lang, "de");
    }

    #[tokio::test]
    async fn test_translate_defaults_to_english() {
        let t = local().translate("Hello world", None).await.unwrap();
        assert_eq!(t.target_lang, "en");
        assert_eq!(t.source_lang, "en");
        assert_eq!(t.translated_text, "Hello world");
    }

    #[tokio::test]
    async fn test_local_language_detection() {
        let provider = LocalAiProvider;
        assert_eq!(provider.detect_language("こんにちは世界").await.unwrap(), "ja");
        assert_eq!(provider.detect_language("안녕하세요").await.unwrap(), "ko");
        assert_eq!(provider.detect_language("Привет мир").await.unwrap(), "ru");
    }

    #[tokio::test]
    async fn test_analyze_image_failure_is_none() {
        let service = AiService::new(Arc::new(FailingProvider), Duration::ZERO);
        assert!(service.analyze_image("https://example.com/a.png").await.is_none());
    }
}
