use std::time::Duration;

use reqwest::Client;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

const SYSTEM_PROMPT: &str = "You help people develop their ideas. Be creative, practical and \
     encouraging. Turn a short note into a concrete plan of action. Use markdown \
     formatting and answer in the language of the note.";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no API key configured")]
    MissingKey,

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no text in API response")]
    Empty,
}

/// Result of expanding a note. `warning` is set when the text is the
/// offline fallback rather than a model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub content: String,
    pub warning: Option<String>,
}

impl Expansion {
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl AiClient {
    pub fn new(api_key: Option<String>, model: &str, timeout: Duration) -> Result<Self, AiError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: if model.is_empty() { DEFAULT_MODEL.to_string() } else { model.to_string() },
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Expand a note. Never fails: on any error the canned expansion is
    /// returned with the error as a warning.
    pub async fn expand_note(&self, title: &str, content: &str) -> Expansion {
        match self.request_expansion(title, content).await {
            Ok(text) => Expansion { content: text, warning: None },
            Err(e) => {
                log::warn!("AI expansion unavailable, using fallback: {}", e);
                Expansion {
                    content: fallback_expansion(title, content),
                    warning: Some(e.to_string()),
                }
            }
        }
    }

    async fn request_expansion(&self, title: &str, content: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingKey)?;

        let user_msg = format!(
            "Develop this idea in a practical, inspiring way.\n\nTitle: \"{}\"\nContent: \"{}\"\n\n\
             Suggest directions to explore, actions to take, questions to consider, \
             links to other areas of life and next steps. At most 500 words.",
            title,
            // Cap body to keep the request small
            content.chars().take(4000).collect::<String>(),
        );

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 800,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": user_msg }
            ]
        });

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Api { status, message });
        }

        let api_resp: serde_json::Value = resp.json().await?;

        // Text of the first content block
        let text = api_resp["content"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|block| block["text"].as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AiError::Empty)?;

        Ok(text.to_string())
    }
}

fn fallback_expansion(title: &str, content: &str) -> String {
    format!(
        "💡 **Developing the idea: \"{title}\"**\n\n\
         🌟 **Core thought:** {content}\n\n\
         🔍 **Possible directions:**\n\
         • **In practice:** how could you use this idea day to day?\n\
         • **Connections:** does it tie into your other projects or ideas?\n\
         • **Next steps:** what small action could you take today?\n\
         • **Resources:** what do you need to make it happen?\n\n\
         📝 **Concrete actions:**\n\
         • Do some quick research on the topic\n\
         • Talk to someone with experience in the area\n\
         • Start with the smallest possible step\n\
         • Set aside regular time to develop the idea\n\n\
         *⚠️ This is an offline answer. Check the AI settings or API key.*"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_falls_back() {
        let client = AiClient::new(None, "", Duration::from_secs(1)).unwrap();
        assert!(!client.has_key());
        let out = client.expand_note("Garden", "grow tomatoes").await;
        assert!(out.is_fallback());
        assert!(out.content.contains("grow tomatoes"));
        assert_eq!(out.warning.as_deref(), Some("no API key configured"));
    }
}
