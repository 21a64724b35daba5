//! Provider configuration, read once at startup and immutable afterwards.

use lorekeeper_domain::ProviderKind;

/// Credentials/endpoints for the configured generation backends.
///
/// A backend with no entry here is excluded: selecting it fails fast with
/// a configuration error instead of a doomed network call.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub grok: Option<ApiKeyConfig>,
    pub chatgpt: Option<ApiKeyConfig>,
    pub ollama: Option<OllamaConfig>,
}

/// A hosted backend reachable with an API key.
#[derive(Debug, Clone)]
pub struct ApiKeyConfig {
    pub api_key: String,
    pub model: String,
}

/// A local Ollama instance (no credential).
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

/// Default Grok model.
pub const DEFAULT_GROK_MODEL: &str = "grok-4-fast-reasoning";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model for Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

impl ProvidersConfig {
    /// Build from environment variables.
    ///
    /// `GROK_API_KEY` and `OPENAI_API_KEY` enable the hosted backends;
    /// placeholder values from a template .env (e.g. `your-grok-key-here`)
    /// count as absent. Ollama is enabled whenever `OLLAMA_BASE_URL` is set.
    pub fn from_env() -> Self {
        let grok = real_credential(std::env::var("GROK_API_KEY").ok()).map(|api_key| {
            ApiKeyConfig {
                api_key,
                model: std::env::var("GROK_MODEL").unwrap_or_else(|_| DEFAULT_GROK_MODEL.into()),
            }
        });
        let chatgpt = real_credential(std::env::var("OPENAI_API_KEY").ok()).map(|api_key| {
            ApiKeyConfig {
                api_key,
                model: std::env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.into()),
            }
        });
        let ollama = std::env::var("OLLAMA_BASE_URL").ok().map(|base_url| OllamaConfig {
            base_url,
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.into()),
        });

        Self {
            grok,
            chatgpt,
            ollama,
        }
    }

    /// The backends usable with this configuration.
    pub fn configured(&self) -> Vec<ProviderKind> {
        let mut kinds = Vec::new();
        if self.grok.is_some() {
            kinds.push(ProviderKind::Grok);
        }
        if self.chatgpt.is_some() {
            kinds.push(ProviderKind::ChatGpt);
        }
        if self.ollama.is_some() {
            kinds.push(ProviderKind::Ollama);
        }
        kinds
    }
}

/// Filters out unset and template-placeholder credentials.
fn real_credential(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && !(v.starts_with("your-") && v.ends_with("-here"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_credentials_count_as_absent() {
        assert_eq!(real_credential(Some("your-grok-key-here".into())), None);
        assert_eq!(real_credential(Some("   ".into())), None);
        assert_eq!(real_credential(None), None);
        assert_eq!(
            real_credential(Some("xai-abc123".into())),
            Some("xai-abc123".into())
        );
    }

    #[test]
    fn configured_lists_present_backends() {
        let config = ProvidersConfig {
            grok: Some(ApiKeyConfig {
                api_key: "k".into(),
                model: DEFAULT_GROK_MODEL.into(),
            }),
            chatgpt: None,
            ollama: Some(OllamaConfig {
                base_url: DEFAULT_OLLAMA_BASE_URL.into(),
                model: DEFAULT_OLLAMA_MODEL.into(),
            }),
        };
        assert_eq!(
            config.configured(),
            vec![ProviderKind::Grok, ProviderKind::Ollama]
        );
    }
}
