use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Upper bound on suggestions returned to the client
const MAX_SUGGESTIONS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a movie recommendation engine. \
Given movies a user liked and watched, suggest movies they have not seen yet. \
Respond with exactly one movie title per line and nothing else.";

/// Completion API abstraction
///
/// One call, one completion. Tests substitute a scripted client; production
/// uses the OpenAI-compatible chat endpoint below.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> AppResult<String>;
}

/// Generates personalized movie recommendations
///
/// Builds a prompt from the caller's taste profile, asks the completion API
/// for titles, and parses the free-text answer into a clean suggestion list.
pub async fn get_recommendations(
    client: &dyn CompletionClient,
    liked: Vec<String>,
    watched: Vec<String>,
) -> AppResult<Vec<String>> {
    if liked.is_empty() && watched.is_empty() {
        return Err(AppError::InvalidInput(
            "Cannot recommend from an empty taste profile".to_string(),
        ));
    }

    let prompt = build_prompt(&liked, &watched);
    let completion = client.complete(SYSTEM_PROMPT, &prompt).await?;
    let suggestions = parse_suggestions(&completion);

    tracing::info!(
        liked = liked.len(),
        watched = watched.len(),
        suggestions = suggestions.len(),
        "Recommendations generated"
    );

    Ok(suggestions)
}

/// Renders the taste profile into the user prompt
fn build_prompt(liked: &[String], watched: &[String]) -> String {
    let mut prompt = String::from("Suggest up to 10 movies for this viewer.\n");

    if !liked.is_empty() {
        prompt.push_str("\nMovies they liked:\n");
        for title in liked {
            prompt.push_str("- ");
            prompt.push_str(title);
            prompt.push('\n');
        }
    }

    if !watched.is_empty() {
        prompt.push_str("\nMovies they already watched (do not suggest these):\n");
        for title in watched {
            prompt.push_str("- ");
            prompt.push_str(title);
            prompt.push('\n');
        }
    }

    prompt
}

/// Parses a one-title-per-line completion into a suggestion list
///
/// Models decorate lines with numbering or bullets despite instructions, so
/// leading list markers are stripped. Duplicates are dropped case-insensitively.
fn parse_suggestions(completion: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut suggestions = Vec::new();

    for line in completion.lines() {
        let title = strip_list_marker(line);

        if title.is_empty() {
            continue;
        }
        if !seen.insert(title.to_lowercase()) {
            continue;
        }

        suggestions.push(title.to_string());
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    suggestions
}

/// Strips a leading "1." / "12)" / "-" / "*" list marker without touching
/// titles that genuinely start with digits ("2001: A Space Odyssey")
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();

    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
        return trimmed;
    }

    trimmed.trim_start_matches(['-', '*']).trim()
}

// OpenAI-compatible chat completion wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
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
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Completion client speaking the OpenAI-compatible chat endpoint
#[derive(Clone)]
pub struct HttpCompletionClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt.to_string(),
                },
            ],
            temperature: 0.8,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        let completion: ChatResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalApi("Completion response had no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedClient {
        completion: String,
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _system: &str, _user: &str) -> AppResult<String> {
            Ok(self.completion.clone())
        }
    }

    #[test]
    fn test_build_prompt_contains_profile() {
        let prompt = build_prompt(
            &["The Matrix".to_string()],
            &["Inception".to_string(), "Heat".to_string()],
        );

        assert!(prompt.contains("- The Matrix"));
        assert!(prompt.contains("- Inception"));
        assert!(prompt.contains("do not suggest these"));
    }

    #[test]
    fn test_parse_suggestions_strips_list_markers() {
        let completion = "1. Blade Runner\n2) Dark City\n- Gattaca\n* Moon\n\nEquilibrium";
        let suggestions = parse_suggestions(completion);
        assert_eq!(
            suggestions,
            vec!["Blade Runner", "Dark City", "Gattaca", "Moon", "Equilibrium"]
        );
    }

    #[test]
    fn test_parse_suggestions_keeps_numeric_titles() {
        let suggestions = parse_suggestions("1. 2001: A Space Odyssey\n300\n2. 12 Angry Men");
        assert_eq!(
            suggestions,
            vec!["2001: A Space Odyssey", "300", "12 Angry Men"]
        );
    }

    #[test]
    fn test_parse_suggestions_dedups_case_insensitively() {
        let suggestions = parse_suggestions("Alien\nalien\nALIEN\nAliens");
        assert_eq!(suggestions, vec!["Alien", "Aliens"]);
    }

    #[test]
    fn test_parse_suggestions_caps_at_limit() {
        let completion = (1..=15)
            .map(|i| format!("Movie {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_suggestions(&completion).len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_recommendations_round_trip() {
        let client = ScriptedClient {
            completion: "1. Blade Runner\n2. Dark City".to_string(),
        };

        let suggestions = get_recommendations(
            &client,
            vec!["The Matrix".to_string()],
            vec![],
        )
        .await
        .unwrap();

        assert_eq!(suggestions, vec!["Blade Runner", "Dark City"]);
    }

    #[tokio::test]
    async fn test_empty_profile_rejected() {
        let client = ScriptedClient {
            completion: String::new(),
        };

        let result = get_recommendations(&client, vec![], vec![]).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
