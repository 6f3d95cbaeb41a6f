//! AI chat - forwards a prompt to a hosted chat endpoint

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::application::context::BotContext;
use crate::application::errors::{BotError, ClientError, CommandError};
use crate::domain::entities::DispatchContext;
use crate::domain::traits::ParseMode;
use crate::infrastructure::config::AiConfig;
use super::trait_def::CommandHandler;

/// Answers longer than this are cut before sending
pub const MAX_ANSWER_CHARS: usize = 3500;

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Mobile Safari/537.36";

#[derive(Serialize)]
struct AskRequest<'a> {
    message: &'a str,
    model: &'a str,
    history: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct AskResponse {
    text: Option<String>,
}

pub struct AiChatHandler {
    client: HttpClient,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl AiChatHandler {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            client: HttpClient::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
        }
    }

    /// Ask the endpoint a single question with no history
    pub async fn ask(&self, prompt: &str) -> Result<String, ClientError> {
        let request = AskRequest {
            message: prompt,
            model: &self.model,
            history: Vec::new(),
        };

        let response = self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rpc(format!("AI endpoint returned {}: {}", status, body)));
        }

        let body: AskResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Rpc(format!("Could not parse AI response: {}", e)))?;

        body.text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClientError::Rpc("AI returned an empty answer".to_string()))
    }
}

/// Header plus answer, truncated on a char boundary
pub fn format_answer(answer: &str, elapsed: Duration) -> String {
    let mut text = format!("🤖 **AI Response** ({}ms)\n\n", elapsed.as_millis());
    if answer.chars().count() > MAX_ANSWER_CHARS {
        text.extend(answer.chars().take(MAX_ANSWER_CHARS));
        text.push_str("\n\n... *(response truncated)*");
    } else {
        text.push_str(answer);
    }
    text
}

#[async_trait]
impl CommandHandler for AiChatHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let prompt = cmd.text.trim();
        if prompt.is_empty() {
            let usage = format!(
                "🤖 **AI Chat**\n\nUsage: `{p}ai <question>`\n\nExamples:\n`{p}ai What is artificial intelligence?`\n`{p}ai Write a simple HTML page`",
                p = ctx.prefix
            );
            ctx.reply_markdown(cmd, &usage).await?;
            return Ok(());
        }

        let processing = ctx.reply_markdown(cmd, "⏳ *Processing your question...*").await?;
        let start = Instant::now();

        match self.ask(prompt).await {
            Ok(answer) => {
                let text = format_answer(&answer, start.elapsed());
                ctx.client
                    .edit_text(cmd.peer(), processing, &text, ParseMode::Markdown)
                    .await?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("AI request failed: {}", e);
                let text = format!("❌ **AI Error**\n\n{}\n\nPlease try again shortly.", e);
                ctx.reply_markdown(cmd, &text).await?;
                Err(CommandError::ExecutionFailed(e.to_string()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::domain::entities::{Chat, InboundEvent, Sender};
    use crate::infrastructure::adapters::MemoryClient;
    use crate::plugins::testing::{context, invocation, OWNER};

    #[test]
    fn test_long_answer_truncated() {
        let answer = "é".repeat(MAX_ANSWER_CHARS + 10);
        let text = format_answer(&answer, Duration::from_millis(12));
        assert!(text.starts_with("🤖 **AI Response** (12ms)\n\n"));
        assert!(text.ends_with("*(response truncated)*"));
        assert_eq!(text.matches('é').count(), MAX_ANSWER_CHARS);
    }

    #[test]
    fn test_short_answer_kept() {
        let text = format_answer("42", Duration::ZERO);
        assert!(text.ends_with("\n\n42"));
    }

    #[tokio::test]
    async fn test_empty_prompt_shows_usage() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());
        let handler = AiChatHandler::new(&AiConfig::default());

        let cmd = invocation(InboundEvent::new(Chat::private(5), Sender::new(5), ".ai   "));
        handler.handle(&cmd, &ctx).await.unwrap();
        assert!(client.texts_to(5)[0].contains("Usage: `.ai <question>`"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());
        let config = AiConfig {
            endpoint: "http://127.0.0.1:9/api/ask-ai/".to_string(),
            timeout_seconds: 2,
            ..AiConfig::default()
        };

        let cmd = invocation(InboundEvent::new(Chat::private(5), Sender::new(5), ".ai hello"));
        let result = AiChatHandler::new(&config).handle(&cmd, &ctx).await;
        assert!(result.is_err());
        let texts = client.texts_to(5);
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("❌ **AI Error**"));
    }
}
