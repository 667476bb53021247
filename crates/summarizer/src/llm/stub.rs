use super::{BackendError, ChatMessage, CompletionBackend, Role};
use async_trait::async_trait;

/// Offline backend: echoes the first `echo_chars` characters of the last user message
#[derive(Debug, Clone, Copy)]
pub struct StubBackend {
    echo_chars: usize,
}

impl StubBackend {
    pub fn new(echo_chars: usize) -> Self {
        Self { echo_chars }
    }
}

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(prompt.chars().take(self.echo_chars).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_prefix_of_last_user_message() {
        let stub = StubBackend::new(5);
        let messages = vec![
            ChatMessage::user("first message"),
            ChatMessage {
                role: Role::Assistant,
                content: "ignored".to_string(),
            },
        ];
        assert_eq!(stub.complete(&messages).await.unwrap(), "first");
        assert_eq!(stub.complete(&[]).await.unwrap(), "");
    }
}
