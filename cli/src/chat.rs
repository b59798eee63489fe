//! Text chat through the server's `/api/chat` route.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;
use voice::{ChatError, ChatLog, ChatMessage, Responder};

use crate::CliError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    client_id: Uuid,
    history: &'a [ChatMessage],
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// [`Responder`] that forwards each turn to a running folio server.
pub struct HttpResponder {
    client: reqwest::Client,
    url: String,
    client_id: Uuid,
}

impl HttpResponder {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            client_id: Uuid::new_v4(),
        }
    }
}

#[async_trait::async_trait]
impl Responder for HttpResponder {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, ChatError> {
        let body = ChatRequest { client_id: self.client_id, history, message };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| ChatError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &raw));
        }

        let reply: ChatReply = serde_json::from_str(&raw).map_err(|e| ChatError::Request(format!("invalid reply: {e}")))?;
        Ok(reply.text)
    }
}

/// Map a non-2xx `/api/chat` response onto the chat error the visitor sees.
pub(crate) fn classify_failure(status: u16, raw: &str) -> ChatError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(raw) {
        Ok(body) => (body.code, body.message),
        Err(_) => (String::new(), format!("HTTP {status}")),
    };
    match code.as_str() {
        "E_ENTITY_NOT_FOUND" => ChatError::EntityNotFound(message),
        "E_RATE_LIMITED" => ChatError::Quota(message),
        _ if status == 429 => ChatError::Quota(message),
        _ => ChatError::Request(message),
    }
}

fn print_message(message: &ChatMessage) {
    let who = if message.is_user { "you" } else { "assistant" };
    println!("{who}> {}", message.text);
}

/// Send a single message and print the reply.
pub async fn run_once(responder: &dyn Responder, message: &str) -> Result<(), CliError> {
    let mut log = ChatLog::empty();
    if let Some(reply) = log.send(message, responder).await {
        print_message(reply);
    }
    Ok(())
}

/// Interactive loop on stdin. `/quit` or EOF ends it.
pub async fn run_repl(responder: &dyn Responder) -> Result<(), CliError> {
    let mut log = ChatLog::new();
    for message in log.messages() {
        print_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        if let Some(reply) = log.send(&line, responder).await {
            print_message(reply);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
