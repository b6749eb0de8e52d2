use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Summarize,
    Suggest,
}

impl Operation {
    /// Only summaries are stored; suggestions are shown once.
    pub fn persists(&self) -> bool {
        matches!(self, Operation::Summarize)
    }

    pub fn pending_message(&self) -> &'static str {
        match self {
            Operation::Summarize => "Summarizing...",
            Operation::Suggest => "Generating topic suggestions...",
        }
    }
}

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    content: &'a str,
    operation: Operation,
}

/// Client for the research endpoint: selected text in, plain text out.
pub struct ResearchClient {
    client: Client,
    endpoint: String,
}

impl ResearchClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub async fn process(&self, content: &str, operation: Operation) -> Result<String> {
        let request = ProcessRequest { content, operation };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Research endpoint answered {}", status);
            return Err(AppError::RemoteService(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Newline-delimited endpoint text with line breaks as `<br>`.
pub fn format_result(text: &str) -> String {
    text.replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::OneShotServer;

    #[tokio::test]
    async fn posts_content_and_operation_as_json() {
        let server = OneShotServer::start(200, "line one\nline two").await;
        let client = ResearchClient::new(server.url.clone()).unwrap();

        let text = client.process("selected words", Operation::Suggest).await.unwrap();
        assert_eq!(text, "line one\nline two");

        let request = server.request().await;
        assert!(request.starts_with("POST /api/research/process"));
        assert!(request.contains(r#"{"content":"selected words","operation":"suggest"}"#));
    }

    #[tokio::test]
    async fn non_success_status_carries_the_code() {
        let server = OneShotServer::start(500, "boom").await;
        let client = ResearchClient::new(server.url.clone()).unwrap();

        let err = client
            .process("text", Operation::Summarize)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RemoteService(500)));
        assert_eq!(err.to_string(), "API Error: 500");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_remote_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ResearchClient::new(format!("http://{addr}/api/research/process")).unwrap();
        let err = client.process("text", Operation::Summarize).await.unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn newlines_become_line_breaks() {
        assert_eq!(format_result("a\nb\n"), "a<br>b<br>");
        assert!(Operation::Summarize.persists());
        assert!(!Operation::Suggest.persists());
    }
}
