//! Capability implementations for arXiv Sentinel.
//!
//! Every entry in the action vocabulary has one handler here:
//! GetLib, OpenWebpage, CallAPI, ExecuteCLICommand, GetUserInput,
//! OutputInformation, ReadFile and Search. The crate also provides the
//! terminal and scripted consoles and the digest job trigger.

pub mod browser;
pub mod console;
pub mod digest;
pub mod file_read;
pub mod http_request;
pub mod knowledge_base;
pub mod shell;
pub mod user_io;
pub mod web_search;

use sentinel_config::ActionsConfig;
use sentinel_core::action::ActionRegistry;
use sentinel_core::console::Console;
use std::sync::Arc;
use std::time::Duration;

pub use console::{ScriptedConsole, TerminalConsole};
pub use digest::{DigestError, DigestTrigger};
pub use knowledge_base::{DEFAULT_KNOWLEDGE, load_knowledge};

/// Create a registry with a handler for every action kind.
pub fn default_registry(
    config: &ActionsConfig,
    knowledge: String,
    console: Arc<dyn Console>,
) -> ActionRegistry {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let mut registry = ActionRegistry::new();
    registry.register(Box::new(knowledge_base::GetLibAction::new(knowledge)));
    registry.register(Box::new(browser::OpenWebpageAction::new(console.clone())));
    registry.register(Box::new(http_request::CallApiAction::new(timeout)));
    registry.register(Box::new(shell::RunCommandAction::new(
        console.clone(),
        config.input_markers.clone(),
    )));
    registry.register(Box::new(user_io::GetUserInputAction::new(console.clone())));
    registry.register(Box::new(user_io::OutputInformationAction::new(console)));
    registry.register(Box::new(file_read::ReadFileAction::new()));
    registry.register(Box::new(web_search::SearchAction::new(
        config.search.clone(),
        timeout,
    )));
    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one HTTP response on a random local port.
    ///
    /// Returns the base URL and a handle resolving to the raw request head.
    pub async fn serve_once(
        status: u16,
        content_type: &str,
        body: &str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status} Status\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).into_owned()
        });

        (format!("http://{addr}"), handle)
    }
}
