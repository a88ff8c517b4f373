//! chatwire Core Library
//!
//! Bridges a host chat UI to an OpenAI-compatible streaming chat completion
//! API: host conversations are mapped onto the wire, the streamed response is
//! rebuilt into text, reasoning and tool-call parts, and failures are
//! classified for the host.

pub mod config;
pub mod host;
pub mod http;
pub mod protocol;
pub mod providers;
pub mod tokens;

pub use config::{ChatwireConfig, SecretString};
pub use host::{KeyStore, ModelCatalog, ResponseSink};
pub use protocol::{HostMessage, HostPart, HostTool, RequestOptions, ResponsePart};
pub use providers::{ChatBridge, ErrorCode, ProviderError, ProviderResult, StreamOutcome};

/// Returns the version of the chatwire core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
