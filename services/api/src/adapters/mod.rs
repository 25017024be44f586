pub mod completion_llm;
pub mod gateway_http;
pub mod github;

pub use completion_llm::{CompletionModels, OpenAiCompletionAdapter};
pub use gateway_http::HttpGateway;
pub use github::GithubAdapter;
