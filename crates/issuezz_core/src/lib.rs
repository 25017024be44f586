pub mod assistant;
pub mod cache;
pub mod classify;
pub mod domain;
pub mod fetcher;
pub mod guidance;
pub mod matcher;
pub mod mentor;
pub mod ports;
pub mod prompts;
pub mod render;
pub mod repo_url;
pub mod session;
pub mod skills;

#[cfg(test)]
mod test_support;

pub use assistant::Assistant;
pub use cache::CacheSettings;
pub use domain::{AnalysisResult, ChatMessage, FetchedData, Recommendation};
pub use fetcher::{GithubFetcher, IssueFetchPolicy};
pub use guidance::GuidanceFlow;
pub use mentor::MentorFlow;
pub use ports::{AiGateway, CompletionService, GithubService, PortError, PortResult};
pub use render::{RenderMode, Renderer};
pub use session::{ChatSession, ContextWindow};
