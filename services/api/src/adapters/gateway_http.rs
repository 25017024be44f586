//! services/api/src/adapters/gateway_http.rs
//!
//! An AI gateway that forwards every request to a remote deployment of the four
//! `/api/*` endpoints and unwraps their `{reply: ...}` envelopes.

use async_trait::async_trait;
use issuezz_core::{
    domain::{
        AnalysisResult, FetchedData, GuidanceFollowUp, MentorFollowUp, Recommendation,
        Recommendations, ReviewRequest,
    },
    ports::{
        AnalysisGateway, FollowUpGateway, PortError, PortResult, RecommendationGateway,
    },
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

#[derive(Deserialize)]
struct Envelope<T> {
    reply: T,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> PortResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to create gateway client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> PortResult<T> {
        let url = format!("{}/api/{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("{} request failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorDetail>(&text)
                .map(|d| d.detail)
                .unwrap_or(text);
            error!("{} returned {}: {}", endpoint, status, message);
            return Err(PortError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.reply)
            .map_err(|e| PortError::Malformed(format!("{} reply could not be decoded: {}", endpoint, e)))
    }
}

#[async_trait]
impl RecommendationGateway for HttpGateway {
    async fn recommend(&self, data: &FetchedData) -> PortResult<Vec<Recommendation>> {
        let reply: Recommendations = self.post("ai_suggest", data).await?;
        Ok(reply.recommendations)
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    async fn analyze(&self, request: &ReviewRequest) -> PortResult<AnalysisResult> {
        self.post("ai_reviewer", request).await
    }
}

#[async_trait]
impl FollowUpGateway for HttpGateway {
    async fn mentor_follow_up(&self, request: &MentorFollowUp) -> PortResult<String> {
        self.post("chatone_followup", request).await
    }

    async fn guidance_follow_up(&self, request: &GuidanceFollowUp) -> PortResult<String> {
        self.post("chattwo_followup", request).await
    }
}
