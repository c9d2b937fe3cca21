//! Contract with the external reservation-calling service.
//!
//! The service dials the restaurant and negotiates the booking; this crate
//! only starts a call and polls its status. The trait keeps the engine
//! testable; [`HttpReservationService`] is the production client and
//! [`StaticReservationService`] a scripted stand-in for tests and demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the calling service.
#[derive(Error, Debug)]
pub enum ReservationServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("calling service rejected the request: {0}")]
    Rejected(String),

    #[error("calling service unavailable: {0}")]
    Unavailable(String),
}

/// Call lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Dialing,
    InProgress,
    Completed,
    Failed,
}

impl CallStatus {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, CallStatus::Failed)
    }
}

/// The restaurant's answer, once one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationDecision {
    Pending,
    Confirmed,
    Declined,
    DeclinedTimeout,
}

impl ReservationDecision {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationDecision::Pending)
    }
}

/// Request to start a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallRequest {
    pub restaurant_name: String,
    pub reservation_time: String,
    pub party_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub job_id: String,
    pub status: CallStatus,
}

/// One polled observation of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStatusResponse {
    pub status: CallStatus,
    #[serde(default = "default_decision")]
    pub reservation_decision: ReservationDecision,
    pub restaurant_name: String,
    pub reservation_time: String,
    pub party_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn default_decision() -> ReservationDecision {
    ReservationDecision::Pending
}

impl CallStatusResponse {
    /// Terminal when the restaurant answered or the call itself died.
    pub fn is_terminal(&self) -> bool {
        self.reservation_decision.is_terminal() || self.status.is_terminal_failure()
    }
}

/// The calling-service seam. Implementations must be shareable across the
/// polling task and the engine.
#[async_trait]
pub trait ReservationService: Send + Sync {
    async fn start_call(
        &self,
        request: &StartCallRequest,
    ) -> Result<StartCallResponse, ReservationServiceError>;

    async fn poll_call(&self, job_id: &str)
        -> Result<CallStatusResponse, ReservationServiceError>;
}

/// HTTP client for the real calling service.
pub struct HttpReservationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReservationService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReservationService for HttpReservationService {
    async fn start_call(
        &self,
        request: &StartCallRequest,
    ) -> Result<StartCallResponse, ReservationServiceError> {
        let url = format!("{}/calls", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReservationServiceError::Rejected(format!(
                "{status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn poll_call(
        &self,
        job_id: &str,
    ) -> Result<CallStatusResponse, ReservationServiceError> {
        let url = format!("{}/calls/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ReservationServiceError::Unavailable(format!(
                "poll returned {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

/// Scripted service for tests and the demo binary: `start_call` hands out
/// a fixed job id, and each poll steps through the script, holding on the
/// final entry.
pub struct StaticReservationService {
    job_id: String,
    script: Vec<CallStatusResponse>,
    cursor: Mutex<usize>,
    polls: Mutex<u32>,
    start_failure: Option<String>,
}

impl StaticReservationService {
    pub fn with_script(job_id: impl Into<String>, script: Vec<CallStatusResponse>) -> Self {
        Self {
            job_id: job_id.into(),
            script,
            cursor: Mutex::new(0),
            polls: Mutex::new(0),
            start_failure: None,
        }
    }

    /// A call that rings once and gets confirmed.
    pub fn confirming(job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        let step = |status, decision| CallStatusResponse {
            status,
            reservation_decision: decision,
            restaurant_name: String::new(),
            reservation_time: String::new(),
            party_size: 0,
            last_error: None,
        };
        Self::with_script(
            job_id,
            vec![
                step(CallStatus::InProgress, ReservationDecision::Pending),
                step(CallStatus::Completed, ReservationDecision::Confirmed),
            ],
        )
    }

    /// A service whose `start_call` always fails.
    pub fn failing_start(reason: impl Into<String>) -> Self {
        Self {
            job_id: String::new(),
            script: vec![],
            cursor: Mutex::new(0),
            polls: Mutex::new(0),
            start_failure: Some(reason.into()),
        }
    }

    /// Total polls observed; lets tests assert polling stopped.
    pub fn poll_count(&self) -> u32 {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl ReservationService for StaticReservationService {
    async fn start_call(
        &self,
        _request: &StartCallRequest,
    ) -> Result<StartCallResponse, ReservationServiceError> {
        if let Some(reason) = &self.start_failure {
            return Err(ReservationServiceError::Unavailable(reason.clone()));
        }

        Ok(StartCallResponse {
            job_id: self.job_id.clone(),
            status: CallStatus::Queued,
        })
    }

    async fn poll_call(
        &self,
        _job_id: &str,
    ) -> Result<CallStatusResponse, ReservationServiceError> {
        *self.polls.lock().unwrap() += 1;

        let mut cursor = self.cursor.lock().unwrap();
        let index = (*cursor).min(self.script.len().saturating_sub(1));
        let response = self
            .script
            .get(index)
            .cloned()
            .ok_or_else(|| ReservationServiceError::Unavailable("no script".to_string()))?;
        *cursor += 1;
        Ok(response)
    }
}
