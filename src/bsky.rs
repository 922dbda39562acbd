use async_trait::async_trait;
use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{PostRef, Session};

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Social network a post is published to.
#[async_trait]
pub trait Poster: Send + Sync {
    /// Exchange a handle and app password for a session.
    async fn authenticate(&self, handle: &str, password: &str) -> Result<Session>;

    /// Create a text post in the session owner's repository.
    async fn publish(&self, session: &Session, text: &str) -> Result<PostRef>;
}

/// Minimal XRPC client for a Bluesky PDS.
#[derive(Debug, Clone)]
pub struct BskyClient {
    http: reqwest::Client,
    host: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: String,
    refresh_jwt: String,
    handle: String,
    did: String,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: FeedPost<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedPost<'a> {
    #[serde(rename = "$type")]
    kind: &'a str,
    text: &'a str,
    created_at: String,
}

/// Error body returned by XRPC endpoints.
#[derive(Debug, Deserialize)]
struct XrpcError {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

/// Turn a failed response into a readable message, preferring the XRPC error body.
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<XrpcError>(body) {
        Ok(XrpcError {
            error,
            message: Some(message),
        }) => format!("{status} {error}: {message}"),
        Ok(XrpcError { error, message: None }) => format!("{status} {error}"),
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => format!("{status} body={body}"),
    }
}

/// Truncate to the start of the hour.
pub fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

/// `createdAt` value for a post made at `now`.
pub fn post_timestamp(now: DateTime<Utc>) -> String {
    truncate_to_hour(now).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn record_body<'a>(did: &'a str, text: &'a str, now: DateTime<Utc>) -> CreateRecordRequest<'a> {
    CreateRecordRequest {
        repo: did,
        collection: POST_COLLECTION,
        record: FeedPost {
            kind: POST_COLLECTION,
            text,
            created_at: post_timestamp(now),
        },
    }
}

impl BskyClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
        }
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{method}", self.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl Poster for BskyClient {
    async fn authenticate(&self, handle: &str, password: &str) -> Result<Session> {
        let auth_error = |message: String| Error::Auth {
            handle: handle.to_string(),
            message,
        };

        let url = self.xrpc_url(CREATE_SESSION);
        let resp = self
            .http
            .post(&url)
            .json(&CreateSessionRequest {
                identifier: handle,
                password,
            })
            .send()
            .await
            .map_err(|e| auth_error(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(auth_error(describe_failure(status, &body)));
        }

        let session: CreateSessionResponse = resp
            .json()
            .await
            .map_err(|e| auth_error(format!("invalid session response: {e}")))?;
        debug!("Session created for {} ({})", session.handle, session.did);

        Ok(Session {
            access_jwt: session.access_jwt,
            refresh_jwt: session.refresh_jwt,
            handle: session.handle,
            did: session.did,
        })
    }

    async fn publish(&self, session: &Session, text: &str) -> Result<PostRef> {
        let url = self.xrpc_url(CREATE_RECORD);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&session.access_jwt)
            .json(&record_body(&session.did, text, Utc::now()))
            .send()
            .await
            .map_err(|e| Error::Publish(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Publish(describe_failure(status, &body)));
        }

        resp.json()
            .await
            .map_err(|e| Error::Publish(format!("invalid createRecord response: {e}")))
    }
}
