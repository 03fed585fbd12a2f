//! API client for communicating with the GoBarber REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests for sessions, profile changes, providers and appointments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use reqwest::{header, multipart, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Appointment, AvailabilityItem, DayAvailability, NewAppointment, ProfileUpdate, Provider,
    SignUp, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// API location used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) GET requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Multipart field and content type expected by `PATCH /users/avatar`
const AVATAR_FIELD: &str = "avatar";
const AVATAR_MIME: &str = "image/jpeg";

/// Supplies the bearer token for each authenticated request.
///
/// The session store hands the client one of these instead of mutating
/// shared default headers, so the client always sees the current token.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

/// Body of a successful `POST /sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AvailabilityQuery {
    year: i32,
    month: u32,
    day: u32,
}

/// API client for GoBarber.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ApiClient {
    /// Create a new API client for the API at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
        })
    }

    /// Create a new ApiClient reading its token from `tokens`, sharing the connection pool.
    pub fn with_token_source(&self, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            tokens: Some(tokens),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` value the next request will carry, if any
    pub fn authorization_header(&self) -> Option<String> {
        self.tokens
            .as_ref()
            .and_then(|t| t.bearer_token())
            .filter(|token| !token.is_empty())
            .map(|token| format!("Bearer {}", token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(value) = self.authorization_header() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&value).context("Bearer token is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET with exponential backoff on 429. Only reads go through here.
    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(ApiError::from)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Mutating request with a JSON body. Never retried.
    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Session & Account =====

    /// Exchange credentials for a user record and bearer token
    pub async fn create_session(&self, email: &str, password: &str) -> Result<SessionResponse> {
        let session: SessionResponse = self
            .send_json(Method::POST, "sessions", &Credentials { email, password })
            .await
            .context("Sign-in request failed")?;

        if session.token.is_empty() || session.user.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Session response is missing the token or user".to_string(),
            )
            .into());
        }
        debug!(user_id = %session.user.id, "Session created");
        Ok(session)
    }

    /// Register a new account
    pub async fn create_user(&self, sign_up: &SignUp) -> Result<User> {
        self.send_json(Method::POST, "users", sign_up)
            .await
            .context("Sign-up request failed")
    }

    /// Update name, email and optionally the password of the signed-in user
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.send_json(Method::PUT, "profile", update)
            .await
            .context("Profile update failed")
    }

    /// Upload a JPEG avatar for the signed-in user
    pub async fn update_avatar(&self, user_id: &str, image: Vec<u8>) -> Result<User> {
        let url = self.url("users/avatar");
        let part = multipart::Part::bytes(image)
            .file_name(format!("{}.jpg", user_id))
            .mime_str(AVATAR_MIME)
            .map_err(ApiError::from)?;
        let form = multipart::Form::new().part(AVATAR_FIELD, part);

        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to upload avatar")?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .context("Failed to parse avatar response")
    }

    // ===== Scheduling =====

    /// Fetch the providers that accept appointments
    pub async fn fetch_providers(&self) -> Result<Vec<Provider>> {
        self.get("providers", &[] as &[(&str, &str)]).await
    }

    /// Fetch a provider's hourly availability for one day
    pub async fn fetch_day_availability(&self, provider_id: &str, date: NaiveDate) -> Result<DayAvailability> {
        let query = AvailabilityQuery {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        };
        let items: Vec<AvailabilityItem> = self
            .get(&format!("providers/{}/day-availability", provider_id), &query)
            .await?;
        debug!(provider_id, %date, slots = items.len(), "Availability fetched");
        Ok(DayAvailability::new(provider_id, date, items))
    }

    /// Book an appointment
    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        self.send_json(Method::POST, "appointments", appointment)
            .await
            .context("Failed to create appointment")
    }
}
