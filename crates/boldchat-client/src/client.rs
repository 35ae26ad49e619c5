//! BoldChat operator API client.
//!
//! # Examples
//!
//! ```no_run
//! use boldchat_client::BoldChatClient;
//! use boldchat_common::{Config, OperatorUpdate, Region};
//!
//! # async fn example() -> Result<(), boldchat_client::ClientError> {
//! let config = Config::new("123456", "789", "secret").with_region(Region::Us);
//! let client = BoldChatClient::new(config)?;
//!
//! for operator in client.get_operators().await? {
//!     println!("{}: {}", operator.login_id, operator.name);
//! }
//!
//! let update = OperatorUpdate::builder()
//!     .login_id("2300000000001")
//!     .chat_name("Alex")
//!     .build();
//! client.edit_operator(&update).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - **Transport errors**: DNS, connection, and timeouts, retried with
//!   exponential backoff by the middleware
//! - **Non-2xx responses**: reported as [`ClientError::HttpStatus`]
//! - **`Status` other than `success`**: reported as [`ClientError::ApiError`]
//!   with the vendor's message

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_retry_after::RetryAfterMiddleware;
use serde::de::DeserializeOwned;

use boldchat_common::{ApiResponse, Config, Operator, OperatorUpdate};

use crate::auth::{Credentials, SystemClock};
use crate::error::ClientError;
use crate::request::{RequestUrlBuilder, escape_query_param};

/// Lists every operator on the account.
pub const GET_OPERATORS: &str = "getOperators";
/// Fetches one operator by ID.
pub const GET_OPERATOR: &str = "getOperator";
/// Changes the editable fields of an operator.
pub const EDIT_OPERATOR: &str = "editOperator";

/// Client for the BoldChat operator API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the cached
/// authentication token.
#[derive(Clone)]
pub struct BoldChatClient {
    client: ClientWithMiddleware,
    urls: RequestUrlBuilder,
    config: Arc<Config>,
}

impl fmt::Debug for BoldChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoldChatClient")
            .field("endpoint", &self.urls.endpoint())
            .field("credentials", self.urls.credentials())
            .finish_non_exhaustive()
    }
}

impl BoldChatClient {
    /// Create a new client from a configuration.
    ///
    /// Derives the first authentication token immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the account identity is incomplete or the HTTP
    /// client cannot be created.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::ConfigurationError(e.to_string()))?;

        let credentials = Arc::new(Credentials::with_clock(
            config.account_id.clone(),
            config.setting_id.clone(),
            config.secret_key.clone(),
            Arc::new(SystemClock),
        ));
        let urls = RequestUrlBuilder::new(config.endpoint(), credentials);

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(
                config.retry_config.initial_delay,
                config.retry_config.max_delay,
            )
            .build_with_max_retries(config.retry_config.max_retries);

        // None means no timeout
        let reqwest_client = match config.timeout_seconds {
            Some(timeout) => reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?,
            None => reqwest::Client::builder().build()?,
        };

        // RetryAfterMiddleware must run before RetryTransientMiddleware
        let client = reqwest_middleware::ClientBuilder::new(reqwest_client)
            .with(RetryAfterMiddleware::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        debug!(
            "Created BoldChat client for account {} at {}",
            config.account_id,
            urls.endpoint()
        );

        Ok(Self {
            client,
            urls,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The account credentials and cached token.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<Credentials> {
        self.urls.credentials()
    }

    /// The builder used to format request URLs.
    #[must_use]
    pub const fn url_builder(&self) -> &RequestUrlBuilder {
        &self.urls
    }

    /// The `getOperators` call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports an error.
    pub async fn get_operators(&self) -> Result<Vec<Operator>, ClientError> {
        let response: ApiResponse<Vec<Operator>> = self.call(GET_OPERATORS, &[]).await?;
        Ok(response.data.unwrap_or_default())
    }

    /// The `getOperator` call.
    ///
    /// # Arguments
    ///
    /// * `operator_id` - The operator's `LoginID`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, or the
    /// response carries no operator.
    pub async fn get_operator(&self, operator_id: &str) -> Result<Operator, ClientError> {
        let params = [escape_query_param("OperatorID", operator_id)];
        let response: ApiResponse<Operator> = self.call(GET_OPERATOR, &params).await?;
        response.data.ok_or_else(|| {
            ClientError::InvalidResponse(format!("{GET_OPERATOR} returned no Data"))
        })
    }

    /// Finds an operator by email address.
    ///
    /// Lists all operators and returns the first exact match.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no operator has this email, or any
    /// error from [`get_operators`](Self::get_operators).
    pub async fn get_operator_by_email(&self, email: &str) -> Result<Operator, ClientError> {
        self.find_operator(|op| op.email == email)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("operator with email {email}")))
    }

    /// Finds an operator by name.
    ///
    /// Lists all operators and returns the first exact match.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no operator has this name, or any
    /// error from [`get_operators`](Self::get_operators).
    pub async fn get_operator_by_name(&self, name: &str) -> Result<Operator, ClientError> {
        self.find_operator(|op| op.name == name)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("operator with name {name}")))
    }

    /// The `editOperator` call.
    ///
    /// Only fields set on `update` are sent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `login_id` is empty, without
    /// contacting the server. Otherwise returns an error if the request fails
    /// or the API reports an error.
    pub async fn edit_operator(&self, update: &OperatorUpdate) -> Result<(), ClientError> {
        let params = edit_operator_params(update)?;
        let _: ApiResponse<serde_json::Value> = self.call(EDIT_OPERATOR, &params).await?;
        debug!("Edited BoldChat operator {}", update.login_id);
        Ok(())
    }

    async fn find_operator(
        &self,
        predicate: impl Fn(&Operator) -> bool,
    ) -> Result<Option<Operator>, ClientError> {
        Ok(self.get_operators().await?.into_iter().find(predicate))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        params: &[String],
    ) -> Result<ApiResponse<T>, ClientError> {
        // The URL carries the token; log the operation only.
        let url = self.urls.build(operation, params);
        debug!("Calling BoldChat operation {operation}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read {operation} response body: {e}");
            if e.is_timeout() {
                ClientError::TimeoutError
            } else {
                ClientError::NetworkError(e)
            }
        })?;

        if !status.is_success() {
            error!(
                "BoldChat {operation} failed with HTTP status {}",
                status.as_u16()
            );
            return Err(ClientError::HttpStatus { status, body });
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        if !envelope.is_success() {
            let message = envelope.error_message();
            error!("BoldChat {operation} returned an error: {message}");
            return Err(ClientError::ApiError(message));
        }

        Ok(envelope)
    }
}

/// Query fragments for an `editOperator` call.
///
/// Order: `OperatorID`, `Departments`, `OperatorName`, `EmailName`,
/// `ChatName`, `Email`. Unset and empty fields are skipped. Departments are
/// sent as a JSON array whenever set, so `Some(vec![])` clears assignments.
///
/// # Errors
///
/// Returns [`ClientError::InvalidRequest`] if `login_id` is empty.
pub fn edit_operator_params(update: &OperatorUpdate) -> Result<Vec<String>, ClientError> {
    if update.login_id.is_empty() {
        return Err(ClientError::InvalidRequest(
            "LoginID is required to edit an operator".to_string(),
        ));
    }

    let mut params = vec![escape_query_param("OperatorID", &update.login_id)];
    if let Some(departments) = &update.departments {
        params.push(escape_query_param(
            "Departments",
            &serde_json::to_string(departments)?,
        ));
    }
    for (name, value) in [
        ("OperatorName", &update.operator_name),
        ("EmailName", &update.email_name),
        ("ChatName", &update.chat_name),
        ("Email", &update.email),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            params.push(escape_query_param(name, value));
        }
    }
    Ok(params)
}
