//! # boldchat-client
//!
//! Client library for the BoldChat (Bold360) REST API.
//!
//! Requests are authenticated with a signed, time-limited token embedded in
//! the query string. This crate provides:
//! - [`Credentials`]: derives the token and refreshes it before it expires
//! - [`RequestUrlBuilder`]: formats request URLs around the current token
//! - [`BoldChatClient`]: the operator API (`getOperators`, `getOperator`,
//!   `editOperator`) on top of both
//!
//! ## Example
//!
//! ```no_run
//! use boldchat_client::BoldChatClient;
//! use boldchat_common::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! println!("{}", boldchat_common::version());
//!
//! let client = BoldChatClient::new(Config::from_env()?)?;
//! let operator = client.get_operator_by_email("alex@example.com").await?;
//! println!("{operator}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod request;

pub use auth::{AuthToken, Clock, Credentials, SystemClock, TOKEN_LIFETIME, TOKEN_REFRESH_AFTER};
pub use client::{BoldChatClient, edit_operator_params};
pub use error::ClientError;
pub use request::{RequestUrlBuilder, escape_query_param};
