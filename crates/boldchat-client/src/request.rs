//! Request URL construction.
//!
//! BoldChat exposes its operations as GET endpoints with every argument in the
//! query string:
//!
//! ```text
//! https://{host}/aid/{account_id}/data/rest/json/v2/{operation}?auth={token}&name=value...
//! ```

use std::sync::Arc;

use url::form_urlencoded;

use crate::auth::Credentials;

/// Path between the account ID and the operation name.
const API_PATH: &str = "data/rest/json/v2";

/// Formats a single `&name=value` query fragment.
///
/// The value is form-urlencoded: spaces become `+` and every reserved or
/// non-ASCII byte is percent-encoded. The name is used as given.
///
/// Only `*-._` and alphanumerics pass through unescaped, so `~` is sent as
/// `%7E` while `*` is sent bare. Any form decoder recovers the same value.
///
/// ```
/// use boldchat_client::escape_query_param;
///
/// assert_eq!(escape_query_param("OperatorID", "abc 123"), "&OperatorID=abc+123");
/// ```
#[must_use]
pub fn escape_query_param(name: &str, value: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    format!("&{name}={escaped}")
}

/// Builds fully qualified request URLs for one account.
///
/// Holds the endpoint and a shared handle to the account [`Credentials`];
/// every call to [`build`](Self::build) embeds a currently valid token.
#[derive(Debug, Clone)]
pub struct RequestUrlBuilder {
    endpoint: String,
    credentials: Arc<Credentials>,
}

impl RequestUrlBuilder {
    /// Creates a builder for `endpoint`, e.g. `https://api.boldchat.com`.
    ///
    /// A trailing slash on the endpoint is ignored.
    pub fn new(endpoint: impl Into<String>, credentials: Arc<Credentials>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            credentials,
        }
    }

    /// The endpoint URLs are built against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The credentials supplying tokens.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Formats the URL for `operation` with pre-escaped query fragments.
    ///
    /// Fragments are appended in the order given. Building never fails; an
    /// empty or unknown operation still yields a well-formed URL for the
    /// server to reject.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use boldchat_client::{Credentials, RequestUrlBuilder, escape_query_param};
    ///
    /// let credentials = Arc::new(Credentials::new("ACC1", "SET1", "secret"));
    /// let builder = RequestUrlBuilder::new("https://api.boldchat.com", credentials);
    /// let url = builder.build("getOperator", &[escape_query_param("OperatorID", "42")]);
    ///
    /// assert!(url.starts_with("https://api.boldchat.com/aid/ACC1/data/rest/json/v2/getOperator?auth=ACC1:SET1:"));
    /// assert!(url.ends_with("&OperatorID=42"));
    /// ```
    #[must_use]
    pub fn build<S: AsRef<str>>(&self, operation: &str, fragments: &[S]) -> String {
        let token = self.credentials.current_token();
        format_url(
            &self.endpoint,
            self.credentials.account_id(),
            operation,
            &token,
            fragments,
        )
    }
}

fn format_url<S: AsRef<str>>(
    endpoint: &str,
    account_id: &str,
    operation: &str,
    token: &str,
    fragments: &[S],
) -> String {
    let query: String = fragments.iter().map(AsRef::as_ref).collect();
    format!("{endpoint}/aid/{account_id}/{API_PATH}/{operation}?auth={token}{query}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use proptest::prelude::*;

    use super::*;

    fn decode_fragment(fragment: &str) -> (String, String) {
        let query = fragment.strip_prefix('&').unwrap();
        let mut pairs = form_urlencoded::parse(query.as_bytes());
        let (name, value) = pairs.next().unwrap();
        assert!(pairs.next().is_none(), "fragment split into several pairs");
        (name.into_owned(), value.into_owned())
    }

    #[test]
    fn test_format_url_exact() {
        let url = format_url(
            "https://api.boldchat.com",
            "ACC1",
            "getOperator",
            "TOK",
            &[escape_query_param("OperatorID", "abc 123")],
        );
        assert_eq!(
            url,
            "https://api.boldchat.com/aid/ACC1/data/rest/json/v2/getOperator?auth=TOK&OperatorID=abc+123"
        );
    }

    #[test]
    fn test_format_url_without_fragments() {
        let url = format_url::<&str>("https://api-eu.boldchat.com", "ACC1", "getOperators", "TOK", &[]);
        assert_eq!(
            url,
            "https://api-eu.boldchat.com/aid/ACC1/data/rest/json/v2/getOperators?auth=TOK"
        );
    }

    #[test]
    fn test_fragment_order_is_preserved() {
        let url = format_url(
            "https://api.boldchat.com",
            "ACC1",
            "editOperator",
            "TOK",
            &["&b=2", "&a=1", "&c=3"],
        );
        assert!(url.ends_with("?auth=TOK&b=2&a=1&c=3"));
    }

    #[test]
    fn test_empty_operation_still_formats() {
        let url = format_url::<&str>("https://api.boldchat.com", "ACC1", "", "TOK", &[]);
        assert_eq!(url, "https://api.boldchat.com/aid/ACC1/data/rest/json/v2/?auth=TOK");
    }

    #[test]
    fn test_escape_reserved_characters() {
        let fragment = escape_query_param("Departments", r#"[{"DepartmentID":"5"}]"#);
        assert_eq!(
            fragment,
            "&Departments=%5B%7B%22DepartmentID%22%3A%225%22%7D%5D"
        );
        for c in ['{', '}', '"', '[', ']', ':'] {
            assert!(!fragment.contains(c), "{c} left unescaped");
        }
        assert_eq!(
            decode_fragment(&fragment),
            ("Departments".to_string(), r#"[{"DepartmentID":"5"}]"#.to_string())
        );
    }

    #[test]
    fn test_escape_query_delimiters_and_unicode() {
        assert_eq!(escape_query_param("q", "a&b=c%d"), "&q=a%26b%3Dc%25d");
        assert_eq!(escape_query_param("Name", "Zoë"), "&Name=Zo%C3%AB");
        assert_eq!(escape_query_param("Email", "a+b@example.com"), "&Email=a%2Bb%40example.com");
        assert_eq!(escape_query_param("Name", "a~b*c"), "&Name=a%7Eb*c");
    }

    #[test]
    fn test_builder_uses_current_token() {
        let credentials = Arc::new(Credentials::new("ACC1", "SET1", "secret"));
        let builder = RequestUrlBuilder::new("https://api.boldchat.com/", Arc::clone(&credentials));
        assert_eq!(builder.endpoint(), "https://api.boldchat.com");

        let url = builder.build("getOperators", &[] as &[&str]);
        let token = credentials.current_token();
        assert_eq!(
            url,
            format!("https://api.boldchat.com/aid/ACC1/data/rest/json/v2/getOperators?auth={token}")
        );
    }

    proptest! {
        #[test]
        fn prop_escape_round_trips(value in ".*") {
            let fragment = escape_query_param("v", &value);
            let (name, decoded) = decode_fragment(&fragment);
            prop_assert_eq!(name, "v");
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn prop_escaped_value_has_no_delimiters(value in ".*") {
            let fragment = escape_query_param("v", &value);
            let escaped = &fragment["&v=".len()..];
            prop_assert!(!escaped.contains('&'));
            prop_assert!(!escaped.contains('='));
            prop_assert!(!escaped.contains('#'));
            prop_assert!(!escaped.contains(' '));
            prop_assert!(escaped.is_ascii());
        }
    }
}
