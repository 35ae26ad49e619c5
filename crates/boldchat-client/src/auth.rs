//! Authentication tokens for the BoldChat API.
//!
//! Every request carries an `auth` token of the form
//! `{account_id}:{setting_id}:{unix_millis}:{sha512_hex}`. The hash is computed
//! over the token prefix followed by the secret key, so the key itself never
//! leaves the process.
//!
//! BoldChat rejects tokens older than [`TOKEN_LIFETIME`]. [`Credentials`]
//! re-derives the token once it is [`TOKEN_REFRESH_AFTER`] old, which leaves a
//! one-minute margin for a URL that was handed out just before a refresh and is
//! still in flight.
//!
//! # Concurrency
//!
//! The token and its issue time live in a single immutable [`AuthToken`]
//! record behind an [`RwLock`]. Readers clone the record under the shared lock;
//! a refresh swaps in a fully derived record under the exclusive lock. A reader
//! therefore sees either the previous token or the new one, never a mix, and
//! waits at most for one in-progress refresh.
//!
//! # Time
//!
//! The token prefix carries wall-clock time, but the age of a token is
//! measured on the monotonic clock. Stepping the wall clock backwards or
//! forwards does not delay or hasten a refresh.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};

/// Age after which BoldChat rejects a token.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Age at which a cached token is replaced.
pub const TOKEN_REFRESH_AFTER: Duration = Duration::from_secs(4 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current wall-clock time, used in the token prefix.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current monotonic instant, used to age tokens.
    fn instant(&self) -> Instant;
}

/// The operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A derived authentication token and the instant it was issued.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    issued_at: DateTime<Utc>,
    minted_at: Instant,
}

impl AuthToken {
    /// The token string sent as the `auth` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Wall-clock time encoded in the token.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Monotonic time elapsed between issue and `now`.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.minted_at)
    }

    /// Whether the token should be replaced at `now`.
    #[must_use]
    pub fn is_stale(&self, now: Instant) -> bool {
        self.age(now) >= TOKEN_REFRESH_AFTER
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Computes the token for an account at a given instant.
///
/// Pure function of its inputs: the same identity, key and second always
/// yield the same token.
#[must_use]
pub fn derive_token(
    account_id: &str,
    setting_id: &str,
    secret_key: &SecretString,
    issued_at: DateTime<Utc>,
) -> String {
    // Millisecond field, whole-second precision.
    let prefix = format!("{account_id}:{setting_id}:{}000", issued_at.timestamp());

    let mut hasher = Sha512::new();
    hasher.update(prefix.as_bytes());
    hasher.update(secret_key.expose_secret().as_bytes());
    let digest = hasher.finalize();

    format!("{prefix}:{}", hex::encode(digest))
}

/// Account identity and the cached authentication token.
///
/// One instance serves one configured account. It is shared by reference
/// (usually behind an [`Arc`]) between all callers formatting request URLs.
///
/// # Examples
///
/// ```
/// use boldchat_client::auth::Credentials;
///
/// let credentials = Credentials::new("ACC1", "SET1", "secret");
/// let token = credentials.current_token();
/// assert!(token.starts_with("ACC1:SET1:"));
/// ```
pub struct Credentials {
    account_id: String,
    setting_id: String,
    secret_key: SecretString,
    clock: Arc<dyn Clock>,
    token: RwLock<AuthToken>,
}

impl Credentials {
    /// Creates credentials using the system clock and derives the first token.
    pub fn new(
        account_id: impl Into<String>,
        setting_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self::with_clock(
            account_id,
            setting_id,
            SecretString::new(secret_key.into().into()),
            Arc::new(SystemClock),
        )
    }

    /// Creates credentials reading time from `clock`.
    pub fn with_clock(
        account_id: impl Into<String>,
        setting_id: impl Into<String>,
        secret_key: SecretString,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let account_id = account_id.into();
        let setting_id = setting_id.into();
        let issued_at = clock.now();
        let token = AuthToken {
            value: derive_token(&account_id, &setting_id, &secret_key, issued_at),
            issued_at,
            minted_at: clock.instant(),
        };

        Self {
            account_id,
            setting_id,
            secret_key,
            clock,
            token: RwLock::new(token),
        }
    }

    /// The BoldChat account ID.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The API setting ID.
    #[must_use]
    pub fn setting_id(&self) -> &str {
        &self.setting_id
    }

    /// Issue time of the cached token.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.snapshot().issued_at
    }

    /// Whether the cached token is due for replacement.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.snapshot().is_stale(self.clock.instant())
    }

    /// Returns a valid token string, refreshing it first if it is stale.
    #[must_use]
    pub fn current_token(&self) -> String {
        self.ensure_fresh_token().value
    }

    /// Returns the cached token record, replacing it first if it is stale.
    ///
    /// Concurrent callers that find the token stale refresh it only once: the
    /// staleness check is repeated after the exclusive lock is taken.
    #[must_use]
    pub fn ensure_fresh_token(&self) -> AuthToken {
        let current = self.snapshot();
        if !current.is_stale(self.clock.instant()) {
            return current;
        }

        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.is_stale(self.clock.instant()) {
            return guard.clone();
        }
        *guard = self.next_token(&guard);
        guard.clone()
    }

    /// Derives a new token from the current time unconditionally.
    #[must_use]
    pub fn refresh(&self) -> AuthToken {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = self.next_token(&guard);
        guard.clone()
    }

    fn next_token(&self, previous: &AuthToken) -> AuthToken {
        let issued_at = self.clock.now();
        let minted_at = self.clock.instant();
        debug!(
            "Refreshing BoldChat auth token for account {} (previous token age {:?})",
            self.account_id,
            previous.age(minted_at)
        );
        AuthToken {
            value: derive_token(&self.account_id, &self.setting_id, &self.secret_key, issued_at),
            issued_at,
            minted_at,
        }
    }

    fn snapshot(&self) -> AuthToken {
        // The record is replaced wholesale, so a poisoned lock still holds a
        // complete token.
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("setting_id", &self.setting_id)
            .field("secret_key", &self.secret_key)
            .field("issued_at", &self.issued_at())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::Mutex;
    use std::thread;

    use chrono::TimeDelta;

    use super::*;

    #[derive(Debug)]
    struct ManualClock {
        wall: Mutex<DateTime<Utc>>,
        mono: Mutex<Instant>,
    }

    impl ManualClock {
        fn starting_at(secs: i64) -> Arc<Self> {
            Arc::new(Self {
                wall: Mutex::new(DateTime::from_timestamp(secs, 0).unwrap()),
                mono: Mutex::new(Instant::now()),
            })
        }

        /// Lets real time pass: both clocks move forward.
        fn advance(&self, secs: u64) {
            *self.wall.lock().unwrap() += TimeDelta::seconds(i64::try_from(secs).unwrap());
            *self.mono.lock().unwrap() += Duration::from_secs(secs);
        }

        /// Steps the wall clock only, as an NTP correction would.
        fn step_wall(&self, delta: TimeDelta) {
            *self.wall.lock().unwrap() += delta;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.wall.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            *self.mono.lock().unwrap()
        }
    }

    fn credentials(clock: Arc<ManualClock>) -> Credentials {
        Credentials::with_clock("ACC1", "SET1", SecretString::new("secret".into()), clock)
    }

    #[test]
    fn test_token_format() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = derive_token("ACC1", "SET1", &SecretString::new("secret".into()), at);

        let parts: Vec<&str> = token.split(':').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "ACC1");
        assert_eq!(parts[1], "SET1");
        assert_eq!(parts[2], "1700000000000");
        assert_eq!(parts[3].len(), 128);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_token_hash_matches_sha512_of_prefix_and_key() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = derive_token("ACC1", "SET1", &SecretString::new("secret".into()), at);

        let expected = hex::encode(Sha512::digest(b"ACC1:SET1:1700000000000secret"));
        assert_eq!(token, format!("ACC1:SET1:1700000000000:{expected}"));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let at = DateTime::from_timestamp(1_700_000_123, 0).unwrap();
        let key = SecretString::new("k".into());
        assert_eq!(derive_token("a", "s", &key, at), derive_token("a", "s", &key, at));
        assert_ne!(
            derive_token("a", "s", &key, at),
            derive_token("a", "s", &SecretString::new("other".into()), at)
        );
    }

    #[test]
    fn test_sub_second_instants_share_a_token() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let later = at + TimeDelta::milliseconds(900);
        let key = SecretString::new("k".into());
        assert_eq!(derive_token("a", "s", &key, at), derive_token("a", "s", &key, later));
    }

    #[test]
    fn test_initial_token_is_derived_immediately() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock);
        assert_eq!(creds.issued_at().timestamp(), 1_700_000_000);
        assert!(creds.current_token().starts_with("ACC1:SET1:1700000000000:"));
    }

    #[test]
    fn test_token_reused_before_threshold() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock.clone());
        let first = creds.current_token();

        clock.advance(3 * 60 + 59);
        assert!(!creds.is_stale());
        assert_eq!(creds.current_token(), first);
        assert_eq!(creds.issued_at().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_token_refreshed_after_threshold() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock.clone());
        let first = creds.current_token();

        clock.advance(4 * 60 + 1);
        assert!(creds.is_stale());
        let second = creds.current_token();

        assert_ne!(second, first);
        assert!(second.starts_with("ACC1:SET1:1700000241000:"));
        assert_eq!(creds.issued_at().timestamp(), 1_700_000_241);
        assert!(!creds.is_stale());
    }

    #[test]
    fn test_refresh_at_exact_threshold() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock.clone());
        clock.advance(4 * 60);
        assert!(creds.is_stale());
    }

    #[test]
    fn test_wall_clock_step_back_does_not_delay_refresh() {
        let clock = ManualClock::starting_at(1_700_003_600);
        let creds = credentials(clock.clone());
        let first = creds.current_token();

        clock.step_wall(TimeDelta::seconds(-3600));
        assert!(!creds.is_stale());
        assert_eq!(creds.current_token(), first);

        clock.advance(4 * 60);
        assert!(creds.is_stale());
        let second = creds.current_token();
        assert_ne!(second, first);
        assert!(second.starts_with("ACC1:SET1:1700000240000:"));
        assert!(!creds.is_stale());
    }

    #[test]
    fn test_wall_clock_step_forward_does_not_hasten_refresh() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock.clone());
        let first = creds.current_token();

        clock.step_wall(TimeDelta::seconds(3600));
        assert!(!creds.is_stale());
        assert_eq!(creds.current_token(), first);
    }

    #[test]
    fn test_refresh_after_step_back_uses_current_wall_time() {
        let clock = ManualClock::starting_at(1_700_003_600);
        let creds = credentials(clock.clone());
        let first = creds.current_token();

        clock.step_wall(TimeDelta::seconds(-3000));
        let refreshed = creds.refresh();
        assert_ne!(refreshed.as_str(), first);
        assert_eq!(refreshed.issued_at().timestamp(), 1_700_000_600);
        assert_eq!(creds.current_token(), refreshed.as_str());
    }

    #[test]
    fn test_refresh_forces_new_record() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = credentials(clock.clone());
        clock.advance(5);

        let refreshed = creds.refresh();
        assert_eq!(refreshed.issued_at().timestamp(), 1_700_000_005);
        assert_eq!(creds.current_token(), refreshed.as_str());
    }

    #[test]
    fn test_concurrent_readers_see_whole_tokens() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let creds = Arc::new(credentials(clock.clone()));
        let key = SecretString::new("secret".into());

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let creds = Arc::clone(&creds);
                thread::spawn(move || {
                    (0..500)
                        .map(|_| creds.ensure_fresh_token())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for _ in 0..50 {
            clock.advance(241);
            let _ = creds.current_token();
        }

        for reader in readers {
            for token in reader.join().expect("reader thread panicked") {
                let expected = derive_token("ACC1", "SET1", &key, token.issued_at());
                assert_eq!(token.as_str(), expected);
            }
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("ACC1", "SET1", "super-secret");
        let token = creds.ensure_fresh_token();
        let debug = format!("{creds:?} {token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains(token.as_str()));
    }
}
