use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};
use crate::otp::OtpChallenge;
use crate::session::{AuthMethod, Session};
use crate::store::{MemoryStateStore, StateStore};
use crate::token::{mask_token, new_numeric_code, new_session_token};
use crate::{AuthConfig, AuthError, pin};

/// Sessions, OTP challenges and PIN checks.
///
/// The manager does not care how identity was established; callers create
/// a session after a voice match, a PIN check or an OTP check and name the
/// method. All per-key mutations go through [`StateStore::update`], so a
/// concurrent sweep and an in-flight validation agree on the outcome.
pub struct AuthenticationManager {
    cfg: AuthConfig,
    sessions: Arc<dyn StateStore<Session>>,
    otps: Arc<dyn StateStore<OtpChallenge>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthenticationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationManager")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl AuthenticationManager {
    /// In-memory stores and the wall clock.
    pub fn new(cfg: AuthConfig) -> Result<Self, AuthError> {
        Self::with_stores(
            cfg,
            Arc::new(MemoryStateStore::new()),
            Arc::new(MemoryStateStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_stores(
        cfg: AuthConfig,
        sessions: Arc<dyn StateStore<Session>>,
        otps: Arc<dyn StateStore<OtpChallenge>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            sessions,
            otps,
            clock,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.cfg
    }

    // ---- sessions ----

    /// Issues a fresh random token valid for `session_ttl_minutes`.
    pub fn create_session(&self, user_id: &str, method: AuthMethod) -> Result<String, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidUserId);
        }
        let token = new_session_token()?;
        let now = self.clock.now();
        let session = Session {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + minutes(self.cfg.session_ttl_minutes),
            authentication_method: method,
            is_active: true,
        };
        self.sessions.put(&token, session)?;
        tracing::info!(
            user_id,
            token = %mask_token(&token),
            method = %method,
            "authn: session created"
        );
        Ok(token)
    }

    /// Looks up a usable session.
    ///
    /// An expired session is deleted on the way out. A deactivated session
    /// is left for the sweep.
    pub fn check_session(&self, token: &str) -> Result<Session, AuthError> {
        let now = self.clock.now();
        let mut outcome = Err(AuthError::UnknownSession);
        self.sessions.update(token, &mut |slot: &mut Option<Session>| {
            outcome = match slot.take() {
                None => Err(AuthError::UnknownSession),
                Some(s) if s.is_expired(now) => Err(AuthError::ExpiredSession),
                Some(s) if !s.is_active => {
                    *slot = Some(s);
                    Err(AuthError::InactiveSession)
                }
                Some(s) => {
                    *slot = Some(s.clone());
                    Ok(s)
                }
            };
        })?;
        if matches!(outcome, Err(AuthError::ExpiredSession)) {
            tracing::info!(token = %mask_token(token), "authn: session expired");
        }
        outcome
    }

    /// The user behind `token`, or `None` if the token is unknown, expired
    /// or deactivated.
    pub fn validate_session(&self, token: &str) -> Option<String> {
        match self.check_session(token) {
            Ok(s) => Some(s.user_id),
            Err(AuthError::Store(e)) => {
                tracing::error!(token = %mask_token(token), error = %e, "authn: session lookup failed");
                None
            }
            Err(e) => {
                tracing::debug!(token = %mask_token(token), reason = %e, "authn: session rejected");
                None
            }
        }
    }

    /// Snapshot of the stored record, whatever its state.
    pub fn session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        Ok(self.sessions.get(token)?)
    }

    /// Idempotent; reports whether a session was removed.
    pub fn end_session(&self, token: &str) -> Result<bool, AuthError> {
        let removed = self.sessions.remove(token)?;
        if let Some(s) = &removed {
            tracing::info!(user_id = %s.user_id, token = %mask_token(token), "authn: session ended");
        }
        Ok(removed.is_some())
    }

    /// Moves `expires_at` to now plus `minutes` (the session TTL when
    /// `None` or zero) and returns the resulting expiry.
    ///
    /// Expiry never moves backwards: a request that would end the session
    /// sooner than its current expiry leaves it unchanged.
    pub fn extend_session(&self, token: &str, minutes_from_now: Option<u32>) -> Result<DateTime<Utc>, AuthError> {
        let ttl = match minutes_from_now {
            Some(m) if m > 0 => m,
            _ => self.cfg.session_ttl_minutes,
        };
        let now = self.clock.now();
        let mut outcome = Err(AuthError::UnknownSession);
        self.sessions.update(token, &mut |slot: &mut Option<Session>| {
            outcome = match slot.take() {
                None => Err(AuthError::UnknownSession),
                Some(s) if s.is_expired(now) => Err(AuthError::ExpiredSession),
                Some(s) if !s.is_active => {
                    *slot = Some(s);
                    Err(AuthError::InactiveSession)
                }
                Some(mut s) => {
                    s.expires_at = s.expires_at.max(now + minutes(ttl));
                    let expires_at = s.expires_at;
                    *slot = Some(s);
                    Ok(expires_at)
                }
            };
        })?;
        if let Ok(expires_at) = &outcome {
            tracing::debug!(token = %mask_token(token), %expires_at, "authn: session extended");
        }
        outcome
    }

    /// Marks the session unusable without deleting it. Returns false if the
    /// token is unknown.
    pub fn deactivate_session(&self, token: &str) -> Result<bool, AuthError> {
        let mut found = false;
        self.sessions.update(token, &mut |slot: &mut Option<Session>| {
            if let Some(s) = slot.as_mut() {
                s.is_active = false;
                found = true;
            }
        })?;
        if found {
            tracing::info!(token = %mask_token(token), "authn: session deactivated");
        }
        Ok(found)
    }

    /// Removes expired and deactivated sessions. Not required for
    /// correctness; bounds memory.
    pub fn cleanup_expired_sessions(&self) -> Result<usize, AuthError> {
        let now = self.clock.now();
        let removed = self
            .sessions
            .retain(&mut |_, s: &Session| s.is_active && !s.is_expired(now))?;
        if removed > 0 {
            tracing::info!(removed, "authn: swept sessions");
        }
        Ok(removed)
    }

    // ---- one-time passcodes ----

    /// Issues a code of the configured length, replacing any outstanding
    /// challenge for the user. The code is returned for delivery and is
    /// never logged.
    pub fn generate_otp(&self, user_id: &str) -> Result<String, AuthError> {
        self.generate_otp_with_length(user_id, self.cfg.otp_length)
    }

    pub fn generate_otp_with_length(&self, user_id: &str, length: usize) -> Result<String, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidUserId);
        }
        if length == 0 {
            return Err(AuthError::InvalidConfig("otp length must be positive".into()));
        }
        let code = new_numeric_code(length)?;
        let now = self.clock.now();
        let challenge = OtpChallenge {
            code: code.clone(),
            created_at: now,
            expires_at: now + minutes(self.cfg.otp_ttl_minutes),
            attempts: 0,
        };
        let expires_at = challenge.expires_at;
        self.otps.put(user_id, challenge)?;
        tracing::info!(user_id, %expires_at, "authn: otp issued");
        Ok(code)
    }

    /// Checks a submitted code.
    ///
    /// Success, expiry and an exhausted attempt budget all consume the
    /// challenge. A mismatch under the cap keeps it and counts the attempt.
    pub fn check_otp(&self, user_id: &str, code: &str) -> Result<(), AuthError> {
        let now = self.clock.now();
        let max = self.cfg.otp_max_attempts;
        let mut outcome = Err(AuthError::NoOtp);
        self.otps.update(user_id, &mut |slot: &mut Option<OtpChallenge>| {
            outcome = match slot.take() {
                None => Err(AuthError::NoOtp),
                Some(ch) if ch.is_expired(now) => Err(AuthError::OtpExpired),
                Some(ch) if ch.attempts >= max => Err(AuthError::OtpAttemptsExhausted),
                Some(ch) if ch.matches(code) => Ok(()),
                Some(mut ch) => {
                    ch.attempts += 1;
                    let attempts = ch.attempts;
                    *slot = Some(ch);
                    Err(AuthError::OtpMismatch {
                        attempts,
                        remaining: max.saturating_sub(attempts),
                    })
                }
            };
        })?;
        match &outcome {
            Ok(()) => tracing::info!(user_id, "authn: otp verified"),
            Err(e) => tracing::warn!(user_id, reason = %e, "authn: otp rejected"),
        }
        outcome
    }

    /// [`Self::check_otp`] collapsed to a boolean.
    pub fn verify_otp(&self, user_id: &str, code: &str) -> bool {
        match self.check_otp(user_id, code) {
            Ok(()) => true,
            Err(AuthError::Store(e)) => {
                tracing::error!(user_id, error = %e, "authn: otp lookup failed");
                false
            }
            Err(_) => false,
        }
    }

    pub fn cleanup_expired_otps(&self) -> Result<usize, AuthError> {
        let now = self.clock.now();
        let removed = self
            .otps
            .retain(&mut |_, ch: &OtpChallenge| !ch.is_expired(now))?;
        if removed > 0 {
            tracing::info!(removed, "authn: swept otp challenges");
        }
        Ok(removed)
    }

    // ---- pin ----

    /// Stateless comparison of `pin` against a stored hash.
    pub fn verify_pin(&self, pin: &str, stored_hash: &str) -> bool {
        pin::verify_pin(pin, stored_hash)
    }
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::ManualClock;

    fn manager() -> (AuthenticationManager, Arc<ManualClock>) {
        manager_with(AuthConfig::default())
    }

    fn manager_with(cfg: AuthConfig) -> (AuthenticationManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let mgr = AuthenticationManager::with_stores(
            cfg,
            Arc::new(MemoryStateStore::new()),
            Arc::new(MemoryStateStore::new()),
            clock.clone(),
        )
        .unwrap();
        (mgr, clock)
    }

    // ---- sessions ----

    #[test]
    fn session_valid_immediately_after_creation() {
        let (mgr, _) = manager();
        let token = mgr.create_session("alice", AuthMethod::VoiceBiometric).unwrap();
        assert_eq!(mgr.validate_session(&token).as_deref(), Some("alice"));

        let s = mgr.check_session(&token).unwrap();
        assert_eq!(s.authentication_method, AuthMethod::VoiceBiometric);
        assert!(s.is_active);
        assert_eq!(s.expires_at - s.created_at, Duration::minutes(30));
    }

    #[test]
    fn tokens_are_unique_and_unrelated_to_user() {
        let (mgr, _) = manager();
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let token = mgr.create_session("alice", AuthMethod::Pin).unwrap();
            assert!(!token.contains("alice"));
            assert!(seen.insert(token));
        }
    }

    #[test]
    fn empty_user_rejected() {
        let (mgr, _) = manager();
        assert!(matches!(
            mgr.create_session("", AuthMethod::Pin),
            Err(AuthError::InvalidUserId)
        ));
        assert!(matches!(mgr.generate_otp(""), Err(AuthError::InvalidUserId)));
    }

    #[test]
    fn session_invalid_after_expiry_and_deleted() {
        let (mgr, clock) = manager();
        let token = mgr.create_session("alice", AuthMethod::Pin).unwrap();

        // now == expires_at is still valid
        clock.advance(Duration::minutes(30));
        assert!(mgr.validate_session(&token).is_some());

        clock.advance(Duration::seconds(1));
        assert!(mgr.validate_session(&token).is_none());
        assert!(mgr.session(&token).unwrap().is_none());
        assert!(matches!(
            mgr.check_session(&token),
            Err(AuthError::UnknownSession)
        ));
    }

    #[test]
    fn check_session_distinguishes_reasons() {
        let (mgr, clock) = manager();
        assert!(matches!(
            mgr.check_session("nope"),
            Err(AuthError::UnknownSession)
        ));

        let a = mgr.create_session("alice", AuthMethod::Pin).unwrap();
        assert!(mgr.deactivate_session(&a).unwrap());
        assert!(matches!(
            mgr.check_session(&a),
            Err(AuthError::InactiveSession)
        ));
        assert!(mgr.validate_session(&a).is_none());
        // deactivated sessions stay until swept
        assert!(mgr.session(&a).unwrap().is_some());

        let b = mgr.create_session("bob", AuthMethod::Pin).unwrap();
        clock.advance(Duration::minutes(31));
        assert!(matches!(
            mgr.check_session(&b),
            Err(AuthError::ExpiredSession)
        ));
    }

    #[test]
    fn end_session_is_idempotent() {
        let (mgr, _) = manager();
        let token = mgr.create_session("alice", AuthMethod::Otp).unwrap();
        assert!(mgr.end_session(&token).unwrap());
        assert!(!mgr.end_session(&token).unwrap());
        assert!(mgr.validate_session(&token).is_none());
    }

    #[test]
    fn extend_session_moves_expiry_forward() {
        let (mgr, clock) = manager();
        let token = mgr.create_session("alice", AuthMethod::VoiceBiometric).unwrap();
        let before = mgr.session(&token).unwrap().unwrap().expires_at;

        clock.advance(Duration::minutes(10));
        let after = mgr.extend_session(&token, None).unwrap();
        assert!(after > before);
        assert_eq!(after, clock.now() + Duration::minutes(30));

        let longer = mgr.extend_session(&token, Some(60)).unwrap();
        assert!(longer > after);
        assert_eq!(mgr.session(&token).unwrap().unwrap().expires_at, longer);

        clock.advance(Duration::minutes(45));
        // zero falls back to the session ttl
        let reset = mgr.extend_session(&token, Some(0)).unwrap();
        assert_eq!(reset, clock.now() + Duration::minutes(30));
        assert!(reset > longer);
    }

    #[test]
    fn extend_session_never_shortens_expiry() {
        let (mgr, clock) = manager();
        let token = mgr.create_session("alice", AuthMethod::VoiceBiometric).unwrap();
        let created = mgr.session(&token).unwrap().unwrap().expires_at;

        assert_eq!(mgr.extend_session(&token, Some(1)).unwrap(), created);
        assert_eq!(mgr.session(&token).unwrap().unwrap().expires_at, created);

        let long = mgr.extend_session(&token, Some(120)).unwrap();
        assert_eq!(long, clock.now() + Duration::minutes(120));
        clock.advance(Duration::minutes(5));
        assert_eq!(mgr.extend_session(&token, None).unwrap(), long);

        clock.advance(Duration::minutes(100));
        let later = mgr.extend_session(&token, None).unwrap();
        assert!(later > long);
    }

    #[test]
    fn extend_unknown_or_expired_session_fails() {
        let (mgr, clock) = manager();
        assert!(matches!(
            mgr.extend_session("nope", None),
            Err(AuthError::UnknownSession)
        ));

        let token = mgr.create_session("alice", AuthMethod::Pin).unwrap();
        clock.advance(Duration::minutes(31));
        assert!(matches!(
            mgr.extend_session(&token, None),
            Err(AuthError::ExpiredSession)
        ));
        assert!(mgr.session(&token).unwrap().is_none());
    }

    #[test]
    fn cleanup_removes_expired_and_inactive_sessions() {
        let (mgr, clock) = manager();
        let old = mgr.create_session("alice", AuthMethod::Pin).unwrap();
        let off = mgr.create_session("bob", AuthMethod::Pin).unwrap();
        mgr.deactivate_session(&off).unwrap();

        clock.advance(Duration::minutes(20));
        let fresh = mgr.create_session("carol", AuthMethod::Pin).unwrap();
        clock.advance(Duration::minutes(15));

        assert_eq!(mgr.cleanup_expired_sessions().unwrap(), 2);
        assert!(mgr.session(&old).unwrap().is_none());
        assert!(mgr.session(&off).unwrap().is_none());
        assert_eq!(mgr.validate_session(&fresh).as_deref(), Some("carol"));
        assert_eq!(mgr.cleanup_expired_sessions().unwrap(), 0);
    }

    #[test]
    fn concurrent_sweep_and_validation_agree() {
        let (mgr, clock) = manager();
        let mgr = Arc::new(mgr);
        let tokens: Vec<_> = (0..100)
            .map(|i| mgr.create_session(&format!("user{i}"), AuthMethod::Pin).unwrap())
            .collect();
        clock.advance(Duration::minutes(31));

        let sweeper = {
            let mgr = Arc::clone(&mgr);
            thread::spawn(move || mgr.cleanup_expired_sessions().unwrap())
        };
        for t in &tokens {
            assert!(mgr.validate_session(t).is_none());
        }
        sweeper.join().unwrap();
        for t in &tokens {
            assert!(mgr.session(t).unwrap().is_none());
        }
    }

    // ---- otp ----

    #[test]
    fn otp_correct_code_succeeds_once() {
        let (mgr, _) = manager();
        let code = mgr.generate_otp("alice").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        assert!(mgr.verify_otp("alice", &code));
        assert!(!mgr.verify_otp("alice", &code));
        assert!(matches!(
            mgr.check_otp("alice", &code),
            Err(AuthError::NoOtp)
        ));
    }

    #[test]
    fn otp_custom_length() {
        let (mgr, _) = manager();
        assert_eq!(mgr.generate_otp_with_length("alice", 8).unwrap().len(), 8);
        assert!(matches!(
            mgr.generate_otp_with_length("alice", 0),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn new_otp_invalidates_prior() {
        let (mgr, _) = manager();
        let first = mgr.generate_otp_with_length("alice", 12).unwrap();
        let mut second = mgr.generate_otp_with_length("alice", 12).unwrap();
        while second == first {
            second = mgr.generate_otp_with_length("alice", 12).unwrap();
        }
        assert!(!mgr.verify_otp("alice", &first));
        assert!(mgr.verify_otp("alice", &second));
    }

    #[test]
    fn otp_fourth_attempt_fails_even_when_correct() {
        let (mgr, _) = manager();
        let code = mgr.generate_otp("alice").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for expected in 1..=3u32 {
            match mgr.check_otp("alice", wrong) {
                Err(AuthError::OtpMismatch { attempts, remaining }) => {
                    assert_eq!(attempts, expected);
                    assert_eq!(remaining, 3 - expected);
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
        assert!(matches!(
            mgr.check_otp("alice", &code),
            Err(AuthError::OtpAttemptsExhausted)
        ));
        // consumed by the terminal failure
        assert!(matches!(
            mgr.check_otp("alice", &code),
            Err(AuthError::NoOtp)
        ));
    }

    #[test]
    fn otp_correct_after_mismatch_under_cap() {
        let (mgr, _) = manager();
        let code = mgr.generate_otp("alice").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(!mgr.verify_otp("alice", wrong));
        assert!(!mgr.verify_otp("alice", wrong));
        assert!(mgr.verify_otp("alice", &code));
    }

    #[test]
    fn otp_expires_after_window() {
        let (mgr, clock) = manager();
        let code = mgr.generate_otp("alice").unwrap();
        clock.advance(Duration::minutes(5) + Duration::seconds(1));
        assert!(matches!(
            mgr.check_otp("alice", &code),
            Err(AuthError::OtpExpired)
        ));
        assert!(matches!(
            mgr.check_otp("alice", &code),
            Err(AuthError::NoOtp)
        ));
    }

    #[test]
    fn otp_attempt_cap_is_configurable() {
        let (mgr, _) = manager_with(AuthConfig {
            otp_max_attempts: 1,
            ..Default::default()
        });
        let code = mgr.generate_otp("alice").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(matches!(
            mgr.check_otp("alice", wrong),
            Err(AuthError::OtpMismatch { attempts: 1, remaining: 0 })
        ));
        assert!(!mgr.verify_otp("alice", &code));
    }

    #[test]
    fn otp_challenges_are_per_user() {
        let (mgr, _) = manager();
        let a = mgr.generate_otp("alice").unwrap();
        let b = mgr.generate_otp("bob").unwrap();
        assert!(mgr.verify_otp("bob", &b));
        assert!(mgr.verify_otp("alice", &a));
    }

    #[test]
    fn cleanup_expired_otps_counts() {
        let (mgr, clock) = manager();
        mgr.generate_otp("alice").unwrap();
        clock.advance(Duration::minutes(3));
        mgr.generate_otp("bob").unwrap();
        clock.advance(Duration::minutes(3));
        assert_eq!(mgr.cleanup_expired_otps().unwrap(), 1);
        assert!(matches!(
            mgr.check_otp("alice", "123456"),
            Err(AuthError::NoOtp)
        ));
    }

    // ---- pin ----

    #[test]
    fn verify_pin_accepts_both_formats() {
        let (mgr, _) = manager();
        assert!(mgr.verify_pin("1234", &pin::hash_pin("1234")));
        assert!(mgr.verify_pin("1234", &pin::hash_pin_salted("1234").unwrap()));
        assert!(!mgr.verify_pin("4321", &pin::hash_pin("1234")));
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = AuthConfig {
            session_ttl_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(
            AuthenticationManager::new(cfg),
            Err(AuthError::InvalidConfig(_))
        ));
    }
}
