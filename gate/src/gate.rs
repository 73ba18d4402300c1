use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use voicegate_authn::{AuthError, AuthMethod, AuthenticationManager, mask_token};
use voicegate_kv::{KVStore, MemoryStore, RedbStore};
use voicegate_trust::{
    AdaptiveTrustEngine, AuthFactor, Operation, TrustAssessment, TrustLevel, TrustSignals,
};
use voicegate_voiceprint::{Match, VoicePrintStore};

use crate::{AssessmentMode, Config, GateError, StorageConfig};

/// Outcome of a voice login.
#[derive(Debug, Clone)]
pub enum VoiceLogin {
    Authenticated {
        token: String,
        user_id: String,
        score: f32,
        assessment: TrustAssessment,
    },
    /// No enrolled print reached the threshold. Fall back to PIN.
    Unrecognized,
}

/// Outcome of a PIN login.
#[derive(Debug, Clone)]
pub enum PinLogin {
    Authenticated {
        token: String,
        user_id: String,
        assessment: TrustAssessment,
    },
    Rejected,
}

/// Why a request needs a step-up before it can proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum StepUpReason {
    /// Amount exceeds the level-independent reverification limit.
    AmountAboveReverificationLimit { amount: f64, limit: f64 },
    /// Sensitive operation at LOW or CRITICAL trust.
    SensitiveOperation { operation: Operation, level: TrustLevel },
    /// Amount exceeds the ceiling of the current trust level.
    AmountAboveLevelCeiling { amount: f64, ceiling: f64 },
}

/// Hard denial. Re-authenticating does not turn these into approvals,
/// except for the session variants, which need a fresh login.
#[derive(Debug, Error)]
pub enum DenialReason {
    #[error("unknown session")]
    UnknownSession,

    #[error("session expired")]
    SessionExpired,

    #[error("session deactivated")]
    SessionInactive,

    #[error("transaction amount must be a positive number, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("{operation} is not allowed at {level} trust")]
    OperationNotAllowed { operation: Operation, level: TrustLevel },

    #[error("step-up verification failed: {0}")]
    StepUpFailed(AuthError),
}

/// Result of [`AuthorizationGate::authorize`].
#[derive(Debug)]
pub enum Decision {
    Approved {
        user_id: String,
        assessment: TrustAssessment,
    },
    /// Present `factors` and retry with the evidence attached.
    StepUpRequired {
        level: TrustLevel,
        factors: Vec<AuthFactor>,
        reasons: Vec<StepUpReason>,
    },
    Denied(DenialReason),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

/// A request to perform one banking operation on a session.
///
/// Step-up evidence is optional; attach it when retrying after
/// [`Decision::StepUpRequired`].
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub token: String,
    pub operation: Operation,
    pub amount: Option<f64>,
    pub signals: Option<TrustSignals>,
    pub pin: Option<PinEvidence>,
    pub otp: Option<String>,
}

/// A PIN and the stored hash to check it against. The hash lives with the
/// user record, outside this crate.
#[derive(Clone)]
pub struct PinEvidence {
    pub pin: String,
    pub stored_hash: String,
}

impl std::fmt::Debug for PinEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PinEvidence(<redacted>)")
    }
}

impl AuthorizationRequest {
    pub fn new(token: impl Into<String>, operation: Operation) -> Self {
        Self {
            token: token.into(),
            operation,
            amount: None,
            signals: None,
            pin: None,
            otp: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_signals(mut self, signals: TrustSignals) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>, stored_hash: impl Into<String>) -> Self {
        self.pin = Some(PinEvidence {
            pin: pin.into(),
            stored_hash: stored_hash.into(),
        });
        self
    }

    pub fn with_otp(mut self, code: impl Into<String>) -> Self {
        self.otp = Some(code.into());
        self
    }
}

/// Login and per-request authorization over a voice-print store, an
/// authentication manager and a trust engine.
pub struct AuthorizationGate {
    mode: AssessmentMode,
    voiceprints: Arc<VoicePrintStore>,
    auth: Arc<AuthenticationManager>,
    trust: Arc<AdaptiveTrustEngine>,
    /// Signals recorded at login, by session token.
    captured: RwLock<HashMap<String, TrustSignals>>,
}

impl AuthorizationGate {
    pub fn new(
        mode: AssessmentMode,
        voiceprints: Arc<VoicePrintStore>,
        auth: Arc<AuthenticationManager>,
        trust: Arc<AdaptiveTrustEngine>,
    ) -> Self {
        Self {
            mode,
            voiceprints,
            auth,
            trust,
            captured: RwLock::new(HashMap::new()),
        }
    }

    /// Builds every component from `cfg`, with voice prints in `kv`.
    pub fn from_config(cfg: &Config, kv: Arc<dyn KVStore>) -> Result<Self, GateError> {
        cfg.validate()?;
        let voiceprints = VoicePrintStore::new(kv, cfg.voiceprint.clone())?;
        let auth = AuthenticationManager::new(cfg.auth.clone())?;
        let trust = AdaptiveTrustEngine::new(cfg.trust.clone())?;
        Ok(Self::new(
            cfg.gate.assessment,
            Arc::new(voiceprints),
            Arc::new(auth),
            Arc::new(trust),
        ))
    }

    /// Opens the voice-print backend named by `cfg`: a redb file when a
    /// path is set, memory otherwise.
    pub fn open_store(cfg: &StorageConfig) -> Result<Arc<dyn KVStore>, GateError> {
        Ok(match &cfg.path {
            Some(path) => Arc::new(RedbStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        })
    }

    pub fn mode(&self) -> AssessmentMode {
        self.mode
    }

    pub fn voiceprints(&self) -> &VoicePrintStore {
        &self.voiceprints
    }

    pub fn auth(&self) -> &AuthenticationManager {
        &self.auth
    }

    pub fn trust(&self) -> &AdaptiveTrustEngine {
        &self.trust
    }

    /// False on a fresh deployment, where the first login must use a PIN.
    pub fn has_enrolled_users(&self) -> Result<bool, GateError> {
        Ok(!self.voiceprints.is_empty()?)
    }

    // ---- login ----

    /// Identifies the speaker and opens a session.
    ///
    /// `signals.voice_confidence` is replaced by the match score.
    pub fn authenticate_voice(&self, probe: &[f32], signals: TrustSignals) -> Result<VoiceLogin, GateError> {
        let Some(m) = self.voiceprints.identify(probe)? else {
            tracing::info!("gate: voice not recognized");
            return Ok(VoiceLogin::Unrecognized);
        };
        self.voice_session(m, signals)
    }

    /// [`Self::authenticate_voice`] on raw audio through the store's
    /// embedding provider.
    pub fn authenticate_voice_audio(
        &self,
        audio: &[f32],
        sample_rate: u32,
        signals: TrustSignals,
    ) -> Result<VoiceLogin, GateError> {
        let Some(m) = self.voiceprints.identify_audio(audio, sample_rate)? else {
            tracing::info!("gate: voice not recognized");
            return Ok(VoiceLogin::Unrecognized);
        };
        self.voice_session(m, signals)
    }

    /// PIN fallback login. There is no voice evidence, so the assessment
    /// uses a voice confidence of zero.
    pub fn authenticate_pin(
        &self,
        user_id: &str,
        pin: &str,
        stored_hash: &str,
        signals: TrustSignals,
    ) -> Result<PinLogin, GateError> {
        if !self.auth.verify_pin(pin, stored_hash) {
            tracing::warn!(user_id, "gate: pin login rejected");
            return Ok(PinLogin::Rejected);
        }
        let signals = TrustSignals {
            voice_confidence: 0.0,
            ..signals
        };
        let (token, assessment) = self.open_session(user_id, AuthMethod::Pin, signals)?;
        Ok(PinLogin::Authenticated {
            token,
            user_id: user_id.to_string(),
            assessment,
        })
    }

    fn voice_session(&self, m: Match, signals: TrustSignals) -> Result<VoiceLogin, GateError> {
        let signals = TrustSignals {
            voice_confidence: f64::from(m.score),
            ..signals
        };
        let (token, assessment) = self.open_session(&m.user_id, AuthMethod::VoiceBiometric, signals)?;
        Ok(VoiceLogin::Authenticated {
            token,
            user_id: m.user_id,
            score: m.score,
            assessment,
        })
    }

    fn open_session(
        &self,
        user_id: &str,
        method: AuthMethod,
        signals: TrustSignals,
    ) -> Result<(String, TrustAssessment), GateError> {
        let assessment = self.trust.assess(&signals, None);
        let token = self.auth.create_session(user_id, method)?;
        self.captured.write().insert(token.clone(), signals);
        tracing::info!(
            user_id,
            token = %mask_token(&token),
            method = %method,
            level = %assessment.trust_level,
            "gate: login"
        );
        Ok((token, assessment))
    }

    /// Replaces the captured signals of a live session, e.g. when ambient
    /// noise changes mid-conversation.
    pub fn refresh_signals(&self, token: &str, signals: TrustSignals) -> Result<(), GateError> {
        self.auth.check_session(token)?;
        self.captured.write().insert(token.to_string(), signals);
        Ok(())
    }

    /// Ends the session and forgets its captured signals.
    pub fn end_session(&self, token: &str) -> Result<bool, GateError> {
        self.captured.write().remove(token);
        Ok(self.auth.end_session(token)?)
    }

    /// Sweeps expired sessions and OTP challenges, and the captured
    /// signals of sessions that no longer exist. Returns the number of
    /// sessions removed.
    pub fn cleanup_expired(&self) -> Result<usize, GateError> {
        let removed = self.auth.cleanup_expired_sessions()?;
        self.auth.cleanup_expired_otps()?;
        let tokens: Vec<String> = self.captured.read().keys().cloned().collect();
        let mut gone = Vec::new();
        for token in tokens {
            if self.auth.session(&token)?.is_none() {
                gone.push(token);
            }
        }
        let mut captured = self.captured.write();
        for token in &gone {
            captured.remove(token);
        }
        Ok(removed)
    }

    // ---- authorization ----

    /// Decides whether the request may proceed.
    ///
    /// Order: session check, amount sanity, trust assessment, categorical
    /// operation policy, then step-up. An amount that is not a positive
    /// finite number is denied outright. Step-up is demanded when
    /// [`AdaptiveTrustEngine::requires_reverification`] says so or the
    /// amount exceeds the level's transaction ceiling. Evidence on the
    /// request is checked against the factors the level requires (at
    /// least a PIN). Missing evidence yields [`Decision::StepUpRequired`];
    /// wrong evidence yields [`DenialReason::StepUpFailed`].
    pub fn authorize(&self, req: &AuthorizationRequest) -> Result<Decision, GateError> {
        let token = mask_token(&req.token);
        let session = match self.auth.check_session(&req.token) {
            Ok(session) => session,
            Err(AuthError::UnknownSession) => {
                return Ok(self.deny(&token, DenialReason::UnknownSession));
            }
            Err(AuthError::ExpiredSession) => {
                self.captured.write().remove(&req.token);
                return Ok(self.deny(&token, DenialReason::SessionExpired));
            }
            Err(AuthError::InactiveSession) => {
                return Ok(self.deny(&token, DenialReason::SessionInactive));
            }
            Err(e) => return Err(e.into()),
        };
        let user_id = session.user_id;

        if let Some(amount) = req.amount.filter(|a| !a.is_finite() || *a <= 0.0) {
            return Ok(self.deny(&token, DenialReason::InvalidAmount { amount }));
        }

        let signals = self.signals_for(req)?;
        let assessment = self.trust.assess(&signals, req.amount);
        let level = assessment.trust_level;

        let allowed = self.trust.get_allowed_operations(level);
        if !allowed.allows(req.operation) {
            return Ok(self.deny(
                &token,
                DenialReason::OperationNotAllowed {
                    operation: req.operation,
                    level,
                },
            ));
        }

        let reasons = self.step_up_reasons(level, req);
        if reasons.is_empty() {
            tracing::info!(
                user_id = %user_id,
                operation = %req.operation,
                level = %level,
                "gate: approved"
            );
            return Ok(Decision::Approved { user_id, assessment });
        }

        let mut factors = self.trust.get_required_authentication(level).step_up_factors();
        if factors.is_empty() {
            factors.push(AuthFactor::Pin);
        }

        let presented = factors.iter().all(|f| match f {
            AuthFactor::Pin => req.pin.is_some(),
            AuthFactor::Otp => req.otp.is_some(),
            AuthFactor::VoiceBiometric => true,
        });
        if !presented {
            tracing::info!(
                user_id = %user_id,
                operation = %req.operation,
                level = %level,
                reasons = reasons.len(),
                "gate: step-up required"
            );
            return Ok(Decision::StepUpRequired {
                level,
                factors,
                reasons,
            });
        }

        for factor in &factors {
            let checked = match factor {
                AuthFactor::Pin => match &req.pin {
                    Some(ev) if self.auth.verify_pin(&ev.pin, &ev.stored_hash) => Ok(()),
                    _ => Err(AuthError::PinMismatch),
                },
                AuthFactor::Otp => match &req.otp {
                    Some(code) => self.auth.check_otp(&user_id, code),
                    None => Err(AuthError::NoOtp),
                },
                AuthFactor::VoiceBiometric => Ok(()),
            };
            match checked {
                Ok(()) => {}
                Err(AuthError::Store(e)) => return Err(AuthError::Store(e).into()),
                Err(e) => return Ok(self.deny(&token, DenialReason::StepUpFailed(e))),
            }
        }

        tracing::info!(
            user_id = %user_id,
            operation = %req.operation,
            level = %level,
            "gate: approved after step-up"
        );
        Ok(Decision::Approved { user_id, assessment })
    }

    fn signals_for(&self, req: &AuthorizationRequest) -> Result<TrustSignals, GateError> {
        match self.mode {
            AssessmentMode::PerCall => req.signals.ok_or(GateError::MissingSignals),
            AssessmentMode::Captured => self
                .captured
                .read()
                .get(&req.token)
                .copied()
                .or(req.signals)
                .ok_or(GateError::MissingSignals),
        }
    }

    fn step_up_reasons(&self, level: TrustLevel, req: &AuthorizationRequest) -> Vec<StepUpReason> {
        let mut reasons = Vec::new();
        let cfg = self.trust.config();

        if self.trust.requires_reverification(level, req.operation, req.amount) {
            match req.amount {
                Some(amount) if !amount.is_finite() || amount > cfg.require_reverification_above => {
                    reasons.push(StepUpReason::AmountAboveReverificationLimit {
                        amount,
                        limit: cfg.require_reverification_above,
                    });
                }
                _ => {}
            }
            if req.operation.is_sensitive() && level.is_reduced() {
                reasons.push(StepUpReason::SensitiveOperation {
                    operation: req.operation,
                    level,
                });
            }
        }

        if let Some(amount) = req.amount {
            let allowed = self.trust.get_allowed_operations(level);
            if !allowed.within_limit(amount) {
                reasons.push(StepUpReason::AmountAboveLevelCeiling {
                    amount,
                    ceiling: allowed.max_transaction_amount.unwrap_or(f64::INFINITY),
                });
            }
        }
        reasons
    }

    fn deny(&self, token: &str, reason: DenialReason) -> Decision {
        tracing::warn!(token, reason = %reason, "gate: denied");
        Decision::Denied(reason)
    }
}
