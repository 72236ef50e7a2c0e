//! Authentication state owned by the caller.
//!
//! The context holds the configuration, the distance engine and the current
//! enrolled profile. The profile sits behind an `RwLock<Option<Arc<_>>>`:
//! enrollment builds a complete new profile and swaps the pointer, so a
//! concurrent verification works on either the old or the new profile and
//! never on a partially replaced one.

use crate::collector::source::{CancellationToken, EventSource};
use crate::config::{AuthenticationConfig, Config, ConfigError};
use crate::core::capture::{PasswordCapture, DEFAULT_POLL_INTERVAL};
use crate::core::decision::{self, DecisionResult};
use crate::core::dtw::{DistanceMetric, Dtw};
use crate::core::features::{extract_features, FeatureVector};
use crate::core::profile::EnrollmentProfile;
use crate::core::report::ProfileReport;
use crate::error::AuthError;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Lifecycle of the authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No profile yet; verification fails with `NotEnrolled`
    Unenrolled,
    /// A profile is in place; re-enrollment replaces it
    Enrolled,
}

/// Enrollment and verification against a single shared profile.
#[derive(Debug)]
pub struct AuthenticationContext<M = Dtw> {
    config: AuthenticationConfig,
    metric: M,
    poll_interval: Duration,
    profile: RwLock<Option<Arc<EnrollmentProfile>>>,
}

impl AuthenticationContext<Dtw> {
    /// Build a context from the full application config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.auth.clone(), config.distance_engine())?
            .with_poll_interval(config.poll_interval))
    }
}

impl<M: DistanceMetric> AuthenticationContext<M> {
    pub fn new(config: AuthenticationConfig, metric: M) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            metric,
            poll_interval: DEFAULT_POLL_INTERVAL,
            profile: RwLock::new(None),
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Start in the enrolled state with a previously stored profile.
    pub fn with_profile(self, profile: EnrollmentProfile) -> Self {
        if profile.samples().len() != self.config.sample_count {
            tracing::warn!(
                profile_samples = profile.samples().len(),
                configured = self.config.sample_count,
                "Stored profile was enrolled with a different sample count"
            );
        }
        self.install(Arc::new(profile));
        self
    }

    pub fn config(&self) -> &AuthenticationConfig {
        &self.config
    }

    pub fn state(&self) -> AuthState {
        match self.profile() {
            Some(_) => AuthState::Enrolled,
            None => AuthState::Unenrolled,
        }
    }

    /// Whether the current profile was enrolled with the configured number
    /// of samples. False when nothing is enrolled.
    pub fn profile_matches_config(&self) -> bool {
        self.profile()
            .is_some_and(|p| p.samples().len() == self.config.sample_count)
    }

    /// Snapshot of the current profile.
    pub fn profile(&self) -> Option<Arc<EnrollmentProfile>> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Enroll from already extracted samples.
    ///
    /// The previous profile, if any, is kept untouched when this fails.
    pub fn enroll(&self, samples: Vec<FeatureVector>) -> Result<Arc<EnrollmentProfile>, AuthError> {
        let profile = Arc::new(EnrollmentProfile::enroll(samples, self.config.sample_count)?);
        self.install(Arc::clone(&profile));
        tracing::info!(
            profile_id = %profile.id(),
            features = profile.average().len(),
            "Typing profile enrolled"
        );
        Ok(profile)
    }

    /// Verify one extracted attempt against the current profile.
    pub fn verify(&self, attempt: &FeatureVector) -> Result<DecisionResult, AuthError> {
        let profile = self.profile();
        let result = decision::verify(
            profile.as_deref(),
            attempt,
            self.config.threshold,
            &self.metric,
        )?;
        tracing::info!(
            distance = result.distance,
            accepted = result.accepted,
            "Verification decided"
        );
        Ok(result)
    }

    /// Distances from the current reference to each enrollment sample.
    pub fn self_distances(&self) -> Result<Vec<f64>, AuthError> {
        let profile = self.profile().ok_or(AuthError::NotEnrolled)?;
        let distances = profile.self_distances(&self.metric)?;
        tracing::debug!(?distances, "Profile self distances");
        Ok(distances)
    }

    /// Profile quality report against the configured threshold.
    pub fn report(&self) -> Result<ProfileReport, AuthError> {
        Ok(ProfileReport::from_distances(
            self.self_distances()?,
            self.config.threshold,
        ))
    }

    /// Capture one typing sample of the password and extract its features.
    pub fn capture_sample<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<FeatureVector, AuthError> {
        let events = PasswordCapture::new(self.config.password.as_str())
            .with_poll_interval(self.poll_interval)
            .capture(source, cancel)?;
        Ok(extract_features(&events))
    }

    /// Run the configured number of capture rounds, then enroll.
    ///
    /// `on_round` is called with the 1-based round number before each
    /// capture so the caller can prompt the user.
    pub fn enroll_from<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
        mut on_round: impl FnMut(usize),
    ) -> Result<Arc<EnrollmentProfile>, AuthError> {
        let mut samples = Vec::with_capacity(self.config.sample_count);
        for round in 1..=self.config.sample_count {
            on_round(round);
            let sample = self.capture_sample(source, cancel)?;
            tracing::debug!(round, features = sample.len(), "Enrollment sample captured");
            samples.push(sample);
        }
        self.enroll(samples)
    }

    /// Capture one attempt and verify it.
    ///
    /// Fails with `NotEnrolled` before consuming any events when no profile exists.
    pub fn verify_from<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<DecisionResult, AuthError> {
        if self.state() == AuthState::Unenrolled {
            return Err(AuthError::NotEnrolled);
        }
        let attempt = self.capture_sample(source, cancel)?;
        self.verify(&attempt)
    }

    fn install(&self, profile: Arc<EnrollmentProfile>) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::replay::ReplaySource;
    use crate::collector::types::KeyEvent;
    use std::thread;

    fn context() -> AuthenticationContext {
        let config = AuthenticationConfig {
            password: "ab".to_string(),
            threshold: 0.5,
            sample_count: 3,
        };
        AuthenticationContext::new(config, Dtw::exact()).unwrap()
    }

    fn vector() -> FeatureVector {
        FeatureVector::from_segments(vec![0.10, 0.12], vec![0.20])
    }

    #[test]
    fn test_starts_unenrolled() {
        let ctx = context();
        assert_eq!(ctx.state(), AuthState::Unenrolled);
        assert!(matches!(ctx.verify(&vector()), Err(AuthError::NotEnrolled)));
        assert!(matches!(ctx.self_distances(), Err(AuthError::NotEnrolled)));
    }

    #[test]
    fn test_enroll_then_verify() {
        let ctx = context();
        ctx.enroll(vec![vector(); 3]).unwrap();
        assert_eq!(ctx.state(), AuthState::Enrolled);

        let result = ctx.verify(&vector()).unwrap();
        assert_eq!(result.distance, 0.0);
        assert!(result.accepted);
        assert_eq!(ctx.self_distances().unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_failed_reenrollment_keeps_previous_profile() {
        let ctx = context();
        let first = ctx.enroll(vec![vector(); 3]).unwrap();

        let odd = FeatureVector::from_segments(vec![0.1], vec![0.2, 0.3, 0.4]);
        let err = ctx.enroll(vec![vector(), vector(), odd]).unwrap_err();
        assert!(matches!(err, AuthError::InconsistentSampleLength(_)));

        assert_eq!(ctx.profile().unwrap().id(), first.id());
    }

    #[test]
    fn test_reenrollment_replaces_profile() {
        let ctx = context();
        let first = ctx.enroll(vec![vector(); 3]).unwrap();
        let slower = FeatureVector::from_segments(vec![0.2, 0.2], vec![0.4]);
        let second = ctx.enroll(vec![slower; 3]).unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(ctx.profile().unwrap().id(), second.id());
        // The earlier snapshot is still intact for anyone holding it
        assert_eq!(first.average(), &vector());
    }

    #[test]
    fn test_stored_profile_with_other_sample_count_is_flagged() {
        let profile = EnrollmentProfile::enroll(vec![vector(); 2], 2).unwrap();
        let ctx = context().with_profile(profile);
        assert_eq!(ctx.state(), AuthState::Enrolled);
        assert!(!ctx.profile_matches_config());

        ctx.enroll(vec![vector(); 3]).unwrap();
        assert!(ctx.profile_matches_config());
        assert!(!context().profile_matches_config());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AuthenticationConfig {
            threshold: -1.0,
            ..Default::default()
        };
        assert!(AuthenticationContext::new(config, Dtw::exact()).is_err());
    }

    #[test]
    fn test_verify_from_requires_enrollment_before_capture() {
        let ctx = context();
        let mut source = ReplaySource::new(vec![KeyEvent::down("a", 0.0)]);
        let err = ctx
            .verify_from(&mut source, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::NotEnrolled));
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_enroll_from_prompts_each_round() {
        let ctx = context();
        let mut events = Vec::new();
        for round in 0..3 {
            let t = round as f64;
            events.extend([
                KeyEvent::down("a", t),
                KeyEvent::up("a", t + 0.1),
                KeyEvent::down("b", t + 0.2),
                KeyEvent::up("b", t + 0.3),
            ]);
        }
        let mut source = ReplaySource::new(events);
        let mut rounds = Vec::new();

        let profile = ctx
            .enroll_from(&mut source, &CancellationToken::new(), |r| rounds.push(r))
            .unwrap();
        assert_eq!(rounds, vec![1, 2, 3]);
        assert_eq!(profile.samples().len(), 3);
    }

    #[test]
    fn test_cancelled_enrollment_leaves_state_unchanged() {
        let ctx = context();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source = ReplaySource::default();
        let err = ctx.enroll_from(&mut source, &cancel, |_| {}).unwrap_err();
        assert!(matches!(err, AuthError::Capture(_)));
        assert_eq!(ctx.state(), AuthState::Unenrolled);
    }

    #[test]
    fn test_concurrent_verify_sees_whole_profiles() {
        let ctx = Arc::new(context());
        ctx.enroll(vec![vector(); 3]).unwrap();

        let reader = {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                for _ in 0..200 {
                    let profile = ctx.profile().unwrap();
                    assert_eq!(profile.samples().len(), 3);
                    assert_eq!(profile.average().len(), 3);
                    ctx.verify(&vector()).unwrap();
                }
            })
        };
        for i in 0..50 {
            let scale = 1.0 + i as f64 / 100.0;
            let sample = FeatureVector::from_segments(vec![0.1 * scale, 0.12], vec![0.2]);
            ctx.enroll(vec![sample; 3]).unwrap();
        }
        reader.join().unwrap();
    }
}
