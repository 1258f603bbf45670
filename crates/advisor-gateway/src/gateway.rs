//! Request gateway: verification gating in front of advice generation.
//!
//! Holds only immutable configuration and the verifier, so a single instance
//! is shared across all request tasks.

use crate::domain::advice::render_advice;
use crate::domain::config::{ProtocolConfig, VerificationConfig};
use crate::domain::error::{AdviceError, AdviceResult};
use crate::domain::types::{RecaptchaVersion, VerificationPath, VerificationResult};
use crate::ports::outbound::TokenVerifier;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The three advice operations
pub struct RequestGateway {
    config: VerificationConfig,
    verifier: Arc<dyn TokenVerifier>,
}

impl RequestGateway {
    pub fn new(config: VerificationConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { config, verifier }
    }

    /// Score-based verification, then advice.
    pub async fn verify_and_advise_v3(
        &self,
        prompt: &str,
        token: Option<&str>,
    ) -> AdviceResult<String> {
        if let Some(result) = self
            .check(RecaptchaVersion::V3, &self.config.v3, token)
            .await?
        {
            let score = match result.score {
                Some(score) => score,
                None => {
                    warn!("reCAPTCHA v3 response carried no score");
                    return Err(AdviceError::VerificationFailed);
                }
            };

            if score < self.config.score_threshold {
                warn!(
                    score,
                    threshold = self.config.score_threshold,
                    "reCAPTCHA score below threshold"
                );
                return Err(AdviceError::ScoreTooLow { score });
            }

            info!(
                score,
                action = result.action.as_deref().unwrap_or(""),
                hostname = result.hostname.as_deref().unwrap_or(""),
                challenge_ts = result.challenge_ts.as_deref().unwrap_or(""),
                "reCAPTCHA v3 verification successful"
            );
        }

        Ok(advise(prompt, VerificationPath::V3))
    }

    /// Challenge-based verification, then advice. No score check.
    pub async fn verify_and_advise_v2(
        &self,
        prompt: &str,
        token: Option<&str>,
    ) -> AdviceResult<String> {
        if let Some(result) = self
            .check(RecaptchaVersion::V2, &self.config.v2, token)
            .await?
        {
            info!(
                hostname = result.hostname.as_deref().unwrap_or(""),
                challenge_ts = result.challenge_ts.as_deref().unwrap_or(""),
                "reCAPTCHA v2 verification successful"
            );
        }

        Ok(advise(prompt, VerificationPath::V2))
    }

    /// Follow-up route for clients that already passed a v2 challenge.
    pub fn advise_v2_passed(&self, prompt: &str) -> String {
        advise(prompt, VerificationPath::V2Passed)
    }

    /// Shared gate for both protocols.
    ///
    /// `Ok(None)` means verification is disabled for this protocol and the
    /// request proceeds unchecked. `Ok(Some(_))` is always a successful
    /// result; score policy is left to the caller.
    async fn check(
        &self,
        version: RecaptchaVersion,
        protocol: &ProtocolConfig,
        token: Option<&str>,
    ) -> AdviceResult<Option<VerificationResult>> {
        if !protocol.enabled {
            warn!(
                version = version.as_str(),
                "reCAPTCHA verification disabled; skipping"
            );
            return Ok(None);
        }

        // Blank check only; the token is forwarded exactly as received
        let token = match token {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                warn!(version = version.as_str(), "Missing reCAPTCHA token");
                return Err(AdviceError::VerificationFailed);
            }
        };

        let result = self
            .verifier
            .verify(version, &protocol.secret_key, token)
            .await
            .map_err(|e| {
                error!(version = version.as_str(), error = %e, "reCAPTCHA verification call failed");
                AdviceError::ServiceUnavailable
            })?;

        if !result.success {
            warn!(
                version = version.as_str(),
                error_codes = ?result.error_codes.as_deref().unwrap_or_default(),
                "reCAPTCHA verification failed"
            );
            return Err(AdviceError::VerificationFailed);
        }

        Ok(Some(result))
    }
}

fn advise(prompt: &str, path: VerificationPath) -> String {
    debug!(prompt_len = prompt.len(), path = ?path, "Generating advice");
    render_advice(prompt, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::VerifierError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted verifier that records every call
    struct MockVerifier {
        reply: Box<dyn Fn() -> Result<VerificationResult, VerifierError> + Send + Sync>,
        calls: AtomicUsize,
        last_call: Mutex<Option<(RecaptchaVersion, String, String)>>,
    }

    impl MockVerifier {
        fn replying(result: VerificationResult) -> Arc<Self> {
            Arc::new(Self {
                reply: Box::new(move || Ok(result.clone())),
                calls: AtomicUsize::new(0),
                last_call: Mutex::new(None),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: Box::new(|| Err(VerifierError::Transport("connection refused".into()))),
                calls: AtomicUsize::new(0),
                last_call: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenVerifier for MockVerifier {
        async fn verify(
            &self,
            version: RecaptchaVersion,
            secret: &str,
            token: &str,
        ) -> Result<VerificationResult, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_call.lock().unwrap() =
                Some((version, secret.to_string(), token.to_string()));
            (self.reply)()
        }
    }

    fn enabled_config(threshold: f64) -> VerificationConfig {
        VerificationConfig {
            v3: ProtocolConfig::enabled("secret-v3"),
            v2: ProtocolConfig::enabled("secret-v2"),
            score_threshold: threshold,
            ..Default::default()
        }
    }

    fn gateway(config: VerificationConfig, verifier: Arc<MockVerifier>) -> RequestGateway {
        RequestGateway::new(config, verifier)
    }

    #[tokio::test]
    async fn test_v3_disabled_skips_verification() {
        let verifier = MockVerifier::unreachable();
        let gw = gateway(VerificationConfig::default(), Arc::clone(&verifier));

        let advice = gw
            .verify_and_advise_v3("clicking when turning left", Some("any"))
            .await
            .unwrap();
        assert!(advice.contains("clicking when turning left"));
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_v3_high_score_passes() {
        let verifier = MockVerifier::replying(VerificationResult::passed(Some(0.9)));
        let gw = gateway(enabled_config(0.5), Arc::clone(&verifier));

        let advice = gw.verify_and_advise_v3("oil leak", Some("tok")).await.unwrap();
        assert!(advice.contains("oil leak"));
        assert_eq!(verifier.calls(), 1);

        let (version, secret, token) = verifier.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(version, RecaptchaVersion::V3);
        assert_eq!(secret, "secret-v3");
        assert_eq!(token, "tok");
    }

    #[tokio::test]
    async fn test_v3_low_score_rejected() {
        let verifier = MockVerifier::replying(VerificationResult::passed(Some(0.3)));
        let gw = gateway(enabled_config(0.5), verifier);

        let err = gw.verify_and_advise_v3("oil leak", Some("tok")).await.unwrap_err();
        assert_eq!(err, AdviceError::ScoreTooLow { score: 0.3 });
    }

    #[tokio::test]
    async fn test_v3_score_equal_to_threshold_passes() {
        let verifier = MockVerifier::replying(VerificationResult::passed(Some(0.5)));
        let gw = gateway(enabled_config(0.5), verifier);

        assert!(gw.verify_and_advise_v3("p", Some("tok")).await.is_ok());
    }

    #[tokio::test]
    async fn test_v3_rejection_ignores_score() {
        let mut result = VerificationResult::rejected(&["bad-request"]);
        result.score = Some(0.99);
        let verifier = MockVerifier::replying(result);
        let gw = gateway(enabled_config(0.5), verifier);

        let err = gw.verify_and_advise_v3("p", Some("tok")).await.unwrap_err();
        assert_eq!(err, AdviceError::VerificationFailed);
    }

    #[tokio::test]
    async fn test_v3_missing_score_rejected() {
        let verifier = MockVerifier::replying(VerificationResult::passed(None));
        let gw = gateway(enabled_config(0.5), verifier);

        let err = gw.verify_and_advise_v3("p", Some("tok")).await.unwrap_err();
        assert_eq!(err, AdviceError::VerificationFailed);
    }

    #[tokio::test]
    async fn test_missing_token_rejected_without_call() {
        let verifier = MockVerifier::replying(VerificationResult::passed(Some(0.9)));
        let gw = gateway(enabled_config(0.5), Arc::clone(&verifier));

        assert_eq!(
            gw.verify_and_advise_v3("p", None).await.unwrap_err(),
            AdviceError::VerificationFailed
        );
        assert_eq!(
            gw.verify_and_advise_v2("p", Some("  ")).await.unwrap_err(),
            AdviceError::VerificationFailed
        );
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_forwarded_as_received() {
        let verifier = MockVerifier::replying(VerificationResult::passed(Some(0.9)));
        let gw = gateway(enabled_config(0.5), Arc::clone(&verifier));

        gw.verify_and_advise_v3("p", Some(" tok\n")).await.unwrap();
        let (_, _, token) = verifier.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(token, " tok\n");

        gw.verify_and_advise_v2("p", Some("\ttok-v2 ")).await.unwrap();
        let (_, _, token) = verifier.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(token, "\ttok-v2 ");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_success_log_carries_assessment_fields() {
        let result = VerificationResult {
            action: Some("get_advice".into()),
            hostname: Some("localhost".into()),
            challenge_ts: Some("2024-01-01T00:00:00Z".into()),
            ..VerificationResult::passed(Some(0.9))
        };
        let verifier = MockVerifier::replying(result);
        let gw = gateway(enabled_config(0.5), verifier);

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();

        tracing::subscriber::with_default(subscriber, || {
            rt.block_on(gw.verify_and_advise_v3("p", Some("secret-token")))
        })
        .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("reCAPTCHA v3 verification successful"));
        assert!(output.contains("challenge_ts"));
        assert!(output.contains("2024-01-01T00:00:00Z"));
        assert!(output.contains("get_advice"));
        assert!(!output.contains("secret-token"));
        assert!(!output.contains("secret-v3"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_service_unavailable() {
        let verifier = MockVerifier::unreachable();
        let gw = gateway(enabled_config(0.5), verifier);

        assert_eq!(
            gw.verify_and_advise_v3("p", Some("tok")).await.unwrap_err(),
            AdviceError::ServiceUnavailable
        );
        assert_eq!(
            gw.verify_and_advise_v2("p", Some("tok")).await.unwrap_err(),
            AdviceError::ServiceUnavailable
        );
    }

    #[tokio::test]
    async fn test_v2_success_has_no_score_check() {
        let verifier = MockVerifier::replying(VerificationResult::passed(None));
        let gw = gateway(enabled_config(1.0), Arc::clone(&verifier));

        let advice = gw.verify_and_advise_v2("rattle", Some("tok")).await.unwrap();
        assert!(advice.contains("rattle"));
        assert!(advice.contains("reCAPTCHA v2"));

        let (version, secret, _) = verifier.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(version, RecaptchaVersion::V2);
        assert_eq!(secret, "secret-v2");
    }

    #[tokio::test]
    async fn test_v2_failure() {
        let verifier = MockVerifier::replying(VerificationResult::rejected(&["timeout-or-duplicate"]));
        let gw = gateway(enabled_config(0.5), verifier);

        assert_eq!(
            gw.verify_and_advise_v2("p", Some("tok")).await.unwrap_err(),
            AdviceError::VerificationFailed
        );
    }

    #[tokio::test]
    async fn test_v2_disabled_skips_verification() {
        let verifier = MockVerifier::unreachable();
        let config = VerificationConfig {
            v3: ProtocolConfig::enabled("secret-v3"),
            ..Default::default()
        };
        let gw = gateway(config, Arc::clone(&verifier));

        assert!(gw.verify_and_advise_v2("p", None).await.is_ok());
        assert_eq!(verifier.calls(), 0);
    }

    #[test]
    fn test_v2_passed_never_calls_out() {
        let verifier = MockVerifier::unreachable();
        let gw = gateway(enabled_config(0.5), Arc::clone(&verifier));

        let advice = gw.advise_v2_passed("grinding gears");
        assert!(advice.contains("grinding gears"));
        assert!(advice.contains("v2 passed"));
        assert_eq!(verifier.calls(), 0);
    }

    proptest! {
        #[test]
        fn repeated_calls_are_identical(prompt in ".*", score in 0.0f64..=1.0) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let verifier = MockVerifier::replying(VerificationResult::passed(Some(score)));
            let gw = gateway(enabled_config(0.5), verifier);

            let first = rt.block_on(gw.verify_and_advise_v3(&prompt, Some("tok")));
            let second = rt.block_on(gw.verify_and_advise_v3(&prompt, Some("tok")));
            prop_assert_eq!(&first, &second);

            match first {
                Ok(advice) => {
                    prop_assert!(score >= 0.5);
                    prop_assert!(advice.contains(&prompt));
                }
                Err(err) => prop_assert_eq!(err, AdviceError::ScoreTooLow { score }),
            }
        }
    }
}
