//! Retry loop shielding callers from transient rate-limit failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::llm::CompletionError;

/// Longest provider error message surfaced to the user.
const ERROR_DISPLAY_LIMIT: usize = 100;

/// Bounds and pacing for retrying rate-limited completion calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (0-based). The schedule is linear:
    /// 5s after the first attempt, 10s after the second.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

/// Terminal outcome of a failed turn.
///
/// Every failure is absorbed here; nothing propagates past the retry loop as
/// a panic or an unhandled error. The UI maps these to notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// Every attempt was rate limited.
    Busy,
    /// Non-transient provider failure, truncated for display.
    Provider(String),
}

/// Emitted just before each backoff wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// The attempt that was just rate limited, 1-based for display.
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Abstraction over waiting so tests can run the loop without real delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Run a completion operation under the retry policy.
///
/// Rate-limited attempts are retried with linearly increasing waits until the
/// attempt bound is reached; any other failure stops the loop immediately.
/// `on_retry` fires before each wait so the UI can show what is happening.
/// A wait, once started, always runs to completion before the next attempt.
pub async fn complete_with_retry<Op, Fut, S, N>(
    policy: RetryPolicy,
    sleeper: &S,
    mut call: Op,
    mut on_retry: N,
) -> Result<String, TurnError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<String, CompletionError>>,
    S: Sleeper,
    N: FnMut(RetryNotice),
{
    for attempt in 0..policy.max_attempts {
        match call().await {
            Ok(text) => return Ok(text),
            Err(CompletionError::RateLimited) => {
                if attempt + 1 < policy.max_attempts {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts,
                        delay_secs = delay.as_secs(),
                        "rate limited, waiting before retry"
                    );
                    on_retry(RetryNotice {
                        attempt: attempt + 1,
                        max_attempts: policy.max_attempts,
                        delay,
                    });
                    sleeper.sleep(delay).await;
                } else {
                    warn!(
                        max_attempts = policy.max_attempts,
                        "rate limited on final attempt, giving up"
                    );
                    return Err(TurnError::Busy);
                }
            }
            Err(CompletionError::Provider(message)) => {
                warn!(%message, "provider error, not retrying");
                return Err(TurnError::Provider(truncate_for_display(&message)));
            }
        }
    }

    // Only reachable with a zero-attempt policy.
    Err(TurnError::Busy)
}

/// Cap a message at `ERROR_DISPLAY_LIMIT` characters, never splitting a char.
fn truncate_for_display(message: &str) -> String {
    message.chars().take(ERROR_DISPLAY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::future;
    use std::sync::Mutex;

    /// Records requested waits instead of sleeping.
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn new() -> Self {
            Self {
                slept: Mutex::new(Vec::new()),
            }
        }

        fn waits(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.slept.lock().unwrap().push(duration);
            future::ready(())
        }
    }

    /// Stub provider that plays back a fixed script of outcomes.
    struct ScriptedProvider {
        script: RefCell<VecDeque<Result<String, CompletionError>>>,
        calls: RefCell<u32>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                calls: RefCell::new(0),
            }
        }

        fn call(&self) -> future::Ready<Result<String, CompletionError>> {
            *self.calls.borrow_mut() += 1;
            let next = self
                .script
                .borrow_mut()
                .pop_front()
                .expect("more attempts than scripted");
            future::ready(next)
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&s| Duration::from_secs(s)).collect()
    }

    #[tokio::test]
    async fn success_on_first_attempt_makes_no_waits() {
        let sleeper = RecordingSleeper::new();
        let provider = ScriptedProvider::new(vec![Ok("Flexible packages...".to_string())]);
        let mut notices = Vec::new();

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |notice| notices.push(notice),
        )
        .await;

        assert_eq!(result, Ok("Flexible packages...".to_string()));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.waits().is_empty());
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn rate_limits_follow_linear_schedule_then_succeed() {
        let sleeper = RecordingSleeper::new();
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::RateLimited),
            Err(CompletionError::RateLimited),
            Ok("answer".to_string()),
        ]);
        let mut notices = Vec::new();

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |notice| notices.push(notice),
        )
        .await;

        assert_eq!(result, Ok("answer".to_string()));
        assert_eq!(provider.calls(), 3);
        assert_eq!(sleeper.waits(), secs(&[5, 10]));
        assert_eq!(
            notices,
            vec![
                RetryNotice {
                    attempt: 1,
                    max_attempts: 3,
                    delay: Duration::from_secs(5)
                },
                RetryNotice {
                    attempt: 2,
                    max_attempts: 3,
                    delay: Duration::from_secs(10)
                },
            ]
        );
    }

    #[tokio::test]
    async fn gives_up_busy_after_three_rate_limits() {
        let sleeper = RecordingSleeper::new();
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::RateLimited),
            Err(CompletionError::RateLimited),
            Err(CompletionError::RateLimited),
        ]);

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |_| {},
        )
        .await;

        assert_eq!(result, Err(TurnError::Busy));
        // No fourth attempt, and no wait after the final failure.
        assert_eq!(provider.calls(), 3);
        assert_eq!(sleeper.waits(), secs(&[5, 10]));
    }

    #[tokio::test]
    async fn provider_error_stops_immediately() {
        let sleeper = RecordingSleeper::new();
        let provider = ScriptedProvider::new(vec![Err(CompletionError::Provider(
            "connection refused".to_string(),
        ))]);

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |_| {},
        )
        .await;

        assert_eq!(result, Err(TurnError::Provider("connection refused".to_string())));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn provider_error_after_rate_limit_stops_without_more_retries() {
        let sleeper = RecordingSleeper::new();
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::RateLimited),
            Err(CompletionError::Provider("bad gateway".to_string())),
        ]);

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |_| {},
        )
        .await;

        assert_eq!(result, Err(TurnError::Provider("bad gateway".to_string())));
        assert_eq!(provider.calls(), 2);
        assert_eq!(sleeper.waits(), secs(&[5]));
    }

    #[tokio::test]
    async fn long_provider_errors_are_truncated_to_100_chars() {
        let sleeper = RecordingSleeper::new();
        let long_message = "é".repeat(150);
        let provider =
            ScriptedProvider::new(vec![Err(CompletionError::Provider(long_message.clone()))]);

        let result = complete_with_retry(
            RetryPolicy::default(),
            &sleeper,
            || provider.call(),
            |_| {},
        )
        .await;

        match result {
            Err(TurnError::Provider(shown)) => {
                assert_eq!(shown.chars().count(), 100);
                assert!(long_message.starts_with(&shown));
            }
            other => panic!("expected a provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deterministic_stub_yields_identical_output() {
        let sleeper = RecordingSleeper::new();
        let answer_for = |question: &str| format!("echo: {question}");

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let result = complete_with_retry(
                RetryPolicy::default(),
                &sleeper,
                || future::ready(Ok(answer_for("What is your pricing?"))),
                |_| {},
            )
            .await;
            outputs.push(result.unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
    }
}
