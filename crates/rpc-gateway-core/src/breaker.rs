use std::sync::Mutex;
use std::time::{Duration, Instant};

use rpc_gateway_config::CircuitBreakerConfig;

/// Circuit breaker state, mirroring the classic closed/open/half-open machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_metric_label(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
struct Inner {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Set while a half-open probe is in flight, so concurrent callers don't all
    /// get waved through as "the" probe.
    probe_in_flight: bool,
}

/// One circuit breaker per network, guarding the whole primary+fallback call
/// sequence. A transport error or an HTTP 5xx counts as a failure; a decoded
/// JSON-RPC response -- success or protocol error -- does not.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

/// What a caller is allowed to do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerDecision {
    /// Proceed normally.
    Allow,
    /// Proceed, but this call is the single half-open probe; record its outcome.
    AllowAsProbe,
    /// The breaker is open and not yet eligible for a probe; reject immediately.
    Reject,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner { consecutive_failures: 0, opened_at: None, probe_in_flight: false }),
        }
    }

    pub fn state(&self) -> BreakerState {
        let inner = self.lock();
        self.state_locked(&inner)
    }

    fn state_locked(&self, inner: &Inner) -> BreakerState {
        match inner.opened_at {
            None => BreakerState::Closed,
            Some(opened_at) if opened_at.elapsed() >= self.config.recovery_timeout => {
                BreakerState::HalfOpen
            }
            Some(_) => BreakerState::Open,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("circuit breaker mutex poisoned")
    }

    /// Call before attempting an upstream request. Pair the result with
    /// [`CircuitBreaker::record_success`] / [`CircuitBreaker::record_failure`].
    pub fn admit(&self) -> BreakerDecision {
        let mut inner = self.lock();
        match self.state_locked(&inner) {
            BreakerState::Closed => BreakerDecision::Allow,
            BreakerState::Open => BreakerDecision::Reject,
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    BreakerDecision::Reject
                } else {
                    inner.probe_in_flight = true;
                    BreakerDecision::AllowAsProbe
                }
            }
        }
    }

    pub fn record_success(&self, decision: BreakerDecision) {
        let mut inner = self.lock();
        if decision == BreakerDecision::AllowAsProbe {
            inner.probe_in_flight = false;
        }
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self, decision: BreakerDecision) {
        let mut inner = self.lock();
        if decision == BreakerDecision::AllowAsProbe {
            inner.probe_in_flight = false;
            inner.opened_at = Some(Instant::now());
            return;
        }
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.config.failure_threshold {
            inner.opened_at = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(failure_threshold: u32, recovery_timeout: Duration) -> CircuitBreakerConfig {
        CircuitBreakerConfig { failure_threshold, recovery_timeout, monitoring_period: Duration::from_secs(300) }
    }

    #[test]
    fn starts_closed_and_allows() {
        let breaker = CircuitBreaker::new(config(5, Duration::from_secs(60)));
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.admit(), BreakerDecision::Allow);
    }

    #[test]
    fn opens_after_reaching_failure_threshold() {
        let breaker = CircuitBreaker::new(config(3, Duration::from_secs(60)));
        for _ in 0..2 {
            let decision = breaker.admit();
            breaker.record_failure(decision);
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
        let decision = breaker.admit();
        breaker.record_failure(decision);
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(breaker.admit(), BreakerDecision::Reject);
    }

    #[test]
    fn half_open_allows_a_single_probe() {
        let breaker = CircuitBreaker::new(config(1, Duration::from_millis(10)));
        let decision = breaker.admit();
        breaker.record_failure(decision);
        assert_eq!(breaker.state(), BreakerState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        let probe = breaker.admit();
        assert_eq!(probe, BreakerDecision::AllowAsProbe);
        assert_eq!(breaker.admit(), BreakerDecision::Reject);
    }

    #[test]
    fn successful_probe_closes_the_breaker() {
        let breaker = CircuitBreaker::new(config(1, Duration::from_millis(10)));
        let decision = breaker.admit();
        breaker.record_failure(decision);
        std::thread::sleep(Duration::from_millis(20));

        let probe = breaker.admit();
        breaker.record_success(probe);
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.admit(), BreakerDecision::Allow);
    }

    #[test]
    fn failed_probe_reopens_the_breaker() {
        let breaker = CircuitBreaker::new(config(1, Duration::from_millis(10)));
        let decision = breaker.admit();
        breaker.record_failure(decision);
        std::thread::sleep(Duration::from_millis(20));

        let probe = breaker.admit();
        breaker.record_failure(probe);
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new(config(3, Duration::from_secs(60)));
        let decision = breaker.admit();
        breaker.record_failure(decision);
        let decision = breaker.admit();
        breaker.record_success(decision);
        let decision = breaker.admit();
        breaker.record_failure(decision);
        let decision = breaker.admit();
        breaker.record_failure(decision);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
