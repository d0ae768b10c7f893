use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::SettingsError;
use crate::ring_buffer::HealthRingBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	Closed,
	Open,
	HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
	pub min_success_rate: f64,
	pub min_samples: usize,
	pub retry_timeout: Duration,
	pub trial_success_required: usize,
}

impl Settings {
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !(0.0..=1.0).contains(&self.min_success_rate) {
			return Err(SettingsError::SuccessRateOutOfRange(self.min_success_rate));
		}
		if self.trial_success_required == 0 {
			return Err(SettingsError::NoTrialSuccessRequired);
		}
		Ok(())
	}
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			min_success_rate: 0.9,
			min_samples: 100,
			retry_timeout: Duration::from_secs(60),
			trial_success_required: 20,
		}
	}
}

#[derive(Debug)]
struct Breaker {
	state: State,
	opened_at: Option<Instant>,
	trial_success: usize,
}

impl Breaker {
	fn open(&mut self) {
		self.state = State::Open;
		self.opened_at = Some(Instant::now());
		self.trial_success = 0;
	}
}

/// Gates calls to a dependency on the health of its recent outcomes.
///
/// Closed while the rolling success rate holds, open once it drops below
/// `min_success_rate`, and half-open after `retry_timeout` to let trial
/// calls decide whether to close again.
#[derive(Debug)]
pub struct CircuitBreaker {
	buffer: HealthRingBuffer,
	breaker: Mutex<Breaker>,
	settings: Settings,
}

impl CircuitBreaker {
	pub fn new() -> Self {
		Self {
			buffer: HealthRingBuffer::new(),
			breaker: Mutex::new(Breaker {
				state: State::Closed,
				opened_at: None,
				trial_success: 0,
			}),
			settings: Settings::default(),
		}
	}

	pub fn with_settings(settings: Settings) -> Result<Self, SettingsError> {
		settings.validate()?;
		Ok(Self {
			settings,
			..Self::new()
		})
	}

	/// Clamped into `[0, 1]`; NaN keeps the current rate.
	pub fn set_min_success_rate(mut self, rate: f64) -> Self {
		if !rate.is_nan() {
			self.settings.min_success_rate = rate.clamp(0.0, 1.0);
		}
		self
	}

	pub fn set_min_samples(mut self, samples: usize) -> Self {
		self.settings.min_samples = samples;
		self
	}

	pub fn set_retry_timeout(mut self, timeout: Duration) -> Self {
		self.settings.retry_timeout = timeout;
		self
	}

	/// At least one trial success is always required.
	pub fn set_trial_success_required(mut self, amount: usize) -> Self {
		self.settings.trial_success_required = amount.max(1);
		self
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn buffer(&self) -> &HealthRingBuffer {
		&self.buffer
	}

	pub fn state(&self) -> State {
		self.breaker.lock().state
	}

	pub fn success_rate(&self) -> f64 {
		self.buffer.success_rate()
	}

	/// Whether a call may go through right now. Moves an open breaker to
	/// half-open once its retry timeout has passed.
	pub fn is_call_permitted(&self) -> bool {
		let mut breaker = self.breaker.lock();
		match breaker.state {
			State::Closed | State::HalfOpen => true,
			State::Open => {
				let expired = breaker
					.opened_at
					.map_or(true, |opened_at| opened_at.elapsed() >= self.settings.retry_timeout);
				if expired {
					breaker.state = State::HalfOpen;
					breaker.trial_success = 0;
					tracing::info!(retry_timeout = ?self.settings.retry_timeout, "circuit half-open, trial calls permitted");
				}
				expired
			},
		}
	}

	/// Feeds the outcome of a permitted call back into the breaker.
	pub fn record(&self, outcome: bool) {
		let mut breaker = self.breaker.lock();
		match breaker.state {
			State::Closed => {
				let healthy = self.buffer.push_and_check(
					outcome,
					self.settings.min_success_rate,
					self.settings.min_samples,
				);
				if !healthy {
					breaker.open();
					tracing::warn!(
						success_rate = self.buffer.success_rate(),
						min_success_rate = self.settings.min_success_rate,
						"circuit opened"
					);
				}
			},
			State::Open => {
				tracing::trace!(outcome, "outcome ignored while circuit is open");
			},
			State::HalfOpen if outcome => {
				breaker.trial_success += 1;
				if breaker.trial_success >= self.settings.trial_success_required {
					breaker.state = State::Closed;
					breaker.opened_at = None;
					breaker.trial_success = 0;
					self.buffer.clear();
					tracing::debug!("health buffer cleared");
					tracing::info!("circuit closed after successful trial");
				}
			},
			State::HalfOpen => {
				breaker.open();
				tracing::warn!("trial call failed, circuit re-opened");
			},
		}
	}
}

impl Default for CircuitBreaker {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn trip(breaker: &CircuitBreaker) {
		for _ in 0..breaker.settings().min_samples {
			breaker.record(false);
		}
		assert_eq!(breaker.state(), State::Open);
	}

	#[test]
	fn settings_test() {
		assert_eq!(CircuitBreaker::new().buffer().capacity(), 1024);
		assert_eq!(*CircuitBreaker::new().settings(), Settings::default());
		assert_eq!(
			*CircuitBreaker::new()
				.set_min_success_rate(0.75)
				.set_min_samples(5)
				.set_retry_timeout(Duration::from_millis(20))
				.set_trial_success_required(42)
				.settings(),
			Settings {
				min_success_rate: 0.75,
				min_samples: 5,
				retry_timeout: Duration::from_millis(20),
				trial_success_required: 42,
			}
		);
	}

	#[test]
	fn setters_keep_settings_valid_test() {
		let breaker = CircuitBreaker::new().set_min_success_rate(1.5).set_trial_success_required(0);
		assert_eq!(breaker.settings().validate(), Ok(()));
		assert_eq!(breaker.settings().min_success_rate, 1.0);
		assert_eq!(breaker.settings().trial_success_required, 1);

		let breaker = CircuitBreaker::new().set_min_success_rate(-3.0);
		assert_eq!(breaker.settings().min_success_rate, 0.0);

		let breaker = CircuitBreaker::new().set_min_success_rate(0.5).set_min_success_rate(f64::NAN);
		assert_eq!(breaker.settings().min_success_rate, 0.5);
		assert_eq!(breaker.settings().validate(), Ok(()));
	}

	#[test]
	fn setter_rate_never_trips_on_successes_test() {
		for rate in [0.0, 0.5, 1.0, 1.5, 100.0, f64::INFINITY, f64::NAN] {
			let breaker = CircuitBreaker::new().set_min_samples(1).set_min_success_rate(rate);
			for _ in 0..2000 {
				breaker.record(true);
			}
			assert_eq!(breaker.state(), State::Closed, "min_success_rate {rate}");
		}
	}

	#[test]
	fn trial_requires_a_success_test() {
		let breaker = CircuitBreaker::new()
			.set_min_samples(10)
			.set_retry_timeout(Duration::ZERO)
			.set_trial_success_required(0);
		trip(&breaker);
		assert!(breaker.is_call_permitted());
		assert_eq!(breaker.state(), State::HalfOpen);
		breaker.record(true);
		assert_eq!(breaker.state(), State::Closed);
	}

	#[test]
	fn validate_test() {
		assert_eq!(Settings::default().validate(), Ok(()));
		assert_eq!(
			Settings {
				min_success_rate: 0.0,
				..Default::default()
			}
			.validate(),
			Ok(())
		);
		assert_eq!(
			Settings {
				min_success_rate: 1.0,
				..Default::default()
			}
			.validate(),
			Ok(())
		);
		assert_eq!(
			Settings {
				min_success_rate: 1.01,
				..Default::default()
			}
			.validate(),
			Err(SettingsError::SuccessRateOutOfRange(1.01))
		);
		assert_eq!(
			Settings {
				min_success_rate: -0.5,
				..Default::default()
			}
			.validate(),
			Err(SettingsError::SuccessRateOutOfRange(-0.5))
		);
		assert!(matches!(
			Settings {
				min_success_rate: f64::NAN,
				..Default::default()
			}
			.validate(),
			Err(SettingsError::SuccessRateOutOfRange(_))
		));
		assert_eq!(
			Settings {
				trial_success_required: 0,
				..Default::default()
			}
			.validate(),
			Err(SettingsError::NoTrialSuccessRequired)
		);
	}

	#[test]
	fn with_settings_test() {
		let settings = Settings {
			min_samples: 7,
			..Default::default()
		};
		let breaker = CircuitBreaker::with_settings(settings).unwrap();
		assert_eq!(*breaker.settings(), settings);
		assert_eq!(breaker.state(), State::Closed);

		assert!(CircuitBreaker::with_settings(Settings {
			min_success_rate: 2.0,
			..Default::default()
		})
		.is_err());
	}

	#[test]
	fn stays_closed_without_evidence_test() {
		let breaker = CircuitBreaker::new().set_min_samples(10);
		for _ in 0..9 {
			breaker.record(false);
		}
		assert_eq!(breaker.state(), State::Closed);
		assert!(breaker.is_call_permitted());
		assert_eq!(breaker.success_rate(), 0.0);
	}

	#[test]
	fn stays_closed_above_threshold_test() {
		let breaker = CircuitBreaker::new().set_min_samples(10).set_min_success_rate(0.9);
		for i in 0..2000 {
			breaker.record(i % 20 != 0);
		}
		assert_eq!(breaker.state(), State::Closed);
		assert!(breaker.buffer().is_full());
	}

	#[test]
	fn opens_below_threshold_test() {
		let breaker = CircuitBreaker::new().set_min_samples(10);
		trip(&breaker);
		assert!(!breaker.is_call_permitted());

		// outcomes recorded while open do not reach the buffer
		let len = breaker.buffer().len();
		breaker.record(true);
		assert_eq!(breaker.buffer().len(), len);
	}

	#[test]
	fn half_open_after_timeout_test() {
		let breaker = CircuitBreaker::new().set_min_samples(10).set_retry_timeout(Duration::ZERO);
		trip(&breaker);
		assert!(breaker.is_call_permitted());
		assert_eq!(breaker.state(), State::HalfOpen);
		assert!(breaker.is_call_permitted());
	}

	#[test]
	fn closes_after_trial_successes_test() {
		let breaker = CircuitBreaker::new()
			.set_min_samples(10)
			.set_retry_timeout(Duration::ZERO)
			.set_trial_success_required(3);
		trip(&breaker);
		assert!(breaker.is_call_permitted());

		breaker.record(true);
		breaker.record(true);
		assert_eq!(breaker.state(), State::HalfOpen);
		breaker.record(true);
		assert_eq!(breaker.state(), State::Closed);
		assert!(breaker.buffer().is_empty());
		assert_eq!(breaker.success_rate(), 1.0);
	}

	#[test]
	fn reopens_on_trial_failure_test() {
		let breaker = CircuitBreaker::new()
			.set_min_samples(10)
			.set_retry_timeout(Duration::from_secs(60))
			.set_trial_success_required(3);
		trip(&breaker);
		assert!(!breaker.is_call_permitted());

		breaker.breaker.lock().opened_at = Instant::now().checked_sub(Duration::from_secs(100));
		assert!(breaker.is_call_permitted());
		assert_eq!(breaker.state(), State::HalfOpen);

		breaker.record(true);
		breaker.record(false);
		assert_eq!(breaker.state(), State::Open);
		assert!(!breaker.is_call_permitted());
		assert_eq!(breaker.breaker.lock().trial_success, 0);
	}

	#[test]
	fn concurrent_record_test() {
		let breaker = CircuitBreaker::new().set_min_samples(1000).set_min_success_rate(0.5);
		std::thread::scope(|scope| {
			for _ in 0..4 {
				scope.spawn(|| {
					for i in 0..250 {
						if breaker.is_call_permitted() {
							breaker.record(i % 2 == 0);
						}
					}
				});
			}
		});
		assert_eq!(breaker.buffer().len(), 1000);
		assert_eq!(breaker.state(), State::Closed);
	}
}
