use std::time::Duration;

use clap::Parser;

use healthring::Settings;

/// Replay a stream of outcomes through a circuit breaker and show its health buffer.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "healthring", version)]
pub struct Args {
	/// Number of outcomes to simulate.
	#[arg(short = 'p', long = "pushes", env = "HEALTHRING_PUSHES", default_value_t = 2000)]
	pub pushes: usize,

	/// Every K-th outcome fails, 0 means none do.
	#[arg(short = 'f', long = "failure_every", env = "HEALTHRING_FAILURE_EVERY", default_value_t = 20)]
	pub failure_every: usize,

	/// Success rate below which the circuit opens.
	#[arg(short = 'm', long = "min_success_rate", env = "HEALTHRING_MIN_SUCCESS_RATE", default_value_t = 0.9)]
	pub min_success_rate: f64,

	/// Outcomes required before the success rate is trusted.
	#[arg(short = 's', long = "min_samples", env = "HEALTHRING_MIN_SAMPLES", default_value_t = 500)]
	pub min_samples: usize,

	/// Seconds the circuit stays open before trial calls are let through.
	#[arg(short = 'r', long = "retry_timeout", env = "HEALTHRING_RETRY_TIMEOUT", default_value_t = 60)]
	pub retry_timeout: u64,

	/// Consecutive trial successes needed to close a half-open circuit.
	#[arg(short = 't', long = "trial_success_required", env = "HEALTHRING_TRIAL_SUCCESS_REQUIRED", default_value_t = 20)]
	pub trial_success_required: usize,

	/// Skip drawing the buffer.
	#[arg(short = 'n', long = "no_render")]
	pub no_render: bool,
}

impl Args {
	pub fn settings(&self) -> Settings {
		Settings {
			min_success_rate: self.min_success_rate,
			min_samples: self.min_samples,
			retry_timeout: Duration::from_secs(self.retry_timeout),
			trial_success_required: self.trial_success_required,
		}
	}

	/// Outcome of the `index`-th simulated call.
	pub fn outcome(&self, index: usize) -> bool {
		self.failure_every == 0 || index % self.failure_every != 0
	}
}
