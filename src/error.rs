use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
	#[error("min_success_rate must be within [0, 1], got {0}")]
	SuccessRateOutOfRange(f64),
	#[error("trial_success_required must be at least 1")]
	NoTrialSuccessRequired,
}
