mod cli_args;

use clap::Parser;
use healthring::{CircuitBreaker, Visualizer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "healthring=info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let args = cli_args::Args::parse();
	let cb = CircuitBreaker::with_settings(args.settings())?;

	let mut rejected = 0usize;
	for index in 0..args.pushes {
		if cb.is_call_permitted() {
			cb.record(args.outcome(index));
		} else {
			rejected += 1;
		}
	}

	tracing::debug!(pushes = args.pushes, rejected, "simulation finished");

	if !args.no_render {
		let snapshot = cb.buffer().snapshot();
		println!("{}", Visualizer::new(&snapshot).render());
	}

	println!(
		"success rate {:.2}% over {} samples, circuit {:?}, {} calls rejected",
		cb.success_rate() * 100.0,
		cb.buffer().len(),
		cb.state(),
		rejected
	);

	Ok(())
}
