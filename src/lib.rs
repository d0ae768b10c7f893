pub mod bit_array;
pub mod circuit_breaker;
pub mod error;
pub mod ring_buffer;
pub mod visualizer;

pub use bit_array::BitArray;
pub use circuit_breaker::{CircuitBreaker, Settings, State};
pub use error::SettingsError;
pub use ring_buffer::{HealthRingBuffer, Snapshot, CAPACITY};
pub use visualizer::Visualizer;
