use parking_lot::Mutex;

use crate::bit_array::{BitArray, BITS};

/// Number of outcomes remembered by a [`HealthRingBuffer`].
pub const CAPACITY: usize = BITS;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ring {
	bits: BitArray,
	head: usize,
	tail: usize,
	count: usize,
}

impl Ring {
	const fn new() -> Self {
		Self {
			bits: BitArray::new(),
			head: 0,
			tail: 0,
			count: 0,
		}
	}

	fn push(&mut self, outcome: bool) {
		if self.count == CAPACITY {
			self.head = (self.head + 1) % CAPACITY;
		} else {
			self.count += 1;
		}

		self.bits.set(self.tail, outcome);
		self.tail = (self.tail + 1) % CAPACITY;

		debug_assert!(self.count <= CAPACITY);
	}

	fn successes(&self) -> usize {
		if self.count == 0 {
			return 0;
		}

		if self.head < self.tail {
			self.bits.count_ones_in_range(self.head, self.tail - 1)
		} else if self.head > self.tail {
			let wrapped = if self.tail > 0 {
				self.bits.count_ones_in_range(0, self.tail - 1)
			} else {
				0
			};
			self.bits.count_ones_in_range(self.head, CAPACITY - 1) + wrapped
		} else {
			// head == tail with live samples: one full lap
			self.bits.count_ones_in_range(0, CAPACITY - 1)
		}
	}

	fn success_rate(&self) -> f64 {
		if self.count == 0 {
			return 1.0;
		}
		self.successes() as f64 / self.count as f64
	}
}

/// A point-in-time copy of a [`HealthRingBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
	pub bits: BitArray,
	pub head: usize,
	pub tail: usize,
	pub count: usize,
	pub successes: usize,
}

impl Snapshot {
	/// Whether slot `index` holds one of the `count` live outcomes.
	pub fn is_live(&self, index: usize) -> bool {
		if self.count == CAPACITY {
			return true;
		}
		(index + CAPACITY - self.head) % CAPACITY < self.count
	}

	pub fn success_rate(&self) -> f64 {
		if self.count == 0 {
			return 1.0;
		}
		self.successes as f64 / self.count as f64
	}
}

/// Rolling record of the last [`CAPACITY`] success/failure outcomes.
///
/// Every operation takes the same lock over the bits and both cursors, so a
/// reader always sees the state between two whole pushes.
#[derive(Debug)]
pub struct HealthRingBuffer {
	ring: Mutex<Ring>,
}

impl HealthRingBuffer {
	pub fn new() -> Self {
		Self {
			ring: Mutex::new(Ring::new()),
		}
	}

	pub const fn capacity(&self) -> usize {
		CAPACITY
	}

	/// Records one outcome, evicting the oldest once the buffer is full.
	pub fn push(&self, outcome: bool) {
		self.ring.lock().push(outcome);
	}

	/// Fraction of live outcomes that succeeded, `1.0` when there are none.
	pub fn success_rate(&self) -> f64 {
		self.ring.lock().success_rate()
	}

	/// Healthy until at least `min_samples` outcomes are recorded, then
	/// healthy while the success rate stays at or above `min_success_rate`.
	pub fn is_healthy(&self, min_success_rate: f64, min_samples: usize) -> bool {
		let ring = self.ring.lock();
		if ring.count < min_samples {
			return true;
		}
		ring.success_rate() >= min_success_rate
	}

	/// Records one outcome and returns the [`is_healthy`](Self::is_healthy)
	/// verdict for the buffer it leaves behind, under a single lock.
	pub fn push_and_check(&self, outcome: bool, min_success_rate: f64, min_samples: usize) -> bool {
		let mut ring = self.ring.lock();
		ring.push(outcome);
		ring.count < min_samples || ring.success_rate() >= min_success_rate
	}

	pub fn len(&self) -> usize {
		self.ring.lock().count
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_full(&self) -> bool {
		self.len() == CAPACITY
	}

	pub fn snapshot(&self) -> Snapshot {
		let ring = self.ring.lock();
		Snapshot {
			bits: ring.bits,
			head: ring.head,
			tail: ring.tail,
			count: ring.count,
			successes: ring.successes(),
		}
	}

	/// Forgets every recorded outcome.
	pub fn clear(&self) {
		*self.ring.lock() = Ring::new();
	}
}

impl Default for HealthRingBuffer {
	fn default() -> Self {
		Self::new()
	}
}
