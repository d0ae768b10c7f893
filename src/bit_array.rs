/// Number of bits held by a [`BitArray`].
pub const BITS: usize = 1024;

const BYTES: usize = BITS / 8;

/// Fixed-size packed bit storage, eight slots per byte, LSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitArray {
	bytes: [u8; BYTES],
}

impl BitArray {
	pub const fn new() -> Self {
		Self { bytes: [0; BYTES] }
	}

	pub fn get(&self, index: usize) -> bool {
		self.bytes[index / 8] & (1 << (index % 8)) != 0
	}

	pub fn set(&mut self, index: usize, value: bool) {
		let mask = 1 << (index % 8);
		if value {
			self.bytes[index / 8] |= mask;
		} else {
			self.bytes[index / 8] &= !mask;
		}
	}

	pub fn clear(&mut self) {
		self.bytes = [0; BYTES];
	}

	/// Counts the set bits in the inclusive range `[start, end]`.
	///
	/// The range must not wrap. An inverted range counts nothing.
	pub fn count_ones_in_range(&self, start: usize, end: usize) -> usize {
		if start > end {
			return 0;
		}

		let start_byte = start / 8;
		let end_byte = end / 8;
		let start_bit = start % 8;
		let end_bit = end % 8;

		if start_byte == end_byte {
			let mask = (0xFF_u8 << start_bit) & (0xFF_u8 >> (7 - end_bit));
			return (self.bytes[start_byte] & mask).count_ones() as usize;
		}

		let head = (self.bytes[start_byte] & (0xFF_u8 << start_bit)).count_ones();
		let middle: u32 = self.bytes[start_byte + 1..end_byte].iter().map(|byte| byte.count_ones()).sum();
		let tail = (self.bytes[end_byte] & (0xFF_u8 >> (7 - end_bit))).count_ones();

		(head + middle + tail) as usize
	}
}

impl Default for BitArray {
	fn default() -> Self {
		Self::new()
	}
}
