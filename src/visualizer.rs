use crate::ring_buffer::{Snapshot, CAPACITY};

const ROW_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
	Success,
	Failure,
	Empty,
}

#[derive(Debug, PartialEq)]
pub struct Visualizer<'a> {
	snapshot: &'a Snapshot,
}

impl<'a> Visualizer<'a> {
	pub fn new(snapshot: &'a Snapshot) -> Self {
		Self { snapshot }
	}

	fn cell(&self, index: usize) -> Cell {
		match (self.snapshot.is_live(index), self.snapshot.bits.get(index)) {
			(false, _) => Cell::Empty,
			(true, true) => Cell::Success,
			(true, false) => Cell::Failure,
		}
	}

	fn render_top(&self) -> String {
		format!("     ┌{}┐", "─".repeat(ROW_WIDTH))
	}

	fn render_row(&self, row: usize) -> String {
		let start = row * ROW_WIDTH;
		let cells: String = (start..start + ROW_WIDTH)
			.map(|index| match self.cell(index) {
				Cell::Success => "\x1b[42m \x1b[0m",
				Cell::Failure => "\x1b[41m \x1b[0m",
				Cell::Empty => "·",
			})
			.collect();
		format!("{start:>4} │{cells}│")
	}

	fn render_bottom(&self) -> String {
		format!("     └{}┘", "─".repeat(ROW_WIDTH))
	}

	fn render_footer(&self) -> String {
		format!(
			"head {} tail {} samples {}/{} success rate {:.2}%",
			self.snapshot.head,
			self.snapshot.tail,
			self.snapshot.count,
			CAPACITY,
			self.snapshot.success_rate() * 100.0
		)
	}

	pub fn render(&self) -> String {
		let mut output = vec![self.render_top()];
		for row in 0..CAPACITY / ROW_WIDTH {
			output.push(self.render_row(row));
		}
		output.push(self.render_bottom());
		output.push(self.render_footer());

		output.join("\n")
	}
}
