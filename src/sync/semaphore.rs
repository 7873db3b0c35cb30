//! A counting semaphore (`spec.md` §4.2 `semaphore_up`/`semaphore_down`).
//!
//! The counter is allowed to go negative; its magnitude then equals the
//! number of waiters (`spec.md` §3).

use crate::arch::{Arch, CriticalSection};
use crate::process::scheduler::{Scheduler, WaitQueue};

/// A counting semaphore with a FIFO waiting list.
pub struct Semaphore {
	counter: i32,
	waiters: WaitQueue,
}

impl Semaphore {
	/// A semaphore initialized to `count`.
	pub const fn new(count: i32) -> Self {
		Self {
			counter: count,
			waiters: WaitQueue::new(),
		}
	}

	/// Current counter value, for diagnostics and tests.
	pub fn count(&self) -> i32 {
		self.counter
	}

	/// `spec.md` §4.2 `semaphore_up`: increments the counter; if it is
	/// non-negative and someone is waiting, wakes the head.
	pub fn up(&mut self, sched: &mut Scheduler, arch: &dyn Arch) {
		let cs = CriticalSection::enter(arch);
		self.counter += 1;
		if self.counter >= 0 && !self.waiters.is_empty() {
			drop(cs);
			sched.unblock(&mut self.waiters, arch);
		}
	}

	/// `spec.md` §4.2 `semaphore_down`: decrements the counter; blocks if
	/// it went negative.
	pub fn down(&mut self, sched: &mut Scheduler, arch: &dyn Arch) {
		let cs = CriticalSection::enter(arch);
		self.counter -= 1;
		if self.counter < 0 {
			drop(cs);
			let _ = sched.block(&mut self.waiters, arch);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::process::{Kind, Pcb};

	#[test]
	fn down_above_zero_does_not_block() {
		let arch = crate::arch::HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(Pcb::new(0, Kind::Process, 0, 0, 8, 0));
		let mut sem = Semaphore::new(1);
		sem.down(&mut sched, &arch);
		assert_eq!(sem.count(), 0);
		assert!(sem.waiters.is_empty());
		assert_eq!(sched.current(), Some(a));
	}

	#[test]
	fn down_below_zero_blocks_and_up_wakes() {
		let arch = crate::arch::HostArch::new();
		let mut sched = Scheduler::new();
		let _a = sched.add(Pcb::new(0, Kind::Process, 0, 0, 8, 0));
		let _b = sched.add(Pcb::new(1, Kind::Process, 0, 0, 8, 0));
		let mut sem = Semaphore::new(0);

		sem.down(&mut sched, &arch);
		assert_eq!(sem.count(), -1);
		assert_eq!(sem.waiters.len(), 1);

		sem.up(&mut sched, &arch);
		assert_eq!(sem.count(), 0);
		assert!(sem.waiters.is_empty());
	}
}
