//! A reusable rendezvous barrier (`spec.md` §4.2 `barrier_wait`).

use crate::arch::{Arch, CriticalSection};
use crate::process::scheduler::{Scheduler, WaitQueue};

/// `spec.md` §3 "Barrier: target count `reach`, arrival counter, waiting
/// list."
pub struct Barrier {
	reach: usize,
	count: usize,
	waiters: WaitQueue,
}

impl Barrier {
	/// A barrier that releases once `reach` tasks have called
	/// [`Barrier::wait`].
	pub const fn new(reach: usize) -> Self {
		Self {
			reach,
			count: 0,
			waiters: WaitQueue::new(),
		}
	}

	/// Current arrival count, for diagnostics and tests.
	pub fn count(&self) -> usize {
		self.count
	}

	/// Arrives at the barrier. Blocks until the `reach`-th arrival, which
	/// instead broadcasts and resets the counter to zero, making the
	/// barrier reusable for a following round.
	pub fn wait(&mut self, sched: &mut Scheduler, arch: &dyn Arch) {
		let cs = CriticalSection::enter(arch);
		self.count += 1;
		if self.count == self.reach {
			self.count = 0;
			drop(cs);
			while sched.unblock(&mut self.waiters, arch).is_some() {}
		} else {
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
	fn third_arrival_releases_the_first_two() {
		let arch = crate::arch::HostArch::new();
		let mut sched = Scheduler::new();
		let _a = sched.add(Pcb::new(0, Kind::Process, 0, 0, 8, 0));
		let _b = sched.add(Pcb::new(1, Kind::Process, 0, 0, 8, 0));
		let _c = sched.add(Pcb::new(2, Kind::Process, 0, 0, 8, 0));
		let mut barrier = Barrier::new(3);

		sched.scheduler(&arch).unwrap(); // advance past `a`
		barrier.wait(&mut sched, &arch); // `b` arrives, blocks
		barrier.wait(&mut sched, &arch); // `c` arrives, blocks
		assert_eq!(barrier.count(), 2);

		barrier.wait(&mut sched, &arch); // `a` arrives, releases both
		assert_eq!(barrier.count(), 0);
		assert!(barrier.waiters.is_empty());
	}
}
