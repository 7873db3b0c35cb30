//! A sleeping mutual-exclusion lock (`spec.md` §4.2 `lock_acquire`/
//! `lock_release`). Contrary to a spinlock, a blocked waiter is taken off
//! the CPU entirely, the way the teacher's own sleeping `Mutex` does
//! (`sync::mutex`).

use crate::arch::{Arch, CriticalSection};
use crate::process::scheduler::{Scheduler, WaitQueue};

/// `spec.md` §3 "Lock: status ∈ {LOCKED, UNLOCKED}".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
	Locked,
	Unlocked,
}

/// A FIFO sleeping lock: at most one holder, waiters queue in arrival order.
pub struct Lock {
	state: LockState,
	waiters: WaitQueue,
}

impl Default for Lock {
	fn default() -> Self {
		Self::new()
	}
}

impl Lock {
	/// A new, unlocked lock.
	pub const fn new() -> Self {
		Self {
			state: LockState::Unlocked,
			waiters: WaitQueue::new(),
		}
	}

	/// Acquires the lock, blocking the current task if it is already held.
	pub fn acquire(&mut self, sched: &mut Scheduler, arch: &dyn Arch) {
		let cs = CriticalSection::enter(arch);
		match self.state {
			LockState::Unlocked => self.state = LockState::Locked,
			LockState::Locked => {
				drop(cs);
				// The ready ring is never empty while the system runs
				// (`spec.md` §3): some other PCB always takes over.
				let _ = sched.block(&mut self.waiters, arch);
			}
		}
	}

	/// Releases the lock. If a task is waiting, ownership transfers to it
	/// directly and the lock stays `LOCKED`; otherwise it becomes
	/// `UNLOCKED`.
	pub fn release(&mut self, sched: &mut Scheduler, arch: &dyn Arch) {
		let cs = CriticalSection::enter(arch);
		if self.waiters.is_empty() {
			self.state = LockState::Unlocked;
		} else {
			drop(cs);
			sched.unblock(&mut self.waiters, arch);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::process::{Kind, Pcb};

	#[test]
	fn uncontended_acquire_does_not_block() {
		let arch = crate::arch::HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(Pcb::new(0, Kind::Process, 0, 0, 8, 0));
		let mut lock = Lock::new();
		lock.acquire(&mut sched, &arch);
		assert_eq!(sched.current(), Some(a));
	}

	#[test]
	fn contended_acquire_blocks_and_release_wakes_in_fifo_order() {
		let arch = crate::arch::HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(Pcb::new(0, Kind::Process, 0, 0, 8, 0));
		let _b = sched.add(Pcb::new(1, Kind::Process, 0, 0, 8, 0));
		let mut lock = Lock::new();

		lock.acquire(&mut sched, &arch);
		assert_eq!(lock.state, LockState::Locked);
		// `b` becomes current, tries to acquire, blocks.
		sched.scheduler(&arch).unwrap();
		lock.acquire(&mut sched, &arch);
		assert_eq!(lock.waiters.len(), 1);

		// `a` releases; ownership transfers to the waiter without
		// unlocking.
		lock.release(&mut sched, &arch);
		assert_eq!(lock.state, LockState::Locked);
		assert!(lock.waiters.is_empty());
		let _ = a;
	}
}
