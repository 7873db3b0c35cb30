//! The role of the process scheduler is to interrupt the currently running
//! process periodically to switch to another process that is in running
//! state (`spec.md` §4.1).
//!
//! The teacher keeps one process per intrusive `Process` node inside a
//! `BTreeMap` and walks it by PID order (`process/scheduler/mod.rs`). This
//! crate has no loader producing real `Process`/`Arc` objects to walk, so
//! [`Scheduler`] instead owns a `Vec<Option<Pcb>>` slab and threads the ready
//! ring through `Pcb::ready_next`/`ready_prev` indices, per the arena
//! substitution `spec.md` §9 sanctions for this exact structure.

use crate::arch::{Arch, CriticalSection};
use crate::process::{Pcb, ProcId, State};
use alloc::vec::Vec;

/// A FIFO waiting list of blocked PCBs, used by the lock/condvar/semaphore/
/// barrier primitives in [`crate::sync`] (`spec.md` §4.2).
#[derive(Default)]
pub struct WaitQueue(Vec<ProcId>);

impl WaitQueue {
	/// An empty waiting list.
	pub const fn new() -> Self {
		Self(Vec::new())
	}

	/// Appends `pid` at the tail.
	fn push_back(&mut self, pid: ProcId) {
		self.0.push(pid);
	}

	/// Pops the head, if any.
	fn pop_front(&mut self) -> Option<ProcId> {
		if self.0.is_empty() {
			None
		} else {
			Some(self.0.remove(0))
		}
	}

	/// Whether anyone is waiting.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of waiters.
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

/// The ready ring ran out of runnable processes: either the exiting PCB was
/// the last one on the ring (`spec.md` §4.1 "Exit of the final task halts,
/// it does not return"), or the only ready PCB just blocked itself with
/// nothing else to take over.
#[derive(Debug, PartialEq, Eq)]
pub struct AllProcessesExited;

/// Owns the PCB table and the ready ring. One instance per core in the
/// teacher (`SCHEDULER: OnceInit<IntMutex<Scheduler>>`); this crate models a
/// single core, so one instance suffices.
pub struct Scheduler {
	pcbs: Vec<Option<Pcb>>,
	/// Ready-ring anchor: the currently running PCB, `None` only before the
	/// first process is added.
	current: Option<ProcId>,
	/// Count of PCBs still on the ready ring, to detect "last one exited".
	ready_count: usize,
}

impl Default for Scheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl Scheduler {
	/// An empty scheduler, no PCBs registered yet.
	pub fn new() -> Self {
		Self {
			pcbs: Vec::new(),
			current: None,
			ready_count: 0,
		}
	}

	/// The PCB currently selected to run, if any has ever been added.
	pub fn current(&self) -> Option<ProcId> {
		self.current
	}

	/// Borrows the PCB at `pid`, if it hasn't exited and been reaped.
	pub fn pcb(&self, pid: ProcId) -> Option<&Pcb> {
		self.pcbs.get(pid).and_then(|slot| slot.as_ref())
	}

	/// Mutably borrows the PCB at `pid`.
	pub fn pcb_mut(&mut self, pid: ProcId) -> Option<&mut Pcb> {
		self.pcbs.get_mut(pid).and_then(|slot| slot.as_mut())
	}

	/// The whole PCB table, for callers (the page-fault handler) that need
	/// to look up an arbitrary victim PCB rather than just the current one.
	pub fn pcbs_mut(&mut self) -> &mut [Option<Pcb>] {
		&mut self.pcbs
	}

	/// Splices `pid` onto the ready ring immediately before `current`
	/// (`spec.md` §4.1 `unblock`: "so it runs after one full round"), or
	/// starts a fresh one-element ring if this is the first PCB.
	fn ring_insert_before_current(&mut self, pid: ProcId) {
		match self.current {
			None => {
				let pcb = self.pcbs[pid].as_mut().unwrap();
				pcb.ready_next = Some(pid);
				pcb.ready_prev = Some(pid);
				self.current = Some(pid);
			}
			Some(cur) => {
				let prev = self.pcbs[cur].as_ref().unwrap().ready_prev.unwrap();
				self.pcbs[prev].as_mut().unwrap().ready_next = Some(pid);
				self.pcbs[cur].as_mut().unwrap().ready_prev = Some(pid);
				let pcb = self.pcbs[pid].as_mut().unwrap();
				pcb.ready_prev = Some(prev);
				pcb.ready_next = Some(cur);
			}
		}
		self.ready_count += 1;
	}

	/// Unlinks `pid` from the ready ring. `pid` must currently be linked in.
	fn ring_remove(&mut self, pid: ProcId) {
		let (prev, next) = {
			let pcb = self.pcbs[pid].as_ref().unwrap();
			(pcb.ready_prev.unwrap(), pcb.ready_next.unwrap())
		};
		if prev == pid {
			// Was the only member.
			self.current = None;
		} else {
			self.pcbs[prev].as_mut().unwrap().ready_next = Some(next);
			self.pcbs[next].as_mut().unwrap().ready_prev = Some(prev);
			if self.current == Some(pid) {
				self.current = Some(next);
			}
		}
		let pcb = self.pcbs[pid].as_mut().unwrap();
		pcb.ready_next = None;
		pcb.ready_prev = None;
		self.ready_count -= 1;
	}

	/// Registers a freshly loaded PCB and links it onto the ready ring,
	/// still in `FIRST_TIME`/`FIRST_TIME_THREAD` state (`spec.md` §3
	/// "created by the loader"); the next `scheduler()` round that reaches
	/// it calls `dispatch` to promote it to `READY`.
	pub fn add(&mut self, pcb: Pcb) -> ProcId {
		let pid = self.pcbs.len();
		self.pcbs.push(Some(pcb));
		self.ring_insert_before_current(pid);
		pid
	}

	/// `spec.md` §4.1 `scheduler()`: splice out a blocked/exited current,
	/// otherwise advance to its successor, then `dispatch`.
	///
	/// Returns [`AllProcessesExited`] in place of the teacher's kernel halt
	/// ("All processes have exited"), since this crate has no console to
	/// halt on; the caller decides what that means.
	pub fn scheduler(&mut self, arch: &dyn Arch) -> Result<ProcId, AllProcessesExited> {
		let _cs = CriticalSection::enter(arch);
		if let Some(cur) = self.current {
			let state = self.pcbs[cur].as_ref().unwrap().state;
			if state == State::Blocked || state == State::Exited {
				let was_last = self.ready_count == 1;
				self.ring_remove(cur);
				if was_last && state == State::Exited {
					return Err(AllProcessesExited);
				}
			} else {
				self.current = self.pcbs[cur].as_ref().unwrap().ready_next;
			}
		}
		let next = self.current.ok_or(AllProcessesExited)?;
		self.dispatch(next);
		Ok(next)
	}

	/// `spec.md` §4.1 `dispatch()`: first-time PCBs transition to `READY`;
	/// the real kernel also invokes `start_process`/`start_thread` here —
	/// out of scope, since that is the dispatch trampoline `spec.md` §1
	/// excludes.
	fn dispatch(&mut self, pid: ProcId) {
		let pcb = self.pcbs[pid].as_mut().unwrap();
		if matches!(pcb.state, State::FirstTime | State::FirstTimeThread) {
			pcb.state = State::Ready;
		}
	}

	/// `spec.md` §4.1 `block(q)`: mark current BLOCKED, append to `q`, then
	/// "transfer via `scheduler_entry`" — which is one more call into
	/// `scheduler()`, splicing the now-blocked PCB out of the ready ring
	/// immediately rather than leaving it dangling there, present but
	/// unschedulable, until some later round happens to notice.
	pub fn block(&mut self, q: &mut WaitQueue, arch: &dyn Arch) -> Result<ProcId, AllProcessesExited> {
		{
			let _cs = CriticalSection::enter(arch);
			let cur = self.current.expect("block with no current process");
			self.pcbs[cur].as_mut().unwrap().state = State::Blocked;
			q.push_back(cur);
		}
		self.scheduler(arch)
	}

	/// `spec.md` §4.1 `unblock(q)`: pop the head, set READY, insert before
	/// `current`. REDESIGN FLAG #7 (`spec.md` §9.7): PCBs that exited while
	/// queued are silently dropped instead of being reinserted, since a
	/// dead PID has nothing left to schedule.
	pub fn unblock(&mut self, q: &mut WaitQueue, arch: &dyn Arch) -> Option<ProcId> {
		let _cs = CriticalSection::enter(arch);
		loop {
			let pid = q.pop_front()?;
			if self.pcbs[pid].as_ref().unwrap().state == State::Exited {
				continue;
			}
			self.pcbs[pid].as_mut().unwrap().state = State::Ready;
			self.ring_insert_before_current(pid);
			return Some(pid);
		}
	}

	/// Voluntarily gives up the CPU for one round, advancing to the next
	/// ready PCB without blocking (`spec.md` §4.1 public contract `yield`).
	pub fn yield_now(&mut self, arch: &dyn Arch) -> Result<ProcId, AllProcessesExited> {
		self.scheduler(arch)
	}

	/// Marks the current PCB `EXITED` and drives one scheduling round,
	/// unlinking it (`spec.md` §4.1 public contract `exit`).
	pub fn exit_current(&mut self, arch: &dyn Arch) -> Result<ProcId, AllProcessesExited> {
		let _cs = CriticalSection::enter(arch);
		let cur = self.current.expect("exit with no current process");
		self.pcbs[cur].as_mut().unwrap().state = State::Exited;
		drop(_cs);
		self.scheduler(arch)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::arch::HostArch;
	use crate::process::Kind;

	fn pcb(pid: ProcId) -> Pcb {
		Pcb::new(pid, Kind::Process, 0, 0, 8, 0)
	}

	#[test]
	fn single_process_ring_points_to_itself() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let pid = sched.add(pcb(0));
		assert_eq!(sched.current(), Some(pid));
		let p = sched.pcb(pid).unwrap();
		assert_eq!(p.ready_next, Some(pid));
		assert_eq!(p.ready_prev, Some(pid));
		let _ = arch;
	}

	#[test]
	fn scheduler_round_robins_two_processes() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(pcb(0));
		let b = sched.add(pcb(1));
		assert_eq!(sched.current(), Some(a));
		let next = sched.scheduler(&arch).unwrap();
		assert_eq!(next, b);
		let next = sched.scheduler(&arch).unwrap();
		assert_eq!(next, a);
	}

	#[test]
	fn block_and_unblock_round_trip() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(pcb(0));
		let b = sched.add(pcb(1));
		assert_eq!(sched.current(), Some(a));

		let mut q = WaitQueue::new();
		// `block` itself drives one scheduling round, splicing `a` out of
		// the ring immediately (`spec.md` §4.1 "transfer via
		// scheduler_entry").
		let next = sched.block(&mut q, &arch).unwrap();
		assert_eq!(next, b);
		assert_eq!(sched.pcb(a).unwrap().state, State::Blocked);
		assert_eq!(q.len(), 1);

		let woken = sched.unblock(&mut q, &arch).unwrap();
		assert_eq!(woken, a);
		assert_eq!(sched.pcb(a).unwrap().state, State::Ready);
		assert!(q.is_empty());
	}

	#[test]
	fn exited_pcbs_are_skipped_by_unblock() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(pcb(0));
		let _b = sched.add(pcb(1));
		let mut q = WaitQueue::new();
		sched.block(&mut q, &arch).unwrap();
		sched.pcb_mut(a).unwrap().state = State::Exited;
		assert_eq!(sched.unblock(&mut q, &arch), None);
	}

	#[test]
	fn last_process_exiting_reports_all_exited() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let _a = sched.add(pcb(0));
		let err = sched.exit_current(&arch);
		assert_eq!(err, Err(AllProcessesExited));
	}

	#[test]
	fn dispatch_promotes_first_time_to_ready() {
		let arch = HostArch::new();
		let mut sched = Scheduler::new();
		let a = sched.add(pcb(0));
		assert_eq!(sched.pcb(a).unwrap().state, State::FirstTime);
		// A single-element ring advances to itself; `scheduler` still calls
		// `dispatch` on it.
		sched.scheduler(&arch).unwrap();
		assert_eq!(sched.pcb(a).unwrap().state, State::Ready);
	}
}
