//! Interfaces for the collaborators `spec.md` §1 names as out of scope: the
//! interrupt/exception glue and the screen printer. This crate never
//! implements `enter_critical`/`leave_critical`/`scheduler_entry`/
//! `flush_tlb_entry`/`scrprintf` itself; it only calls them through
//! [`Arch`], so a host test can supply a software stand-in while real
//! hardware supplies the genuine instructions.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// The real dispatch trampoline, the TLB shootdown, and the timer tick all
/// live on the other side of this trait. "No other scheduling decision may
/// occur" (`spec.md` §5) is exactly what disabling interrupts buys on real
/// hardware; a test double can model the same guarantee with a plain lock.
pub trait Arch: Send + Sync {
	/// Disables interrupts, returning whatever state is needed to restore
	/// them. Nests: an inner call must not re-enable interrupts that an
	/// outer call disabled.
	fn enter_critical(&self) -> u32;
	/// Restores the interrupt state returned by a matching
	/// [`Arch::enter_critical`].
	fn leave_critical(&self, prev: u32);
	/// Invalidates the TLB entry for `vaddr` after its page-table entry
	/// changed.
	fn flush_tlb_entry(&self, vaddr: u32);
	/// A free-running tick counter, used only to reseed the page-replacement
	/// PRNG (`spec.md` §4.4, §9 "Random replacement with per-call reseed").
	fn ticks(&self) -> u64;
	/// Writes a line to the screen at `(row, col)`; logging still goes
	/// through [`crate::klog!`] regardless.
	fn scrprintf(&self, row: u32, col: u32, s: &str);
}

/// RAII guard around [`Arch::enter_critical`]/[`Arch::leave_critical`],
/// mirroring the bracketing the teacher applies around scheduler-data
/// mutations via `IntMutex` (`sync::mutex::IntMutex`, `process/scheduler/
/// mod.rs`).
pub struct CriticalSection<'a> {
	arch: &'a dyn Arch,
	prev: u32,
}

impl<'a> CriticalSection<'a> {
	/// Enters a critical section, disabling interrupts until dropped.
	pub fn enter(arch: &'a dyn Arch) -> Self {
		let prev = arch.enter_critical();
		Self { arch, prev }
	}
}

impl Drop for CriticalSection<'_> {
	fn drop(&mut self) {
		self.arch.leave_critical(self.prev);
	}
}

/// A software stand-in for [`Arch`], used by tests and by any host-side
/// simulation of this kernel.
///
/// On a single CPU, "interrupts disabled" is just a nesting depth: the first
/// `enter_critical` disables, matching `leave_critical` calls decrement, and
/// only the outermost one re-enables. A plain counter models that without
/// risking a self-deadlock when a critical section is entered recursively
/// on the same (single) execution context, unlike a non-reentrant lock
/// would.
pub struct HostArch {
	depth: AtomicU32,
	ticks: AtomicU64,
}

impl HostArch {
	/// Creates a new host stand-in with the tick counter at zero.
	pub const fn new() -> Self {
		Self {
			depth: AtomicU32::new(0),
			ticks: AtomicU64::new(0),
		}
	}

	/// Advances the tick counter, as a real timer interrupt would.
	pub fn tick(&self) {
		self.ticks.fetch_add(1, Ordering::Relaxed);
	}
}

impl Arch for HostArch {
	fn enter_critical(&self) -> u32 {
		self.depth.fetch_add(1, Ordering::AcqRel)
	}

	fn leave_critical(&self, prev: u32) {
		self.depth.store(prev, Ordering::Release);
	}

	fn flush_tlb_entry(&self, _vaddr: u32) {}

	fn ticks(&self) -> u64 {
		self.ticks.load(Ordering::Relaxed)
	}

	fn scrprintf(&self, _row: u32, _col: u32, _s: &str) {}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn critical_section_nests_without_deadlock() {
		let arch = HostArch::new();
		let _outer = CriticalSection::enter(&arch);
		{
			let _inner = CriticalSection::enter(&arch);
		}
		assert_eq!(arch.depth.load(Ordering::Relaxed), 1);
	}
}
