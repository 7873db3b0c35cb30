//! A process (or kernel thread) is a schedulable entity: a [`Pcb`].
//!
//! A multitasking system allows several of them to run at the same time by
//! sharing the CPU through [`scheduler`].

pub mod scheduler;

use crate::config::MAX_OPEN_FILES;
use crate::memory::page_table::PageDirId;

/// Index of a [`Pcb`] inside the scheduler's table.
///
/// The teacher links PCBs with raw `previous`/`next` pointers
/// (`process/mod.rs`); a safe reimplementation represents the ready ring and
/// waiting lists as indices into an arena instead (`spec.md` §9, "Doubly-
/// linked ready ring vs. indexed arena").
pub type ProcId = usize;

/// Whether a [`Pcb`] is a user process or a kernel thread.
///
/// Threads share their creator's page directory (`spec.md` §4.4
/// "Per-process setup"); processes get one of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	/// A user process, with its own address space.
	Process,
	/// A kernel thread, sharing the kernel page directory.
	Thread,
}

/// Scheduling state of a [`Pcb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Newly created process, not yet dispatched for the first time.
	FirstTime,
	/// Newly created kernel thread, not yet dispatched for the first time.
	FirstTimeThread,
	/// On the ready ring, waiting for its turn.
	Ready,
	/// On some waiting list, not schedulable.
	Blocked,
	/// Unlinked from the ready ring; never scheduled again.
	Exited,
}

/// An open file descriptor's mode, matching `spec.md` §3's
/// `(mode, inode) | UNUSED` encoding, modeled here as an `Option` instead of
/// a sentinel integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
	/// Opened for reading only.
	ReadOnly,
	/// Opened for writing only.
	WriteOnly,
	/// Opened for both.
	ReadWrite,
}

impl OpenMode {
	/// Whether this mode permits `fs_read`.
	pub fn readable(self) -> bool {
		matches!(self, OpenMode::ReadOnly | OpenMode::ReadWrite)
	}

	/// Whether this mode permits `fs_write`.
	pub fn writable(self) -> bool {
		matches!(self, OpenMode::WriteOnly | OpenMode::ReadWrite)
	}
}

/// A single slot of a process's file-descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct FdEntry {
	/// `None` when the slot is `UNUSED`.
	pub open: Option<(OpenMode, u32)>,
}

impl FdEntry {
	const UNUSED: Self = Self { open: None };
}

/// Fault information recorded by the page-fault handler
/// (`spec.md` §3, §4.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultInfo {
	/// The faulting virtual address.
	pub addr: u32,
	/// The hardware error code (bit 0 set means the page was present).
	pub error_code: u32,
}

/// Process Control Block: everything the scheduler and the rest of the
/// kernel needs to know about one schedulable entity (`spec.md` §3).
pub struct Pcb {
	/// Process (or thread) identifier; also its index in the scheduler's
	/// table.
	pub pid: ProcId,
	/// Process or kernel thread.
	pub kind: Kind,
	/// Current scheduling state.
	pub state: State,

	/// Ready-ring successor, `None` when not on the ring.
	pub(crate) ready_next: Option<ProcId>,
	/// Ready-ring predecessor, `None` when not on the ring.
	pub(crate) ready_prev: Option<ProcId>,

	/// This process's page directory.
	pub page_dir: PageDirId,
	/// Start sector of this process's image in the backing store.
	pub swap_loc: u32,
	/// Length, in sectors, of this process's image in the backing store.
	pub swap_size: u32,

	/// Info about the most recent page fault taken by this process.
	pub fault_info: FaultInfo,
	/// Total number of page faults taken by this process.
	pub fault_count: u64,

	/// Inode number of the current working directory.
	pub cwd: u32,
	/// Open file descriptor table.
	pub fds: [FdEntry; MAX_OPEN_FILES],
}

impl Pcb {
	/// Creates a new PCB in `FirstTime`/`FirstTimeThread` state, not yet
	/// linked into any ring.
	pub fn new(pid: ProcId, kind: Kind, page_dir: PageDirId, swap_loc: u32, swap_size: u32, cwd: u32) -> Self {
		let state = match kind {
			Kind::Process => State::FirstTime,
			Kind::Thread => State::FirstTimeThread,
		};
		Self {
			pid,
			kind,
			state,
			ready_next: None,
			ready_prev: None,
			page_dir,
			swap_loc,
			swap_size,
			fault_info: FaultInfo::default(),
			fault_count: 0,
			cwd,
			fds: [FdEntry::UNUSED; MAX_OPEN_FILES],
		}
	}

	/// Finds the first `UNUSED` file-descriptor slot, if any.
	pub fn first_free_fd(&self) -> Option<usize> {
		self.fds.iter().position(|fd| fd.open.is_none())
	}
}
