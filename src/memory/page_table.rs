//! The x86 two-level page table layout (`spec.md` §3): 1024 entries per
//! directory and per table, each 32 bits.
//!
//! The teacher walks real `NonNull<Table>` pointers into identity-mapped
//! physical memory (`memory/vmem/x86.rs`). Since this crate never runs on
//! real hardware, directories and tables are owned by arenas inside
//! [`crate::memory::MemoryManager`] and referenced by index instead —
//! the same "arena over raw pointers" substitution `spec.md` §9 sanctions
//! for the ready ring.

use bitflags::bitflags;

bitflags! {
	/// Flag bits of a page-directory or page-table entry.
	#[derive(Default)]
	pub struct PteFlags: u32 {
		/// Present.
		const PRESENT = 1 << 0;
		/// Read/write (unset means read-only).
		const RW = 1 << 1;
		/// Accessible from user mode.
		const US = 1 << 2;
		/// Dirty: written since it was loaded.
		const DIRTY = 1 << 6;
	}
}

/// One page-table or page-directory entry.
///
/// Only the flag bits and a frame index are modeled; the physical address
/// bits a real entry packs alongside the flags are represented here by the
/// [`PtEntry::frame`] index into [`crate::memory::MemoryManager`]'s frame
/// table, since that is the only addressing this crate needs to perform.
#[derive(Debug, Clone, Copy, Default)]
pub struct PtEntry {
	pub flags: PteFlags,
	pub frame: Option<usize>,
}

impl PtEntry {
	/// An absent entry.
	pub const EMPTY: Self = Self {
		flags: PteFlags::empty(),
		frame: None,
	};

	/// Whether the present bit is set.
	pub fn is_present(&self) -> bool {
		self.flags.contains(PteFlags::PRESENT)
	}

	/// Clears the entry entirely (P=0 and all other flags), as
	/// `spec.md` §4.4's eviction step requires.
	pub fn clear(&mut self) {
		*self = Self::EMPTY;
	}
}

/// A page table: 1024 entries, each mapping one [`crate::config::PAGE_SIZE`]
/// page.
#[derive(Clone)]
pub struct PageTable {
	pub entries: [PtEntry; 1024],
}

impl PageTable {
	/// A table with every entry absent.
	pub fn empty() -> Self {
		Self {
			entries: [PtEntry::EMPTY; 1024],
		}
	}
}

/// One page-directory entry: either absent, or present and pointing at a
/// [`PageTable`] in the owning [`crate::memory::MemoryManager`]'s table
/// arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdeEntry {
	pub present: bool,
	/// Set alongside the enclosing PTE's US bit for the page holding
	/// `SCREEN_ADDR`, so user code can print directly (`spec.md` §4.4).
	pub us: bool,
	pub table: Option<usize>,
}

/// A page directory: 1024 entries.
#[derive(Clone)]
pub struct PageDirectory {
	pub entries: [PdeEntry; 1024],
}

impl PageDirectory {
	/// A directory with every entry absent.
	pub fn empty() -> Self {
		Self {
			entries: [PdeEntry::default(); 1024],
		}
	}
}

/// Index of a [`PageDirectory`] inside [`crate::memory::MemoryManager`].
pub type PageDirId = usize;

/// Splits a virtual address into `(directory_index, table_index)`, per
/// `spec.md` §4.4.
pub fn decompose(vaddr: u32) -> (usize, usize) {
	use crate::config::{PAGE_DIRECTORY_BITS, PAGE_DIRECTORY_MASK, PAGE_TABLE_BITS, PAGE_TABLE_MASK};
	let dir = ((vaddr & PAGE_DIRECTORY_MASK) >> PAGE_DIRECTORY_BITS) as usize;
	let table = ((vaddr & PAGE_TABLE_MASK) >> PAGE_TABLE_BITS) as usize;
	(dir, table)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decompose_matches_layout() {
		// Directory 1, table 2, offset irrelevant.
		let vaddr = (1u32 << 22) | (2u32 << 12) | 0x123;
		assert_eq!(decompose(vaddr), (1, 2));
	}

	#[test]
	fn clear_resets_flags_and_frame() {
		let mut pte = PtEntry {
			flags: PteFlags::PRESENT | PteFlags::RW | PteFlags::DIRTY,
			frame: Some(3),
		};
		pte.clear();
		assert!(!pte.is_present());
		assert_eq!(pte.frame, None);
	}
}
