//! Virtual memory: page directories/tables, the frame table, demand paging
//! and random-replacement eviction (`spec.md` §4.4).
//!
//! Everything here runs under [`MemoryManager`]'s single lock, mirroring
//! the teacher's `memory_lock` (`spec.md` §5: "`memory_lock` guards the
//! frame table, the page directories/tables it mutates, and the allocation
//! counter").

pub mod fault;
pub mod heap;
pub mod page_table;

use crate::arch::Arch;
use crate::block::ScsiDevice;
use crate::config::{
	N_KERNEL_PTS, PAGEABLE_PAGES, PAGE_SIZE, PROCESS_ENTRY, PROCESS_STACK, SCREEN_ADDR,
	SECTORS_PER_PAGE, SECTOR_SIZE,
};
use crate::process::{Kind, Pcb, ProcId};
use alloc::vec;
use alloc::vec::Vec;
use page_table::{decompose, PageDirId, PageDirectory, PageTable, PdeEntry, PteFlags, PtEntry};
use rand_core::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Metadata for one physical frame available to the pager.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDescriptor {
	/// Virtual address currently backed by this frame, if any.
	pub vaddr: Option<u32>,
	/// PCB owning this frame, if any.
	pub owner: Option<ProcId>,
	/// Kernel pages and page tables/directories are pinned and never
	/// evicted.
	pub pinned: bool,
}

/// Outcome of [`MemoryManager::get_memory`] when every unpinned frame is
/// already in use by the time a process asks for another one: none can be
/// stolen, so the requesting process must be terminated (`spec.md` §4.4).
pub struct OutOfMemory;

/// Owns the frame table, the page-directory/page-table arenas, and the bump
/// allocation counter; all mutations happen under one conceptual lock
/// (`spec.md` §5 `memory_lock`), modeled by requiring `&mut self`.
pub struct MemoryManager {
	frames: [FrameDescriptor; PAGEABLE_PAGES],
	/// Physical frame contents, `PAGEABLE_PAGES * PAGE_SIZE` bytes, indexed
	/// by `frame_index * PAGE_SIZE`. Stands in for real RAM, which this
	/// crate never actually addresses.
	mem: Vec<u8>,
	next_frame: usize,
	dirs: Vec<PageDirectory>,
	tables: Vec<PageTable>,
	kernel_dir: PageDirId,
	rng: Pcg32,
}

impl MemoryManager {
	/// Builds the kernel's identity-mapped page directory
	/// (`spec.md` §4.4 `init_memory`) and an otherwise-empty manager.
	pub fn new() -> Self {
		let mut dirs = vec![PageDirectory::empty()];
		let mut tables = Vec::new();
		for i in 0..N_KERNEL_PTS {
			let mut table = PageTable::empty();
			for (j, entry) in table.entries.iter_mut().enumerate() {
				let vaddr = (i * 1024 + j) * PAGE_SIZE;
				let mut flags = PteFlags::PRESENT | PteFlags::RW;
				if vaddr as u32 & !0xFFF == SCREEN_ADDR & !0xFFF {
					flags |= PteFlags::US;
				}
				*entry = PtEntry {
					flags,
					frame: Some(i * 1024 + j),
				};
			}
			let table_id = tables.len();
			tables.push(table);
			let contains_screen = (i * 1024 * PAGE_SIZE..(i + 1) * 1024 * PAGE_SIZE)
				.contains(&(SCREEN_ADDR as usize));
			dirs[0].entries[i] = PdeEntry {
				present: true,
				us: contains_screen,
				table: Some(table_id),
			};
		}
		Self {
			frames: [FrameDescriptor::default(); PAGEABLE_PAGES],
			mem: vec![0u8; PAGEABLE_PAGES * PAGE_SIZE],
			next_frame: 0,
			dirs,
			tables,
			kernel_dir: 0,
			rng: Pcg32::seed_from_u64(0),
		}
	}

	/// The bytes backing frame `idx`, `PAGE_SIZE` long.
	pub fn frame_bytes_mut(&mut self, idx: usize) -> &mut [u8] {
		&mut self.mem[idx * PAGE_SIZE..(idx + 1) * PAGE_SIZE]
	}

	fn zero_frame(&mut self, idx: usize) {
		self.frame_bytes_mut(idx).fill(0);
	}

	/// Index of the kernel's own page directory.
	pub fn kernel_dir(&self) -> PageDirId {
		self.kernel_dir
	}

	/// Identity-maps `size` bytes starting at `addr`, used to map device
	/// registers before scheduling starts (`spec.md` §4.4). Called with no
	/// lock held, as the teacher's does.
	pub fn identity_map(&mut self, addr: u32, size: u32) {
		let pages = (size as usize).div_ceil(PAGE_SIZE);
		for i in 0..pages {
			let vaddr = addr as usize + i * PAGE_SIZE;
			let (d, t) = decompose(vaddr as u32);
			let table_id = self.ensure_table(self.kernel_dir, d);
			self.tables[table_id].entries[t] = PtEntry {
				flags: PteFlags::PRESENT | PteFlags::RW | PteFlags::US,
				frame: Some(vaddr / PAGE_SIZE),
			};
		}
	}

	fn ensure_table(&mut self, dir: PageDirId, index: usize) -> usize {
		if let Some(id) = self.dirs[dir].entries[index].table {
			return id;
		}
		let id = self.tables.len();
		self.tables.push(PageTable::empty());
		self.dirs[dir].entries[index] = PdeEntry {
			present: true,
			us: false,
			table: Some(id),
		};
		id
	}

	/// Sets up a fresh process's (or thread's) address space
	/// (`spec.md` §4.4 `setup_page_table`).
	pub fn setup_page_table(&mut self, pcb: &Pcb) -> PageDirId {
		if pcb.kind == Kind::Thread {
			return self.kernel_dir;
		}
		// Copy all kernel directory entries so the process inherits the
		// identity-mapped kernel and any identity-mapped device regions.
		let dir_id = self.dirs.len();
		self.dirs.push(self.dirs[self.kernel_dir].clone());

		// Stack: two pinned pages, present immediately.
		for (i, vaddr) in [PROCESS_STACK, PROCESS_STACK - PAGE_SIZE as u32]
			.into_iter()
			.enumerate()
		{
			let frame = self.alloc_frame(true, vaddr, pcb.pid);
			let (d, t) = decompose(vaddr);
			let table_id = self.ensure_table(dir_id, d);
			self.tables[table_id].entries[t] = PtEntry {
				flags: PteFlags::PRESENT | PteFlags::RW | PteFlags::US,
				frame: Some(frame),
			};
			let _ = i;
		}

		// Code/data: not-present PTEs that fault in on first access.
		let pages = (pcb.swap_size as usize).div_ceil(SECTORS_PER_PAGE);
		for p in 0..pages {
			let vaddr = PROCESS_ENTRY + (p * PAGE_SIZE) as u32;
			let (d, t) = decompose(vaddr);
			let table_id = self.ensure_table(dir_id, d);
			self.tables[table_id].entries[t] = PtEntry {
				flags: PteFlags::RW | PteFlags::US,
				frame: None,
			};
		}
		dir_id
	}

	fn alloc_frame(&mut self, pinned: bool, vaddr: u32, owner: ProcId) -> usize {
		let idx = self.next_frame;
		self.next_frame += 1;
		self.frames[idx] = FrameDescriptor {
			vaddr: Some(vaddr),
			owner: Some(owner),
			pinned,
		};
		self.zero_frame(idx);
		idx
	}

	/// Returns the physical-disk sector range backing `vaddr` for a process
	/// whose image starts at `swap_loc` and spans `swap_size` sectors
	/// (`spec.md` §4.4 "Backing-store geometry").
	pub fn backing_location(vaddr: u32, swap_loc: u32, swap_size: u32) -> (u32, u32) {
		let sector_offset = (vaddr - PROCESS_ENTRY) / SECTOR_SIZE as u32;
		let aligned_offset = (sector_offset / SECTORS_PER_PAGE as u32) * SECTORS_PER_PAGE as u32;
		let sectors = core::cmp::min(SECTORS_PER_PAGE as u32, swap_size - aligned_offset);
		(swap_loc + aligned_offset, sectors)
	}

	/// Allocates (or steals) a frame for `vaddr` belonging to `owner`
	/// (`spec.md` §4.4 `get_memory`).
	///
	/// On eviction, looks up the victim's owning PCB through `pcbs` to read
	/// its page-table entry, clear it, flush the TLB, and — if the entry
	/// was dirty — write the frame back through `scsi` before reassigning
	/// it. Returns [`OutOfMemory`] if every frame is pinned, in which case
	/// the caller must terminate `owner`, never the kernel.
	#[allow(clippy::too_many_arguments)]
	pub fn get_memory(
		&mut self,
		pinned: bool,
		vaddr: u32,
		owner: ProcId,
		pcbs: &mut [Option<Pcb>],
		arch: &dyn Arch,
		scsi: &dyn ScsiDevice,
	) -> Result<u32, OutOfMemory> {
		if self.next_frame < PAGEABLE_PAGES {
			let idx = self.alloc_frame(pinned, vaddr, owner);
			return Ok(idx as u32);
		}

		let candidates: Vec<usize> = self
			.frames
			.iter()
			.enumerate()
			.filter(|(_, f)| !f.pinned)
			.map(|(i, _)| i)
			.collect();
		if candidates.is_empty() {
			return Err(OutOfMemory);
		}
		let seed = arch.ticks();
		self.rng = Pcg32::seed_from_u64(seed);
		let pick = (self.rng.next_u32() as usize) % candidates.len();
		let victim = candidates[pick];

		let desc = self.frames[victim];
		if let (Some(victim_vaddr), Some(victim_owner)) = (desc.vaddr, desc.owner) {
			if let Some(Some(victim_pcb)) = pcbs.get(victim_owner) {
				let (d, t) = decompose(victim_vaddr);
				if let Some(dir_entry) = self.dirs.get(victim_pcb.page_dir) {
					if let Some(table_id) = dir_entry.entries[d].table {
						let dirty = self.tables[table_id].entries[t]
							.flags
							.contains(PteFlags::DIRTY);
						self.tables[table_id].entries[t].clear();
						arch.flush_tlb_entry(victim_vaddr);
						if dirty {
							let (sector, sectors) = Self::backing_location(
								victim_vaddr,
								victim_pcb.swap_loc,
								victim_pcb.swap_size,
							);
							let len = sectors as usize * SECTOR_SIZE;
							scsi.scsi_write(sector, sectors, &self.mem[victim * PAGE_SIZE..victim * PAGE_SIZE + len]);
						}
					}
				}
			}
		}

		self.frames[victim] = FrameDescriptor {
			vaddr: Some(vaddr),
			owner: Some(owner),
			pinned,
		};
		self.zero_frame(victim);
		Ok(victim as u32)
	}

	/// The page directory and table arenas, for the fault handler.
	pub(crate) fn dirs_mut(&mut self) -> &mut Vec<PageDirectory> {
		&mut self.dirs
	}

	pub(crate) fn tables_mut(&mut self) -> &mut Vec<PageTable> {
		&mut self.tables
	}

	pub(crate) fn ensure_table_pub(&mut self, dir: PageDirId, index: usize) -> usize {
		self.ensure_table(dir, index)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::arch::HostArch;
	use crate::block::MemDisk;
	use crate::process::Kind;

	#[test]
	fn bump_allocates_before_stealing() {
		let mut mm = MemoryManager::new();
		let arch = HostArch::new();
		let disk = MemDisk::new((PAGEABLE_PAGES * SECTORS_PER_PAGE) as usize);
		let mut pcbs: Vec<Option<Pcb>> = Vec::new();
		for i in 0..PAGEABLE_PAGES {
			let got = mm
				.get_memory(false, (i * PAGE_SIZE) as u32, 0, &mut pcbs, &arch, &disk)
				.unwrap();
			assert_eq!(got as usize, i);
		}
		// Now every frame is taken; with no PCB owning any of them there is
		// nothing unpinned and attributable, but the bump path is exhausted
		// so the steal path is taken and still returns a frame index.
		let got = mm.get_memory(false, 0xDEAD_0000, 0, &mut pcbs, &arch, &disk);
		assert!(got.is_ok());
	}

	#[test]
	fn eviction_flushes_the_victims_pte_and_writes_back_a_dirty_frame() {
		// Two processes share the frame pool; each one's code pages are
		// installed as real PTEs so the steal path in `get_memory` has a
		// genuine owning PCB + page table to find and clear.
		let mut mm = MemoryManager::new();
		let arch = HostArch::new();
		let swap_size = (PAGEABLE_PAGES as u32 + 2) * SECTORS_PER_PAGE as u32;
		let disk = MemDisk::new(swap_size as usize);

		let dir_a = mm.setup_page_table(&Pcb::new(0, Kind::Process, 0, 0, swap_size, 0));
		let dir_b = mm.setup_page_table(&Pcb::new(1, Kind::Process, 0, 0, swap_size, 0));
		let mut pcbs: Vec<Option<Pcb>> = vec![
			Some(Pcb::new(0, Kind::Process, dir_a, 0, swap_size, 0)),
			Some(Pcb::new(1, Kind::Process, dir_b, 0, swap_size, 0)),
		];

		// Bump-allocate all PAGEABLE_PAGES frames, half for each process, and
		// install a dirty, present PTE for every one of them.
		let mut owner_of = [0usize; PAGEABLE_PAGES];
		let mut vaddr_of = [0u32; PAGEABLE_PAGES];
		for i in 0..PAGEABLE_PAGES {
			let pid = i % 2;
			let page_num = i / 2;
			let vaddr = PROCESS_ENTRY + (page_num * PAGE_SIZE) as u32;
			let dir = if pid == 0 { dir_a } else { dir_b };
			let frame = mm
				.get_memory(false, vaddr, pid, &mut pcbs, &arch, &disk)
				.unwrap() as usize;
			assert_eq!(frame, i);
			owner_of[frame] = pid;
			vaddr_of[frame] = vaddr;

			mm.frame_bytes_mut(frame).fill(frame as u8);
			let (d, t) = decompose(vaddr);
			let table_id = mm.ensure_table_pub(dir, d);
			mm.tables_mut()[table_id].entries[t] = PtEntry {
				flags: PteFlags::PRESENT | PteFlags::RW | PteFlags::US | PteFlags::DIRTY,
				frame: Some(frame),
			};
		}

		// One more request: every frame is pinned-free but none left to bump,
		// so `get_memory` must steal one.
		let new_vaddr = PROCESS_ENTRY + (PAGEABLE_PAGES / 2 * PAGE_SIZE) as u32;
		let victim = mm
			.get_memory(false, new_vaddr, 0, &mut pcbs, &arch, &disk)
			.unwrap() as usize;

		let victim_pid = owner_of[victim];
		let victim_vaddr = vaddr_of[victim];
		let victim_dir = pcbs[victim_pid].as_ref().unwrap().page_dir;
		let (d, t) = decompose(victim_vaddr);
		let table_id = mm.ensure_table_pub(victim_dir, d);
		assert!(!mm.tables_mut()[table_id].entries[t].is_present());

		let (sector, sectors) = MemoryManager::backing_location(victim_vaddr, 0, swap_size);
		let mut written_back = vec![0u8; sectors as usize * SECTOR_SIZE];
		disk.scsi_read(sector, sectors, &mut written_back);
		assert!(written_back.iter().all(|&b| b == victim as u8));
	}

	#[test]
	fn backing_location_clips_final_partial_page() {
		let (sector, sectors) = MemoryManager::backing_location(PROCESS_ENTRY, 100, 3);
		assert_eq!(sector, 100);
		assert_eq!(sectors, 3);
	}

	#[test]
	fn setup_page_table_shares_kernel_dir_for_threads() {
		let mut mm = MemoryManager::new();
		let pcb = Pcb::new(0, Kind::Thread, 0, 0, 0, 0);
		assert_eq!(mm.setup_page_table(&pcb), mm.kernel_dir());
	}
}
