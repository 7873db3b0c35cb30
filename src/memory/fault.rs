//! Page-fault handling (`spec.md` §4.4).
//!
//! Dirty-bit writeback happens at eviction time in
//! [`super::MemoryManager::get_memory`], never here: the initial PTE
//! install this module performs always clears D.

use crate::arch::Arch;
use crate::block::ScsiDevice;
use crate::memory::page_table::{decompose, PteFlags};
use crate::memory::MemoryManager;
use crate::process::{FaultInfo, Pcb, ProcId};

/// What happened while resolving a page fault.
#[derive(Debug, PartialEq, Eq)]
pub enum FaultOutcome {
	/// A not-present page was demand-loaded and mapped.
	Resolved,
	/// Address zero: terminate the faulting task.
	NullPointer,
	/// The faulted page was present: a protection violation, terminate the
	/// faulting task.
	AccessDenied,
	/// Every unpinned frame is in use and none could be stolen: terminate
	/// the faulting task.
	OutOfMemory,
}

/// Error-code bit indicating the faulted page was present (`spec.md` §4.4).
pub const ERROR_PRESENT: u32 = 1 << 0;

/// Resolves a page fault taken by `pid`, under the caller's `memory_lock`
/// (`mm`). `pcbs` is the scheduler's whole PCB table, not just the faulting
/// one: on eviction, [`MemoryManager::get_memory`] needs to look up whatever
/// PCB owns the stolen frame to read its PTE's dirty bit before reassigning
/// it, and that victim is in general a different PCB than `pid`.
pub fn handle_page_fault(
	mm: &mut MemoryManager,
	pcbs: &mut [Option<Pcb>],
	pid: ProcId,
	fault_addr: u32,
	error_code: u32,
	arch: &dyn Arch,
	scsi: &dyn ScsiDevice,
) -> FaultOutcome {
	let pcb = pcbs[pid].as_mut().expect("page fault on unknown pid");
	pcb.fault_count += 1;
	pcb.fault_info = FaultInfo {
		addr: fault_addr,
		error_code,
	};
	let page_dir = pcb.page_dir;
	let swap_loc = pcb.swap_loc;
	let swap_size = pcb.swap_size;

	if fault_addr == 0 {
		return FaultOutcome::NullPointer;
	}
	if error_code & ERROR_PRESENT != 0 {
		return FaultOutcome::AccessDenied;
	}

	let (sector, sectors) = MemoryManager::backing_location(fault_addr, swap_loc, swap_size);
	let frame = match mm.get_memory(false, fault_addr, pid, pcbs, arch, scsi) {
		Ok(f) => f as usize,
		Err(_) => return FaultOutcome::OutOfMemory,
	};

	{
		let len = sectors as usize * crate::config::SECTOR_SIZE;
		let buf = mm.frame_bytes_mut(frame);
		scsi.scsi_read(sector, sectors, &mut buf[..len]);
	}

	let (d, t) = decompose(fault_addr);
	let table_id = mm.ensure_table_pub(page_dir, d);
	mm.tables_mut()[table_id].entries[t] = crate::memory::page_table::PtEntry {
		flags: PteFlags::PRESENT | PteFlags::RW | PteFlags::US,
		frame: Some(frame),
	};
	arch.flush_tlb_entry(fault_addr);

	FaultOutcome::Resolved
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::arch::HostArch;
	use crate::block::MemDisk;
	use crate::config::{PROCESS_ENTRY, SECTORS_PER_PAGE};
	use crate::process::Kind;

	#[test]
	fn null_pointer_is_fatal() {
		let mut mm = MemoryManager::new();
		let mut pcbs = alloc::vec![Some(Pcb::new(0, Kind::Process, 0, 0, 8, 0))];
		let arch = HostArch::new();
		let disk = MemDisk::new(8);
		let outcome = handle_page_fault(&mut mm, &mut pcbs, 0, 0, 0, &arch, &disk);
		assert_eq!(outcome, FaultOutcome::NullPointer);
		assert_eq!(pcbs[0].as_ref().unwrap().fault_count, 1);
	}

	#[test]
	fn present_page_fault_is_access_denied() {
		let mut mm = MemoryManager::new();
		let mut pcbs = alloc::vec![Some(Pcb::new(0, Kind::Process, 0, 0, 8, 0))];
		let arch = HostArch::new();
		let disk = MemDisk::new(8);
		let outcome = handle_page_fault(&mut mm, &mut pcbs, 0, PROCESS_ENTRY, ERROR_PRESENT, &arch, &disk);
		assert_eq!(outcome, FaultOutcome::AccessDenied);
	}

	#[test]
	fn not_present_demand_loads() {
		let mut mm = MemoryManager::new();
		let dir = mm.setup_page_table(&Pcb::new(0, Kind::Process, 0, 16, SECTORS_PER_PAGE as u32, 0));
		let mut pcbs = alloc::vec![Some(Pcb::new(0, Kind::Process, dir, 16, SECTORS_PER_PAGE as u32, 0))];
		let arch = HostArch::new();
		let disk = MemDisk::new(64);
		let outcome = handle_page_fault(&mut mm, &mut pcbs, 0, PROCESS_ENTRY, 0, &arch, &disk);
		assert_eq!(outcome, FaultOutcome::Resolved);
	}
}
