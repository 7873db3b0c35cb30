//! `teachos` is the core of a small teaching operating system: a scheduler,
//! synchronization primitives, a mailbox IPC layer, demand-paged virtual
//! memory, and an inode-based filesystem, running single-CPU on bare x86 in
//! 32-bit protected mode.
//!
//! The bootloader image builder, the block/SCSI driver, the interrupt and
//! context-switch glue, and the screen printer are external collaborators:
//! this crate only depends on their *interfaces*, given here as the
//! [`arch::Arch`] and [`block::BlockDevice`]/[`block::ScsiDevice`] traits.
//! That keeps every subsystem below exercisable from host-side tests without
//! booting real hardware.
#![no_std]
#![allow(clippy::new_without_default)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
pub mod logger;
pub mod arch;
pub mod block;
pub mod config;
pub mod errno;
pub mod fs;
pub mod ipc;
pub mod memory;
pub mod process;
pub mod sync;

pub use errno::{Errno, Result};

use alloc::boxed::Box;
use block::BlockDevice;
use config::BootArgs;
use fs::FileSystem;

/// Mounts the root filesystem and applies the logger's silence flag from a
/// raw boot command line, mirroring the teacher's `kernel_main` wiring
/// (`cmdline::ArgsParser::parse` into `LOGGER.lock().silent` and
/// `file::init(args_parser.get_root_dev())`).
pub fn boot(cmdline: &str, device: Box<dyn BlockDevice>) -> FileSystem {
	let args = BootArgs::parse(cmdline);
	logger::LOGGER.lock().silent = args.silent;
	let super_block_start = args.root_sector.unwrap_or(fs::DEFAULT_SUPER_BLOCK_START);
	FileSystem::mount(device, super_block_start)
}
