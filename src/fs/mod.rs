//! An inode-based filesystem over a [`BlockDevice`] (`spec.md` §4.5).
//!
//! Layout, starting at sector [`FileSystem::super_block_start`]: superblock,
//! inode bitmap, data-block bitmap, inode table, data region. See
//! [`superblock`], [`bitmap`], [`inode`], [`dirent`] for the on-disk record
//! formats.

pub mod bitmap;
pub mod dirent;
pub mod inode;
pub mod superblock;

use crate::block::BlockDevice;
use crate::config::{BLOCK_SIZE, MAX_INODES, NINODES};
use crate::errno::{Result, FSE_BADFD, FSE_DIRISFILE, FSE_EOF, FSE_FULL, FSE_INVALIDMODE, FSE_INVALIDNAME, FSE_NOMOREINODES, FSE_NOTEXIST};
use crate::fserr;
use crate::process::{OpenMode, Pcb};
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use bitmap::Bitmap;
use dirent::{DirEntry, ENTRY_SIZE};
use inode::{idx2blk, load_inode, save_inode, DiskInode, InodeType, MemInode};
use superblock::Superblock;

/// Default starting sector used when no boot argument names one (`spec.md`
/// §3 "`SUPER_BLOCK_START = 2 + os_size`"). `os_size`, the kernel image's
/// sector count, is only known once the image is built; this default
/// assumes a 64-sector (32 KiB) kernel, matching the size range of images
/// this kernel's own `bin/mkimage` produces. [`crate::boot`] passes the boot
/// loader's computed value through [`crate::config::BootArgs::root_sector`]
/// instead of relying on this default whenever the command line names one.
pub const DEFAULT_SUPER_BLOCK_START: u32 = 2 + 64;

/// Whence argument to [`FileSystem::lseek`] (`spec.md` §4.5 `fs_lseek`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
	Set,
	Cur,
	End,
}

/// The mounted filesystem: superblock, both bitmaps, the in-memory inode
/// table, and the block device backing them all.
pub struct FileSystem {
	device: Box<dyn BlockDevice>,
	super_block_start: u32,
	superblock: Superblock,
	inode_bmap: Bitmap,
	data_bmap: Bitmap,
	inodes: Vec<MemInode>,
}

impl FileSystem {
	/// Sector at which the superblock (and everything after it) lives.
	pub fn super_block_start(&self) -> u32 {
		self.super_block_start
	}

	fn save_bitmaps(&self) {
		self.inode_bmap.save(&*self.device, self.super_block_start + 1);
		self.data_bmap.save(&*self.device, self.super_block_start + 2);
	}

	/// Mounts the filesystem at `super_block_start`: reads the superblock,
	/// and either loads the existing filesystem or formats a new one if the
	/// fixed fields don't match what this kernel expects (`spec.md` §4.5
	/// "Mount (`fs_init`)").
	pub fn mount(device: Box<dyn BlockDevice>, super_block_start: u32) -> Self {
		let superblock = Superblock::load(&*device, super_block_start);
		if !superblock.matches_expected() {
			return Self::format(device, super_block_start);
		}

		let inode_bmap = Bitmap::load(&*device, super_block_start + 1);
		let data_bmap = Bitmap::load(&*device, super_block_start + 2);
		let inodes = (0..MAX_INODES as u32)
			.map(|ino| MemInode::new(ino, DiskInode::new(InodeType::File)))
			.collect();
		let mut fs = Self {
			device,
			super_block_start,
			superblock,
			inode_bmap,
			data_bmap,
			inodes,
		};

		for ino in 0..NINODES as u32 {
			if !fs.inode_bmap.is_set(ino as usize) {
				continue;
			}
			let disk = load_inode(&*fs.device, fs.super_block_start, ino);
			if fs.inode_is_corrupted(&disk) {
				klog!("Corrupted inode detected\n");
				fs.free_inode(ino);
				continue;
			}
			fs.inodes[ino as usize] = MemInode::new(ino, disk);
			fs.inodes[ino as usize].dirty = false;
		}
		fs
	}

	/// `size <= max_filesize` and every direct block it addresses is inside
	/// `ndata_blks` and marked allocated, matching `load_inode`'s
	/// corruption check in the source.
	fn inode_is_corrupted(&self, disk: &DiskInode) -> bool {
		if disk.size > self.superblock.max_filesize {
			return true;
		}
		let blocks = disk.size.div_ceil(BLOCK_SIZE as u32).max(1) as usize;
		for x in 0..blocks.min(disk.direct.len()) {
			match disk.direct.get(x).copied() {
				Some(idx) if idx != u16::MAX => {
					if idx as u32 >= self.superblock.ndata_blks || !self.data_bmap.is_set(idx as usize) {
						return true;
					}
				}
				_ => return true,
			}
		}
		false
	}

	/// Formats a fresh filesystem: zeroed bitmaps, the fixed superblock
	/// fields, and a root directory whose parent is itself (`spec.md` §4.5
	/// "Format (`fs_mkfs`)").
	pub fn format(device: Box<dyn BlockDevice>, super_block_start: u32) -> Self {
		let inode_bmap = Bitmap::zeroed();
		let data_bmap = Bitmap::zeroed();
		inode_bmap.save(&*device, super_block_start + 1);
		data_bmap.save(&*device, super_block_start + 2);

		let inodes = (0..MAX_INODES as u32)
			.map(|ino| MemInode::new(ino, DiskInode::new(InodeType::File)))
			.collect();
		let mut fs = Self {
			device,
			super_block_start,
			superblock: Superblock::expected(0),
			inode_bmap,
			data_bmap,
			inodes,
		};

		let root = fs.create_directory(None).expect("cannot create root directory on a freshly formatted disk");
		fs.superblock.root_inode = root;
		fs.superblock.save(&*fs.device, fs.super_block_start);
		fs
	}

	fn inode(&self, id: u32) -> Result<&MemInode> {
		self.inodes.get(id as usize).ok_or(fserr!(FSE_NOTEXIST))
	}

	fn inode_mut(&mut self, id: u32) -> Result<&mut MemInode> {
		self.inodes.get_mut(id as usize).ok_or(fserr!(FSE_NOTEXIST))
	}

	/// The inode type of `id`, for callers outside this module (`fs_stat`
	/// duplicates this but `chdir`/`rmdir`/`link` need it directly too).
	pub fn inode_kind(&self, id: u32) -> Result<InodeType> {
		Ok(self.inode(id)?.disk.kind)
	}

	/// `create_inode` in the source: allocates an inode-bitmap entry and an
	/// empty in-memory slot, but does not link it into any directory yet.
	fn create_inode(&mut self, kind: InodeType) -> Result<u32> {
		let entry = self.inode_bmap.get_free_entry().filter(|&e| e < MAX_INODES).ok_or(fserr!(FSE_NOMOREINODES))?;
		self.save_bitmaps();
		let id = entry as u32;
		self.inodes[entry] = MemInode::new(id, DiskInode::new(kind));
		Ok(id)
	}

	/// Frees `id` and every data block it still owns.
	fn free_inode(&mut self, id: u32) {
		let direct = self.inodes[id as usize].disk.direct;
		for &slot in direct.iter() {
			if slot != u16::MAX {
				self.data_bmap.free_entry(slot as usize);
			}
		}
		self.inode_bmap.free_entry(id as usize);
		self.save_bitmaps();
	}

	/// Decrements `nlinks`; frees the inode once it reaches zero, or
	/// unconditionally if it is a directory (`spec.md` §4.5
	/// "`remove_directory_entry`").
	fn reduce_links(&mut self, id: u32) {
		let inode = &mut self.inodes[id as usize];
		inode.disk.nlinks = inode.disk.nlinks.saturating_sub(1);
		if inode.disk.nlinks == 0 || inode.disk.kind == InodeType::Dir {
			self.free_inode(id);
		} else {
			save_inode(&*self.device, self.super_block_start, id, inode.disk);
		}
	}

	/// Grows or shrinks `id`'s direct-block allocation to match `new_size`
	/// (`spec.md` §4.5 "`resize_inode`"). Allocation failure partway
	/// through a growth leaves the blocks already claimed allocated — this
	/// matches the source (`spec.md` §9 notes it as a known, accepted
	/// quirk rather than a bug to fix).
	fn resize_inode(&mut self, id: u32, new_size: u32) -> Result<()> {
		if new_size as usize > self.superblock.max_filesize as usize {
			return Err(fserr!(FSE_FULL));
		}
		let target_blocks = (new_size as usize / BLOCK_SIZE) + 1;
		let ndata_blks = self.superblock.ndata_blks;
		let direct_len = self.inodes[id as usize].disk.direct.len();
		for x in 0..direct_len {
			let allocated = self.inodes[id as usize].disk.direct[x] != u16::MAX;
			if x < target_blocks {
				if !allocated {
					let slot = self.data_bmap.get_free_entry();
					match slot {
						Some(s) if (s as u32) < ndata_blks && s != u16::MAX as usize => {
							self.inodes[id as usize].disk.direct[x] = s as u16;
						}
						_ => return Err(fserr!(FSE_FULL)),
					}
				}
			} else if allocated {
				let slot = self.inodes[id as usize].disk.direct[x];
				self.data_bmap.free_entry(slot as usize);
				self.inodes[id as usize].disk.direct[x] = u16::MAX;
			}
		}
		self.inodes[id as usize].disk.size = new_size;
		self.save_bitmaps();
		save_inode(&*self.device, self.super_block_start, id, self.inodes[id as usize].disk);
		Ok(())
	}

	/// Reads up to `buf.len()` bytes starting at `start_pos`, clipped to the
	/// inode's current size, whole-block in the middle and partial at the
	/// edges (`spec.md` §4.5 "`db_read`").
	fn db_read(&mut self, id: u32, buf: &mut [u8], start_pos: u32) -> Result<u32> {
		let size = self.inode(id)?.disk.size;
		let finish_pos = (start_pos + buf.len() as u32).min(size);
		if finish_pos <= start_pos {
			return Ok(0);
		}
		let start_block = start_pos as usize / BLOCK_SIZE;
		let finish_block = finish_pos as usize / BLOCK_SIZE + 1;
		let mut read = 0usize;
		for x in start_block..finish_block {
			if (read as u32 + start_pos) >= size {
				break;
			}
			let slot = self.inode(id)?.disk.direct[x];
			let block = idx2blk(self.super_block_start, slot as u32);
			let (offset, len) = if x == start_block {
				let in_len = if x + 1 == finish_block {
					(finish_pos - start_pos) as usize
				} else {
					BLOCK_SIZE - (start_pos as usize % BLOCK_SIZE)
				};
				(start_pos as usize % BLOCK_SIZE, in_len)
			} else if x + 1 == finish_block {
				(0, (finish_pos - start_pos) as usize - read)
			} else {
				(0, BLOCK_SIZE)
			};
			self.device.block_read_part(block, offset, len, &mut buf[read..read + len]);
			read += len;
		}
		Ok(read as u32)
	}

	/// Writes `buf` starting at `start_pos`, first extending the inode (via
	/// [`FileSystem::resize_inode`]) to cover `start_pos + buf.len()`
	/// clipped to `max_filesize` (`spec.md` §4.5 "`db_write`").
	fn db_write(&mut self, id: u32, buf: &[u8], start_pos: u32) -> Result<u32> {
		let start_block = start_pos as usize / BLOCK_SIZE;
		let finish_pos = ((start_pos as usize + buf.len()) as u32).min(self.superblock.max_filesize);
		let finish_block = finish_pos as usize / BLOCK_SIZE + 1;
		self.resize_inode(id, finish_pos)?;

		let size = self.inode(id)?.disk.size;
		let mut written = 0usize;
		for x in start_block..finish_block {
			if start_pos + written as u32 >= size {
				break;
			}
			let slot = self.inode(id)?.disk.direct[x];
			let block = idx2blk(self.super_block_start, slot as u32);
			let (offset, len) = if x == start_block {
				let in_len = if x + 1 == finish_block {
					(finish_pos - start_pos) as usize
				} else {
					BLOCK_SIZE - (start_pos as usize % BLOCK_SIZE)
				};
				(start_pos as usize % BLOCK_SIZE, in_len)
			} else if x + 1 == finish_block {
				(0, (finish_pos - start_pos) as usize - written)
			} else {
				(0, BLOCK_SIZE)
			};
			self.device.block_modify(block, offset, &buf[written..written + len]);
			written += len;
		}
		Ok(written as u32)
	}

	fn read_dir_entries(&mut self, dir: u32) -> Result<Vec<DirEntry>> {
		let size = self.inode(dir)?.disk.size as usize;
		let mut raw = vec![0u8; size];
		self.db_read(dir, &mut raw, 0)?;
		Ok(raw.chunks_exact(ENTRY_SIZE).map(DirEntry::from_bytes).collect())
	}

	/// Appends `name -> inode` to `dir`'s entries and bumps `inode`'s link
	/// count (`spec.md` §4.5 "`create_directory_entry`").
	fn create_directory_entry(&mut self, dir: u32, inode: u32, name: &str) -> Result<()> {
		let entry = DirEntry::new(name, inode).to_bytes();
		let old_size = self.inode(dir)?.disk.size;
		self.resize_inode(dir, old_size + ENTRY_SIZE as u32)?;
		self.db_write(dir, &entry, old_size)?;
		self.inodes[inode as usize].disk.nlinks += 1;
		save_inode(&*self.device, self.super_block_start, inode, self.inodes[inode as usize].disk);
		Ok(())
	}

	/// Creates a directory inode with `.` and `..` entries installed; root
	/// is created by passing `parent: None`, which makes it its own parent
	/// (`spec.md` §4.5 "`create_directory`").
	pub fn create_directory(&mut self, parent: Option<u32>) -> Result<u32> {
		let dir = self.create_inode(InodeType::Dir)?;
		let parent = parent.unwrap_or(dir);
		let self_entry_ok = self.create_directory_entry(dir, dir, ".").is_ok();
		let parent_entry_ok = self.create_directory_entry(dir, parent, "..").is_ok();
		if !self_entry_ok || !parent_entry_ok {
			self.free_inode(dir);
			return Err(fserr!(FSE_FULL));
		}
		save_inode(&*self.device, self.super_block_start, dir, self.inodes[dir as usize].disk);
		Ok(dir)
	}

	/// Creates a plain file inode linked into `dir` as `filename`
	/// (`spec.md` §4.5, `create_file` in the source; only called after the
	/// caller has already confirmed `filename` doesn't exist in `dir`).
	fn create_file(&mut self, dir: u32, filename: &str) -> Result<u32> {
		let file = self.create_inode(InodeType::File)?;
		if let Err(e) = self.create_directory_entry(dir, file, filename) {
			self.free_inode(file);
			return Err(e);
		}
		save_inode(&*self.device, self.super_block_start, file, self.inodes[file as usize].disk);
		self.save_bitmaps();
		Ok(file)
	}

	/// Removes the first entry in `dir` referencing `id`. If `id` is itself
	/// a directory, first recursively removes its children (skipping `.`
	/// and `..`, `spec.md` §4.5 "`remove_directory_entry`").
	fn remove_directory_entry(&mut self, dir: u32, id: u32) -> Result<()> {
		if self.inode(id)?.disk.kind == InodeType::Dir {
			let children = self.read_dir_entries(id)?;
			for child in children {
				if child.inode != dir && child.inode != id {
					self.remove_directory_entry(id, child.inode)?;
				}
			}
		}

		let entries = self.read_dir_entries(dir)?;
		let mut kept = Vec::with_capacity(entries.len());
		let mut found = false;
		for entry in entries {
			if entry.inode == id && !found {
				found = true;
			} else {
				kept.push(entry);
			}
		}
		if found {
			self.reduce_links(id);
		}
		let new_size = (kept.len() * ENTRY_SIZE) as u32;
		let bytes: Vec<u8> = kept.into_iter().flat_map(|e| e.to_bytes()).collect();
		self.resize_inode(dir, new_size)?;
		self.db_write(dir, &bytes, 0)?;
		Ok(())
	}

	/// Looks up a single path segment directly inside `dir` (no further
	/// traversal): `name2inode_f` in the source. Matches by a bounded
	/// prefix compare of `name`'s length, as the source does.
	fn name2inode_f(&mut self, dir: u32, name: &str) -> Option<u32> {
		self.read_dir_entries(dir).ok()?.into_iter().find(|e| e.name().as_bytes().starts_with(name.as_bytes())).map(|e| e.inode)
	}

	/// Resolves a `/`-separated path starting at `dir`, recursing one
	/// segment at a time (`name2inode_r` in the source). The empty path
	/// resolves to `dir` itself. A leading `/` is not special-cased here —
	/// it is treated as an (almost always absent) empty first segment,
	/// matching the source's documented, un-"fixed" behavior (`spec.md`
	/// §9.5 / §4.5 "Path resolution").
	fn name2inode_r(&mut self, dir: u32, path: &str) -> Option<u32> {
		if path.is_empty() {
			return Some(dir);
		}
		match path.find('/') {
			Some(slash) => {
				let segment = &path[..slash];
				let next = self.name2inode_f(dir, segment)?;
				self.name2inode_r(next, &path[slash + 1..])
			}
			None => self.name2inode_f(dir, path),
		}
	}

	/// Resolves `path` relative to `cwd` (`spec.md` §4.5 "`name2inode`").
	pub fn name2inode(&mut self, cwd: u32, path: &str) -> Option<u32> {
		self.name2inode_r(cwd, path)
	}

	/// `spec.md` §4.5 "`fs_open`": the first UNUSED descriptor slot is
	/// picked, `filename` is resolved (a single segment inside `cwd`, not a
	/// full path — matching `name2inode_f`'s use in the source), and
	/// created in `cwd` when missing if `create` is set.
	pub fn open(&mut self, pcb: &mut Pcb, filename: &str, mode: OpenMode, create: bool) -> Result<usize> {
		let fd = pcb.first_free_fd().ok_or(fserr!(crate::errno::FSE_TOOMANYFILES))?;
		let ino = if let Some(stripped) = filename.strip_prefix('/') {
			let _ = stripped;
			pcb.cwd
		} else {
			match self.name2inode_f(pcb.cwd, filename) {
				Some(ino) => ino,
				None if create => self.create_file(pcb.cwd, filename)?,
				None => return Err(fserr!(FSE_NOTEXIST)),
			}
		};
		pcb.fds[fd].open = Some((mode, ino));
		let inode = self.inode_mut(ino)?;
		inode.pos = 0;
		inode.open_count += 1;
		Ok(fd)
	}

	/// `spec.md` §4.5 "`fs_close`": a no-op returning success on an already
	/// unused descriptor.
	pub fn close(&mut self, pcb: &mut Pcb, fd: usize) -> Result<()> {
		let Some((_, ino)) = pcb.fds.get(fd).and_then(|e| e.open) else {
			return Ok(());
		};
		if let Ok(inode) = self.inode_mut(ino) {
			inode.pos = 0;
			inode.open_count = inode.open_count.saturating_sub(1);
		}
		pcb.fds[fd].open = None;
		Ok(())
	}

	/// `spec.md` §4.5 "`fs_read`".
	pub fn read(&mut self, pcb: &mut Pcb, fd: usize, buf: &mut [u8]) -> Result<u32> {
		let (mode, ino) = self.fd_entry(pcb, fd)?;
		if !mode.readable() {
			return Err(fserr!(FSE_INVALIDMODE));
		}
		let pos = self.inode(ino)?.pos;
		let read = self.db_read(ino, buf, pos)?;
		self.lseek(pcb, fd, read as i32, Whence::Cur)?;
		Ok(read)
	}

	/// `spec.md` §4.5 "`fs_write`".
	pub fn write(&mut self, pcb: &mut Pcb, fd: usize, buf: &[u8]) -> Result<u32> {
		let (mode, ino) = self.fd_entry(pcb, fd)?;
		if !mode.writable() {
			return Err(fserr!(FSE_INVALIDMODE));
		}
		let pos = self.inode(ino)?.pos;
		let written = self.db_write(ino, buf, pos)?;
		self.lseek(pcb, fd, written as i32, Whence::Cur)?;
		Ok(written)
	}

	fn fd_entry(&self, pcb: &Pcb, fd: usize) -> Result<(OpenMode, u32)> {
		pcb.fds.get(fd).and_then(|e| e.open).ok_or(fserr!(FSE_BADFD))
	}

	/// `spec.md` §4.5 "`fs_lseek`": extending past `size` allocates blocks
	/// (via [`FileSystem::resize_inode`]) unless the descriptor is
	/// read-only (`FSE_EOF`) or the new position would exceed
	/// `max_filesize` (`FSE_FULL`).
	///
	/// The source resizes to `offset` rather than the computed `pos` on
	/// this branch — `spec.md` §9.1 calls that out as a bug a faithful port
	/// should fix, so this resizes to `pos`.
	pub fn lseek(&mut self, pcb: &mut Pcb, fd: usize, offset: i32, whence: Whence) -> Result<u32> {
		let (mode, ino) = self.fd_entry(pcb, fd)?;
		let inode = self.inode(ino)?;
		let base = match whence {
			Whence::Set => 0i64,
			Whence::Cur => inode.pos as i64,
			Whence::End => inode.disk.size as i64,
		};
		let pos = base + offset as i64;
		let pos = if pos < 0 { 0 } else { pos as u32 };

		if pos > inode.disk.size {
			if matches!(mode, OpenMode::ReadOnly) {
				return Err(fserr!(FSE_EOF));
			}
			if pos > self.superblock.max_filesize {
				return Err(fserr!(FSE_FULL));
			}
			self.resize_inode(ino, pos)?;
		}
		self.inodes[ino as usize].pos = pos;
		Ok(pos)
	}

	/// `spec.md` §4.5 "`fs_stat`": writes `type` (1 byte), `nlinks` (1
	/// byte), `size` (4 bytes, little-endian) into `buf`.
	pub fn stat(&self, pcb: &Pcb, fd: usize, buf: &mut [u8; 6]) -> Result<()> {
		let (_, ino) = self.fd_entry(pcb, fd)?;
		let disk = self.inode(ino)?.disk;
		buf[0] = match disk.kind {
			InodeType::File => 0,
			InodeType::Dir => 1,
		};
		buf[1] = disk.nlinks.min(u8::MAX as u16) as u8;
		buf[2..6].copy_from_slice(&disk.size.to_le_bytes());
		Ok(())
	}

	/// `spec.md` §4.5 `fs_mkdir` (named in §6's syscall surface).
	pub fn mkdir(&mut self, pcb: &Pcb, dirname: &str) -> Result<()> {
		let dir = self.create_directory(Some(pcb.cwd))?;
		if let Err(e) = self.create_directory_entry(pcb.cwd, dir, dirname) {
			self.free_inode(dir);
			return Err(e);
		}
		Ok(())
	}

	/// `spec.md` §4.5 `fs_chdir`.
	pub fn chdir(&mut self, pcb: &mut Pcb, path: &str) -> Result<()> {
		let id = self.name2inode(pcb.cwd, path).ok_or(fserr!(FSE_NOTEXIST))?;
		if self.inode(id)?.disk.kind != InodeType::Dir {
			return Err(fserr!(FSE_DIRISFILE));
		}
		pcb.cwd = id;
		Ok(())
	}

	/// `spec.md` §4.5 `fs_rmdir`: `.` and `..` may never be named directly
	/// as the removal target.
	pub fn rmdir(&mut self, pcb: &Pcb, path: &str) -> Result<()> {
		let (parent_path, name) = match path.rfind('/') {
			Some(i) => (&path[..i], &path[i + 1..]),
			None => ("", path),
		};
		if name == "." || name == ".." {
			return Err(fserr!(FSE_INVALIDNAME));
		}
		let parent_dir = if parent_path.is_empty() {
			pcb.cwd
		} else {
			self.name2inode(pcb.cwd, parent_path).ok_or(fserr!(FSE_NOTEXIST))?
		};
		let remove_dir = self.name2inode(pcb.cwd, path).ok_or(fserr!(FSE_NOTEXIST))?;
		if self.inode(parent_dir)?.disk.kind != InodeType::Dir || self.inode(remove_dir)?.disk.kind != InodeType::Dir {
			return Err(fserr!(FSE_NOTEXIST));
		}
		self.remove_directory_entry(parent_dir, remove_dir)
	}

	/// `spec.md` §4.5 `fs_link`: hard-links an existing file (not a
	/// directory) under a new name in `cwd`.
	pub fn link(&mut self, pcb: &Pcb, linkname: &str, filename: &str) -> Result<()> {
		let id = self.name2inode(pcb.cwd, filename).ok_or(fserr!(FSE_NOTEXIST))?;
		if self.inode(id)?.disk.kind == InodeType::Dir {
			return Err(fserr!(FSE_NOTEXIST));
		}
		self.create_directory_entry(pcb.cwd, id, linkname)
	}

	/// `spec.md` §4.5 `fs_unlink`.
	pub fn unlink(&mut self, pcb: &Pcb, linkname: &str) -> Result<()> {
		let id = self.name2inode_f(pcb.cwd, linkname).ok_or(fserr!(FSE_NOTEXIST))?;
		self.remove_directory_entry(pcb.cwd, id)
	}

	/// The root directory's inode number, as recorded by [`Self::format`]
	/// or loaded by [`Self::mount`].
	pub fn root_inode(&self) -> u32 {
		self.superblock.root_inode
	}
}
