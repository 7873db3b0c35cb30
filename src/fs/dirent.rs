//! A directory's data region is a packed array of these records
//! (`spec.md` §3 "Directory entry").

use crate::config::MAX_FILENAME_LEN;

/// On-disk size of one directory entry: the name field plus a 32-bit inode
/// number.
pub const ENTRY_SIZE: usize = MAX_FILENAME_LEN + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
	name: [u8; MAX_FILENAME_LEN],
	pub inode: u32,
}

impl DirEntry {
	/// Builds an entry, truncating `name` to fit (including the null
	/// terminator) the way the source's `create_directory_entry` clamps
	/// `len` to `MAX_FILENAME_LEN`.
	pub fn new(name: &str, inode: u32) -> Self {
		let mut bytes = [0u8; MAX_FILENAME_LEN];
		let n = name.len().min(MAX_FILENAME_LEN - 1);
		bytes[..n].copy_from_slice(&name.as_bytes()[..n]);
		Self { name: bytes, inode }
	}

	/// The stored name, up to its null terminator.
	pub fn name(&self) -> &str {
		let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
		core::str::from_utf8(&self.name[..end]).unwrap_or("")
	}

	pub(crate) fn to_bytes(self) -> [u8; ENTRY_SIZE] {
		let mut out = [0u8; ENTRY_SIZE];
		out[..MAX_FILENAME_LEN].copy_from_slice(&self.name);
		out[MAX_FILENAME_LEN..].copy_from_slice(&self.inode.to_le_bytes());
		out
	}

	pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
		let mut name = [0u8; MAX_FILENAME_LEN];
		name.copy_from_slice(&bytes[..MAX_FILENAME_LEN]);
		let inode = u32::from_le_bytes(bytes[MAX_FILENAME_LEN..ENTRY_SIZE].try_into().unwrap());
		Self { name, inode }
	}
}
