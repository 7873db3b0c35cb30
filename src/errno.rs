//! Error codes returned by filesystem and mailbox calls.
//!
//! Calls return a small non-negative integer on success (bytes transferred,
//! an inode number, a file descriptor...) and a negative [`Errno`] on
//! failure. Nothing in this crate panics on a recoverable error; only a
//! fatal condition (a page fault against address zero, an out-of-range
//! mailbox key) terminates the offending task, and it does so through
//! [`crate::process::scheduler::exit_current`], not by unwinding.

/// An error code, always negative by convention when returned from a
/// filesystem or mailbox call.
pub type Errno = i32;

/// File or directory not found.
pub const FSE_NOTEXIST: Errno = -1;
/// A path names a file where a directory was expected, or the reverse.
pub const FSE_DIRISFILE: Errno = -2;
/// A file-descriptor operation is incompatible with the descriptor's open
/// mode.
pub const FSE_INVALIDMODE: Errno = -3;
/// A forbidden name (`.` or `..`) was used as a removal target.
pub const FSE_INVALIDNAME: Errno = -4;
/// No free data blocks, or a file grew past `max_filesize`.
pub const FSE_FULL: Errno = -5;
/// The inode bitmap has no free entry left.
pub const FSE_NOMOREINODES: Errno = -6;
/// The in-memory inode table has no free slot left.
pub const FSE_INODETABLEFULL: Errno = -7;
/// The superblock or an inode failed validation at mount time.
pub const FSE_ERROR: Errno = -8;
/// A directory is not empty is implied by recursive removal, never returned
/// directly (`remove_directory_entry` always recurses); kept for parity
/// with the taxonomy in the design document.
pub const FSE_NOTEMPTY: Errno = -9;
/// The process-wide file-descriptor table is full.
pub const FSE_TOOMANYFILES: Errno = -10;
/// No such open file descriptor.
pub const FSE_BADFD: Errno = -11;
/// Seek past end-of-file while the descriptor is read-only.
pub const FSE_EOF: Errno = -12;

/// Result alias used throughout the filesystem and mailbox layers.
pub type Result<T> = core::result::Result<T, Errno>;

/// Builds an [`Errno`] from one of the `FSE_*` constants.
///
/// Exists only so call sites read `fserr!(FSE_NOTEXIST)` the way the
/// teacher's (unavailable) `utils::errno!` macro reads `errno!(ENOENT)`;
/// unlike that macro this one does not also record a backtrace, since this
/// crate has no such facility.
#[macro_export]
macro_rules! fserr {
	($code:expr) => {
		$code
	};
}
