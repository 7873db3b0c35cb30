//! Kernel logging.
//!
//! There is no console driver available this early, so logs are kept in a
//! fixed-size ring buffer rather than printed directly. [`klog!`] writes
//! into it; [`Logger::drain`] is how
//! [`crate::arch::Arch::scrprintf`] (an external collaborator, out of this
//! crate's scope) would flush it to the screen.

use core::cmp::min;
use core::fmt;
use core::fmt::Write;
use spin::Mutex;

/// Size of the in-memory log ring buffer, in bytes.
const LOG_SIZE: usize = 16384;

/// The kernel's logger.
pub static LOGGER: Mutex<Logger> = Mutex::new(Logger::new());

/// Ring-buffer logger.
///
/// Overwrites the oldest bytes once full; nothing here can fail or block.
pub struct Logger {
	/// Suppresses [`klog!`] entirely when set. Defaults to `false`; set from
	/// the boot command line's `silent` flag by [`crate::boot`].
	pub silent: bool,
	buf: [u8; LOG_SIZE],
	write_head: usize,
	len: usize,
}

impl Logger {
	/// Creates an empty logger.
	pub const fn new() -> Self {
		Self {
			silent: false,
			buf: [0; LOG_SIZE],
			write_head: 0,
			len: 0,
		}
	}

	fn push_byte(&mut self, b: u8) {
		self.buf[self.write_head] = b;
		self.write_head = (self.write_head + 1) % LOG_SIZE;
		self.len = min(self.len + 1, LOG_SIZE);
	}

	/// Copies up to `dst.len()` of the oldest still-buffered bytes into
	/// `dst`, returning the number copied.
	pub fn drain(&self, dst: &mut [u8]) -> usize {
		let n = min(self.len, dst.len());
		let start = (self.write_head + LOG_SIZE - self.len) % LOG_SIZE;
		for (i, slot) in dst.iter_mut().enumerate().take(n) {
			*slot = self.buf[(start + i) % LOG_SIZE];
		}
		n
	}
}

impl fmt::Write for Logger {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		for b in s.bytes() {
			self.push_byte(b);
		}
		Ok(())
	}
}

/// Writes a formatted message into the kernel log ring buffer.
///
/// This function is meant to be used through the [`klog!`] macro only.
#[doc(hidden)]
pub fn _klog(args: fmt::Arguments) {
	let mut logger = LOGGER.lock();
	if logger.silent {
		return;
	}
	fmt::write(&mut *logger, args).ok();
}

/// Logs a formatted message, suppressed entirely once [`Logger::silent`] is
/// set (by [`crate::boot`], from the `silent` command-line flag).
#[macro_export]
macro_rules! klog {
	($($arg:tt)*) => {
		$crate::logger::_klog(format_args!($($arg)*))
	};
}
