//! Inter-process communication (`spec.md` §4.3).

pub mod mailbox;
