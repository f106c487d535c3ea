//! Common imports throughout this project.

pub use std::{
    collections::{BTreeMap as Map, BTreeSet as Set},
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

pub use error_chain::bail;
pub use indexmap::IndexMap;
pub use num::BigInt as Int;

pub use crate::{
    ctl, db, engine,
    err::{ChainExt, Error, ErrorChain, Res},
    parse, project, sim, solve, term,
};

/// Acquires a read lock, recovering the guard if a writer panicked.
///
/// A poisoned lock means some thread panicked while writing; the data is
/// whatever that writer left behind, which for the clause database is always
/// a consistent value (writers build aside and swap).
pub fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

/// Acquires a write lock, recovering the guard if a writer panicked.
pub fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
