//! Priority-tagged interceptors.
//!
//! # Role
//!
//! An [`Interceptor`] wraps one user behavior together with the priority that
//! places it in a chain. It carries no reference to the chain it lives in.
//!
//! # Invariants
//!
//! - Ordering compares priority first, then attach sequence; it never looks at the behavior.
//! - Identity for removal is [`InterceptorId`], never the priority.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::Deserialize;

use crate::chain::Next;
use crate::config::TieBreak;

/// Execution priority. Higher values run earlier and wrap outermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
	/// Mid-range priority used when none is given.
	pub const DEFAULT: Self = Self(5);

	pub const fn new(value: i32) -> Self {
		Self(value)
	}

	pub const fn get(self) -> i32 {
		self.0
	}
}

impl Default for Priority {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl From<i32> for Priority {
	fn from(value: i32) -> Self {
		Self(value)
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

static NEXT_INTERCEPTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one attached interceptor.
///
/// Ids are handed out monotonically, so they double as the attach sequence
/// used to break priority ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterceptorId(u64);

impl InterceptorId {
	fn next() -> Self {
		Self(NEXT_INTERCEPTOR_ID.fetch_add(1, AtomicOrdering::Relaxed))
	}
}

impl fmt::Display for InterceptorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Boxed behavior shape: `(receiver, next, args) -> output`.
pub type Behavior<R, A, O> = dyn for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync;

/// One behavior inserted into a method's call path.
pub struct Interceptor<R, A, O> {
	id: InterceptorId,
	priority: Priority,
	behavior: Box<Behavior<R, A, O>>,
}

impl<R, A, O> Interceptor<R, A, O> {
	/// Wraps `behavior` with a fresh identity.
	pub fn new<F>(priority: Priority, behavior: F) -> Self
	where
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
	{
		Self {
			id: InterceptorId::next(),
			priority,
			behavior: Box::new(behavior),
		}
	}

	pub fn id(&self) -> InterceptorId {
		self.id
	}

	pub fn priority(&self) -> Priority {
		self.priority
	}

	/// Runs the behavior; `next` advances to the rest of the chain.
	#[inline]
	pub fn invoke<'a>(&self, receiver: &'a R, next: Next<'a, R, A, O>, args: A) -> O {
		(self.behavior)(receiver, next, args)
	}

	/// Compares two interceptors by chain position.
	///
	/// `Less` means `self` runs before `other`. Ties on priority fall back to
	/// the attach sequence in the direction given by `tie_break`.
	pub fn chain_cmp(&self, other: &Self, tie_break: TieBreak) -> Ordering {
		other.priority.cmp(&self.priority).then_with(|| match tie_break {
			TieBreak::FirstAttached => self.id.cmp(&other.id),
			TieBreak::LastAttached => other.id.cmp(&self.id),
		})
	}
}

impl<R, A, O> fmt::Debug for Interceptor<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interceptor")
			.field("id", &self.id)
			.field("priority", &self.priority)
			.finish_non_exhaustive()
	}
}
