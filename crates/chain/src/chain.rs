//! Per-call chain traversal.
//!
//! # Role
//!
//! [`Next`] is the forwarding value handed to every behavior. It borrows the
//! snapshot captured for the current call and an index into it (as a
//! subslice), so there is no shared cursor between calls.
//!
//! # Invariants
//!
//! - A `Next` only ever points into the snapshot of the call that created it.
//! - The end of the chain is the original behavior, which receives no `Next`.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::Original;
use crate::interceptor::Interceptor;

/// The remainder of a chain, bound to the current receiver.
///
/// Calling [`Next::call`] zero times short-circuits; calling it repeatedly
/// re-runs the remainder each time.
pub struct Next<'a, R, A, O> {
	receiver: &'a R,
	rest: &'a [Arc<Interceptor<R, A, O>>],
	original: &'a Original<R, A, O>,
}

impl<R, A, O> Clone for Next<'_, R, A, O> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<R, A, O> Copy for Next<'_, R, A, O> {}

impl<'a, R, A, O> Next<'a, R, A, O> {
	pub(crate) fn new(
		receiver: &'a R,
		rest: &'a [Arc<Interceptor<R, A, O>>],
		original: &'a Original<R, A, O>,
	) -> Self {
		Self {
			receiver,
			rest,
			original,
		}
	}

	/// Forwards `args` to the next interceptor, or to the original when none remain.
	pub fn call(&self, args: A) -> O {
		match self.rest.split_first() {
			Some((head, tail)) => head.invoke(self.receiver, Self { rest: tail, ..*self }, args),
			None => self.original.call(self.receiver, args),
		}
	}

	/// Number of interceptors still ahead of the original.
	pub fn remaining(&self) -> usize {
		self.rest.len()
	}

	/// True when the next hop is the original behavior.
	pub fn is_original(&self) -> bool {
		self.rest.is_empty()
	}

	pub fn receiver(&self) -> &'a R {
		self.receiver
	}
}

impl<R, A, O> fmt::Debug for Next<'_, R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Next")
			.field("remaining", &self.rest.len())
			.finish_non_exhaustive()
	}
}
