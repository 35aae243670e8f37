//! Ordered interceptor registry with atomic publication.
//!
//! # Role
//!
//! One [`InterceptionRegistry`] holds the chain for one target. Readers take a
//! [`ChainSnapshot`] without locking; writers publish a new sorted vector
//! through a compare-and-swap loop.
//!
//! # Invariants
//!
//! - Published chains are sorted by [`Interceptor::chain_cmp`] under the registry's tie-break.
//! - A snapshot never changes after it is taken; mutations are seen by the next snapshot only.
//! - Removal matches by [`InterceptorId`], so equal priorities never alias.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::TieBreak;
use crate::handle::DetachTarget;
use crate::interceptor::{Interceptor, InterceptorId};

type Chain<R, A, O> = Vec<Arc<Interceptor<R, A, O>>>;

/// Immutable ordered view of a registry, taken once per call.
pub struct ChainSnapshot<R, A, O> {
	chain: Arc<Chain<R, A, O>>,
}

impl<R, A, O> Clone for ChainSnapshot<R, A, O> {
	fn clone(&self) -> Self {
		Self {
			chain: self.chain.clone(),
		}
	}
}

impl<R, A, O> Deref for ChainSnapshot<R, A, O> {
	type Target = [Arc<Interceptor<R, A, O>>];

	fn deref(&self) -> &Self::Target {
		self.chain.as_slice()
	}
}

impl<R, A, O> ChainSnapshot<R, A, O> {
	/// True when both snapshots share the same published chain.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.chain, &other.chain)
	}
}

impl<R, A, O> fmt::Debug for ChainSnapshot<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.chain.iter()).finish()
	}
}

/// Priority-ordered multiset of interceptors for one target.
pub struct InterceptionRegistry<R, A, O> {
	chain: ArcSwap<Chain<R, A, O>>,
	tie_break: TieBreak,
}

impl<R, A, O> Default for InterceptionRegistry<R, A, O> {
	fn default() -> Self {
		Self::new(TieBreak::default())
	}
}

impl<R, A, O> InterceptionRegistry<R, A, O> {
	pub fn new(tie_break: TieBreak) -> Self {
		Self {
			chain: ArcSwap::from_pointee(Vec::new()),
			tie_break,
		}
	}

	pub fn tie_break(&self) -> TieBreak {
		self.tie_break
	}

	/// Inserts `interceptor` at its chain position and returns its id.
	///
	/// Existing entries keep their relative order.
	pub fn add(&self, interceptor: Interceptor<R, A, O>) -> InterceptorId {
		let id = interceptor.id();
		let interceptor = Arc::new(interceptor);

		loop {
			let cur = self.chain.load_full();
			let mut next = Vec::with_capacity(cur.len() + 1);
			next.extend(cur.iter().cloned());

			let pos = next
				.binary_search_by(|e| e.chain_cmp(&interceptor, self.tie_break))
				.unwrap_or_else(|p| p);
			next.insert(pos, interceptor.clone());

			let prev = self.chain.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return id;
			}
		}
	}

	/// Removes the interceptor with `id`, handing it back to the caller.
	///
	/// The returned entry may be the last reference to the behavior, so the
	/// caller controls where the behavior is dropped. Returns `None` if `id`
	/// was not present.
	pub fn remove(&self, id: InterceptorId) -> Option<Arc<Interceptor<R, A, O>>> {
		loop {
			let cur = self.chain.load_full();
			let pos = cur.iter().position(|e| e.id() == id)?;
			let removed = cur[pos].clone();
			let mut next = (*cur).clone();
			next.remove(pos);

			let prev = self.chain.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return Some(removed);
			}
		}
	}

	pub fn contains(&self, id: InterceptorId) -> bool {
		self.chain.load().iter().any(|e| e.id() == id)
	}

	pub fn is_empty(&self) -> bool {
		self.chain.load().is_empty()
	}

	pub fn len(&self) -> usize {
		self.chain.load().len()
	}

	/// Captures the current chain for one traversal.
	pub fn snapshot(&self) -> ChainSnapshot<R, A, O> {
		ChainSnapshot {
			chain: self.chain.load_full(),
		}
	}
}

impl<R, A, O> DetachTarget for InterceptionRegistry<R, A, O> {
	fn detach(&self, id: InterceptorId) -> bool {
		self.remove(id).is_some()
	}

	fn contains(&self, id: InterceptorId) -> bool {
		InterceptionRegistry::contains(self, id)
	}
}

impl<R, A, O> fmt::Debug for InterceptionRegistry<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptionRegistry")
			.field("tie_break", &self.tie_break)
			.field("chain", &self.snapshot())
			.finish()
	}
}
