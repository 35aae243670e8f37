//! One-shot detach capabilities.
//!
//! # Invariants
//!
//! - A handle refers to its target weakly; it never keeps a dispatcher alive.
//! - A consumed handle holds no reference to its target at all.
//! - Detaching is total: repeated or late detaches are no-ops.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::interceptor::InterceptorId;

/// Something an attached interceptor can be removed from.
pub(crate) trait DetachTarget: Send + Sync {
	fn detach(&self, id: InterceptorId) -> bool;
	fn contains(&self, id: InterceptorId) -> bool;
}

struct Binding {
	target: Weak<dyn DetachTarget>,
	id: InterceptorId,
}

/// Capability to remove exactly one attached interceptor.
///
/// Dropping a handle leaves the interceptor attached; use
/// [`AttachmentHandle::into_guard`] for scoped attachment.
#[must_use = "an attached interceptor can only be detached through its handle"]
pub struct AttachmentHandle {
	method: Arc<str>,
	binding: Option<Binding>,
}

impl AttachmentHandle {
	pub(crate) fn new(method: Arc<str>, target: Weak<dyn DetachTarget>, id: InterceptorId) -> Self {
		Self {
			method,
			binding: Some(Binding { target, id }),
		}
	}

	/// Removes the interceptor if it is still attached and consumes the handle.
	///
	/// Returns true only when this call removed something.
	pub fn detach(&mut self) -> bool {
		let Some(binding) = self.binding.take() else {
			return false;
		};
		let Some(target) = binding.target.upgrade() else {
			return false;
		};
		let removed = target.detach(binding.id);
		tracing::debug!(method = %self.method, id = %binding.id, removed, "detached interceptor");
		removed
	}

	/// True once [`detach`](Self::detach) has been called.
	pub fn is_consumed(&self) -> bool {
		self.binding.is_none()
	}

	/// True while the interceptor is still part of a live chain.
	pub fn is_attached(&self) -> bool {
		self.binding.as_ref().is_some_and(|b| {
			b.target
				.upgrade()
				.is_some_and(|target| target.contains(b.id))
		})
	}

	/// Id of the interceptor, or `None` once consumed.
	pub fn id(&self) -> Option<InterceptorId> {
		self.binding.as_ref().map(|b| b.id)
	}

	/// Qualified name of the intercepted method.
	pub fn method(&self) -> &str {
		&self.method
	}

	/// Wraps the handle so the interceptor detaches when the guard drops.
	pub fn into_guard(self) -> DetachGuard {
		DetachGuard { handle: self }
	}
}

impl fmt::Debug for AttachmentHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttachmentHandle")
			.field("method", &self.method)
			.field("id", &self.id())
			.field("consumed", &self.is_consumed())
			.finish()
	}
}

/// Detaches its interceptor on drop.
#[must_use = "dropping the guard detaches immediately"]
#[derive(Debug)]
pub struct DetachGuard {
	handle: AttachmentHandle,
}

impl DetachGuard {
	pub fn handle(&self) -> &AttachmentHandle {
		&self.handle
	}

	/// Disarms the guard and returns the underlying handle, still attached.
	pub fn release(mut self) -> AttachmentHandle {
		AttachmentHandle {
			method: self.handle.method.clone(),
			binding: self.handle.binding.take(),
		}
	}
}

impl Drop for DetachGuard {
	fn drop(&mut self) {
		self.handle.detach();
	}
}
