//! The dispatcher installed in place of a method's original behavior.
//!
//! # Role
//!
//! A [`Dispatcher`] pairs the captured [`Original`] with the target's
//! [`InterceptionRegistry`] and drives one traversal per call.
//!
//! # Invariants
//!
//! - An empty chain calls the original directly, exactly as if nothing were attached.
//! - Every call traverses the snapshot it took on entry, even if the registry changes mid-call.
//! - The dispatcher never observes or alters behavior outputs.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::chain::Next;
use crate::config::TieBreak;
use crate::handle::{AttachmentHandle, DetachTarget};
use crate::interceptor::{Interceptor, Priority};
use crate::registry::InterceptionRegistry;

/// The un-intercepted behavior at the end of every chain.
pub struct Original<R, A, O> {
	body: Box<dyn Fn(&R, A) -> O + Send + Sync>,
}

impl<R, A, O> Original<R, A, O> {
	pub fn new<F>(body: F) -> Self
	where
		F: Fn(&R, A) -> O + Send + Sync + 'static,
	{
		Self { body: Box::new(body) }
	}

	#[inline]
	pub fn call(&self, receiver: &R, args: A) -> O {
		(self.body)(receiver, args)
	}
}

impl<R, A, O> fmt::Debug for Original<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Original")
	}
}

/// Where a dispatcher is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
	/// One object's own method slot.
	Instance,
	/// A type's method slot, shared by every instance.
	Type,
}

impl SiteKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Instance => "instance",
			Self::Type => "type",
		}
	}
}

/// Callable wrapper that routes a method through its interceptor chain.
pub struct Dispatcher<R, A, O> {
	target: Arc<str>,
	site: SiteKind,
	original: Arc<Original<R, A, O>>,
	registry: Arc<InterceptionRegistry<R, A, O>>,
}

impl<R, A, O> Dispatcher<R, A, O> {
	/// Creates a dispatcher with an empty registry.
	pub fn new(
		target: impl Into<Arc<str>>,
		site: SiteKind,
		original: Arc<Original<R, A, O>>,
		tie_break: TieBreak,
	) -> Self {
		Self {
			target: target.into(),
			site,
			original,
			registry: Arc::new(InterceptionRegistry::new(tie_break)),
		}
	}

	/// Same target and registry, different fallback.
	pub(crate) fn with_original(&self, original: Arc<Original<R, A, O>>) -> Self {
		Self {
			target: self.target.clone(),
			site: self.site,
			original,
			registry: self.registry.clone(),
		}
	}

	/// Invokes the target through the current chain.
	pub fn call(&self, receiver: &R, args: A) -> O {
		let chain = self.registry.snapshot();
		if chain.is_empty() {
			return self.original.call(receiver, args);
		}
		tracing::trace!(
			target_method = %self.target,
			site = self.site.as_str(),
			depth = chain.len(),
			"dispatching"
		);
		Next::new(receiver, &chain, &self.original).call(args)
	}

	/// Diagnostic name, e.g. `Decorated 'Greeter::greeting'`.
	pub fn name(&self) -> String {
		format!("Decorated '{}'", self.target)
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn site(&self) -> SiteKind {
		self.site
	}

	pub fn registry(&self) -> &Arc<InterceptionRegistry<R, A, O>> {
		&self.registry
	}

	pub fn is_empty(&self) -> bool {
		self.registry.is_empty()
	}

	pub fn len(&self) -> usize {
		self.registry.len()
	}
}

impl<R: 'static, A: 'static, O: 'static> Dispatcher<R, A, O> {
	/// Attaches directly to this dispatcher's registry.
	///
	/// Used when the dispatcher is held as a standalone indirection cell
	/// rather than through a method table. Attaching here bypasses the slot,
	/// so a dispatcher a slot has already torn down keeps accepting
	/// interceptors that its method's callers never reach.
	pub fn attach<F>(&self, priority: Priority, behavior: F) -> AttachmentHandle
	where
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
	{
		let id = self.registry.add(Interceptor::new(priority, behavior));
		tracing::debug!(
			target_method = %self.target,
			site = self.site.as_str(),
			%id,
			%priority,
			"attached interceptor"
		);
		let weak = Arc::downgrade(&self.registry);
		let target: Weak<dyn DetachTarget> = weak;
		AttachmentHandle::new(self.target.clone(), target, id)
	}
}

impl<R, A, O> fmt::Debug for Dispatcher<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatcher")
			.field("target", &self.target)
			.field("site", &self.site)
			.field("registry", &self.registry)
			.finish_non_exhaustive()
	}
}
