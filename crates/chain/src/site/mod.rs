//! Attachment sites: where a dispatcher is installed.
//!
//! # Role
//!
//! Both sites key their slots explicitly by method name, so "already wrapped"
//! is a map lookup rather than inspection of an installed callable.
//!
//! - [`TypeMethods`] holds the type-level slot of each method, shared by every instance.
//! - [`InstanceMethods`] holds one object's own slots, created lazily on first attach.
//!
//! # Invariants
//!
//! - One slot, and so at most one dispatcher, per (site, method name).
//! - Attaching to an undefined method fails before anything is registered.
//! - The receiver is always supplied per call; no site stores `self`.

mod instance;
mod key;
mod slot;
mod types;

pub use instance::InstanceMethods;
pub use key::MethodKey;
pub use types::{TypeMethods, TypeMethodsBuilder};

use crate::chain::Next;
use crate::config::ChainConfig;
use crate::dispatch::SiteKind;
use crate::error::Result;
use crate::handle::AttachmentHandle;
use crate::interceptor::Priority;

/// Common attach contract of both installation strategies.
pub trait AttachmentSite<R: 'static> {
	fn site_kind(&self) -> SiteKind;

	fn config(&self) -> &ChainConfig;

	/// Attaches `behavior` to the method named by `key`.
	///
	/// Reuses the slot's dispatcher when one is already installed.
	fn attach<A, O, F>(&self, key: &MethodKey<R, A, O>, behavior: F, priority: Priority) -> Result<AttachmentHandle>
	where
		A: 'static,
		O: 'static,
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static;

	/// Attaches at the configured default priority.
	fn attach_default<A, O, F>(&self, key: &MethodKey<R, A, O>, behavior: F) -> Result<AttachmentHandle>
	where
		A: 'static,
		O: 'static,
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
	{
		let priority = self.config().default_priority;
		self.attach(key, behavior, priority)
	}
}

/// An object that owns [`InstanceMethods`] for itself.
///
/// Implementors get [`invoke`](Intercepted::invoke), the stable call path
/// every call site should use.
pub trait Intercepted: Sized + 'static {
	fn methods(&self) -> &InstanceMethods<Self>;

	fn invoke<A: 'static, O: 'static>(&self, key: &MethodKey<Self, A, O>, args: A) -> Result<O> {
		self.methods().call(key, self, args)
	}
}

/// Attaches `behavior` to one object's method, leaving sibling instances untouched.
pub fn attach_to_instance<T, A, O, F>(
	receiver: &T,
	key: &MethodKey<T, A, O>,
	behavior: F,
	priority: impl Into<Priority>,
) -> Result<AttachmentHandle>
where
	T: Intercepted,
	A: 'static,
	O: 'static,
	F: for<'a> Fn(&'a T, Next<'a, T, A, O>, A) -> O + Send + Sync + 'static,
{
	receiver.methods().attach(key, behavior, priority.into())
}

/// Attaches `behavior` to a type-level method, affecting every instance.
pub fn attach_to_type<R, A, O, F>(
	methods: &TypeMethods<R>,
	key: &MethodKey<R, A, O>,
	behavior: F,
	priority: impl Into<Priority>,
) -> Result<AttachmentHandle>
where
	R: 'static,
	A: 'static,
	O: 'static,
	F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
{
	methods.attach(key, behavior, priority.into())
}
