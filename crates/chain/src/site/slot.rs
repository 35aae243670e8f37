//! Method slots: the indirection cell each call goes through.
//!
//! # Role
//!
//! A [`MethodSlot`] owns one method's original behavior and, once something
//! attaches, the [`Dispatcher`] installed in front of it. Calls load both
//! lock-free; attach, detach and redefine serialize on the slot's mutex.
//!
//! # Invariants
//!
//! - At most one dispatcher is installed per slot; re-attaching reuses it.
//! - The slot mutex is never held while user code runs.

use std::any::Any;
use std::sync::{Arc, Weak};

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;

use super::key::MethodKey;
use crate::chain::Next;
use crate::config::ChainConfig;
use crate::dispatch::{Dispatcher, Original, SiteKind};
use crate::error::{InterceptError, Result};
use crate::handle::{AttachmentHandle, DetachTarget};
use crate::interceptor::{Interceptor, InterceptorId, Priority};

pub(crate) struct MethodSlot<R, A, O> {
	target: Arc<str>,
	site: SiteKind,
	config: ChainConfig,
	original: ArcSwap<Original<R, A, O>>,
	dispatcher: ArcSwapOption<Dispatcher<R, A, O>>,
	lock: Mutex<()>,
}

impl<R, A, O> MethodSlot<R, A, O> {
	pub(crate) fn new(
		target: Arc<str>,
		site: SiteKind,
		config: ChainConfig,
		original: Original<R, A, O>,
	) -> Self {
		Self {
			target,
			site,
			config,
			original: ArcSwap::from_pointee(original),
			dispatcher: ArcSwapOption::empty(),
			lock: Mutex::new(()),
		}
	}

	/// Calls through the installed dispatcher, or straight to the original.
	pub(crate) fn call(&self, receiver: &R, args: A) -> O {
		match self.dispatcher.load_full() {
			Some(dispatcher) => dispatcher.call(receiver, args),
			None => self.original.load_full().call(receiver, args),
		}
	}

	pub(crate) fn dispatcher(&self) -> Option<Arc<Dispatcher<R, A, O>>> {
		self.dispatcher.load_full()
	}

	pub(crate) fn interceptor_count(&self) -> usize {
		self.dispatcher.load_full().map_or(0, |d| d.len())
	}

	/// Replaces the original, keeping any attached interceptors.
	pub(crate) fn redefine(&self, original: Original<R, A, O>) {
		let _retired = {
			let _guard = self.lock.lock();
			let original = Arc::new(original);
			let previous = self.original.swap(original.clone());
			let replaced = self
				.dispatcher
				.load_full()
				.map(|current| self.dispatcher.swap(Some(Arc::new(current.with_original(original)))));
			(previous, replaced)
		};
		tracing::debug!(target_method = %self.target, site = self.site.as_str(), "redefined original");
	}

	fn installed(&self) -> Arc<Dispatcher<R, A, O>> {
		if let Some(existing) = self.dispatcher.load_full() {
			return existing;
		}
		let dispatcher = Arc::new(Dispatcher::new(
			self.target.clone(),
			self.site,
			self.original.load_full(),
			self.config.tie_break,
		));
		self.dispatcher.store(Some(dispatcher.clone()));
		tracing::debug!(target_method = %self.target, site = self.site.as_str(), "installed dispatcher");
		dispatcher
	}
}

impl<R: 'static, A: 'static, O: 'static> MethodSlot<R, A, O> {
	pub(crate) fn attach<F>(self: &Arc<Self>, priority: Priority, behavior: F) -> AttachmentHandle
	where
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
	{
		let interceptor = Interceptor::new(priority, behavior);
		let id = {
			let _guard = self.lock.lock();
			self.installed().registry().add(interceptor)
		};
		tracing::debug!(
			target_method = %self.target,
			site = self.site.as_str(),
			%id,
			%priority,
			"attached interceptor"
		);
		let weak = Arc::downgrade(self);
		let target: Weak<dyn DetachTarget> = weak;
		AttachmentHandle::new(self.target.clone(), target, id)
	}
}

impl<R, A, O> DetachTarget for MethodSlot<R, A, O> {
	fn detach(&self, id: InterceptorId) -> bool {
		// Removed behaviors and retired dispatchers are dropped after the
		// lock is released: a behavior may own a guard on this same slot.
		let (removed, _retired) = {
			let _guard = self.lock.lock();
			let Some(dispatcher) = self.dispatcher.load_full() else {
				return false;
			};
			let removed = dispatcher.registry().remove(id);
			let retired = if removed.is_some() && self.config.uninstall_when_empty && dispatcher.is_empty() {
				tracing::debug!(target_method = %self.target, site = self.site.as_str(), "uninstalled empty dispatcher");
				self.dispatcher.swap(None)
			} else {
				None
			};
			(removed, (dispatcher, retired))
		};
		removed.is_some()
	}

	fn contains(&self, id: InterceptorId) -> bool {
		self.dispatcher
			.load_full()
			.is_some_and(|d| d.registry().contains(id))
	}
}

/// Type-erased slot stored in a method table.
pub(crate) struct ErasedSlot {
	signature: &'static str,
	slot: Arc<dyn Any + Send + Sync>,
}

impl ErasedSlot {
	pub(crate) fn new<R: 'static, A: 'static, O: 'static>(slot: Arc<MethodSlot<R, A, O>>) -> Self {
		Self {
			signature: MethodKey::<R, A, O>::signature(),
			slot,
		}
	}

	/// Recovers the typed slot, or reports which signature it was defined with.
	pub(crate) fn downcast<R: 'static, A: 'static, O: 'static>(
		&self,
		type_name: &'static str,
		key: &MethodKey<R, A, O>,
	) -> Result<Arc<MethodSlot<R, A, O>>> {
		self.slot
			.clone()
			.downcast::<MethodSlot<R, A, O>>()
			.map_err(|_| InterceptError::SignatureMismatch {
				type_name,
				method: key.name(),
				expected: self.signature,
				found: MethodKey::<R, A, O>::signature(),
			})
	}
}
