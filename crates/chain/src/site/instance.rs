use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::AttachmentSite;
use super::key::MethodKey;
use super::slot::{ErasedSlot, MethodSlot};
use super::types::TypeMethods;
use crate::chain::Next;
use crate::config::ChainConfig;
use crate::dispatch::{Dispatcher, Original, SiteKind};
use crate::error::Result;
use crate::handle::AttachmentHandle;
use crate::interceptor::Priority;

/// Per-object method slots layered over the object's [`TypeMethods`].
///
/// An instance slot exists only for methods something attached to on this
/// object. Its original forwards to the type-level slot at call time, so
/// type-level interceptors keep applying underneath instance ones.
pub struct InstanceMethods<R> {
	methods: Arc<TypeMethods<R>>,
	overrides: RwLock<FxHashMap<&'static str, ErasedSlot>>,
}

impl<R: 'static> InstanceMethods<R> {
	pub fn new(methods: Arc<TypeMethods<R>>) -> Self {
		Self {
			methods,
			overrides: RwLock::new(FxHashMap::default()),
		}
	}

	pub fn type_methods(&self) -> &Arc<TypeMethods<R>> {
		&self.methods
	}

	fn existing<A: 'static, O: 'static>(
		&self,
		key: &MethodKey<R, A, O>,
	) -> Result<Option<Arc<MethodSlot<R, A, O>>>> {
		self.overrides
			.read()
			.get(key.name())
			.map(|slot| slot.downcast(self.methods.type_name(), key))
			.transpose()
	}

	/// The instance slot for `key`, created on first use.
	fn slot<A: 'static, O: 'static>(&self, key: &MethodKey<R, A, O>) -> Result<Arc<MethodSlot<R, A, O>>> {
		if let Some(slot) = self.existing(key)? {
			return Ok(slot);
		}

		let type_slot = self.methods.slot(key)?;
		let mut overrides = self.overrides.write();
		if let Some(slot) = overrides.get(key.name()) {
			return slot.downcast(self.methods.type_name(), key);
		}

		let target: Arc<str> = format!("{}::{}", self.methods.type_name(), key.name()).into();
		let slot = Arc::new(MethodSlot::new(
			target,
			SiteKind::Instance,
			self.methods.config().clone(),
			Original::new(move |receiver: &R, args: A| type_slot.call(receiver, args)),
		));
		overrides.insert(key.name(), ErasedSlot::new(slot.clone()));
		Ok(slot)
	}

	/// Invokes a method on `receiver`, through this instance's chain when it has one.
	///
	/// `receiver` is expected to be the object that owns these slots.
	pub fn call<A: 'static, O: 'static>(&self, key: &MethodKey<R, A, O>, receiver: &R, args: A) -> Result<O> {
		match self.existing(key)? {
			Some(slot) => Ok(slot.call(receiver, args)),
			None => self.methods.call(key, receiver, args),
		}
	}

	/// Number of instance-level interceptors on a method.
	pub fn interceptor_count<A: 'static, O: 'static>(&self, key: &MethodKey<R, A, O>) -> Result<usize> {
		Ok(self.existing(key)?.map_or(0, |slot| slot.interceptor_count()))
	}

	/// The instance-level dispatcher, if anything attached to this object.
	///
	/// The same teardown caveat as [`TypeMethods::dispatcher`] applies.
	pub fn dispatcher<A: 'static, O: 'static>(
		&self,
		key: &MethodKey<R, A, O>,
	) -> Result<Option<Arc<Dispatcher<R, A, O>>>> {
		Ok(self.existing(key)?.and_then(|slot| slot.dispatcher()))
	}
}

impl<R: 'static> AttachmentSite<R> for InstanceMethods<R> {
	fn site_kind(&self) -> SiteKind {
		SiteKind::Instance
	}

	fn config(&self) -> &ChainConfig {
		self.methods.config()
	}

	fn attach<A, O, F>(&self, key: &MethodKey<R, A, O>, behavior: F, priority: Priority) -> Result<AttachmentHandle>
	where
		A: 'static,
		O: 'static,
		F: for<'a> Fn(&'a R, Next<'a, R, A, O>, A) -> O + Send + Sync + 'static,
	{
		Ok(self.slot(key)?.attach(priority, behavior))
	}
}

impl<R> fmt::Debug for InstanceMethods<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let overrides = self.overrides.read();
		let mut names: Vec<_> = overrides.keys().collect();
		names.sort_unstable();
		f.debug_struct("InstanceMethods")
			.field("type_name", &self.methods.type_name())
			.field("overrides", &names)
			.finish()
	}
}
