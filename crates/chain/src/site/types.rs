use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::AttachmentSite;
use super::key::MethodKey;
use super::slot::{ErasedSlot, MethodSlot};
use crate::chain::Next;
use crate::config::ChainConfig;
use crate::dispatch::{Dispatcher, Original, SiteKind};
use crate::error::{InterceptError, Result};
use crate::handle::AttachmentHandle;
use crate::interceptor::Priority;

/// Method table shared by every instance of `R`.
///
/// The set of methods is fixed when the table is built; bodies can still be
/// replaced with [`TypeMethods::redefine`].
pub struct TypeMethods<R> {
	type_name: &'static str,
	config: ChainConfig,
	slots: FxHashMap<&'static str, ErasedSlot>,
	_receiver: PhantomData<fn(&R)>,
}

impl<R> TypeMethods<R> {
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	pub fn has_method(&self, name: &str) -> bool {
		self.slots.contains_key(name)
	}

	/// Defined method names, sorted.
	pub fn method_names(&self) -> Vec<&'static str> {
		let mut names: Vec<_> = self.slots.keys().copied().collect();
		names.sort_unstable();
		names
	}
}

impl<R: 'static> TypeMethods<R> {
	pub fn builder(type_name: &'static str) -> TypeMethodsBuilder<R> {
		TypeMethodsBuilder {
			type_name,
			config: ChainConfig::default(),
			methods: Vec::new(),
			_receiver: PhantomData,
		}
	}

	pub(crate) fn slot<A: 'static, O: 'static>(
		&self,
		key: &MethodKey<R, A, O>,
	) -> Result<Arc<MethodSlot<R, A, O>>> {
		self.slots
			.get(key.name())
			.ok_or(InterceptError::MissingOriginal {
				type_name: self.type_name,
				method: key.name(),
			})?
			.downcast(self.type_name, key)
	}

	/// Invokes a method on `receiver` through the type-level chain.
	pub fn call<A: 'static, O: 'static>(
		&self,
		key: &MethodKey<R, A, O>,
		receiver: &R,
		args: A,
	) -> Result<O> {
		Ok(self.slot(key)?.call(receiver, args))
	}

	/// Replaces a method's original body. Attached interceptors stay in place.
	pub fn redefine<A, O, F>(&self, key: &MethodKey<R, A, O>, body: F) -> Result<()>
	where
		A: 'static,
		O: 'static,
		F: Fn(&R, A) -> O + Send + Sync + 'static,
	{
		self.slot(key)?.redefine(Original::new(body));
		Ok(())
	}

	/// Number of type-level interceptors on a method.
	pub fn interceptor_count<A: 'static, O: 'static>(&self, key: &MethodKey<R, A, O>) -> Result<usize> {
		Ok(self.slot(key)?.interceptor_count())
	}

	/// The installed dispatcher, if anything has attached at type level.
	///
	/// With `uninstall-when-empty` set, a dispatcher kept past its teardown is
	/// no longer the slot's: calls through the table do not see it, and
	/// anything attached to it directly never runs on those calls.
	pub fn dispatcher<A: 'static, O: 'static>(
		&self,
		key: &MethodKey<R, A, O>,
	) -> Result<Option<Arc<Dispatcher<R, A, O>>>> {
		Ok(self.slot(key)?.dispatcher())
	}
}

impl<R: 'static> AttachmentSite<R> for TypeMethods<R> {
	fn site_kind(&self) -> SiteKind {
		SiteKind::Type
	}

	fn config(&self) -> &ChainConfig {
		&self.config
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

impl<R> fmt::Debug for TypeMethods<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.slots.keys().collect();
		names.sort_unstable();
		f.debug_struct("TypeMethods")
			.field("type_name", &self.type_name)
			.field("methods", &names)
			.field("config", &self.config)
			.finish()
	}
}

type Definition = Box<dyn FnOnce(&'static str, &ChainConfig) -> ErasedSlot>;

/// Collects method definitions for a [`TypeMethods`] table.
pub struct TypeMethodsBuilder<R> {
	type_name: &'static str,
	config: ChainConfig,
	methods: Vec<(&'static str, Definition)>,
	_receiver: PhantomData<fn(&R)>,
}

impl<R: 'static> TypeMethodsBuilder<R> {
	pub fn config(mut self, config: ChainConfig) -> Self {
		self.config = config;
		self
	}

	/// Defines `key` with `body` as its original behavior.
	pub fn method<A, O, F>(mut self, key: MethodKey<R, A, O>, body: F) -> Self
	where
		A: 'static,
		O: 'static,
		F: Fn(&R, A) -> O + Send + Sync + 'static,
	{
		let define: Definition = Box::new(move |type_name, config| {
			let target: Arc<str> = format!("{type_name}::{}", key.name()).into();
			ErasedSlot::new(Arc::new(MethodSlot::new(
				target,
				SiteKind::Type,
				config.clone(),
				Original::<R, A, O>::new(body),
			)))
		});
		self.methods.push((key.name(), define));
		self
	}

	/// Builds the table. Fails if any method name was defined twice.
	pub fn build(self) -> Result<Arc<TypeMethods<R>>> {
		let mut slots = FxHashMap::default();
		for (name, define) in self.methods {
			if slots.contains_key(name) {
				return Err(InterceptError::DuplicateMethod {
					type_name: self.type_name,
					method: name,
				});
			}
			slots.insert(name, define(self.type_name, &self.config));
		}
		Ok(Arc::new(TypeMethods {
			type_name: self.type_name,
			config: self.config,
			slots,
			_receiver: PhantomData,
		}))
	}
}
