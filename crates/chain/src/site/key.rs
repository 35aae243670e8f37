use std::fmt;
use std::marker::PhantomData;

/// Typed handle naming one method of receiver type `R` with argument `A` and output `O`.
///
/// Keys are plain constants; the table they index decides whether the
/// method exists.
pub struct MethodKey<R, A, O> {
	name: &'static str,
	_marker: PhantomData<fn(&R, A) -> O>,
}

impl<R, A, O> Clone for MethodKey<R, A, O> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<R, A, O> Copy for MethodKey<R, A, O> {}

impl<R, A, O> MethodKey<R, A, O> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			_marker: PhantomData,
		}
	}

	pub const fn name(&self) -> &'static str {
		self.name
	}

	/// Human-readable `A -> O` signature used in mismatch errors.
	pub(crate) fn signature() -> &'static str {
		std::any::type_name::<fn(A) -> O>()
	}
}

impl<R, A, O> fmt::Debug for MethodKey<R, A, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MethodKey").field(&self.name).finish()
	}
}
