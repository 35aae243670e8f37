//! Priority-ordered interception chains for object methods.
//!
//! Call sites invoke a method through a stable entry point (a method slot);
//! attaching installs a [`Dispatcher`] in that slot which fans each call
//! through the attached interceptors, highest priority outermost, before the
//! original behavior runs. Detaching through the returned
//! [`AttachmentHandle`] is reversible and idempotent.
//!
//! # Example
//!
//! ```
//! use relay_chain::{Intercepted, InstanceMethods, MethodKey, TypeMethods, attach_to_type};
//!
//! struct Greeter {
//!     num: u32,
//!     methods: InstanceMethods<Greeter>,
//! }
//!
//! impl Intercepted for Greeter {
//!     fn methods(&self) -> &InstanceMethods<Self> {
//!         &self.methods
//!     }
//! }
//!
//! const GREETING: MethodKey<Greeter, (String,), String> = MethodKey::new("greeting");
//!
//! let table = TypeMethods::builder("Greeter")
//!     .method(GREETING, |g: &Greeter, (name,): (String,)| format!("Hi {name}, I'm {}", g.num))
//!     .build()
//!     .unwrap();
//! let greeter = Greeter { num: 2, methods: InstanceMethods::new(table.clone()) };
//!
//! let mut handle = attach_to_type(&table, &GREETING, |_, next, (name,)| next.call((name + "!",)), 6).unwrap();
//! assert_eq!(greeter.invoke(&GREETING, ("Max".into(),)).unwrap(), "Hi Max!, I'm 2");
//!
//! handle.detach();
//! assert_eq!(greeter.invoke(&GREETING, ("Max".into(),)).unwrap(), "Hi Max, I'm 2");
//! ```
//!
//! # Modules
//!
//! - [`interceptor`] - Priorities, identities and the interceptor wrapper
//! - [`registry`] - Ordered per-target registry with per-call snapshots
//! - [`chain`] - The `next` forwarding value used during traversal
//! - [`dispatch`] - The dispatcher and the original-behavior sentinel
//! - [`handle`] - Detach handles and scoped guards
//! - [`site`] - Type-level and instance-level attachment
//! - [`config`] - TOML chain configuration

pub mod chain;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod interceptor;
pub mod registry;
pub mod site;

pub use chain::Next;
pub use config::{ChainConfig, TieBreak};
pub use dispatch::{Dispatcher, Original, SiteKind};
pub use error::{ConfigError, InterceptError, Result};
pub use handle::{AttachmentHandle, DetachGuard};
pub use interceptor::{Interceptor, InterceptorId, Priority};
pub use registry::{ChainSnapshot, InterceptionRegistry};
pub use site::{
	AttachmentSite, InstanceMethods, Intercepted, MethodKey, TypeMethods, TypeMethodsBuilder,
	attach_to_instance, attach_to_type,
};
