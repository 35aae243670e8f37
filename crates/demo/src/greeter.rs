//! The greeter type and the scenarios run against it.

use std::sync::Arc;

use parking_lot::Mutex;
use relay_chain::{
	AttachmentHandle, ChainConfig, InstanceMethods, Intercepted, MethodKey, TypeMethods, attach_to_instance,
	attach_to_type,
};

use crate::cli::Site;

/// Lines printed by greeters and interceptors, in call order.
pub type Transcript = Arc<Mutex<Vec<String>>>;

pub struct Greeter {
	num: u32,
	out: Transcript,
	methods: InstanceMethods<Greeter>,
}

impl Intercepted for Greeter {
	fn methods(&self) -> &InstanceMethods<Self> {
		&self.methods
	}
}

pub const GREETING: MethodKey<Greeter, (String,), ()> = MethodKey::new("greeting");

/// Defines `Greeter::greeting` under `config`.
pub fn greeter_type(config: ChainConfig) -> relay_chain::Result<Arc<TypeMethods<Greeter>>> {
	TypeMethods::builder("Greeter")
		.config(config)
		.method(GREETING, |g: &Greeter, (name,): (String,)| {
			g.out.lock().push(format!("Hi {name}, I'm {}", g.num));
		})
		.build()
}

impl Greeter {
	pub fn new(methods: &Arc<TypeMethods<Greeter>>, num: u32, out: Transcript) -> Self {
		Self {
			num,
			out,
			methods: InstanceMethods::new(methods.clone()),
		}
	}

	pub fn greeting(&self, name: &str) -> relay_chain::Result<()> {
		self.invoke(&GREETING, (name.to_string(),))
	}
}

/// Attaches an interceptor that announces `tag` and appends `suffix` to the name.
fn suffixer(
	site: Site,
	methods: &TypeMethods<Greeter>,
	greeter: &Greeter,
	tag: &'static str,
	suffix: &'static str,
	priority: i32,
) -> relay_chain::Result<AttachmentHandle> {
	match site {
		Site::Type => attach_to_type(
			methods,
			&GREETING,
			move |g, next, (name,)| {
				g.out.lock().push(format!("{tag} executed"));
				next.call((name + suffix,));
			},
			priority,
		),
		Site::Instance | Site::Both => attach_to_instance(
			greeter,
			&GREETING,
			move |g, next, (name,)| {
				g.out.lock().push(format!("{tag} executed"));
				next.call((name + suffix,));
			},
			priority,
		),
	}
}

/// Runs the greeting scenario once at `site` and returns what was printed.
///
/// `Site::Both` runs it at the type site, then at the instance site, then
/// greets from a sibling while only the first greeter is intercepted.
pub fn run(site: Site, name: &str, config: &ChainConfig) -> relay_chain::Result<Vec<String>> {
	match site {
		Site::Type | Site::Instance => scenario(site, name, config),
		Site::Both => {
			let mut lines = scenario(Site::Type, name, config)?;
			lines.extend(scenario(Site::Instance, name, config)?);
			lines.extend(isolation(name, config)?);
			Ok(lines)
		}
	}
}

fn scenario(site: Site, name: &str, config: &ChainConfig) -> relay_chain::Result<Vec<String>> {
	let methods = greeter_type(config.clone())?;
	let out = Transcript::default();
	let a = Greeter::new(&methods, 2, out.clone());

	tracing::info!(?site, "running greeting scenario");
	let mut f2 = suffixer(site, &methods, &a, "f2", "2", 6)?;
	let mut f1 = suffixer(site, &methods, &a, "f1", "1", 5)?;

	a.greeting(name)?;
	f1.detach();
	f2.detach();
	a.greeting(name)?;

	let lines = out.lock().clone();
	Ok(lines)
}

fn isolation(name: &str, config: &ChainConfig) -> relay_chain::Result<Vec<String>> {
	let methods = greeter_type(config.clone())?;
	let out = Transcript::default();
	let a = Greeter::new(&methods, 2, out.clone());
	let b = Greeter::new(&methods, 3, out.clone());

	tracing::info!("running sibling isolation check");
	let mut f1 = suffixer(Site::Instance, &methods, &a, "f1", "1", 5)?;
	a.greeting(name)?;
	b.greeting(name)?;
	f1.detach();

	let lines = out.lock().clone();
	Ok(lines)
}
