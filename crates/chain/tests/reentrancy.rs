//! Attaching and detaching from inside running behaviors, and across threads.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use relay_chain::{
	AttachmentHandle, ChainConfig, InstanceMethods, Intercepted, MethodKey, Next, TypeMethods, attach_to_instance,
	attach_to_type,
};
use rstest::rstest;

struct Meter {
	scale: i64,
	methods: InstanceMethods<Meter>,
}

impl Intercepted for Meter {
	fn methods(&self) -> &InstanceMethods<Self> {
		&self.methods
	}
}

const READ: MethodKey<Meter, i64, i64> = MethodKey::new("read");

type Handles = Arc<Mutex<Vec<AttachmentHandle>>>;

fn meter_type(config: ChainConfig) -> Arc<TypeMethods<Meter>> {
	TypeMethods::builder("Meter")
		.config(config)
		.method(READ, |m: &Meter, x: i64| m.scale * x)
		.build()
		.unwrap()
}

fn meter(table: &Arc<TypeMethods<Meter>>, scale: i64) -> Meter {
	Meter {
		scale,
		methods: InstanceMethods::new(table.clone()),
	}
}

fn read(m: &Meter, x: i64) -> i64 {
	m.invoke(&READ, x).unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Site {
	Type,
	Instance,
}

fn attach<F>(site: Site, table: &TypeMethods<Meter>, m: &Meter, priority: i32, behavior: F) -> AttachmentHandle
where
	F: for<'a> Fn(&'a Meter, Next<'a, Meter, i64, i64>, i64) -> i64 + Send + Sync + 'static,
{
	match site {
		Site::Type => attach_to_type(table, &READ, behavior, priority),
		Site::Instance => attach_to_instance(m, &READ, behavior, priority),
	}
	.unwrap()
}

/// Runs `f` on a worker thread and fails the test instead of hanging.
fn within_deadline<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
	let (tx, rx) = mpsc::channel();
	thread::spawn(move || {
		let _ = tx.send(f());
	});
	rx.recv_timeout(Duration::from_secs(5))
		.expect("operation did not finish")
}

#[test]
fn behavior_attaching_at_type_site_applies_from_next_call() {
	let table = meter_type(ChainConfig::default());
	let m = meter(&table, 1);
	let added: Handles = Arc::default();

	let (inner_table, inner_added) = (table.clone(), added.clone());
	let _installer = attach_to_type(
		&table,
		&READ,
		move |_, next, x| {
			let mut added = inner_added.lock();
			if added.is_empty() {
				added.push(attach_to_type(&inner_table, &READ, |_, next, x| next.call(x) + 100, 9).unwrap());
			}
			drop(added);
			next.call(x)
		},
		5,
	)
	.unwrap();

	assert_eq!(read(&m, 1), 1);
	assert_eq!(read(&m, 1), 101);
	assert_eq!(table.interceptor_count(&READ).unwrap(), 2);
}

#[test]
fn behavior_attaching_at_instance_site_applies_from_next_call() {
	let table = meter_type(ChainConfig::default());
	let m = Arc::new(meter(&table, 1));
	let sibling = meter(&table, 1);
	let added: Handles = Arc::default();

	let (weak, inner_added) = (Arc::downgrade(&m), added.clone());
	let _installer = attach_to_type(
		&table,
		&READ,
		move |_, next, x| {
			let mut added = inner_added.lock();
			if added.is_empty()
				&& let Some(m) = weak.upgrade()
			{
				added.push(attach_to_instance(&*m, &READ, |_, next, x| next.call(x) * 10, 5).unwrap());
			}
			drop(added);
			next.call(x)
		},
		5,
	)
	.unwrap();

	assert_eq!(read(&m, 2), 2);
	assert_eq!(read(&m, 2), 20);
	assert_eq!(read(&sibling, 2), 2);
}

#[rstest]
#[case::type_site(Site::Type)]
#[case::instance_site(Site::Instance)]
fn detach_of_same_slot_during_call_applies_from_next_call(#[case] site: Site) {
	let table = meter_type(ChainConfig::default());
	let m = meter(&table, 1);
	let victim: Arc<Mutex<Option<AttachmentHandle>>> = Arc::default();

	let to_detach = victim.clone();
	let _outer = attach(site, &table, &m, 9, move |_, next, x| {
		if let Some(mut handle) = to_detach.lock().take() {
			assert!(handle.detach());
		}
		next.call(x)
	});
	*victim.lock() = Some(attach(site, &table, &m, 1, |_, next, x| next.call(x) + 1));

	// The detach lands mid-call; this traversal still sees its snapshot.
	assert_eq!(read(&m, 3), 4);
	assert_eq!(read(&m, 3), 3);
}

#[rstest]
#[case::type_site(Site::Type, false)]
#[case::instance_site(Site::Instance, false)]
#[case::type_site_teardown(Site::Type, true)]
#[case::instance_site_teardown(Site::Instance, true)]
fn detaching_behavior_that_owns_guard_on_same_method(#[case] site: Site, #[case] uninstall: bool) {
	let table = meter_type(ChainConfig::default().with_uninstall_when_empty(uninstall));
	let m = meter(&table, 1);

	let inner = attach(site, &table, &m, 1, |_, next, x| next.call(x) + 1).into_guard();
	let mut outer = attach(site, &table, &m, 9, move |_, next, x| {
		let _owned = inner.handle();
		next.call(x)
	});
	assert_eq!(read(&m, 1), 2);

	let detached = within_deadline(move || outer.detach());
	assert!(detached);
	assert_eq!(read(&m, 1), 1);
	assert_eq!(table.interceptor_count(&READ).unwrap(), 0);
	assert_eq!(m.methods.interceptor_count(&READ).unwrap(), 0);
}

#[rstest]
#[case::type_site(Site::Type)]
#[case::instance_site(Site::Instance)]
fn attach_detach_races_with_concurrent_calls(#[case] site: Site) {
	let table = meter_type(ChainConfig::default().with_uninstall_when_empty(true));
	let m = meter(&table, 2);

	thread::scope(|s| {
		s.spawn(|| {
			for round in 0..200 {
				let mut handle = attach(site, &table, &m, round % 7, |_, next, x| next.call(x) + 1);
				assert!(handle.detach());
			}
		});
		for _ in 0..4 {
			s.spawn(|| {
				for _ in 0..500 {
					let out = read(&m, 5);
					assert!(out == 10 || out == 11, "unexpected output {out}");
				}
			});
		}
	});

	assert_eq!(read(&m, 5), 10);
	assert_eq!(table.interceptor_count(&READ).unwrap(), 0);
	assert_eq!(m.methods.interceptor_count(&READ).unwrap(), 0);
}
