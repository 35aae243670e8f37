//! Chain properties checked over generated inputs.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use relay_chain::{
	AttachmentHandle, AttachmentSite, ChainConfig, InstanceMethods, Intercepted, MethodKey, Priority,
	TieBreak, TypeMethods,
};

struct Calc {
	offset: i64,
	methods: InstanceMethods<Calc>,
}

impl Intercepted for Calc {
	fn methods(&self) -> &InstanceMethods<Self> {
		&self.methods
	}
}

const APPLY: MethodKey<Calc, i64, i64> = MethodKey::new("apply");

fn original(offset: i64, x: i64) -> i64 {
	x.wrapping_mul(3).wrapping_add(offset)
}

fn calc_type(config: ChainConfig) -> Arc<TypeMethods<Calc>> {
	TypeMethods::builder("Calc")
		.config(config)
		.method(APPLY, |c: &Calc, x: i64| original(c.offset, x))
		.build()
		.unwrap()
}

fn calc(table: &Arc<TypeMethods<Calc>>, offset: i64) -> Calc {
	Calc {
		offset,
		methods: InstanceMethods::new(table.clone()),
	}
}

fn apply(c: &Calc, x: i64) -> i64 {
	c.invoke(&APPLY, x).unwrap()
}

/// Attaches a recording passthrough for each priority, returning the handles in attach order.
fn attach_recorders(
	site: &impl AttachmentSite<Calc>,
	priorities: &[i32],
	order: &Arc<Mutex<Vec<usize>>>,
) -> Vec<AttachmentHandle> {
	priorities
		.iter()
		.enumerate()
		.map(|(idx, &p)| {
			let order = order.clone();
			site.attach(
				&APPLY,
				move |_, next, x| {
					order.lock().push(idx);
					next.call(x)
				},
				Priority::new(p),
			)
			.unwrap()
		})
		.collect()
}

/// Expected traversal: descending priority, ties in attach order.
fn expected_order(priorities: &[i32], tie_break: TieBreak) -> Vec<usize> {
	let mut idx: Vec<usize> = (0..priorities.len()).collect();
	idx.sort_by(|&a, &b| {
		priorities[b].cmp(&priorities[a]).then_with(|| match tie_break {
			TieBreak::FirstAttached => a.cmp(&b),
			TieBreak::LastAttached => b.cmp(&a),
		})
	});
	idx
}

proptest! {
	#[test]
	fn empty_chain_is_transparent(offset in any::<i64>(), x in any::<i64>()) {
		let table = calc_type(ChainConfig::default());
		let c = calc(&table, offset);
		prop_assert_eq!(apply(&c, x), original(offset, x));
	}

	#[test]
	fn traversal_follows_priority_then_attach_order(
		priorities in prop::collection::vec(-3i32..4, 0..12),
		last_attached in any::<bool>(),
	) {
		let tie_break = if last_attached { TieBreak::LastAttached } else { TieBreak::FirstAttached };
		let table = calc_type(ChainConfig::default().with_tie_break(tie_break));
		let c = calc(&table, 0);
		let order = Arc::new(Mutex::new(Vec::new()));
		let _handles = attach_recorders(&*table, &priorities, &order);

		prop_assert_eq!(apply(&c, 1), original(0, 1));
		prop_assert_eq!(order.lock().clone(), expected_order(&priorities, tie_break));
	}

	#[test]
	fn detaching_everything_restores_original(
		priorities in prop::collection::vec(-5i32..5, 1..10),
		detach_seed in any::<u64>(),
		on_instance in any::<bool>(),
		x in -1000i64..1000,
	) {
		let table = calc_type(ChainConfig::default());
		let c = calc(&table, 7);
		let order = Arc::new(Mutex::new(Vec::new()));
		let mut handles = if on_instance {
			attach_recorders(&c.methods, &priorities, &order)
		} else {
			attach_recorders(&*table, &priorities, &order)
		};

		// Detach in a seed-dependent order.
		let mut seed = detach_seed;
		while !handles.is_empty() {
			let pick = (seed % handles.len() as u64) as usize;
			seed = seed.rotate_left(7) ^ 0x9e37_79b9_7f4a_7c15;
			let mut handle = handles.swap_remove(pick);
			prop_assert!(handle.detach());
			prop_assert!(!handle.detach());
		}

		order.lock().clear();
		prop_assert_eq!(apply(&c, x), original(7, x));
		prop_assert!(order.lock().is_empty());
	}

	#[test]
	fn forwarded_arguments_are_seen_downstream(deltas in prop::collection::vec(-50i64..50, 1..8), x in -1000i64..1000) {
		let table = calc_type(ChainConfig::default());
		let c = calc(&table, 0);
		let seen = Arc::new(Mutex::new(Vec::new()));

		// Higher index means lower priority, so deltas apply in index order.
		let _handles: Vec<_> = deltas
			.iter()
			.enumerate()
			.map(|(idx, &delta)| {
				let seen = seen.clone();
				table
					.attach(
						&APPLY,
						move |_, next, x: i64| {
							seen.lock().push(x);
							next.call(x + delta)
						},
						Priority::new(100 - idx as i32),
					)
					.unwrap()
			})
			.collect();

		let mut expected_seen = Vec::new();
		let mut running = x;
		for delta in &deltas {
			expected_seen.push(running);
			running += delta;
		}

		prop_assert_eq!(apply(&c, x), original(0, running));
		prop_assert_eq!(seen.lock().clone(), expected_seen);
	}
}
