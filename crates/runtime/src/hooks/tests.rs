use std::cell::RefCell;

use pretty_assertions::assert_eq;

use super::*;
use crate::config::RuntimeConfig;
use crate::error::{Unwind, continue_hook_in_current_context, hook_abort};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn log() -> Log {
	Rc::new(RefCell::new(Vec::new()))
}

fn record(log: &Log, label: &'static str) -> impl Fn(&mut Runtime) -> Flow + 'static {
	let log = log.clone();
	move |_| {
		log.borrow_mut().push(label);
		Ok(())
	}
}

fn ids(rt: &Runtime, point: HookPointId, band: Band) -> Vec<String> {
	rt.handlers(point, band).map(|entry| entry.tag.id.to_string()).collect()
}

fn after_b(_this: &HandlerTag, other: &HandlerTag) -> Order {
	if other.id == "b" { Order::After } else { Order::None }
}

fn before_a(_this: &HandlerTag, other: &HandlerTag) -> Order {
	if other.id == "a" { Order::Before } else { Order::None }
}

fn after_everyone(_this: &HandlerTag, _other: &HandlerTag) -> Order {
	Order::After
}

#[test]
fn test_define_hook_is_idempotent() {
	let mut rt = Runtime::new();
	let first = rt.define_hook("redisplay");
	let second = rt.define_hook("redisplay");

	assert_eq!(first, second);
	assert_eq!(rt.lookup_hook("redisplay"), Some(first));
	assert_eq!(rt.hook_name(first), "redisplay");
	assert_eq!(rt.lookup_hook(crate::runtime::SAVE_THE_WORLD), Some(rt.save_the_world()));
}

#[test]
fn test_bands_run_in_order() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::After, HookEntry::new("after", record(&log, "after"))).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("main", record(&log, "main"))).unwrap();
	rt.add_hook(point, Band::Before, HookEntry::new("before", record(&log, "before"))).unwrap();

	assert_eq!(rt.invoke_hook(point), Ok(HookOutcome::Completed));
	assert_eq!(*log.borrow(), vec!["before", "main", "after"]);
}

#[test]
fn test_unconstrained_handlers_keep_insertion_order() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	for label in ["one", "two", "three"] {
		rt.add_hook(point, Band::Main, HookEntry::new(label, record(&log, label))).unwrap();
	}

	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["one", "two", "three"]);
}

#[test]
fn test_same_identity_replaces() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let obj = rt.new_object(None);
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("h", record(&log, "first"))).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("h", record(&log, "bound")).bound(obj)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("h", record(&log, "second"))).unwrap();

	assert_eq!(rt.handlers(point, Band::Main).count(), 2);
	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["bound", "second"]);
}

#[test]
fn test_add_then_delete_restores_order() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	for label in ["a", "b", "c"] {
		rt.add_hook(point, Band::Main, HookEntry::new(label, record(&log, label))).unwrap();
	}
	let before = ids(&rt, point, Band::Main);

	rt.add_hook(
		point,
		Band::Main,
		HookEntry::new("early", record(&log, "early")).constraint(before_a),
	)
	.unwrap();
	assert_eq!(ids(&rt, point, Band::Main), vec!["early", "a", "b", "c"]);

	assert!(rt.delete_hook(point, Band::Main, "early", None));
	assert_eq!(ids(&rt, point, Band::Main), before);
	assert!(!rt.delete_hook(point, Band::Main, "early", None));
}

#[test]
fn test_delete_hooks_of_ignores_binding() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let first = rt.new_object(None);
	let second = rt.new_object(None);
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("h", record(&log, "1")).bound(first)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("h", record(&log, "2")).bound(second)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("keep", record(&log, "k"))).unwrap();

	assert_eq!(rt.delete_hooks_of(point, Band::Main, "h"), 2);
	assert_eq!(ids(&rt, point, Band::Main), vec!["keep"]);
}

#[test]
fn test_own_constraint_moves_handler() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("a", record(&log, "a")).constraint(after_b)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("b", record(&log, "b"))).unwrap();

	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["b", "a"]);
}

#[test]
fn test_inverse_verdict_of_later_handler() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("a", record(&log, "a"))).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("x", record(&log, "x"))).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("b", record(&log, "b")).constraint(before_a)).unwrap();

	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["b", "a", "x"]);
}

#[test]
fn test_contradiction_keeps_last_order() {
	let config = RuntimeConfig {
		max_sort_passes: 8,
		..RuntimeConfig::default()
	};
	let mut rt = Runtime::with_config(config);
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("a", record(&log, "a")).constraint(after_everyone)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("b", record(&log, "b")).constraint(after_everyone)).unwrap();

	assert_eq!(rt.handlers(point, Band::Main).count(), 2);
	rt.invoke_hook(point).unwrap();
	assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_strict_contradiction_is_rejected() {
	let config = RuntimeConfig {
		max_sort_passes: 8,
		strict_constraints: true,
		..RuntimeConfig::default()
	};
	let mut rt = Runtime::with_config(config);
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("a", record(&log, "a")).constraint(after_everyone)).unwrap();

	let err = rt
		.add_hook(point, Band::Main, HookEntry::new("b", record(&log, "b")).constraint(after_everyone))
		.unwrap_err();
	assert!(matches!(
		err,
		Unwind::Fault(RuntimeError::ConstraintContradiction { passes: 8, .. })
	));
	assert_eq!(ids(&rt, point, Band::Main), vec!["a"]);
}

#[test]
fn test_closed_gate_skips_handler() {
	let mut rt = Runtime::new();
	let enabled = rt.define("enabled", false);
	let point = rt.define_hook("p");
	let log = log();
	rt.add_hook(point, Band::Main, HookEntry::new("gated", record(&log, "gated")).when(enabled)).unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("open", record(&log, "open"))).unwrap();

	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["open"]);

	rt.set(enabled, true);
	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["open", "gated", "open"]);
}

#[test]
fn test_bound_handler_runs_in_object_context() {
	let mut rt = Runtime::new();
	let name = rt.define("name", 0u32);
	let obj = rt.new_object(None);
	rt.implant(obj, name);
	rt.set_in(obj, name, 7);
	let point = rt.define_hook("p");
	let seen = Rc::new(RefCell::new(None));

	let sink = seen.clone();
	let handler = move |rt: &mut Runtime| {
		*sink.borrow_mut() = Some((rt.current(), rt.get(name)));
		Ok(())
	};
	rt.add_hook(point, Band::Main, HookEntry::new("read", handler).bound(obj)).unwrap();

	rt.invoke_hook(point).unwrap();
	assert_eq!(*seen.borrow(), Some((Some(obj), 7)));
	assert_eq!(rt.depth(), 0);
}

#[test]
fn test_abort_skips_remaining_handlers_and_restores_depth() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	let sink = log.clone();
	rt.add_hook(
		point,
		Band::Before,
		HookEntry::new("stop", move |rt: &mut Runtime| {
			sink.borrow_mut().push("stop");
			let scratch = rt.new_object(None);
			rt.eviscerate(scratch);
			rt.eviscerate(scratch);
			Err(hook_abort())
		}),
	)
	.unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("never", record(&log, "never"))).unwrap();

	let outer = rt.new_object(None);
	rt.eviscerate(outer);
	assert_eq!(rt.invoke_hook(point), Ok(HookOutcome::Aborted));
	assert_eq!(*log.borrow(), vec!["stop"]);
	assert_eq!(rt.context(), &[outer]);
}

#[test]
fn test_continue_ends_only_current_handler() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	let sink = log.clone();
	rt.add_hook(
		point,
		Band::Main,
		HookEntry::new("skip", move |rt: &mut Runtime| {
			let scratch = rt.new_object(None);
			rt.eviscerate(scratch);
			if rt.depth() > 0 {
				return Err(continue_hook_in_current_context());
			}
			sink.borrow_mut().push("unreachable");
			Ok(())
		}),
	)
	.unwrap();
	rt.add_hook(point, Band::Main, HookEntry::new("next", record(&log, "next"))).unwrap();

	assert_eq!(rt.invoke_hook(point), Ok(HookOutcome::Completed));
	assert_eq!(*log.borrow(), vec!["next"]);
	assert_eq!(rt.depth(), 0);
}

#[test]
fn test_abort_stops_only_innermost_invocation() {
	let mut rt = Runtime::new();
	let inner = rt.define_hook("inner");
	let outer = rt.define_hook("outer");
	let log = log();
	rt.add_hook(inner, Band::Main, HookEntry::new("abort", |_: &mut Runtime| Err(Unwind::Abort))).unwrap();
	rt.add_hook(inner, Band::After, HookEntry::new("skipped", record(&log, "skipped"))).unwrap();
	rt.add_hook(
		outer,
		Band::Main,
		HookEntry::new("call-inner", move |rt: &mut Runtime| rt.invoke_hook(inner).map(drop)),
	)
	.unwrap();
	rt.add_hook(outer, Band::After, HookEntry::new("done", record(&log, "done"))).unwrap();

	assert_eq!(rt.invoke_hook(outer), Ok(HookOutcome::Completed));
	assert_eq!(*log.borrow(), vec!["done"]);
}

#[test]
fn test_handlers_added_during_invocation_wait_for_next_run() {
	let mut rt = Runtime::new();
	let point = rt.define_hook("p");
	let log = log();
	let sink = log.clone();
	rt.add_hook(
		point,
		Band::Main,
		HookEntry::new("installer", move |rt: &mut Runtime| {
			let late = record(&sink, "late");
			rt.add_hook(point, Band::Main, HookEntry::new("late", late))
		}),
	)
	.unwrap();

	rt.invoke_hook(point).unwrap();
	assert!(log.borrow().is_empty());
	rt.invoke_hook(point).unwrap();
	assert_eq!(*log.borrow(), vec!["late"]);
}

#[test]
fn test_invoke_named_unknown_faults() {
	let mut rt = Runtime::new();
	let err = rt.invoke_named("missing").unwrap_err();
	assert!(matches!(err, Unwind::Fault(RuntimeError::UnknownName { kind: "hook point", .. })));
}
