use pretty_assertions::assert_eq;

use super::*;
use crate::error::Unwind;

#[test]
fn test_evisceration_routes_reads_to_object() {
	let mut rt = Runtime::new();
	let foo = rt.define("foo", 0x1111_1111u32);
	let obj = rt.new_object(None);
	rt.implant(obj, foo);
	rt.set_in(obj, foo, 0x2222_2222);

	rt.eviscerate(obj);
	assert_eq!(rt.current(), Some(obj));
	assert_eq!(rt.get(foo), 0x2222_2222);

	rt.reembowel().unwrap();
	assert_eq!(rt.current(), None);
	assert_eq!(rt.get(foo), 0x1111_1111);
}

#[test]
fn test_fresh_object_roundtrip_leaves_ownership_unchanged() {
	let mut rt = Runtime::new();
	let foo = rt.define("foo", 0u32);
	let holder = rt.new_object(None);
	rt.implant(holder, foo);
	rt.eviscerate(holder);
	let before = rt.owners(foo.id()).to_vec();

	let fresh = rt.new_object(None);
	rt.eviscerate(fresh);
	rt.reembowel().unwrap();
	assert_eq!(rt.owners(foo.id()), before.as_slice());
	assert_eq!(rt.context(), &[holder]);
}

#[test]
fn test_parent_is_eviscerated_transitively() {
	let mut rt = Runtime::new();
	let parent = rt.new_object(None);
	let child = rt.new_object(Some(parent));

	rt.eviscerate(child);
	assert_eq!(rt.context(), &[parent, child]);
	assert_eq!(rt.evisceration_count(parent), 1);

	rt.reembowel().unwrap();
	assert_eq!(rt.depth(), 0);
	assert_eq!(rt.evisceration_count(parent), 0);
	assert_eq!(rt.evisceration_count(child), 0);
}

#[test]
fn test_parent_already_on_stack_is_pushed_again() {
	let mut rt = Runtime::new();
	let parent = rt.new_object(None);
	let child = rt.new_object(Some(parent));

	rt.eviscerate(parent);
	rt.eviscerate(child);
	assert_eq!(rt.context(), &[parent, parent, child]);

	rt.reembowel().unwrap();
	assert_eq!(rt.context(), &[parent]);
}

#[test]
fn test_reembowel_empty_stack_faults() {
	let mut rt = Runtime::new();
	let err = rt.reembowel().unwrap_err();
	assert_eq!(err, Unwind::Fault(RuntimeError::EmptyContext));
}

#[test]
fn test_nested_evisceration_of_same_object() {
	let mut rt = Runtime::new();
	let foo = rt.define("foo", 0u32);
	let obj = rt.new_object(None);
	rt.implant(obj, foo);

	rt.eviscerate(obj);
	rt.set(foo, 1);
	rt.eviscerate(obj);
	assert_eq!(rt.get(foo), 1);
	rt.set(foo, 2);
	rt.reembowel().unwrap();
	assert_eq!(rt.get(foo), 2);
	rt.reembowel().unwrap();

	assert_eq!(rt.get(foo), 0);
	assert_eq!(rt.get_in(obj, foo), 2);
}

#[test]
fn test_context_layering() {
	let mut rt = Runtime::new();
	let a = rt.define("a", 0u32);
	let b = rt.define("b", 0u32);
	let first = rt.new_object(None);
	let second = rt.new_object(None);
	rt.implant(first, a);
	rt.set_in(first, a, 1);
	rt.implant(second, b);
	rt.set_in(second, b, 2);

	rt.eviscerate(first);
	rt.set(a, 9);
	rt.eviscerate(second);
	assert_eq!(rt.get(a), 9);
	assert_eq!(rt.get(b), 2);

	rt.reembowel().unwrap();
	rt.reembowel().unwrap();
	assert_eq!(rt.get(a), 0);
	assert_eq!(rt.get_in(first, a), 9);
}

#[test]
fn test_guard_restores_depth_on_drop() {
	let mut rt = Runtime::new();
	let outer = rt.new_object(None);
	let inner = rt.new_object(None);
	rt.eviscerate(outer);

	{
		let mut guard = rt.enter(inner);
		assert_eq!(guard.base_depth(), 1);
		assert_eq!(guard.current(), Some(inner));
		let extra = guard.new_object(None);
		guard.eviscerate(extra);
		assert_eq!(guard.depth(), 3);
	}
	assert_eq!(rt.context(), &[outer]);
}

#[test]
fn test_within_restores_depth_on_early_exit() {
	let mut rt = Runtime::new();
	let obj = rt.new_object(None);

	let result: Flow = rt.within(obj, |rt| {
		let other = rt.new_object(None);
		rt.eviscerate(other);
		Err(Unwind::Abort)
	});
	assert_eq!(result, Err(Unwind::Abort));
	assert_eq!(rt.depth(), 0);
}

#[test]
fn test_restore_depth_only_pops() {
	let mut rt = Runtime::new();
	let obj = rt.new_object(None);
	rt.eviscerate(obj);

	rt.restore_depth(4);
	assert_eq!(rt.depth(), 1);
	rt.restore_depth(0);
	assert_eq!(rt.depth(), 0);
}
