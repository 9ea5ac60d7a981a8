use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::Unwind;
use crate::hooks::{after_super, before_super};

#[test]
fn test_domain_add_is_idempotent() {
	let mut rt = Runtime::new();
	let foo = rt.define("foo", 0u8);
	let domain = rt.define_domain("d");

	rt.domain_add(domain, foo).unwrap();
	rt.domain_add(domain, foo).unwrap();
	assert_eq!(rt.domain_members(domain), &[Implant::Symbol(foo.id())]);
	assert_eq!(rt.define_domain("d"), domain);
	assert_eq!(rt.lookup_domain("d"), Some(domain));
}

#[test]
fn test_domain_cycle_is_rejected() {
	let mut rt = Runtime::new();
	let outer = rt.define_domain("outer");
	let inner = rt.define_domain("inner");
	rt.domain_add(outer, inner).unwrap();

	let err = rt.domain_add(inner, outer).unwrap_err();
	assert!(matches!(err, Unwind::Fault(RuntimeError::DomainCycle { .. })));
	let err = rt.domain_add(inner, inner).unwrap_err();
	assert!(matches!(err, Unwind::Fault(RuntimeError::DomainCycle { .. })));
	assert!(rt.domain_contains(outer, inner));
	assert!(!rt.domain_contains(inner, outer));
}

#[test]
fn test_subclass_domain_and_superconstructor() {
	let mut rt = Runtime::new();
	let parent = rt.define_class("shape", None).unwrap();
	let child = rt.define_class("circle", Some(parent)).unwrap();

	assert!(rt.domain_contains(rt.class_domain(child), rt.class_domain(parent)));
	assert_eq!(rt.hook_name(rt.class_constructor(child)), "circle:construct");

	let before: Vec<_> = rt
		.handlers(rt.class_constructor(child), Band::Before)
		.map(|entry| (entry.tag.id.to_string(), entry.tag.class.to_string()))
		.collect();
	assert_eq!(before, vec![("shape".to_string(), SUPERCONSTRUCTOR.to_string())]);
	assert_eq!(rt.handlers(rt.class_constructor(parent), Band::Before).count(), 0);
}

#[test]
fn test_define_class_twice_returns_first() {
	let mut rt = Runtime::new();
	let first = rt.define_class("shape", None).unwrap();
	assert_eq!(rt.define_class("shape", None).unwrap(), first);
	assert_eq!(rt.class_count(), 1);
	assert_eq!(rt.lookup_class("shape"), Some(first));
	assert_eq!(rt.class_name(first), "shape");
}

#[test]
fn test_superconstructor_runs_first() {
	let mut rt = Runtime::new();
	let x = rt.define("x", 0u32);
	let parent = rt.define_class("parent", None).unwrap();
	let parent_domain = rt.class_domain(parent);
	rt.domain_add(parent_domain, x).unwrap();
	let child = rt.define_class("child", Some(parent)).unwrap();

	rt.add_hook(
		rt.class_constructor(parent),
		Band::Main,
		HookEntry::new("init-x", move |rt: &mut Runtime| {
			rt.set(x, 1);
			Ok(())
		}),
	)
	.unwrap();
	rt.add_hook(
		rt.class_constructor(child),
		Band::Main,
		HookEntry::new("bump-x", move |rt: &mut Runtime| {
			rt.update(x, |value| value + 1);
			Ok(())
		}),
	)
	.unwrap();

	let obj = rt.new_object(None);
	assert_eq!(rt.class_construct(child, obj, |_| Ok(())), Ok(HookOutcome::Completed));
	assert_eq!(rt.get_in(obj, x), 2);
	assert_eq!(rt.get(x), 0);
	assert_eq!(rt.depth(), 0);
}

#[test]
fn test_super_constraints_order_before_band() {
	let mut rt = Runtime::new();
	let parent = rt.define_class("parent", None).unwrap();
	let child = rt.define_class("child", Some(parent)).unwrap();
	let log = Rc::new(RefCell::new(Vec::new()));

	let sink = log.clone();
	rt.add_hook(
		rt.class_constructor(parent),
		Band::Main,
		HookEntry::new("parent-body", move |_: &mut Runtime| {
			sink.borrow_mut().push("parent");
			Ok(())
		}),
	)
	.unwrap();
	let sink = log.clone();
	rt.add_hook(
		rt.class_constructor(child),
		Band::Before,
		HookEntry::new("late", move |_: &mut Runtime| {
			sink.borrow_mut().push("after-super");
			Ok(())
		})
		.constraint(after_super),
	)
	.unwrap();
	let sink = log.clone();
	rt.add_hook(
		rt.class_constructor(child),
		Band::Before,
		HookEntry::new("early", move |_: &mut Runtime| {
			sink.borrow_mut().push("before-super");
			Ok(())
		})
		.constraint(before_super),
	)
	.unwrap();

	let obj = rt.new_object(None);
	rt.class_construct(child, obj, |_| Ok(())).unwrap();
	assert_eq!(*log.borrow(), vec!["before-super", "parent", "after-super"]);
}

#[test]
fn test_init_passes_arguments_through_context() {
	let mut rt = Runtime::new();
	let radius = rt.define("radius", 0u32);
	let area = rt.define("area", 0u32);
	let circle = rt.define_class("circle", None).unwrap();
	let domain = rt.class_domain(circle);
	rt.domain_add(domain, radius).unwrap();
	rt.domain_add(domain, area).unwrap();
	rt.add_hook(
		rt.class_constructor(circle),
		Band::Main,
		HookEntry::new("area", move |rt: &mut Runtime| {
			let r = rt.get(radius);
			rt.set(area, 3 * r * r);
			Ok(())
		}),
	)
	.unwrap();

	let obj = rt
		.new_instance(circle, None, move |rt| {
			rt.set(radius, 2);
			Ok(())
		})
		.unwrap();
	assert_eq!(rt.get_in(obj, area), 12);
	assert!(rt.is_implanted(obj, radius));
}

#[test]
fn test_is_subclass_walks_parents() {
	let mut rt = Runtime::new();
	let base = rt.define_class("base", None).unwrap();
	let middle = rt.define_class("middle", Some(base)).unwrap();
	let leaf = rt.define_class("leaf", Some(middle)).unwrap();
	let other = rt.define_class("other", None).unwrap();

	assert!(rt.is_subclass(leaf, base));
	assert!(rt.is_subclass(leaf, leaf));
	assert!(!rt.is_subclass(base, leaf));
	assert!(!rt.is_subclass(leaf, other));
	assert_eq!(rt.class_parent(leaf), Some(middle));
}

#[test]
fn test_class_of_name_unknown_faults() {
	let mut rt = Runtime::new();
	let err = rt.class_of_name("ghost").unwrap_err();
	assert!(matches!(err, Unwind::Fault(RuntimeError::UnknownName { kind: "class", .. })));
}
