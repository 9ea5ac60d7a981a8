//! Constraint sort for a hook band.

use std::rc::Rc;

use soliloquy_primitives::Order;

use super::HookEntry;

/// Verdict for `a` relative to `b` when `a` currently precedes `b`.
///
/// `a`'s own constraint wins; if it has no opinion, the inverse of `b`'s
/// verdict about `a` is used.
pub(super) fn effective_order(a: &HookEntry, b: &HookEntry) -> Order {
	let own = a.constraint.map_or(Order::None, |constraint| constraint(&a.tag, &b.tag));
	if !own.is_none() {
		return own;
	}
	b.constraint
		.map_or(Order::None, |constraint| constraint(&b.tag, &a.tag))
		.inverse()
}

/// Reorders `entries` until no pair has an *after* verdict.
///
/// Each scan checks every ordered pair. When an earlier entry must run after
/// a later one, the later entry is moved in front of it and the scan starts
/// over. Moving rather than swapping leaves every other entry in place, so
/// unconstrained handlers keep insertion order.
///
/// Returns the number of passes spent when the constraints do not settle.
pub(super) fn sort_band(entries: &mut Vec<Rc<HookEntry>>, max_passes: usize) -> Result<(), usize> {
	let mut passes = 0;
	'scan: loop {
		if passes == max_passes {
			return Err(passes);
		}
		passes += 1;
		for i in 0..entries.len() {
			for j in i + 1..entries.len() {
				if effective_order(&entries[i], &entries[j]) == Order::After {
					let moved = entries.remove(j);
					entries.insert(i, moved);
					continue 'scan;
				}
			}
		}
		return Ok(());
	}
}
