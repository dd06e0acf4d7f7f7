//! Stage transition table for the fulfillment pipeline.
//!
//! Orders move along the chain
//! `processing -> cooking -> packing -> shipping -> delivered`, and any
//! non-terminal stage may move to `cancelled` through a rollback. Both
//! terminals accept nothing further.

use fulfillment_types::Stage;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Static transition table - each stage maps to its allowed next stages.
static TRANSITIONS: Lazy<HashMap<Stage, HashSet<Stage>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		Stage::Processing,
		HashSet::from([Stage::Cooking, Stage::Cancelled]),
	);
	m.insert(
		Stage::Cooking,
		HashSet::from([Stage::Packing, Stage::Cancelled]),
	);
	m.insert(
		Stage::Packing,
		HashSet::from([Stage::Shipping, Stage::Cancelled]),
	);
	m.insert(
		Stage::Shipping,
		HashSet::from([Stage::Delivered, Stage::Cancelled]),
	);
	m.insert(Stage::Delivered, HashSet::new()); // terminal
	m.insert(Stage::Cancelled, HashSet::new()); // terminal
	m
});

/// Checks whether the pipeline permits moving from `from` to `to`.
pub fn is_valid_transition(from: Stage, to: Stage) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|next| next.contains(&to))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn forward_chain_is_allowed() {
		assert!(is_valid_transition(Stage::Processing, Stage::Cooking));
		assert!(is_valid_transition(Stage::Cooking, Stage::Packing));
		assert!(is_valid_transition(Stage::Packing, Stage::Shipping));
		assert!(is_valid_transition(Stage::Shipping, Stage::Delivered));
	}

	#[test]
	fn skipping_stages_is_rejected() {
		assert!(!is_valid_transition(Stage::Processing, Stage::Packing));
		assert!(!is_valid_transition(Stage::Processing, Stage::Shipping));
		assert!(!is_valid_transition(Stage::Cooking, Stage::Shipping));
		assert!(!is_valid_transition(Stage::Cooking, Stage::Delivered));
	}

	#[test]
	fn moving_backwards_is_rejected() {
		assert!(!is_valid_transition(Stage::Packing, Stage::Cooking));
		assert!(!is_valid_transition(Stage::Shipping, Stage::Processing));
	}

	#[test]
	fn any_non_terminal_stage_can_cancel() {
		for stage in [
			Stage::Processing,
			Stage::Cooking,
			Stage::Packing,
			Stage::Shipping,
		] {
			assert!(is_valid_transition(stage, Stage::Cancelled));
		}
	}

	#[test]
	fn terminals_accept_nothing() {
		for to in [
			Stage::Processing,
			Stage::Cooking,
			Stage::Packing,
			Stage::Shipping,
			Stage::Delivered,
			Stage::Cancelled,
		] {
			assert!(!is_valid_transition(Stage::Delivered, to));
			assert!(!is_valid_transition(Stage::Cancelled, to));
		}
	}
}
