//! Candidate selection and ranked-fallback assignment.
//!
//! Selection is read-only: it lists the unoccupied employees of a role and
//! ranks them by rating. Assignment walks that ranking and attempts the
//! store's atomic claim on each candidate in turn, stopping at the first
//! success. A lost claim race is an expected outcome here, not an error; it
//! simply moves the iteration to the next candidate.

use fulfillment_storage::{EmployeeStore, StorageError};
use fulfillment_types::{Employee, Role};
use std::future::Future;

/// Sorts candidates by rating descending, breaking ties by employee id so
/// concurrent retries walk the list in the same order.
pub fn rank_candidates(mut candidates: Vec<Employee>) -> Vec<Employee> {
	candidates.sort_by(|a, b| {
		b.rating
			.total_cmp(&a.rating)
			.then_with(|| a.id.cmp(&b.id))
	});
	candidates
}

/// Lists and ranks the claimable employees of `role` at a location.
///
/// Read-only; an empty result signals no capacity.
pub async fn select_candidates(
	employees: &dyn EmployeeStore,
	location_id: &str,
	role: Role,
) -> Result<Vec<Employee>, StorageError> {
	let available = employees.list_available(location_id, role).await?;
	Ok(rank_candidates(available))
}

/// Attempts to claim candidates in ranked order, returning the first one the
/// claim function acquires.
///
/// The claim function receives the candidate's employee id and reports
/// whether the atomic flip succeeded. A `false` result or a storage error
/// counts as a conflict for that candidate and the iteration moves on.
/// Returns `None` once every candidate has conflicted.
pub async fn assign_first<F, Fut>(candidates: Vec<Employee>, mut claim: F) -> Option<Employee>
where
	F: FnMut(String) -> Fut,
	Fut: Future<Output = Result<bool, StorageError>>,
{
	for candidate in candidates {
		match claim(candidate.id.clone()).await {
			Ok(true) => {
				tracing::info!(
					employee_id = %candidate.id,
					role = %candidate.role,
					rating = candidate.rating,
					"Claimed employee"
				);
				return Some(candidate);
			},
			Ok(false) => {
				tracing::info!(
					employee_id = %candidate.id,
					"Employee already occupied, trying next candidate"
				);
			},
			Err(e) => {
				tracing::warn!(
					employee_id = %candidate.id,
					error = %e,
					"Claim attempt failed, trying next candidate"
				);
			},
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	fn employee(id: &str, rating: f64) -> Employee {
		Employee {
			location_id: "loc-1".to_string(),
			id: id.to_string(),
			full_name: format!("Employee {}", id),
			role: Role::Cook,
			occupied: false,
			rating,
		}
	}

	#[test]
	fn ranking_is_by_rating_descending() {
		let ranked = rank_candidates(vec![
			employee("e1", 3.2),
			employee("e2", 4.9),
			employee("e3", 4.1),
		]);
		let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, ["e2", "e3", "e1"]);
	}

	#[test]
	fn ranking_ties_break_by_id() {
		let ranked = rank_candidates(vec![
			employee("e2", 4.5),
			employee("e1", 4.5),
			employee("e3", 4.5),
		]);
		let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, ["e1", "e2", "e3"]);
	}

	#[tokio::test]
	async fn first_successful_claim_wins() {
		let candidates = vec![employee("e1", 4.9), employee("e2", 4.0)];
		let attempts = Arc::new(AtomicUsize::new(0));
		let counter = attempts.clone();

		let assigned = assign_first(candidates, move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			async { Ok(true) }
		})
		.await;

		assert_eq!(assigned.unwrap().id, "e1");
		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn conflicts_fall_back_to_next_candidate() {
		let candidates = vec![employee("e1", 4.9), employee("e2", 4.0)];

		let assigned = assign_first(candidates, |id| async move { Ok(id == "e2") }).await;

		assert_eq!(assigned.unwrap().id, "e2");
	}

	#[tokio::test]
	async fn claim_errors_also_fall_back() {
		let candidates = vec![employee("e1", 4.9), employee("e2", 4.0)];

		let assigned = assign_first(candidates, |id| async move {
			if id == "e1" {
				Err(StorageError::NotFound)
			} else {
				Ok(true)
			}
		})
		.await;

		assert_eq!(assigned.unwrap().id, "e2");
	}

	#[tokio::test]
	async fn exhausted_candidates_yield_none() {
		let candidates = vec![employee("e1", 4.9), employee("e2", 4.0)];
		let tried = Arc::new(std::sync::Mutex::new(HashSet::new()));
		let seen = tried.clone();

		let assigned = assign_first(candidates, move |id| {
			seen.lock().unwrap().insert(id);
			async { Ok(false) }
		})
		.await;

		assert!(assigned.is_none());
		assert_eq!(tried.lock().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn empty_candidate_list_yields_none() {
		let assigned = assign_first(vec![], |_| async { Ok(true) }).await;
		assert!(assigned.is_none());
	}
}
