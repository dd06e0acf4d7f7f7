//! In-memory storage backend for the fulfillment service.
//!
//! This module provides memory-based implementations of the order and
//! employee store traits, used by the service's default configuration and by
//! tests. All conditional operations run their check-and-set under the
//! map's single write lock, which is what makes them atomic with respect to
//! concurrent claimants.

use crate::{EmployeeStore, OrderStore, StorageError};
use async_trait::async_trait;
use fulfillment_types::{Employee, Order, Role, Stage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Key = (String, String);

/// In-memory order store.
#[derive(Default)]
pub struct MemoryOrderStore {
	store: Arc<RwLock<HashMap<Key, Order>>>,
}

impl MemoryOrderStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
	async fn get(&self, location_id: &str, order_id: &str) -> Result<Order, StorageError> {
		let store = self.store.read().await;
		store
			.get(&(location_id.to_string(), order_id.to_string()))
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn put(&self, order: &Order) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(
			(order.location_id.clone(), order.order_id.clone()),
			order.clone(),
		);
		Ok(())
	}

	async fn update_if_stage(&self, order: &Order, expected: Stage) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		let key = (order.location_id.clone(), order.order_id.clone());
		match store.get(&key).map(|current| current.stage) {
			None => Err(StorageError::NotFound),
			Some(stage) if stage != expected => Err(StorageError::Conflict(format!(
				"order is in stage {}, expected {}",
				stage, expected
			))),
			Some(_) => {
				store.insert(key, order.clone());
				Ok(())
			},
		}
	}
}

/// In-memory employee store.
#[derive(Default)]
pub struct MemoryEmployeeStore {
	store: Arc<RwLock<HashMap<Key, Employee>>>,
}

impl MemoryEmployeeStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
	async fn get(&self, location_id: &str, employee_id: &str) -> Result<Employee, StorageError> {
		let store = self.store.read().await;
		store
			.get(&(location_id.to_string(), employee_id.to_string()))
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn put(&self, employee: &Employee) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(
			(employee.location_id.clone(), employee.id.clone()),
			employee.clone(),
		);
		Ok(())
	}

	async fn list_available(
		&self,
		location_id: &str,
		role: Role,
	) -> Result<Vec<Employee>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.values()
			.filter(|e| e.location_id == location_id && e.role == role && !e.occupied)
			.cloned()
			.collect())
	}

	async fn try_claim(
		&self,
		location_id: &str,
		employee_id: &str,
	) -> Result<bool, StorageError> {
		let mut store = self.store.write().await;
		let employee = store
			.get_mut(&(location_id.to_string(), employee_id.to_string()))
			.ok_or(StorageError::NotFound)?;
		if employee.occupied {
			return Ok(false);
		}
		employee.occupied = true;
		Ok(true)
	}

	async fn release(&self, location_id: &str, employee_id: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		let employee = store
			.get_mut(&(location_id.to_string(), employee_id.to_string()))
			.ok_or(StorageError::NotFound)?;
		employee.occupied = false;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn employee(id: &str, role: Role, occupied: bool, rating: f64) -> Employee {
		Employee {
			location_id: "loc-1".to_string(),
			id: id.to_string(),
			full_name: format!("Employee {}", id),
			role,
			occupied,
			rating,
		}
	}

	#[tokio::test]
	async fn claim_flips_exactly_once() {
		let store = MemoryEmployeeStore::new();
		store
			.put(&employee("e1", Role::Cook, false, 4.5))
			.await
			.unwrap();

		assert!(store.try_claim("loc-1", "e1").await.unwrap());
		assert!(!store.try_claim("loc-1", "e1").await.unwrap());

		store.release("loc-1", "e1").await.unwrap();
		assert!(store.try_claim("loc-1", "e1").await.unwrap());
	}

	#[tokio::test]
	async fn claim_missing_employee_is_not_found() {
		let store = MemoryEmployeeStore::new();
		let result = store.try_claim("loc-1", "ghost").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn release_is_idempotent() {
		let store = MemoryEmployeeStore::new();
		store
			.put(&employee("e1", Role::Cook, true, 4.5))
			.await
			.unwrap();

		store.release("loc-1", "e1").await.unwrap();
		store.release("loc-1", "e1").await.unwrap();
		assert!(!store.get("loc-1", "e1").await.unwrap().occupied);
	}

	#[tokio::test]
	async fn concurrent_claims_admit_one_winner() {
		let store = Arc::new(MemoryEmployeeStore::new());
		store
			.put(&employee("e1", Role::Courier, false, 4.9))
			.await
			.unwrap();

		let mut handles = Vec::new();
		for _ in 0..16 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				store.try_claim("loc-1", "e1").await.unwrap()
			}));
		}

		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[tokio::test]
	async fn list_available_filters_role_and_occupancy() {
		let store = MemoryEmployeeStore::new();
		store
			.put(&employee("e1", Role::Cook, false, 4.5))
			.await
			.unwrap();
		store
			.put(&employee("e2", Role::Cook, true, 4.9))
			.await
			.unwrap();
		store
			.put(&employee("e3", Role::Packer, false, 3.0))
			.await
			.unwrap();

		let available = store.list_available("loc-1", Role::Cook).await.unwrap();
		assert_eq!(available.len(), 1);
		assert_eq!(available[0].id, "e1");
	}

	#[tokio::test]
	async fn update_if_stage_guards_the_persisted_stage() {
		let store = MemoryOrderStore::new();
		let order = Order::new("loc-1", "ord-1", "cust-1", Utc::now());
		store.put(&order).await.unwrap();

		let mut advanced = order.clone();
		advanced.stage = Stage::Cooking;
		store
			.update_if_stage(&advanced, Stage::Processing)
			.await
			.unwrap();

		// A second writer still holding the old expectation must lose.
		let mut stale = order.clone();
		stale.stage = Stage::Cooking;
		let result = store.update_if_stage(&stale, Stage::Processing).await;
		assert!(matches!(result, Err(StorageError::Conflict(_))));
	}

	#[tokio::test]
	async fn concurrent_conditional_writes_admit_one_winner() {
		let store = Arc::new(MemoryOrderStore::new());
		let order = Order::new("loc-1", "ord-1", "cust-1", Utc::now());
		store.put(&order).await.unwrap();

		let mut handles = Vec::new();
		for _ in 0..8 {
			let store = store.clone();
			let mut advanced = order.clone();
			advanced.stage = Stage::Cooking;
			handles.push(tokio::spawn(async move {
				store.update_if_stage(&advanced, Stage::Processing).await
			}));
		}

		let mut winners = 0;
		for handle in handles {
			match handle.await.unwrap() {
				Ok(()) => winners += 1,
				Err(e) => assert!(matches!(e, StorageError::Conflict(_))),
			}
		}
		assert_eq!(winners, 1);
		assert_eq!(store.get("loc-1", "ord-1").await.unwrap().stage, Stage::Cooking);
	}

	#[tokio::test]
	async fn update_if_stage_missing_order_is_not_found() {
		let store = MemoryOrderStore::new();
		let order = Order::new("loc-1", "ghost", "cust-1", Utc::now());
		let result = store.update_if_stage(&order, Stage::Processing).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}
}
