//! Employee types used for stage assignments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an employee performs, fixed at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Prepares orders during the cooking stage.
	Cook,
	/// Packs orders during the packing stage.
	Packer,
	/// Delivers orders during the shipping stage.
	Courier,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Role::Cook => "cook",
			Role::Packer => "packer",
			Role::Courier => "courier",
		};
		write!(f, "{}", s)
	}
}

/// An employee of a location.
///
/// The `occupied` flag is flipped only through the employee store's claim
/// and release operations; `rating` is maintained by an external review
/// aggregator and only ranks candidates here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
	/// Location the employee works at.
	pub location_id: String,
	/// Unique identifier of the employee within the location.
	pub id: String,
	/// Display name.
	pub full_name: String,
	/// Role, fixed at creation.
	pub role: Role,
	/// True while assigned to exactly one order's active stage.
	pub occupied: bool,
	/// Average review rating; ranks candidates, does not affect correctness.
	pub rating: f64,
}

/// The subset of an employee embedded in an order's stage history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeRef {
	/// Employee identifier.
	pub id: String,
	/// Display name at assignment time.
	pub full_name: String,
	/// Role at assignment time.
	pub role: Role,
	/// Rating at assignment time.
	pub rating: f64,
}

impl From<&Employee> for EmployeeRef {
	fn from(employee: &Employee) -> Self {
		Self {
			id: employee.id.clone(),
			full_name: employee.full_name.clone(),
			role: employee.role,
			rating: employee.rating,
		}
	}
}
