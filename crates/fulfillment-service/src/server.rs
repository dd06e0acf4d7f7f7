//! HTTP server for the fulfillment API.
//!
//! This module adapts HTTP requests to the engine's three operations and to
//! the store interfaces for creating orders and staffing locations. It only
//! does transport framing; every rule about stages and employees lives in
//! the core.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use chrono::Utc;
use fulfillment_config::Config;
use fulfillment_core::{EngineError, FulfillmentEngine};
use fulfillment_storage::{EmployeeStore, OrderStore, StorageError};
use fulfillment_types::{Employee, Order, ReleaseReason, Role, Stage};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The fulfillment engine serving advance/confirm/release.
	pub engine: Arc<FulfillmentEngine>,
	/// Order store, for create and fetch.
	pub orders: Arc<dyn OrderStore>,
	/// Employee store, for staffing a location.
	pub employees: Arc<dyn EmployeeStore>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	config: Config,
	engine: Arc<FulfillmentEngine>,
	orders: Arc<dyn OrderStore>,
	employees: Arc<dyn EmployeeStore>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState {
		engine,
		orders,
		employees,
	};

	let app = Router::new()
		.route(
			"/locations/{location_id}/orders",
			post(handle_create_order),
		)
		.route(
			"/locations/{location_id}/orders/{order_id}",
			get(handle_get_order),
		)
		.route(
			"/locations/{location_id}/orders/{order_id}/advance",
			post(handle_advance),
		)
		.route(
			"/locations/{location_id}/orders/{order_id}/confirm",
			post(handle_confirm),
		)
		.route(
			"/locations/{location_id}/orders/{order_id}/release",
			post(handle_release),
		)
		.route(
			"/locations/{location_id}/employees",
			post(handle_create_employee).get(handle_list_available),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(app_state);

	let bind_address = format!("{}:{}", config.service.host, config.service.port);
	let listener = TcpListener::bind(&bind_address).await?;
	tracing::info!("Fulfillment API server starting on {}", bind_address);

	axum::serve(listener, app).await?;
	Ok(())
}

/// API error carrying the HTTP status an engine or storage failure maps to.
struct ApiError {
	status: StatusCode,
	message: String,
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(json!({ "error": self.message }))).into_response()
	}
}

impl From<EngineError> for ApiError {
	fn from(e: EngineError) -> Self {
		let status = match &e {
			EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
			EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
			EngineError::NoCapacity { .. } => StatusCode::SERVICE_UNAVAILABLE,
			EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			message: e.to_string(),
		}
	}
}

impl From<StorageError> for ApiError {
	fn from(e: StorageError) -> Self {
		let status = match &e {
			StorageError::NotFound => StatusCode::NOT_FOUND,
			StorageError::Conflict(_) => StatusCode::CONFLICT,
			StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			message: e.to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
	customer_id: String,
}

async fn handle_create_order(
	State(state): State<AppState>,
	Path(location_id): Path<String>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
	let order = Order::new(
		location_id,
		uuid::Uuid::new_v4().to_string(),
		request.customer_id,
		Utc::now(),
	);
	state.orders.put(&order).await?;
	Ok((StatusCode::CREATED, Json(order)))
}

async fn handle_get_order(
	State(state): State<AppState>,
	Path((location_id, order_id)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
	let order = state.orders.get(&location_id, &order_id).await?;
	Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
	target: Stage,
}

async fn handle_advance(
	State(state): State<AppState>,
	Path((location_id, order_id)): Path<(String, String)>,
	Json(request): Json<AdvanceRequest>,
) -> Result<Json<Order>, ApiError> {
	let order = state
		.engine
		.advance(&location_id, &order_id, request.target)
		.await?;
	Ok(Json(order))
}

async fn handle_confirm(
	State(state): State<AppState>,
	Path((location_id, order_id)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
	let order = state.engine.confirm_delivery(&location_id, &order_id).await?;
	Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct ReleaseRequest {
	reason: ReleaseReason,
}

async fn handle_release(
	State(state): State<AppState>,
	Path((location_id, order_id)): Path<(String, String)>,
	Json(request): Json<ReleaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
	let report = state
		.engine
		.release_order(&location_id, &order_id, request.reason)
		.await?;
	Ok(Json(json!({
		"released_count": report.released_count(),
		"released": report.released,
		"errors": report.errors,
	})))
}

#[derive(Debug, Deserialize)]
struct CreateEmployeeRequest {
	id: String,
	full_name: String,
	role: Role,
	rating: f64,
}

async fn handle_create_employee(
	State(state): State<AppState>,
	Path(location_id): Path<String>,
	Json(request): Json<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, ApiError> {
	let employee = Employee {
		location_id,
		id: request.id,
		full_name: request.full_name,
		role: request.role,
		occupied: false,
		rating: request.rating,
	};
	state.employees.put(&employee).await?;
	Ok((StatusCode::CREATED, Json(employee)))
}

#[derive(Debug, Deserialize)]
struct AvailableQuery {
	role: Role,
}

async fn handle_list_available(
	State(state): State<AppState>,
	Path(location_id): Path<String>,
	Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<Employee>>, ApiError> {
	let available = state
		.employees
		.list_available(&location_id, query.role)
		.await?;
	Ok(Json(available))
}
