//! Customer and product endpoints.
//!
//! Batches are all-or-nothing: one invalid entry rejects the request
//! before anything is written.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, ProductId};
use domain::{Customer, NewCustomer, NewProduct, Product};
use orders::PaymentInitiator;
use serde::Deserialize;
use store::{CatalogStore, OrderStore};

use crate::error::ApiError;
use crate::routes::orders::OrderAppState;

#[derive(Debug, Deserialize)]
pub struct CreateCustomersRequest {
    pub customers: Vec<NewCustomer>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductsRequest {
    pub products: Vec<NewProduct>,
}

/// POST /order/create_customer
#[tracing::instrument(skip_all, fields(count = req.customers.len()))]
pub async fn create_customers<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Json(req): Json<CreateCustomersRequest>,
) -> Result<(StatusCode, Json<Vec<Customer>>), ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    if req.customers.is_empty() {
        return Err(ApiError::BadRequest("no customers given".to_string()));
    }
    for customer in &req.customers {
        customer.validate().map_err(ApiError::BadRequest)?;
    }

    let created = state.catalog().create_customers(req.customers).await?;
    tracing::info!(count = created.len(), "customers created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /order/query_customer/{id}
pub async fn get_customer<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Path(id): Path<u64>,
) -> Result<Json<Customer>, ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let customer = state.catalog().find_customer(CustomerId::new(id)).await?;
    Ok(Json(customer))
}

/// POST /order/create_product
#[tracing::instrument(skip_all, fields(count = req.products.len()))]
pub async fn create_products<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Json(req): Json<CreateProductsRequest>,
) -> Result<(StatusCode, Json<Vec<Product>>), ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    if req.products.is_empty() {
        return Err(ApiError::BadRequest("no products given".to_string()));
    }
    for product in &req.products {
        product.validate().map_err(ApiError::BadRequest)?;
    }

    let created = state.catalog().create_products(req.products).await?;
    tracing::info!(count = created.len(), "products created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /order/query_product/{id}
pub async fn get_product<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let product = state.catalog().find_product(ProductId::new(id)).await?;
    Ok(Json(product))
}
