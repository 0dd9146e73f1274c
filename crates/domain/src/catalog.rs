//! Customer and product records.
//!
//! Plain data with no state machine. Products carry the availability flag
//! that order creation flips when it reserves one.

use chrono::{DateTime, Utc};
use common::{CustomerId, ProductId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Money,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            address: None,
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Customer name is required".to_string());
        }
        Ok(())
    }

    /// Materializes the record once the store has assigned an id.
    pub fn into_customer(self, id: CustomerId) -> Customer {
        let now = Utc::now();
        Customer {
            id,
            name: self.name,
            email: self.email,
            address: self.address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "price_cents")]
    pub price: Money,
    #[serde(default = "available")]
    pub is_available: bool,
}

fn available() -> bool {
    true
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            is_available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Checks required fields and the price floor.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if self.price.is_negative() {
            return Err(format!("Product price {} is invalid", self.price));
        }
        Ok(())
    }

    /// Materializes the record once the store has assigned an id.
    pub fn into_product(self, id: ProductId) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            is_available: self.is_available,
            created_at: now,
            updated_at: now,
        }
    }
}
