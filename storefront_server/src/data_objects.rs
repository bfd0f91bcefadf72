use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_engine::{
    db_types::OrderStatusType,
    traits::{OrderSearchFilter, Pagination},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Body of `PATCH /api/orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusParams {
    pub id: Option<String>,
    pub status: Option<String>,
}

impl UpdateStatusParams {
    pub fn validate(self) -> Result<(String, OrderStatusType), ServerError> {
        let id = self.id.filter(|s| !s.trim().is_empty());
        let status = self.status.filter(|s| !s.trim().is_empty());
        let (Some(id), Some(status)) = (id, status) else {
            return Err(ServerError::InvalidRequestBody("Order id and status are required".into()));
        };
        let status = status
            .trim()
            .parse::<OrderStatusType>()
            .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        Ok((id, status))
    }
}

/// Query string of `GET /api/orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersQuery {
    /// An order status, or `all`
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrdersQuery {
    pub fn to_filter(&self) -> Result<(OrderSearchFilter, Pagination), ServerError> {
        let mut filter = OrderSearchFilter::default();
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => {},
            Some(s) => {
                let status =
                    s.parse::<OrderStatusType>().map_err(|e| ServerError::InvalidQueryParameters(e.to_string()))?;
                filter = filter.with_status(status);
            },
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.as_str());
        }
        Ok((filter, Pagination::new(self.page, self.limit)))
    }
}

/// Query string of `DELETE /api/orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteOrderParams {
    pub id: Option<String>,
}

/// Response of `GET /api/paypal/ipn`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpnDiagnostics {
    pub message: String,
    pub mode: String,
    pub business_email: String,
    pub timestamp: DateTime<Utc>,
}
