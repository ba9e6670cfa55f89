//! # Request Channel
//!
//! In-process request/response channel between the presentation layer and
//! the sale engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RegisterHandle (Clone)                                                │
//! │  ├── checkout(cart)      ─┐                                            │
//! │  ├── delete(sale_id)      │  Request { payload, reply: oneshot }       │
//! │  ├── update(patch)        ├──────────── mpsc ──────────────┐           │
//! │  └── list()              ─┘                                 ▼           │
//! │                                                     Dispatcher::run    │
//! │                                                            │            │
//! │                                          one task per request (JoinSet)│
//! │                                                            │            │
//! │                                     commands::sale::*  ◄───┘            │
//! │                                                            │            │
//! │  caller awaits ◄──────────── oneshot reply ◄───────────────┘            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! A request that reached the dispatcher runs to commit or rollback even if
//! the caller stops waiting. Dropping the last handle lets the dispatcher
//! drain in-flight requests and return.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::commands;
use crate::error::ApiError;
use kasir_core::{CheckoutRequest, SaleId, SalePatch, SaleWithItems};
use kasir_db::Database;

// =============================================================================
// Channel Names
// =============================================================================

pub const SALES_CHECKOUT: &str = "sales:checkout";
pub const SALES_DELETE: &str = "sales:delete";
pub const SALES_UPDATE: &str = "sales:update";
pub const SALES_LIST: &str = "sales:list";

/// Reply half carried by each request.
pub type Reply<T> = oneshot::Sender<Result<T, ApiError>>;

/// A request travelling to the dispatcher.
#[derive(Debug)]
pub enum Request {
    Checkout {
        request: CheckoutRequest,
        reply: Reply<SaleId>,
    },
    Delete {
        sale_id: String,
        reply: Reply<bool>,
    },
    Update {
        patch: SalePatch,
        reply: Reply<bool>,
    },
    List {
        reply: Reply<Vec<SaleWithItems>>,
    },
}

impl Request {
    /// The channel name this request answers to.
    pub fn channel(&self) -> &'static str {
        match self {
            Request::Checkout { .. } => SALES_CHECKOUT,
            Request::Delete { .. } => SALES_DELETE,
            Request::Update { .. } => SALES_UPDATE,
            Request::List { .. } => SALES_LIST,
        }
    }
}

/// Creates a connected handle/dispatcher pair.
///
/// `capacity` bounds how many requests queue before `send` waits.
pub fn channel(db: Database, capacity: usize) -> (RegisterHandle, Dispatcher) {
    let (tx, rx) = mpsc::channel(capacity);
    (RegisterHandle { tx }, Dispatcher { db, rx })
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Receives requests and runs each on its own task.
#[derive(Debug)]
pub struct Dispatcher {
    db: Database,
    rx: mpsc::Receiver<Request>,
}

impl Dispatcher {
    /// Serves requests until every handle is dropped, then waits for the
    /// in-flight ones.
    pub async fn run(mut self) {
        info!("Register dispatcher started");

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                request = self.rx.recv() => match request {
                    Some(request) => {
                        debug!(channel = request.channel(), "Dispatching request");
                        in_flight.spawn(handle(self.db.clone(), request));
                    }
                    None => break,
                },
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    report(finished);
                }
            }
        }

        while let Some(finished) = in_flight.join_next().await {
            report(finished);
        }

        info!("Register dispatcher stopped");
    }
}

fn report(finished: Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        error!(error = %e, "Request task failed");
    }
}

async fn handle(db: Database, request: Request) {
    let channel = request.channel();

    let delivered = match request {
        Request::Checkout { request, reply } => {
            reply.send(commands::sale::checkout(&db, request).await).is_ok()
        }
        Request::Delete { sale_id, reply } => {
            reply.send(commands::sale::delete_sale(&db, sale_id).await).is_ok()
        }
        Request::Update { patch, reply } => {
            reply.send(commands::sale::update_sale(&db, patch).await).is_ok()
        }
        Request::List { reply } => reply.send(commands::sale::list_sales(&db).await).is_ok(),
    };

    if !delivered {
        debug!(channel, "Caller stopped waiting; result discarded");
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable client side of the channel.
#[derive(Debug, Clone)]
pub struct RegisterHandle {
    tx: mpsc::Sender<Request>,
}

impl RegisterHandle {
    /// `sales:checkout`
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<SaleId, ApiError> {
        self.call(|reply| Request::Checkout { request, reply }).await
    }

    /// `sales:delete`
    pub async fn delete(&self, sale_id: impl Into<String>) -> Result<bool, ApiError> {
        let sale_id = sale_id.into();
        self.call(|reply| Request::Delete { sale_id, reply }).await
    }

    /// `sales:update`
    pub async fn update(&self, patch: SalePatch) -> Result<bool, ApiError> {
        self.call(|reply| Request::Update { patch, reply }).await
    }

    /// `sales:list`
    pub async fn list(&self) -> Result<Vec<SaleWithItems>, ApiError> {
        self.call(|reply| Request::List { reply }).await
    }

    /// Enqueues a prebuilt request without waiting for its reply.
    pub async fn send(&self, request: Request) -> Result<(), ApiError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| ApiError::internal("Register is not running"))
    }

    /// Calls a channel by name with a JSON payload.
    ///
    /// ## Payloads
    /// - `sales:checkout` - `CheckoutRequest` object → sale id string
    /// - `sales:delete` - sale id string → `true`
    /// - `sales:update` - `SalePatch` object → `true`
    /// - `sales:list` - ignored → array of sales with items
    pub async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, ApiError> {
        match channel {
            SALES_CHECKOUT => to_json(self.checkout(from_json(payload)?).await?),
            SALES_DELETE => to_json(self.delete(from_json::<String>(payload)?).await?),
            SALES_UPDATE => to_json(self.update(from_json(payload)?).await?),
            SALES_LIST => to_json(self.list().await?),
            other => Err(ApiError::validation(format!("Unknown channel: {}", other))),
        }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Request,
    ) -> Result<T, ApiError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;

        response
            .await
            .map_err(|_| ApiError::internal("Request dropped before replying"))?
    }
}

fn from_json<T: DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(payload)?)
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use kasir_core::{CartLine, Money, Product};
    use kasir_db::{DbConfig, NewProduct};
    use serde_json::json;
    use std::time::Duration;

    async fn start() -> (RegisterHandle, Database, tokio::task::JoinHandle<()>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (handle, dispatcher) = channel(db.clone(), 8);
        let task = tokio::spawn(dispatcher.run());
        (handle, db, task)
    }

    async fn product(db: &Database, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct::new("Teh Botol 350ml", Money::new(5_000), stock))
            .await
            .unwrap()
    }

    fn cart(id: &str, qty: i64) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CartLine {
                id: id.to_string(),
                qty,
            }],
            subtotal: Money::new(5_000 * qty),
            total: Money::new(5_000 * qty),
            paid: Money::new(5_000 * qty),
            change: Money::zero(),
        }
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let (handle, db, _task) = start().await;
        let p = product(&db, 10).await;

        let sale_id = handle.checkout(cart(&p.id, 3)).await.unwrap();
        let listed = handle.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sale.id, sale_id);

        assert!(handle.delete(sale_id).await.unwrap());
        assert!(handle.list().await.unwrap().is_empty());
        assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_errors_carry_codes() {
        let (handle, _db, _task) = start().await;

        let err = handle.checkout(cart("ghost", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut empty = cart("ghost", 1);
        empty.items.clear();
        let err = handle.checkout(empty).await.unwrap_err();
        assert_eq!(err, ApiError::validation("Cart is empty"));

        let err = handle.delete("ghost").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_invoke_by_channel_name() {
        let (handle, db, _task) = start().await;
        let p = product(&db, 10).await;

        let sale_id = handle
            .invoke(
                SALES_CHECKOUT,
                json!({ "items": [{ "id": p.id, "qty": 2 }], "subtotal": 10000, "total": 10000, "paid": 10000, "change": 0 }),
            )
            .await
            .unwrap();
        let sale_id = sale_id.as_str().unwrap().to_string();

        let updated = handle
            .invoke(SALES_UPDATE, json!({ "id": sale_id, "total": 9000 }))
            .await
            .unwrap();
        assert_eq!(updated, json!(true));

        let listed = handle.invoke(SALES_LIST, Value::Null).await.unwrap();
        assert_eq!(listed[0]["total"], 9000);
        assert_eq!(listed[0]["items"][0]["productName"], "Teh Botol 350ml");

        let deleted = handle.invoke(SALES_DELETE, json!(sale_id)).await.unwrap();
        assert_eq!(deleted, json!(true));

        let err = handle.invoke("sales:refund", Value::Null).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = handle.invoke(SALES_CHECKOUT, json!({ "items": "nope" })).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_abandoned_request_still_commits() {
        let (handle, db, _task) = start().await;
        let p = product(&db, 10).await;

        let (reply, response) = oneshot::channel();
        drop(response);
        handle
            .send(Request::Checkout {
                request: cart(&p.id, 4),
                reply,
            })
            .await
            .unwrap();

        let mut stock = 10;
        for _ in 0..100 {
            stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
            if stock == 6 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stock, 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_through_channel() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("channel.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let (handle, dispatcher) = channel(db.clone(), 4);
        let task = tokio::spawn(dispatcher.run());
        let p = product(&db, 50).await;

        let calls: Vec<_> = (1..=6)
            .map(|qty| {
                let handle = handle.clone();
                let request = cart(&p.id, qty);
                tokio::spawn(async move { handle.checkout(request).await })
            })
            .collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }

        assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().stock, 50 - 21);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_handles_dropped() {
        let (handle, _db, task) = start().await;
        let clone = handle.clone();
        drop(handle);
        drop(clone);
        task.await.unwrap();
    }
}
