use std::sync::Arc;

use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;

use crate::config::{AppConfig, StorageBackend};
use crate::domain::catalog::{Product, ProductCatalog};
use crate::domain::delivery::{Delivery, DeliveryCommandHandler};
use crate::domain::order::{Order, OrderCommandHandler};
use crate::domain::review::{Review, ReviewCommandHandler};
use crate::domain::seller::{SellerCommandHandler, SellerProfile};
use crate::media::{LocalMediaStore, MediaStore};
use crate::messaging::EventBus;
use crate::metrics::Metrics;
use crate::store::scylla::ensure_schema;
use crate::store::{
    HistoryStore, MemoryHistoryStore, MemoryStore, MemoryUniqueKeys, Record, RecordStore,
    ScyllaHistoryStore, ScyllaStore, ScyllaUniqueKeys, UniqueKeys,
};

// ============================================================================
// Application State
// ============================================================================
//
// Wires stores, the event bus and metrics into the command handlers. Built
// once at startup and shared by every HTTP worker.
//
// ============================================================================

pub struct Stores {
    pub orders: Arc<dyn RecordStore<Order>>,
    pub history: Arc<dyn HistoryStore>,
    pub deliveries: Arc<dyn RecordStore<Delivery>>,
    pub reviews: Arc<dyn RecordStore<Review>>,
    pub profiles: Arc<dyn RecordStore<SellerProfile>>,
    pub products: Arc<dyn RecordStore<Product>>,
    pub keys: Arc<dyn UniqueKeys>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            orders: Arc::new(MemoryStore::<Order>::new()),
            history: Arc::new(MemoryHistoryStore::new()),
            deliveries: Arc::new(MemoryStore::<Delivery>::new()),
            reviews: Arc::new(MemoryStore::<Review>::new()),
            profiles: Arc::new(MemoryStore::<SellerProfile>::new()),
            products: Arc::new(MemoryStore::<Product>::new()),
            keys: Arc::new(MemoryUniqueKeys::new()),
        }
    }

    pub async fn scylla(config: &AppConfig) -> anyhow::Result<Self> {
        tracing::info!(nodes = ?config.scylla_nodes, "Connecting to ScyllaDB...");
        let session: Session = SessionBuilder::new()
            .known_nodes(&config.scylla_nodes)
            .build()
            .await?;

        ensure_schema(
            &session,
            &config.scylla_keyspace,
            &[
                Order::KIND,
                Delivery::KIND,
                Review::KIND,
                SellerProfile::KIND,
                Product::KIND,
            ],
        )
        .await?;

        let session = Arc::new(session);
        Ok(Self {
            orders: Arc::new(ScyllaStore::<Order>::new(session.clone())),
            history: Arc::new(ScyllaHistoryStore::new(session.clone())),
            deliveries: Arc::new(ScyllaStore::<Delivery>::new(session.clone())),
            reviews: Arc::new(ScyllaStore::<Review>::new(session.clone())),
            profiles: Arc::new(ScyllaStore::<SellerProfile>::new(session.clone())),
            products: Arc::new(ScyllaStore::<Product>::new(session.clone())),
            keys: Arc::new(ScyllaUniqueKeys::new(session)),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderCommandHandler>,
    pub deliveries: Arc<DeliveryCommandHandler>,
    pub reviews: Arc<ReviewCommandHandler>,
    pub sellers: Arc<SellerCommandHandler>,
    pub catalog: Arc<ProductCatalog>,
    pub bus: EventBus,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Connect the configured backend and build every handler on top of it
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let stores = match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; records are lost on restart");
                Stores::memory()
            }
            StorageBackend::Scylla => Stores::scylla(config).await?,
        };
        let media = Arc::new(LocalMediaStore::new(
            config.media_dir.clone(),
            config.media_base_url.clone(),
            config.media_max_bytes,
        ));
        Self::build(config, stores, media)
    }

    pub fn build(config: &AppConfig, stores: Stores, media: Arc<dyn MediaStore>) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new()?);
        tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

        let bus = EventBus::new(config.event_bus_capacity);
        let retry = config.retry();

        Ok(Self {
            orders: Arc::new(OrderCommandHandler::new(
                stores.orders.clone(),
                stores.history,
                bus.clone(),
                metrics.clone(),
                config.pricing.clone(),
                retry.clone(),
            )),
            deliveries: Arc::new(DeliveryCommandHandler::new(
                stores.deliveries,
                stores.orders.clone(),
                stores.keys.clone(),
                bus.clone(),
                metrics.clone(),
                retry.clone(),
            )),
            reviews: Arc::new(ReviewCommandHandler::new(
                stores.reviews,
                stores.orders,
                stores.keys,
                bus.clone(),
                metrics.clone(),
                retry.clone(),
            )),
            sellers: Arc::new(SellerCommandHandler::new(
                stores.profiles,
                media,
                bus.clone(),
                metrics.clone(),
                retry,
            )),
            catalog: Arc::new(ProductCatalog::new(stores.products)),
            bus,
            metrics,
        })
    }
}
