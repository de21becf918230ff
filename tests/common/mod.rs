#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

use teamstore_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{collection, product, product_category, product_color, product_variant},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    services::{CreateSessionRequest, HostedSession, NotificationService, PaymentGateway},
    AppState,
};

/// Payment gateway double: records session-create requests and answers
/// session lookups from an in-memory map.
pub struct MockPaymentGateway {
    pub requests: Mutex<Vec<CreateSessionRequest>>,
    sessions: Mutex<HashMap<String, Uuid>>,
    fail_next: AtomicBool,
    counter: AtomicU64,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
            fail_next: AtomicBool::new(false),
            counter: AtomicU64::new(0),
        }
    }

    /// Makes the next session-create call fail, simulating a processor outage.
    pub fn fail_next_create(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn recorded_requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Registers a session id → order id mapping without a create call,
    /// for driving the success-redirect path directly.
    pub fn register_session(&self, session_id: &str, order_id: Uuid) {
        self.sessions
            .lock()
            .expect("sessions lock")
            .insert(session_id.to_string(), order_id);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ServiceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::PaymentProviderError(
                "simulated outage".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("cs_test_{}", n);
        self.sessions
            .lock()
            .expect("sessions lock")
            .insert(id.clone(), request.order_id);
        self.requests.lock().expect("requests lock").push(request);

        Ok(HostedSession {
            url: format!("https://checkout.test/pay/{}", id),
            id,
        })
    }

    async fn find_order_for_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Uuid>, ServiceError> {
        Ok(self
            .sessions
            .lock()
            .expect("sessions lock")
            .get(payment_session_id)
            .copied())
    }
}

/// Ids of the rows seeded by [`TestApp::seed_catalog`].
pub struct SeededCatalog {
    pub collection_id: Uuid,
    pub category_id: Uuid,
    pub color_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
}

/// Test harness: application state over a fresh in-memory SQLite database
/// with a mock payment gateway.
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<MockPaymentGateway>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = test_config();

        // A single pooled connection keeps the in-memory database alive and
        // shared across the whole test.
        let db_config = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };
        let db_pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("connect test db");
        Migrator::up(&db_pool, None).await.expect("run migrations");
        let db_arc = Arc::new(db_pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(MockPaymentGateway::new());
        let gateway_dyn: Arc<dyn PaymentGateway> = gateway.clone();
        let notifications = Arc::new(NotificationService::disabled());

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            gateway_dyn,
            notifications,
            &cfg,
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            gateway,
            _event_task: event_task,
        }
    }

    /// Router with the full v1 API, for request-level tests.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/v1", teamstore_api::api_v1_routes())
            .with_state(self.state.clone())
    }

    /// Seeds a collection, a category, a color, and one active customizable
    /// product priced at 25.00 in sizes AM/AL/AXL/2X/3X/4X.
    pub async fn seed_catalog(&self) -> SeededCatalog {
        self.seed_product(
            "Test Shirt",
            &["AM", "AL", "AXL", "2X", "3X", "4X"],
            true,
            Decimal::new(2500, 2),
        )
        .await
    }

    /// Seeds a full catalog row set around one product.
    pub async fn seed_product(
        &self,
        name: &str,
        sizes: &[&str],
        has_customization: bool,
        price: Decimal,
    ) -> SeededCatalog {
        let db = &*self.state.db;
        let now = Utc::now();

        let collection_id = Uuid::new_v4();
        collection::ActiveModel {
            id: Set(collection_id),
            name: Set(format!("Spring 2024 {}", collection_id)),
            active: Set(true),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed collection");

        let category_id = Uuid::new_v4();
        product_category::ActiveModel {
            id: Set(category_id),
            name: Set(format!("T-Shirt {}", category_id)),
            active: Set(true),
        }
        .insert(db)
        .await
        .expect("seed category");

        let color_id = Uuid::new_v4();
        product_color::ActiveModel {
            id: Set(color_id),
            name: Set(format!("Red {}", color_id)),
        }
        .insert(db)
        .await
        .expect("seed color");

        let product_id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(product_id),
            collection_id: Set(Some(collection_id)),
            name: Set(name.to_string()),
            image_url: Set(None),
            available_sizes: Set(serde_json::json!(sizes)),
            has_customization: Set(has_customization),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed product");

        let variant_id = Uuid::new_v4();
        product_variant::ActiveModel {
            id: Set(variant_id),
            product_id: Set(product_id),
            category_id: Set(category_id),
            color_id: Set(Some(color_id)),
            price: Set(price),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed variant");

        SeededCatalog {
            collection_id,
            category_id,
            color_id,
            product_id,
            variant_id,
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 18080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
        currency: "usd".to_string(),
        cart_ttl_secs: 3600,
        public_base_url: "http://localhost:18080".to_string(),
        payment_secret_key: "sk_test_key".to_string(),
        payment_api_base: "https://api.stripe.test".to_string(),
        payment_timeout_secs: 5,
        payment_webhook_secret: "whsec_test_secret".to_string(),
        payment_webhook_tolerance_secs: 300,
        email: None,
    }
}
