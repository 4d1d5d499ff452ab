//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the collaborators, the workflow configuration and one
//! `BookingWorkflow` per open desk session.

use desk_backend::{BackendClient, MobileMoneyGateway};
use desk_core::{Collaborators, DeskResult, Hotel};
use desk_flow::{BookingWorkflow, FlowConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Sessions untouched for this long are dropped
    pub session_idle_timeout_secs: u64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            session_idle_timeout_secs: std::env::var("SESSION_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// A workflow shared between requests of one session
pub type SharedWorkflow = Arc<Mutex<BookingWorkflow>>;

struct Session {
    workflow: SharedWorkflow,
    last_seen: Instant,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backend and gateway handles given to every new workflow
    pub collaborators: Collaborators,
    /// Hotel the desk works for
    pub hotel: Hotel,
    /// Poll cadence and payee rules
    pub flow_config: FlowConfig,
    /// Application config
    pub config: AppConfig,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl AppState {
    /// Create state from environment variables and `config/workflow.toml`
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let flow_config = FlowConfig::load()
            .map_err(|e| anyhow::anyhow!("Failed to load workflow config: {}", e))?;

        let backend = BackendClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize backend client: {}", e))?;
        let gateway = MobileMoneyGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize mobile money: {}", e))?;

        // The backend decides which hotel this desk belongs to
        let hotel_id = backend.hotel_id();
        let mut hotel = flow_config
            .hotel
            .clone()
            .unwrap_or_else(|| Hotel::new(hotel_id, format!("Hotel {}", hotel_id)));
        hotel.id = hotel_id;

        let collaborators = Collaborators::new(Arc::new(backend), Arc::new(gateway));
        Ok(Self::with_collaborators(config, collaborators, hotel, flow_config))
    }

    /// Create state around given collaborators (for testing)
    pub fn with_collaborators(
        config: AppConfig,
        collaborators: Collaborators,
        hotel: Hotel,
        flow_config: FlowConfig,
    ) -> Self {
        Self {
            collaborators,
            hotel,
            flow_config,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a new workflow at step 1
    pub async fn open_session(&self) -> DeskResult<(Uuid, SharedWorkflow)> {
        let workflow = BookingWorkflow::new(
            self.collaborators.clone(),
            self.hotel.clone(),
            self.flow_config.clone(),
        )?;
        let id = Uuid::new_v4();
        let shared = Arc::new(Mutex::new(workflow));

        self.sessions.write().await.insert(
            id,
            Session {
                workflow: shared.clone(),
                last_seen: Instant::now(),
            },
        );
        Ok((id, shared))
    }

    /// Look up a session and mark it as used
    pub async fn session(&self, id: Uuid) -> Option<SharedWorkflow> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        session.last_seen = Instant::now();
        Some(session.workflow.clone())
    }

    /// Drop a session; its polls stop with the workflow
    pub async fn close_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle longer than the configured timeout
    pub async fn evict_idle_sessions(&self) -> usize {
        let timeout = self.config.session_idle_timeout();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < timeout);
        before - sessions.len()
    }

    /// Evict idle sessions once a minute, for the life of the server
    pub async fn sweep_idle_sessions(self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = self.evict_idle_sessions().await;
            if evicted > 0 {
                info!("Evicted {} idle workflow session(s)", evicted);
            }
        }
    }
}
