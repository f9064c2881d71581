//! Engine configuration surface.

use crate::book::ArbitrageConfig;
use crate::risk::RiskLimits;
use crate::strategy::{AsParams, MarketMakerParams};
use crate::types::{Price, Qty, Symbol};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

/// Instrument-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    pub symbol: Symbol,
    pub min_qty: Qty,
    pub max_qty: Qty,
    pub step_size: Qty,
    pub tick_size: Price,
    /// When set, orders are acknowledged locally and never sent out.
    pub paper_trading: bool,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: Symbol::new("BTCUSDT"),
            min_qty: Qty::from_f64(0.0001),
            max_qty: Qty::from_f64(10.0),
            step_size: Qty::from_f64(0.0001),
            tick_size: Price::from_f64(0.01),
            paper_trading: true,
        }
    }
}

/// Which quoting strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Basic,
    InventoryAdjusted,
    AvellanedaStoikov,
}

/// Strategy selection plus the parameter blocks for each variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub market_maker: MarketMakerParams,
    /// EMA decay for the inventory-adjusted skew.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,
    pub avellaneda: AsParams,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::default(),
            market_maker: MarketMakerParams::default(),
            ema_alpha: default_ema_alpha(),
            avellaneda: AsParams::default(),
        }
    }
}

fn default_ema_alpha() -> f64 {
    0.2
}

/// Queue and pool capacities. All must be powers of two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Capacity of the shared venue-event queue.
    pub event_queue_capacity: usize,
    /// Capacity of the strategy → order-thread queue.
    pub order_queue_capacity: usize,
    /// Capacity of the order record pool.
    pub order_pool_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: 4_096,
            order_queue_capacity: 1_024,
            order_pool_capacity: 1_024,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub risk: RiskLimits,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub queues: QueueConfig,
}

impl EngineConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Check cross-field consistency; called by the loaders and by
    /// [`Engine::new`](crate::engine::Engine::new).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, capacity) in [
            ("event_queue_capacity", self.queues.event_queue_capacity),
            ("order_queue_capacity", self.queues.order_queue_capacity),
            ("order_pool_capacity", self.queues.order_pool_capacity),
        ] {
            if capacity == 0 || !capacity.is_power_of_two() {
                return Err(ConfigError::invalid(format!(
                    "{name} must be a non-zero power of two, got {capacity}"
                )));
            }
        }

        if self.trading.symbol.is_empty() {
            return Err(ConfigError::invalid("trading.symbol must be set"));
        }
        if self.trading.min_qty > self.trading.max_qty {
            return Err(ConfigError::invalid("trading.min_qty exceeds max_qty"));
        }

        let mm = &self.strategy.market_maker;
        if mm.min_spread_bps > mm.max_spread_bps {
            return Err(ConfigError::invalid(
                "strategy.min_spread_bps exceeds max_spread_bps",
            ));
        }
        if mm.min_order_size > mm.max_order_size {
            return Err(ConfigError::invalid(
                "strategy.min_order_size exceeds max_order_size",
            ));
        }
        if !mm.max_position.is_positive() {
            return Err(ConfigError::invalid("strategy.max_position must be positive"));
        }
        if !(0.0..=1.0).contains(&self.strategy.ema_alpha) {
            return Err(ConfigError::invalid("strategy.ema_alpha must be in [0, 1]"));
        }

        let a = &self.strategy.avellaneda;
        if a.gamma <= 0.0 || a.k <= 0.0 || a.horizon_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "avellaneda gamma, k, and horizon_secs must be positive",
            ));
        }

        if !self.risk.max_position_qty.is_positive() {
            return Err(ConfigError::invalid("risk.max_position_qty must be positive"));
        }
        if self.arbitrage.min_quantity > self.arbitrage.max_quantity {
            return Err(ConfigError::invalid(
                "arbitrage.min_quantity exceeds max_quantity",
            ));
        }
        if !(0.0..=1.0).contains(&self.arbitrage.min_liquidity_ratio) {
            return Err(ConfigError::invalid(
                "arbitrage.min_liquidity_ratio must be in [0, 1]",
            ));
        }

        Ok(())
    }
}
