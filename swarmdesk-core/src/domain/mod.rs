//! Domain types for the desk

pub mod agent;
pub mod candle;
pub mod decision;
pub mod ids;
pub mod market;
pub mod news;
pub mod persona;
pub mod position;

pub use agent::{Agent, AgentStatus, Counters, Outcome};
pub use candle::{Candle, CandleSeries, Interval, SeriesError, UnknownInterval};
pub use decision::{Action, Decision};
pub use ids::{AgentId, PositionId};
pub use market::{Asset, Sector, Side, Trend, Volatility};
pub use news::NewsEvent;
pub use persona::{Persona, RiskProfile, StrategyKind, TargetFilter};
pub use position::Position;
