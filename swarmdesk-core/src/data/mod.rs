//! Market data: the source trait, concrete sources and the fallback feed.

pub mod binance;
pub mod circuit_breaker;
pub mod coingecko;
pub mod csv_source;
pub mod feed;
pub mod http;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceSource;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use coingecko::CoinGeckoSource;
pub use csv_source::CsvSource;
pub use feed::MarketFeed;
pub use http::HttpFetcher;
pub use provider::{DataError, MarketDataSource, PriceBook, PriceTick};
pub use synthetic::SyntheticSource;
