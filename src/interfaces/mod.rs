// ============================================================================
// Interfaces Module
// Contains the market-data sink contract
// ============================================================================

mod publisher;

pub use publisher::MarketDataPublisher;
