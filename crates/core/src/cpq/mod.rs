pub mod catalog;
pub mod pricing;

pub use catalog::{RateCatalog, RateSnapshot, SqFtRange, TierCoverage, TierOverlap};
pub use pricing::{
    calculate_quote, round_money, DeterministicPricingEngine, PricingDegradation, PricingEngine,
    PricingResult, PricingTrace, PricingTraceStep,
};
