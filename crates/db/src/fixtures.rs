use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;

use tidyquote_core::domain::rate::{
    AdjustmentKind, RateEntry, RateId, RateRule, ServiceFrequency, UNBOUNDED_SQ_FT,
};

use crate::repositories::MemoryStores;

/// Default rate catalog loaded when `pricing.seed_catalog` is on.
pub struct SeedCatalog;

fn seed_rates() -> Vec<(&'static str, &'static str, RateRule)> {
    vec![
        ("Small Home", "Up to 999 sq ft", tier(0, 999, 80)),
        ("Medium Home", "1,000 to 1,999 sq ft", tier(1_000, 1_999, 120)),
        ("Large Home", "2,000 to 2,999 sq ft", tier(2_000, 2_999, 160)),
        ("Estate", "3,000 sq ft and above", tier(3_000, UNBOUNDED_SQ_FT, 220)),
        (
            "Deep Cleaning",
            "Baseboards, vents and behind appliances",
            surcharge(AdjustmentKind::Fixed, 40),
        ),
        (
            "Pet Hair Cleanup",
            "Extra vacuuming and lint rolling of furniture",
            surcharge(AdjustmentKind::Fixed, 25),
        ),
        ("Inside Windows", "Interior glass and sills", surcharge(AdjustmentKind::Percentage, 10)),
        ("Inside Fridge", "Empty, wipe and restock", surcharge(AdjustmentKind::Fixed, 20)),
        (
            "Weekly Discount",
            "Recurring weekly service",
            discount(ServiceFrequency::Weekly, AdjustmentKind::Percentage, 10),
        ),
        (
            "Bi-Weekly Discount",
            "Recurring service every two weeks",
            discount(ServiceFrequency::Biweekly, AdjustmentKind::Percentage, 5),
        ),
        (
            "Monthly Discount",
            "Recurring monthly service",
            discount(ServiceFrequency::Monthly, AdjustmentKind::Fixed, 5),
        ),
    ]
}

fn tier(min_sq_ft: i64, max_sq_ft: i64, base_price: i64) -> RateRule {
    RateRule::SquareFootage { min_sq_ft, max_sq_ft, base_price: Decimal::new(base_price, 0) }
}

fn surcharge(surcharge_type: AdjustmentKind, value: i64) -> RateRule {
    RateRule::Surcharge { surcharge_type, surcharge_value: Decimal::new(value, 0) }
}

fn discount(frequency: ServiceFrequency, discount_type: AdjustmentKind, value: i64) -> RateRule {
    RateRule::Discount { frequency, discount_type, discount_value: Decimal::new(value, 0) }
}

fn seeded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

impl SeedCatalog {
    /// Seed entries with ids `1..=n` in declaration order.
    pub fn rates() -> Vec<RateEntry> {
        let created_at = seeded_at();
        seed_rates()
            .into_iter()
            .zip(1_u64..)
            .map(|((name, description, rule), id)| RateEntry {
                id: RateId(id),
                name: name.to_string(),
                description: Some(description.to_string()),
                is_active: true,
                rule,
                created_at,
                updated_at: created_at,
            })
            .collect()
    }

    /// Fresh stores, with the seed catalog when `seed` is set.
    pub fn load(seed: bool) -> MemoryStores {
        if !seed {
            return MemoryStores::empty();
        }

        let rates = Self::rates();
        info!(event_name = "seed.catalog_loaded", rates = rates.len(), "seed rate catalog loaded");
        MemoryStores::with_rates(rates)
    }
}
