use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::store::Record;

record_id!(RateId, "Rate");

/// Sentinel for a square footage tier with no upper bound.
pub const UNBOUNDED_SQ_FT: i64 = i64::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateCategory {
    SquareFootage,
    Surcharge,
    Discount,
}

impl RateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SquareFootage => "squareFootage",
            Self::Surcharge => "surcharge",
            Self::Discount => "discount",
        }
    }
}

impl std::fmt::Display for RateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateCategory {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "squareFootage" => Ok(Self::SquareFootage),
            "surcharge" => Ok(Self::Surcharge),
            "discount" => Ok(Self::Discount),
            other => Err(DomainError::InvalidArgument(format!(
                "unsupported rate category `{other}` (expected squareFootage|surcharge|discount)"
            ))),
        }
    }
}

/// How a surcharge or discount value is applied to its basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustmentKind {
    Fixed,
    Percentage,
}

impl AdjustmentKind {
    /// `None` when the amount does not fit in a `Decimal`.
    pub fn apply(self, value: Decimal, basis: Decimal) -> Option<Decimal> {
        match self {
            Self::Fixed => Some(value),
            Self::Percentage => basis.checked_mul(value)?.checked_div(Decimal::ONE_HUNDRED),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceFrequency {
    Weekly,
    Biweekly,
    Monthly,
    OneTime,
}

impl ServiceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::OneTime => "oneTime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Biweekly => "Bi-Weekly",
            Self::Monthly => "Monthly",
            Self::OneTime => "One-Time",
        }
    }
}

impl std::fmt::Display for ServiceFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceFrequency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "oneTime" => Ok(Self::OneTime),
            other => Err(DomainError::InvalidArgument(format!(
                "unsupported service frequency `{other}` (expected weekly|biweekly|monthly|oneTime)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum RateRule {
    #[serde(rename_all = "camelCase")]
    SquareFootage { min_sq_ft: i64, max_sq_ft: i64, base_price: Decimal },
    #[serde(rename_all = "camelCase")]
    Surcharge { surcharge_type: AdjustmentKind, surcharge_value: Decimal },
    #[serde(rename_all = "camelCase")]
    Discount { frequency: ServiceFrequency, discount_type: AdjustmentKind, discount_value: Decimal },
}

impl RateRule {
    pub fn category(&self) -> RateCategory {
        match self {
            Self::SquareFootage { .. } => RateCategory::SquareFootage,
            Self::Surcharge { .. } => RateCategory::Surcharge,
            Self::Discount { .. } => RateCategory::Discount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub id: RateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub rule: RateRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierRate<'a> {
    pub entry: &'a RateEntry,
    pub min_sq_ft: i64,
    pub max_sq_ft: i64,
    pub base_price: Decimal,
}

impl TierRate<'_> {
    pub fn contains(&self, square_footage: i64) -> bool {
        self.min_sq_ft <= square_footage && square_footage <= self.max_sq_ft
    }

    pub fn is_open_ended(&self) -> bool {
        self.max_sq_ft == UNBOUNDED_SQ_FT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurchargeRate<'a> {
    pub entry: &'a RateEntry,
    pub kind: AdjustmentKind,
    pub value: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscountRate<'a> {
    pub entry: &'a RateEntry,
    pub frequency: ServiceFrequency,
    pub kind: AdjustmentKind,
    pub value: Decimal,
}

impl RateEntry {
    pub fn category(&self) -> RateCategory {
        self.rule.category()
    }

    pub fn as_tier(&self) -> Option<TierRate<'_>> {
        match self.rule {
            RateRule::SquareFootage { min_sq_ft, max_sq_ft, base_price } => {
                Some(TierRate { entry: self, min_sq_ft, max_sq_ft, base_price })
            }
            _ => None,
        }
    }

    pub fn as_surcharge(&self) -> Option<SurchargeRate<'_>> {
        match self.rule {
            RateRule::Surcharge { surcharge_type, surcharge_value } => {
                Some(SurchargeRate { entry: self, kind: surcharge_type, value: surcharge_value })
            }
            _ => None,
        }
    }

    pub fn as_discount(&self) -> Option<DiscountRate<'_>> {
        match self.rule {
            RateRule::Discount { frequency, discount_type, discount_value } => Some(DiscountRate {
                entry: self,
                frequency,
                kind: discount_type,
                value: discount_value,
            }),
            _ => None,
        }
    }

    /// The add-on key a quote request uses to select this surcharge.
    pub fn add_on_key(&self) -> Option<String> {
        self.as_surcharge().map(|_| add_on_key(&self.name))
    }
}

impl Record for RateEntry {
    type Id = RateId;

    fn id(&self) -> RateId {
        self.id
    }
}

/// Lowercases a surcharge name and strips all whitespace:
/// `"Pet Hair Cleanup"` becomes `"pethaircleanup"`.
pub fn add_on_key(name: &str) -> String {
    name.chars().filter(|ch| !ch.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// Input for creating a rate. Category-specific fields stay optional here so
/// that missing ones can be reported together by `into_rule`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDraft {
    pub category: Option<RateCategory>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_sq_ft: Option<i64>,
    #[serde(default)]
    pub max_sq_ft: Option<i64>,
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub surcharge_type: Option<AdjustmentKind>,
    #[serde(default)]
    pub surcharge_value: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<AdjustmentKind>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub frequency: Option<ServiceFrequency>,
}

impl RateDraft {
    pub fn into_rule(&self) -> Result<RateRule, DomainError> {
        let category = self
            .category
            .ok_or_else(|| DomainError::Validation("rate category is required".to_string()))?;

        match category {
            RateCategory::SquareFootage => match (self.min_sq_ft, self.max_sq_ft, self.base_price) {
                (Some(min_sq_ft), Some(max_sq_ft), Some(base_price)) => {
                    validate_tier_bounds(min_sq_ft, max_sq_ft)?;
                    Ok(RateRule::SquareFootage { min_sq_ft, max_sq_ft, base_price })
                }
                _ => Err(missing(
                    "Square footage rates require minSqFt, maxSqFt, and basePrice",
                    &[
                        ("minSqFt", self.min_sq_ft.is_none()),
                        ("maxSqFt", self.max_sq_ft.is_none()),
                        ("basePrice", self.base_price.is_none()),
                    ],
                )),
            },
            RateCategory::Surcharge => match (self.surcharge_type, self.surcharge_value) {
                (Some(surcharge_type), Some(surcharge_value)) => {
                    Ok(RateRule::Surcharge { surcharge_type, surcharge_value })
                }
                _ => Err(missing(
                    "Surcharges require surchargeType and surchargeValue",
                    &[
                        ("surchargeType", self.surcharge_type.is_none()),
                        ("surchargeValue", self.surcharge_value.is_none()),
                    ],
                )),
            },
            RateCategory::Discount => {
                match (self.discount_type, self.discount_value, self.frequency) {
                    (Some(discount_type), Some(discount_value), Some(frequency)) => {
                        Ok(RateRule::Discount { frequency, discount_type, discount_value })
                    }
                    _ => Err(missing(
                        "Discounts require discountType, discountValue, and frequency",
                        &[
                            ("discountType", self.discount_type.is_none()),
                            ("discountValue", self.discount_value.is_none()),
                            ("frequency", self.frequency.is_none()),
                        ],
                    )),
                }
            }
        }
    }
}

/// Partial update for a rate. Fields that do not belong to the entry's
/// category are rejected rather than silently dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub min_sq_ft: Option<i64>,
    #[serde(default)]
    pub max_sq_ft: Option<i64>,
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub surcharge_type: Option<AdjustmentKind>,
    #[serde(default)]
    pub surcharge_value: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<AdjustmentKind>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub frequency: Option<ServiceFrequency>,
}

impl RatePatch {
    pub fn apply_to(&self, entry: &mut RateEntry) -> Result<(), DomainError> {
        let foreign = self.foreign_fields(entry.category());
        if !foreign.is_empty() {
            return Err(DomainError::Validation(format!(
                "fields {} do not apply to {} rates",
                foreign.join(", "),
                entry.category()
            )));
        }

        match &mut entry.rule {
            RateRule::SquareFootage { min_sq_ft, max_sq_ft, base_price } => {
                let next_min = self.min_sq_ft.unwrap_or(*min_sq_ft);
                let next_max = self.max_sq_ft.unwrap_or(*max_sq_ft);
                validate_tier_bounds(next_min, next_max)?;
                *min_sq_ft = next_min;
                *max_sq_ft = next_max;
                if let Some(value) = self.base_price {
                    *base_price = value;
                }
            }
            RateRule::Surcharge { surcharge_type, surcharge_value } => {
                if let Some(value) = self.surcharge_type {
                    *surcharge_type = value;
                }
                if let Some(value) = self.surcharge_value {
                    *surcharge_value = value;
                }
            }
            RateRule::Discount { frequency, discount_type, discount_value } => {
                if let Some(value) = self.frequency {
                    *frequency = value;
                }
                if let Some(value) = self.discount_type {
                    *discount_type = value;
                }
                if let Some(value) = self.discount_value {
                    *discount_value = value;
                }
            }
        }

        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(description) = &self.description {
            entry.description = Some(description.clone());
        }
        if let Some(is_active) = self.is_active {
            entry.is_active = is_active;
        }

        Ok(())
    }

    fn foreign_fields(&self, category: RateCategory) -> Vec<&'static str> {
        let tier = [
            ("minSqFt", self.min_sq_ft.is_some()),
            ("maxSqFt", self.max_sq_ft.is_some()),
            ("basePrice", self.base_price.is_some()),
        ];
        let surcharge = [
            ("surchargeType", self.surcharge_type.is_some()),
            ("surchargeValue", self.surcharge_value.is_some()),
        ];
        let discount = [
            ("discountType", self.discount_type.is_some()),
            ("discountValue", self.discount_value.is_some()),
            ("frequency", self.frequency.is_some()),
        ];

        let foreign: [&[(&'static str, bool)]; 2] = match category {
            RateCategory::SquareFootage => [&surcharge[..], &discount[..]],
            RateCategory::Surcharge => [&tier[..], &discount[..]],
            RateCategory::Discount => [&tier[..], &surcharge[..]],
        };

        foreign
            .into_iter()
            .flatten()
            .filter_map(|(name, present)| present.then_some(*name))
            .collect()
    }
}

fn validate_tier_bounds(min_sq_ft: i64, max_sq_ft: i64) -> Result<(), DomainError> {
    if min_sq_ft > max_sq_ft {
        return Err(DomainError::Validation(format!(
            "minSqFt ({min_sq_ft}) must not exceed maxSqFt ({max_sq_ft})"
        )));
    }
    Ok(())
}

fn missing(summary: &str, fields: &[(&str, bool)]) -> DomainError {
    let absent =
        fields.iter().filter_map(|(name, is_missing)| is_missing.then_some(*name)).collect::<Vec<_>>();
    DomainError::Validation(format!("{summary} (missing: {})", absent.join(", ")))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{
        add_on_key, AdjustmentKind, RateCategory, RateDraft, RateEntry, RateId, RatePatch,
        RateRule, ServiceFrequency,
    };
    use crate::errors::DomainError;

    fn surcharge_entry() -> RateEntry {
        RateEntry {
            id: RateId(7),
            name: "Pet Hair Cleanup".to_string(),
            description: None,
            is_active: true,
            rule: RateRule::Surcharge {
                surcharge_type: AdjustmentKind::Fixed,
                surcharge_value: Decimal::new(25, 0),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn add_on_key_lowercases_and_strips_whitespace() {
        assert_eq!(add_on_key("Pet Hair Cleanup"), "pethaircleanup");
        assert_eq!(add_on_key("  Deep\tCleaning "), "deepcleaning");
        assert_eq!(surcharge_entry().add_on_key().as_deref(), Some("pethaircleanup"));
    }

    #[test]
    fn percentage_adjustment_is_relative_to_basis() {
        let basis = Decimal::new(100, 0);
        assert_eq!(
            AdjustmentKind::Percentage.apply(Decimal::new(10, 0), basis),
            Some(Decimal::new(10, 0))
        );
        assert_eq!(AdjustmentKind::Fixed.apply(Decimal::new(40, 0), basis), Some(Decimal::new(40, 0)));
    }

    #[test]
    fn percentage_adjustment_reports_overflow() {
        assert_eq!(AdjustmentKind::Percentage.apply(Decimal::new(200, 0), Decimal::MAX), None);
    }

    #[test]
    fn draft_reports_every_missing_tier_field() {
        let draft = RateDraft {
            category: Some(RateCategory::SquareFootage),
            min_sq_ft: Some(0),
            ..RateDraft::default()
        };

        let error = draft.into_rule().expect_err("tier without bounds should fail");
        let DomainError::Validation(message) = error else {
            panic!("expected validation error");
        };
        assert!(message.contains("maxSqFt"));
        assert!(message.contains("basePrice"));
        assert!(message.ends_with("(missing: maxSqFt, basePrice)"));
    }

    #[test]
    fn draft_accepts_zero_as_a_present_lower_bound() {
        let draft = RateDraft {
            category: Some(RateCategory::SquareFootage),
            min_sq_ft: Some(0),
            max_sq_ft: Some(999),
            base_price: Some(Decimal::new(80, 0)),
            ..RateDraft::default()
        };

        assert_eq!(
            draft.into_rule(),
            Ok(RateRule::SquareFootage {
                min_sq_ft: 0,
                max_sq_ft: 999,
                base_price: Decimal::new(80, 0)
            })
        );
    }

    #[test]
    fn discount_draft_requires_frequency() {
        let draft = RateDraft {
            category: Some(RateCategory::Discount),
            discount_type: Some(AdjustmentKind::Percentage),
            discount_value: Some(Decimal::new(10, 0)),
            ..RateDraft::default()
        };

        assert!(matches!(
            draft.into_rule(),
            Err(DomainError::Validation(ref message)) if message.contains("frequency")
        ));
    }

    #[test]
    fn patch_rejects_fields_from_another_category() {
        let mut entry = surcharge_entry();
        let patch = RatePatch { base_price: Some(Decimal::ONE), ..RatePatch::default() };

        let error = patch.apply_to(&mut entry).expect_err("basePrice is not a surcharge field");
        assert!(matches!(error, DomainError::Validation(ref message) if message.contains("basePrice")));
        assert_eq!(entry.rule, surcharge_entry().rule);
    }

    #[test]
    fn patch_merges_category_fields() {
        let mut entry = surcharge_entry();
        let patch = RatePatch {
            surcharge_type: Some(AdjustmentKind::Percentage),
            surcharge_value: Some(Decimal::new(15, 0)),
            ..RatePatch::default()
        };

        patch.apply_to(&mut entry).expect("patch applies");
        assert_eq!(
            entry.rule,
            RateRule::Surcharge {
                surcharge_type: AdjustmentKind::Percentage,
                surcharge_value: Decimal::new(15, 0)
            }
        );
        assert_eq!(entry.name, "Pet Hair Cleanup");
    }

    #[test]
    fn rate_entry_serializes_with_category_tag() {
        let value = serde_json::to_value(surcharge_entry()).expect("serialize rate");
        assert_eq!(value["category"], "surcharge");
        assert_eq!(value["surchargeType"], "fixed");
        assert_eq!(value["isActive"], true);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn frequency_parses_wire_names() {
        assert_eq!("oneTime".parse::<ServiceFrequency>(), Ok(ServiceFrequency::OneTime));
        assert_eq!(ServiceFrequency::Biweekly.label(), "Bi-Weekly");
        assert!("daily".parse::<ServiceFrequency>().is_err());
    }
}
