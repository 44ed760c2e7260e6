use tidyquote_core::domain::rate::{
    AdjustmentKind, RateCategory, RateEntry, RateRule, UNBOUNDED_SQ_FT,
};

use crate::commands::{to_json, CatalogContext, CommandResult, EXIT_INVALID_ARGUMENT};

const COMMAND: &str = "rates";

#[derive(Debug, Clone, Default)]
pub struct RatesArgs {
    pub category: Option<String>,
    pub json: bool,
}

pub fn run(args: &RatesArgs) -> CommandResult {
    let category = match args.category.as_deref().map(str::parse::<RateCategory>).transpose() {
        Ok(category) => category,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_argument",
                error.to_string(),
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    let context = match CatalogContext::load(COMMAND) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let snapshot = match context.snapshot(COMMAND) {
        Ok(snapshot) => snapshot,
        Err(failure) => return failure,
    };

    let rates = snapshot
        .entries()
        .iter()
        .filter(|entry| category.map_or(true, |category| entry.category() == category))
        .cloned()
        .collect::<Vec<_>>();

    if args.json {
        return to_json(COMMAND, &rates);
    }

    if rates.is_empty() {
        return CommandResult::report("no active rates".to_string());
    }
    let currency = context.config.pricing.currency.as_str();
    CommandResult::report(
        rates.iter().map(|entry| render_line(entry, currency)).collect::<Vec<_>>().join("\n"),
    )
}

fn render_line(entry: &RateEntry, currency: &str) -> String {
    let detail = match &entry.rule {
        RateRule::SquareFootage { min_sq_ft, max_sq_ft, base_price } => {
            let range = if *max_sq_ft == UNBOUNDED_SQ_FT {
                format!("{min_sq_ft}+ sq ft")
            } else {
                format!("{min_sq_ft}-{max_sq_ft} sq ft")
            };
            format!("{range}: {base_price:.2} {currency}")
        }
        RateRule::Surcharge { surcharge_type, surcharge_value } => {
            format!("+{}", adjustment(*surcharge_type, surcharge_value, currency))
        }
        RateRule::Discount { frequency, discount_type, discount_value } => {
            format!("{frequency}: -{}", adjustment(*discount_type, discount_value, currency))
        }
    };
    format!("[{}] {} ({}) {detail}", entry.id, entry.name, entry.category())
}

fn adjustment(kind: AdjustmentKind, value: &rust_decimal::Decimal, currency: &str) -> String {
    match kind {
        AdjustmentKind::Fixed => format!("{value:.2} {currency}"),
        AdjustmentKind::Percentage => format!("{value}%"),
    }
}
