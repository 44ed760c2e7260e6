use crate::errors::DomainError;

/// Parses a raw identifier the way every id type in this crate accepts it:
/// surrounding whitespace is ignored and the rest must be an unsigned integer.
pub(crate) fn parse_record_id(entity: &str, raw: &str) -> Result<u64, DomainError> {
    raw.trim().parse::<u64>().map_err(|_| {
        DomainError::InvalidArgument(format!("{entity} ID must be a valid integer, got `{raw}`"))
    })
}

macro_rules! record_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::DomainError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                crate::domain::parse_record_id($entity, raw).map(Self)
            }
        }

        impl crate::store::RecordId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

pub mod client;
pub mod proposal;
pub mod quote;
pub mod rate;

#[cfg(test)]
mod tests {
    use crate::domain::{quote::QuoteId, rate::RateId};
    use crate::errors::DomainError;

    #[test]
    fn ids_parse_from_trimmed_integers() {
        assert_eq!(" 17 ".parse::<RateId>(), Ok(RateId(17)));
        assert_eq!("3".parse::<QuoteId>(), Ok(QuoteId(3)));
    }

    #[test]
    fn non_numeric_ids_are_invalid_arguments() {
        let error = "abc".parse::<RateId>().expect_err("abc is not an id");
        assert!(matches!(error, DomainError::InvalidArgument(ref message) if message.contains("Rate")));

        assert!(matches!("-4".parse::<QuoteId>(), Err(DomainError::InvalidArgument(_))));
        assert!(matches!("".parse::<QuoteId>(), Err(DomainError::InvalidArgument(_))));
    }
}
