//! Macro for implementing Display and FromStr for name-keyed enums
//!
//! Metric kinds, directory modes and upstream schemes all travel as plain
//! strings (environment variables, URL path segments, JSON). This macro keeps
//! the string form of each variant in one place.
//!
//! # Example
//!
//! ```rust
//! use agentmetrics_domain::impl_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Listing,
//!     Collecting,
//! }
//!
//! impl_name_conversions!(Phase {
//!     Listing => "listing",
//!     Collecting => "collecting",
//! });
//!
//! assert_eq!(Phase::Listing.to_string(), "listing");
//! assert_eq!("COLLECTING".parse::<Phase>().unwrap(), Phase::Collecting);
//! ```

/// Implements `Display`, `FromStr` and an `as_str` accessor for enums whose
/// variants map one-to-one onto lowercase names.
///
/// Parsing is case-insensitive; the rendered form is always the literal
/// given in the mapping.
#[macro_export]
macro_rules! impl_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Transport {
        Plain,
        Tls,
    }

    impl_name_conversions!(Transport {
        Plain => "plain",
        Tls => "tls",
    });

    #[test]
    fn renders_canonical_name() {
        assert_eq!(Transport::Plain.to_string(), "plain");
        assert_eq!(Transport::Tls.as_str(), "tls");
    }

    #[test]
    fn parses_ignoring_case() {
        assert_eq!(Transport::from_str("TLS").unwrap(), Transport::Tls);
        assert_eq!(Transport::from_str("Plain").unwrap(), Transport::Plain);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = Transport::from_str("quic").unwrap_err();
        assert!(err.contains("Invalid Transport: quic"));
        assert!(Transport::from_str("").is_err());
    }
}
