use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A respondent's verified email address, normalised to lower case with
/// surrounding whitespace removed.
///
/// Normalisation happens at parse time so every copy of an address in the
/// system compares equal; this is the sole deduplication key, and a
/// respondent must not be able to dodge the one-response limit by altering
/// the casing of their address.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("'{0}' is not a valid email address")]
    Invalid(String),
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase();
        let valid = match normalised.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalised.contains(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(normalised))
        } else {
            Err(EmailError::Invalid(s.to_string()))
        }
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl From<Email> for Bson {
    fn from(email: Email) -> Self {
        to_bson(&email).expect("Serialisation is infallible")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_whitespace() {
        let email: Email = "  Jo.Bloggs@Example.COM ".parse().unwrap();
        assert_eq!(email.as_str(), "jo.bloggs@example.com");
    }

    #[test]
    fn differently_cased_addresses_compare_equal() {
        let a: Email = "a@x.com".parse().unwrap();
        let b: Email = "A@X.Com".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Email>().is_err());
        assert!("no-at-sign".parse::<Email>().is_err());
        assert!("@missing-local".parse::<Email>().is_err());
        assert!("missing-domain@".parse::<Email>().is_err());
        assert!("two@at@signs".parse::<Email>().is_err());
        assert!("spaces in@local.com".parse::<Email>().is_err());
    }
}
