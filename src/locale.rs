//! Supported locales and the language selector
//!
//! The locale drives both the answer service request and speech voice
//! selection. The set is closed; selection is never empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A supported language/region code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Hindi
    Hi,
    /// Telugu
    Te,
    /// Kannada
    Kn,
}

impl Locale {
    /// All supported locales, in cycle order
    pub const ALL: [Self; 4] = [Self::En, Self::Hi, Self::Te, Self::Kn];

    /// ISO 639-1 code sent on the wire
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Te => "te",
            Self::Kn => "kn",
        }
    }

    /// Native-script display name, as shown in the language selector
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "\u{939}\u{93f}\u{902}\u{926}\u{940}",
            Self::Te => "\u{c24}\u{c46}\u{c32}\u{c41}\u{c17}\u{c41}",
            Self::Kn => "\u{c95}\u{ca8}\u{ccd}\u{ca8}\u{ca1}",
        }
    }

    /// The next locale in the fixed cycle en -> hi -> te -> kn -> en
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::En => Self::Hi,
            Self::Hi => Self::Te,
            Self::Te => Self::Kn,
            Self::Kn => Self::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "hi" => Ok(Self::Hi),
            "te" => Ok(Self::Te),
            "kn" => Ok(Self::Kn),
            other => Err(Error::InvalidLocale(other.to_string())),
        }
    }
}

/// Holds the active locale and exposes the cycle operation
#[derive(Debug, Clone, Default)]
pub struct LanguageSelector {
    current: Locale,
}

impl LanguageSelector {
    /// Create a selector starting at `locale`
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { current: locale }
    }

    /// The active locale
    #[must_use]
    pub const fn current(&self) -> Locale {
        self.current
    }

    /// Advance to the next locale in the fixed cycle and return it
    pub const fn cycle_next(&mut self) -> Locale {
        self.current = self.current.next();
        self.current
    }

    /// Replace the active locale
    pub const fn set(&mut self, locale: Locale) {
        self.current = locale;
    }

    /// Replace the active locale from a wire code
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocale` if `code` is outside the supported set.
    pub fn set_code(&mut self, code: &str) -> Result<Locale> {
        let locale = code.parse()?;
        self.current = locale;
        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_order_is_fixed() {
        let mut selector = LanguageSelector::new(Locale::En);
        assert_eq!(selector.cycle_next(), Locale::Hi);
        assert_eq!(selector.cycle_next(), Locale::Te);
        assert_eq!(selector.cycle_next(), Locale::Kn);
        assert_eq!(selector.cycle_next(), Locale::En);
    }

    #[test]
    fn test_full_cycles_return_to_start() {
        for start in Locale::ALL {
            let mut selector = LanguageSelector::new(start);
            for _ in 0..4 * 3 {
                selector.cycle_next();
            }
            assert_eq!(selector.current(), start);
        }
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" KN ".parse::<Locale>().unwrap(), Locale::Kn);
        assert!(matches!(
            "fr".parse::<Locale>(),
            Err(Error::InvalidLocale(_))
        ));
    }

    #[test]
    fn test_set_code_rejects_unknown() {
        let mut selector = LanguageSelector::default();
        assert!(selector.set_code("hi").is_ok());
        assert!(selector.set_code("xx").is_err());
        // Failed set leaves the previous selection in place
        assert_eq!(selector.current(), Locale::Hi);
    }
}
