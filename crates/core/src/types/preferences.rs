//! Customer profile preferences.

use crate::define_choice;

define_choice!(
    /// Preferred interface language.
    Language {
        English => ("en", "English"),
        Spanish => ("es", "Spanish"),
        French => ("fr", "French"),
        German => ("de", "German"),
    }
);

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

define_choice!(
    /// Preferred display currency.
    ///
    /// Display only; charges are always made in USD.
    DisplayCurrency {
        Usd => ("usd", "USD ($)"),
        Eur => ("eur", "EUR (€)"),
        Gbp => ("gbp", "GBP (£)"),
    }
);

impl Default for DisplayCurrency {
    fn default() -> Self {
        Self::Usd
    }
}
