// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Currency formatting and parsing.
//!
//! Formatting is an explicit value passed to presentation boundaries (the CLI
//! and the demo server); the engine itself only ever sees [`Decimal`] amounts.
//! There is no process-wide locale state.

use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Describes how amounts are rendered and parsed at a presentation boundary.
///
/// The default matches the business's ruble convention: two decimal places,
/// space-grouped thousands, comma decimal separator and a ` р.` suffix.
///
/// # Example
///
/// ```
/// use shift_ledger_rs::CurrencyFormat;
/// use rust_decimal_macros::dec;
///
/// let format = CurrencyFormat::default();
/// assert_eq!(format.format(dec!(1234.5)), "1 234,50 р.");
/// assert_eq!(format.parse("1 234,50 р.").unwrap(), dec!(1234.50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub decimal_places: u32,
    pub group_separator: Option<char>,
    pub decimal_separator: char,
    pub suffix: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            group_separator: Some(' '),
            decimal_separator: ',',
            suffix: " р.".to_string(),
        }
    }
}

impl CurrencyFormat {
    /// A locale-free format: two decimal places, dot separator, no grouping,
    /// no suffix. Convenient for machine-readable output.
    pub fn plain() -> Self {
        Self {
            decimal_places: 2,
            group_separator: None,
            decimal_separator: '.',
            suffix: String::new(),
        }
    }

    /// Renders an amount, rounding to the configured number of decimal
    /// places (round half to even, as [`Decimal`] does).
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp(self.decimal_places);
        let text = format!("{:.*}", self.decimal_places as usize, rounded);
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (unsigned, None),
        };

        let mut out = String::with_capacity(text.len() + 8);
        out.push_str(sign);
        match self.group_separator {
            Some(sep) => {
                for (i, ch) in int_part.chars().enumerate() {
                    if i != 0 && (int_part.len() - i) % 3 == 0 {
                        out.push(sep);
                    }
                    out.push(ch);
                }
            }
            None => out.push_str(int_part),
        }
        if let Some(frac) = frac_part {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out.push_str(&self.suffix);
        out
    }

    /// Parses an amount the way it was rendered: the suffix, grouping and
    /// plain spaces are stripped, the decimal separator is normalized.
    ///
    /// An empty input parses as zero.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] when the remainder is not a
    /// decimal number.
    pub fn parse(&self, input: &str) -> Result<Decimal, LedgerError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let mut cleaned = if self.suffix.is_empty() {
            trimmed.to_string()
        } else {
            trimmed.replace(&self.suffix, "")
        };
        if let Some(sep) = self.group_separator {
            cleaned = cleaned.replace(sep, "");
        }
        cleaned.retain(|ch| ch != ' ');
        let normalized: String = cleaned
            .chars()
            .map(|ch| if ch == self.decimal_separator { '.' } else { ch })
            .collect();

        normalized
            .parse::<Decimal>()
            .map(|amount| amount.round_dp(self.decimal_places))
            .map_err(|_| LedgerError::InvalidAmount)
    }
}
