use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{FlowError, Result};

/// Key under which every calculation stores its final total.
pub const TOTAL_PRICE_KEY: &str = "total_price";
/// Generic alias of [`TOTAL_PRICE_KEY`] shared by all calculators.
pub const PRICE_KEY: &str = "price";

/// Parsed value of a single dialog step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Count(u32),
    Measure(f64),
    Choice(String),
    Flag(bool),
    Selection(Vec<String>),
    /// The user explicitly left an optional step empty.
    Blank,
}

impl Answer {
    pub fn choice(code: impl Into<String>) -> Self {
        Self::Choice(code.into())
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Measures and counts both read as a decimal.
    pub fn as_measure(&self) -> Option<f64> {
        match self {
            Self::Measure(v) => Some(*v),
            Self::Count(n) => Some(f64::from(*n)),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&[String]> {
        match self {
            Self::Selection(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// Answers collected so far, keyed by step name. Ordered so that calculations are reproducible.
pub type Answers = BTreeMap<String, Answer>;

/// Typed accessors used by calculators to read their answers with defaults.
pub trait AnswersExt {
    /// Fails with [`FlowError::MissingParameter`] when `key` was never answered.
    fn require(&self, key: &str) -> Result<&Answer>;
    fn require_choice(&self, key: &str) -> Result<&str>;
    fn require_measure(&self, key: &str) -> Result<f64>;
    fn choice_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str;
    fn count_or(&self, key: &str, default: u32) -> u32;
    fn measure(&self, key: &str) -> Option<f64>;
    fn flag_or(&self, key: &str, default: bool) -> bool;
    fn selection(&self, key: &str) -> Vec<String>;
}

impl AnswersExt for Answers {
    fn require(&self, key: &str) -> Result<&Answer> {
        self.get(key)
            .ok_or_else(|| FlowError::MissingParameter(key.to_string()))
    }

    fn require_choice(&self, key: &str) -> Result<&str> {
        self.require(key)?
            .as_choice()
            .ok_or_else(|| FlowError::MissingParameter(key.to_string()))
    }

    fn require_measure(&self, key: &str) -> Result<f64> {
        self.require(key)?
            .as_measure()
            .ok_or_else(|| FlowError::MissingParameter(key.to_string()))
    }

    fn choice_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Answer::as_choice).unwrap_or(default)
    }

    fn count_or(&self, key: &str, default: u32) -> u32 {
        self.get(key).and_then(Answer::as_count).unwrap_or(default)
    }

    fn measure(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Answer::as_measure)
    }

    fn flag_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Answer::as_flag).unwrap_or(default)
    }

    fn selection(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Answer::as_selection)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }
}

/// Price breakdown produced by a calculator.
///
/// The values map holds every input and intermediate sub-total the calculator wants to show,
/// plus the final total under both [`TOTAL_PRICE_KEY`] and [`PRICE_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub calculator: String,
    pub values: Map<String, Value>,
}

impl Calculation {
    /// Builds a calculation from a typed breakdown that serializes to a map with a
    /// `total_price` field.
    pub fn new<T: Serialize>(calculator: impl Into<String>, breakdown: &T) -> Result<Self> {
        let Value::Object(mut values) = serde_json::to_value(breakdown)? else {
            return Err(anyhow::anyhow!("calculation breakdown is not a map").into());
        };
        let total = values
            .get(TOTAL_PRICE_KEY)
            .cloned()
            .ok_or_else(|| FlowError::MissingParameter(TOTAL_PRICE_KEY.to_string()))?;
        values.insert(PRICE_KEY.to_string(), total);

        Ok(Self {
            calculator: calculator.into(),
            values,
        })
    }

    pub fn total_price(&self) -> i64 {
        self.values
            .get(TOTAL_PRICE_KEY)
            .and_then(Value::as_i64)
            .unwrap_or_default()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    /// Reads the breakdown back into the calculator's own type.
    pub fn breakdown<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.values.clone()))?)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Quote {
        property_type: String,
        total_price: i64,
    }

    #[test]
    fn calculation_carries_price_alias() {
        let quote = Quote {
            property_type: "apartment".to_string(),
            total_price: 2820,
        };
        let calculation = Calculation::new("socket", &quote).unwrap();

        assert_eq!(calculation.total_price(), 2820);
        assert_eq!(calculation.values["price"], 2820);
        assert_eq!(calculation.get_str("property_type"), Some("apartment"));
        assert_eq!(calculation.breakdown::<Quote>().unwrap(), quote);
    }

    #[test]
    fn calculation_without_total_is_rejected() {
        #[derive(Serialize)]
        struct NoTotal {
            area: f64,
        }
        let err = Calculation::new("cabling", &NoTotal { area: 10.0 }).unwrap_err();
        assert!(matches!(err, FlowError::MissingParameter(key) if key == "total_price"));
    }

    #[test]
    fn missing_answers_are_reported_by_key() {
        let mut answers = Answers::new();
        answers.insert("area".to_string(), Answer::Measure(42.5));

        assert_eq!(answers.require_measure("area").unwrap(), 42.5);
        let err = answers.require_choice("property_type").unwrap_err();
        assert!(matches!(err, FlowError::MissingParameter(key) if key == "property_type"));
        assert_eq!(answers.choice_or("complexity", "standard"), "standard");
        assert_eq!(answers.count_or("socket_singles", 0), 0);
    }
}
