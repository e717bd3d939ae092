// visits/conditions.rs
use crate::errors::CrmError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const DATE_FMT: &str = "%Y-%m-%d";

/// Comparison names as the backend spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    #[serde(rename = "egal cu")]
    Equals,
    #[serde(rename = "dupa")]
    After,
    #[serde(rename = "inainte de")]
    Before,
    #[serde(rename = "contine")]
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    Text,
    Number,
    Date,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// One server-side filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub column: String,
    pub object_id: String,
    pub operation: Operation,
    pub join_key: Option<Vec<String>>,
    pub value: ConditionValue,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    // Form validation fields the backend still expects on the wire.
    error: bool,
    helper_text: String,
}

impl FilterCondition {
    pub fn new(
        column: &str,
        operation: Operation,
        join_key: Option<Vec<String>>,
        value: ConditionValue,
        kind: ConditionType,
    ) -> Result<Self, CrmError> {
        let cond = Self {
            column: column.to_string(),
            object_id: column.to_string(),
            operation,
            join_key,
            value,
            kind,
            error: false,
            helper_text: String::new(),
        };
        cond.validate()?;
        Ok(cond)
    }

    pub fn validate(&self) -> Result<(), CrmError> {
        if let Some(keys) = &self.join_key {
            if keys.is_empty() {
                return Err(CrmError::InvalidCondition(format!(
                    "{}: join key must not be empty",
                    self.column
                )));
            }
        }

        let consistent = match (&self.kind, &self.value) {
            (_, ConditionValue::Null) => true,
            (ConditionType::Text, ConditionValue::Text(_)) => true,
            (ConditionType::Number, ConditionValue::Number(n)) => n.is_finite(),
            (ConditionType::Boolean, ConditionValue::Bool(_)) => true,
            (ConditionType::Date, ConditionValue::Text(s)) => {
                NaiveDate::parse_from_str(s, DATE_FMT).is_ok()
            }
            _ => false,
        };

        if !consistent {
            return Err(CrmError::InvalidCondition(format!(
                "{}: value {:?} does not fit type {:?}",
                self.column, self.value, self.kind
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRange {
    pub first_day: String,
    pub last_day: String,
}

/// First and last calendar day of `date`'s month, as `YYYY-MM-DD`.
/// `date` is already a local calendar date, so no timezone shift applies.
pub fn month_range(date: NaiveDate) -> MonthRange {
    let first = date - chrono::Duration::days(i64::from(date.day0()));

    let mut last = date;
    while let Some(next) = last.succ_opt() {
        if next.month() != date.month() {
            break;
        }
        last = next;
    }

    MonthRange {
        first_day: first.format(DATE_FMT).to_string(),
        last_day: last.format(DATE_FMT).to_string(),
    }
}

/// Translate the feed filters into the backend condition list.
///
/// A month emits an after/before pair on `data_limita`. A company name
/// that is set, even to "", emits a contains condition through `Companie`.
pub fn build_conditions(
    helper_date: Option<NaiveDate>,
    company_name: Option<&str>,
) -> Result<Vec<FilterCondition>, CrmError> {
    let mut conditions = Vec::new();

    if let Some(date) = helper_date {
        let range = month_range(date);
        conditions.push(FilterCondition::new(
            "data_limita",
            Operation::After,
            None,
            ConditionValue::Text(range.first_day),
            ConditionType::Date,
        )?);
        conditions.push(FilterCondition::new(
            "data_limita",
            Operation::Before,
            None,
            ConditionValue::Text(range.last_day),
            ConditionType::Date,
        )?);
    }

    if let Some(name) = company_name {
        conditions.push(FilterCondition::new(
            "companie_denumire",
            Operation::Contains,
            Some(vec!["Companie".to_string()]),
            ConditionValue::Text(name.to_string()),
            ConditionType::Text,
        )?);
    }

    Ok(conditions)
}
