//! Normalisation of OneSphere `/metrics` payloads.
//!
//! A payload looks like `{"total": 2, "members": [{"values": [{"value": 10.5}]}, ...]}`.
//! Only the first value of each member is meaningful for the cost metrics the
//! skill reads.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MetricShapeError {
    #[error("metrics payload is not a JSON object")]
    NotAnObject,
    #[error("metrics payload `total` is not a record count: {0}")]
    InvalidTotal(String),
    #[error("metrics payload `members` is not a list")]
    InvalidMembers,
    #[error("metrics payload declares {0} records but has no `members`")]
    MissingMembers(u64),
    #[error("metrics payload has neither `total` nor `members`")]
    MissingRecords,
    #[error("metrics member values sum beyond the representable cost range")]
    CostOverflow,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricData {
    declared_total: Option<u64>,
    member_values: Vec<Option<Decimal>>,
}

impl MetricData {
    pub fn from_value(payload: &Value) -> Result<Self, MetricShapeError> {
        let object = payload.as_object().ok_or(MetricShapeError::NotAnObject)?;

        let declared_total = match object.get("total") {
            None | Some(Value::Null) => None,
            Some(total) => Some(parse_total(total)?),
        };

        let member_values = match object.get("members") {
            Some(Value::Array(members)) => members.iter().map(first_member_value).collect(),
            Some(_) => return Err(MetricShapeError::InvalidMembers),
            None => match declared_total {
                Some(0) => Vec::new(),
                Some(total) => return Err(MetricShapeError::MissingMembers(total)),
                None => return Err(MetricShapeError::MissingRecords),
            },
        };

        Ok(Self { declared_total, member_values })
    }

    pub fn record_count(&self) -> usize {
        self.member_values.len()
    }

    /// Sums the first value of every member. Malformed members count as zero.
    pub fn cost(&self) -> Result<Decimal, MetricShapeError> {
        if let Some(total) = self.declared_total {
            if total != self.member_values.len() as u64 {
                debug!(
                    event_name = "metrics.total_mismatch",
                    declared_total = total,
                    member_count = self.member_values.len(),
                    "metrics total does not match member count"
                );
            }
        }

        self.member_values.iter().enumerate().try_fold(Decimal::ZERO, |sum, (index, value)| {
            let value = value.unwrap_or_else(|| {
                debug!(
                    event_name = "metrics.member_malformed",
                    member_index = index,
                    "metrics member has no numeric first value, counting it as zero"
                );
                Decimal::ZERO
            });
            sum.checked_add(value).ok_or_else(|| {
                debug!(
                    event_name = "metrics.cost_overflow",
                    member_index = index,
                    "metrics cost exceeds the representable range"
                );
                MetricShapeError::CostOverflow
            })
        })
    }
}

fn parse_total(total: &Value) -> Result<u64, MetricShapeError> {
    match total {
        Value::Number(number) => {
            number.as_u64().ok_or_else(|| MetricShapeError::InvalidTotal(number.to_string()))
        }
        Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| MetricShapeError::InvalidTotal(text.clone())),
        other => Err(MetricShapeError::InvalidTotal(other.to_string())),
    }
}

fn first_member_value(member: &Value) -> Option<Decimal> {
    let value = member.get("values")?.as_array()?.first()?.get("value")?;
    match value {
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
}
