use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An inclusive date range. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, CoreError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CoreError::InvalidInput(
                    "window".to_string(),
                    format!("start {s} is after end {e}"),
                ));
            }
        }
        Ok(Self { start, end })
    }

    /// The unbounded window.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn until(end: NaiveDate) -> Self {
        Self { start: None, end: Some(end) }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    /// Narrows the window so that it ends no later than `date`.
    pub fn clamp_end(&self, date: NaiveDate) -> Self {
        let end = match self.end {
            Some(e) if e <= date => e,
            _ => date,
        };
        Self { start: self.start, end: Some(end) }
    }
}

/// A value observed on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

impl DatedValue {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

fn check_strictly_increasing(symbol: &str, points: &[DatedValue]) -> Result<(), CoreError> {
    for pair in points.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(CoreError::NonMonotonicDates {
                symbol: symbol.to_string(),
                date: pair[1].date,
            });
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    points: Vec<DatedValue>,
}

/// Prices (or NAV values) of one instrument, strictly increasing by date, all positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct PriceSeries {
    symbol: String,
    points: Vec<DatedValue>,
}

impl TryFrom<RawSeries> for PriceSeries {
    type Error = CoreError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        PriceSeries::new(raw.symbol, raw.points)
    }
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<DatedValue>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        check_strictly_increasing(&symbol, &points)?;
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite() || p.value <= 0.0) {
            return Err(CoreError::InvalidValue {
                symbol,
                date: bad.date,
                value: bad.value,
            });
        }
        Ok(Self { symbol, points })
    }

    /// Builds a series from parallel date and value slices.
    pub fn from_pairs(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        values: &[f64],
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if dates.len() != values.len() {
            return Err(CoreError::InvalidInput(
                symbol,
                format!("{} dates but {} values", dates.len(), values.len()),
            ));
        }
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, &value)| DatedValue { date, value })
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[DatedValue] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn last(&self) -> Option<&DatedValue> {
        self.points.last()
    }

    /// The latest observation dated on or before `date`.
    pub fn value_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].value)
    }

    pub fn within(&self, window: &DateWindow) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| window.contains(p.date))
                .copied()
                .collect(),
        }
    }

    /// Keeps only the observations dated on one of `dates`.
    pub fn on_dates(&self, dates: &BTreeSet<NaiveDate>) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| dates.contains(&p.date))
                .copied()
                .collect(),
        }
    }

    /// Simple periodic returns `(v[i] - v[i-1]) / v[i-1]`, dated at the end of each period.
    pub fn returns(&self) -> ReturnSeries {
        let points = self
            .points
            .windows(2)
            .map(|w| DatedValue {
                date: w[1].date,
                value: (w[1].value - w[0].value) / w[0].value,
            })
            .collect();
        ReturnSeries {
            symbol: self.symbol.clone(),
            points,
        }
    }
}

/// Periodic returns of one instrument, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct ReturnSeries {
    symbol: String,
    points: Vec<DatedValue>,
}

impl TryFrom<RawSeries> for ReturnSeries {
    type Error = CoreError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        ReturnSeries::new(raw.symbol, raw.points)
    }
}

impl ReturnSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<DatedValue>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        check_strictly_increasing(&symbol, &points)?;
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(CoreError::InvalidValue {
                symbol,
                date: bad.date,
                value: bad.value,
            });
        }
        Ok(Self { symbol, points })
    }

    pub fn from_pairs(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        values: &[f64],
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if dates.len() != values.len() {
            return Err(CoreError::InvalidInput(
                symbol,
                format!("{} dates but {} values", dates.len(), values.len()),
            ));
        }
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, &value)| DatedValue { date, value })
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[DatedValue] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn within(&self, window: &DateWindow) -> ReturnSeries {
        ReturnSeries {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| window.contains(p.date))
                .copied()
                .collect(),
        }
    }
}
