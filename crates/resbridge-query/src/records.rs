//! Typed catalog records.

use resbridge_wire::Record;
use serde::Serialize;

use crate::error::{QueryError, Result};

/// A result property and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyInfo {
    pub name: String,
    /// `DynamicNative`, `StaticNative`, `Generated`, `Input`, ...
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseInfo {
    pub id: i64,
    pub name: String,
    pub kind: String,
    /// `-1` when the case belongs to no group.
    pub group_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeStepDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

/// A non-neighbor connection between two cells, in zero-based IJK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NncConnection {
    pub grid_a: i32,
    pub cell_a: [i32; 3],
    pub grid_b: i32,
    pub cell_b: [i32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridDimensions {
    pub i: u64,
    pub j: u64,
    pub k: u64,
}

impl GridDimensions {
    pub fn cell_count(&self) -> u64 {
        self.i.saturating_mul(self.j).saturating_mul(self.k)
    }
}

fn field<T>(command: &'static str, value: Option<T>, index: usize) -> Result<T> {
    value.ok_or_else(|| QueryError::shape(command, format!("record field {index} has the wrong type")))
}

impl PropertyInfo {
    pub(crate) fn from_record(command: &'static str, record: &Record) -> Result<Self> {
        Ok(Self {
            name: field(command, record.text(0), 0)?.to_string(),
            kind: field(command, record.text(1), 1)?.to_string(),
        })
    }
}

impl CaseInfo {
    pub(crate) fn from_record(command: &'static str, record: &Record) -> Result<Self> {
        Ok(Self {
            id: field(command, record.i64(0), 0)?,
            name: field(command, record.text(1), 1)?.to_string(),
            kind: field(command, record.text(2), 2)?.to_string(),
            group_id: field(command, record.i64(3), 3)?,
        })
    }
}

impl TimeStepDate {
    pub(crate) fn from_record(command: &'static str, record: &Record) -> Result<Self> {
        let v = |i: usize| field(command, record.i32(i), i);
        Ok(Self {
            year: v(0)?,
            month: v(1)?,
            day: v(2)?,
            hour: v(3)?,
            minute: v(4)?,
            second: v(5)?,
        })
    }
}

impl NncConnection {
    pub(crate) fn from_record(command: &'static str, record: &Record) -> Result<Self> {
        let v = |i: usize| field(command, record.i32(i), i);
        Ok(Self {
            grid_a: v(0)?,
            cell_a: [v(1)?, v(2)?, v(3)?],
            grid_b: v(4)?,
            cell_b: [v(5)?, v(6)?, v(7)?],
        })
    }
}

pub(crate) fn text(command: &'static str, record: &Record) -> Result<String> {
    field(command, record.text(0), 0).map(str::to_string)
}

pub(crate) fn float(command: &'static str, record: &Record) -> Result<f64> {
    field(command, record.f64(0), 0)
}
