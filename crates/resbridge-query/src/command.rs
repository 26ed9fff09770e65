//! Declarative per-command descriptors.
//!
//! Every supported command is one [`CommandSpec`] constant. The generic
//! executor reads the header, sizes the payload and applies the zero-count
//! policy from the descriptor alone.

use resbridge_wire::{CatalogLayout, ElementKind, FieldKind};

use crate::error::{QueryError, Result};

/// What a zero declared element count means for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroCountPolicy {
    /// A valid, empty result.
    Empty,
    /// An error: the requested object does not exist.
    Fail(&'static str),
}

/// Whether the header's byte count covers the whole payload or one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteCountScope {
    Total,
    PerColumn,
}

/// Layout of the server's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The header tuple is the whole answer.
    HeaderOnly { fields: usize },
    /// A header tuple followed by a chunked payload.
    ///
    /// `columns` names the header field counting payload columns (time steps
    /// or table columns); each column is transferred as its own block.
    Block {
        fields: usize,
        byte_count: usize,
        scope: ByteCountScope,
        columns: Option<usize>,
        element: ElementKind,
    },
    /// A `byteCount`-prefixed record list.
    Catalog(CatalogLayout),
    /// No answer: the client writes a header of `fields` values and the payload.
    Upload { fields: usize, element: ElementKind },
}

/// A command and how to read its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub shape: ResponseShape,
    pub zero_count: ZeroCountPolicy,
}

/// Payload geometry derived from a received header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLayout {
    pub total: usize,
    pub columns: usize,
    pub element: ElementKind,
}

impl PayloadLayout {
    /// Bytes in one column.
    pub fn column_len(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.total / self.columns
        }
    }
}

impl CommandSpec {
    /// Size the payload described by `header`.
    ///
    /// Returns `Ok(None)` for shapes without a chunked payload.
    pub fn payload_layout(&self, header: &[u64]) -> Result<Option<PayloadLayout>> {
        let ResponseShape::Block {
            fields,
            byte_count,
            scope,
            columns,
            element,
        } = self.shape
        else {
            return Ok(None);
        };
        if header.len() != fields {
            return Err(QueryError::shape(
                self.name,
                format!("expected {fields} header fields, got {}", header.len()),
            ));
        }

        let declared = to_usize(self.name, header[byte_count])?;
        let column_count = match columns {
            Some(index) => to_usize(self.name, header[index])?,
            None => 1,
        };
        let total = match scope {
            ByteCountScope::Total => declared,
            ByteCountScope::PerColumn => declared.checked_mul(column_count).ok_or_else(|| {
                QueryError::shape(self.name, "declared payload size overflows")
            })?,
        };

        if total % element.size() != 0 {
            return Err(QueryError::shape(
                self.name,
                format!("{total} bytes is not a whole number of {}-byte elements", element.size()),
            ));
        }
        let column_bytes = column_count.checked_mul(element.size()).ok_or_else(|| {
            QueryError::shape(self.name, format!("{column_count} columns overflow"))
        })?;
        if total > 0 && (column_bytes == 0 || total % column_bytes != 0) {
            return Err(QueryError::shape(
                self.name,
                format!("{total} bytes cannot be split into {column_count} equal columns"),
            ));
        }
        Ok(Some(PayloadLayout {
            total,
            columns: column_count,
            element,
        }))
    }
}

fn to_usize(command: &'static str, value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| QueryError::shape(command, format!("header value {value} exceeds address space")))
}

const NO_GRID: &str = "the case or grid does not exist or has no cells";

/// `[timestepCount, byteCount]`, byte count covering all time steps.
pub const GET_ACTIVE_CELL_PROPERTY: CommandSpec = CommandSpec {
    name: "GetActiveCellProperty",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::Total,
        columns: Some(0),
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[I, J, K, timestepCount, byteCount]`, byte count per time step.
///
/// Only the five-field header is understood. Servers that answer with the
/// four-field `[I, J, K, timestepCount]` tuple (and four zeros for no data)
/// do not interoperate with this descriptor.
pub const GET_GRID_PROPERTY: CommandSpec = CommandSpec {
    name: "GetGridProperty",
    shape: ResponseShape::Block {
        fields: 5,
        byte_count: 4,
        scope: ByteCountScope::PerColumn,
        columns: Some(3),
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[timestepCount, byteCount]`, byte count per time step.
pub const GET_GRID_PROPERTY_FOR_SELECTED_CELLS: CommandSpec = CommandSpec {
    name: "GetGridPropertyForSelectedCells",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::PerColumn,
        columns: Some(0),
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[activeCellCount, byteCount]`.
pub const GET_ACTIVE_CELL_CENTERS: CommandSpec = CommandSpec {
    name: "GetActiveCellCenters",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::Total,
        columns: None,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail(NO_GRID),
};

/// `[cellCount, I, J, K, byteCount]`.
pub const GET_CELL_CENTERS: CommandSpec = CommandSpec {
    name: "GetCellCenters",
    shape: ResponseShape::Block {
        fields: 5,
        byte_count: 4,
        scope: ByteCountScope::Total,
        columns: None,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail(NO_GRID),
};

/// `[activeCellCount, byteCount]`.
pub const GET_ACTIVE_CELL_CORNERS: CommandSpec = CommandSpec {
    name: "GetActiveCellCorners",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::Total,
        columns: None,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail(NO_GRID),
};

/// `[cellCount, I, J, K, byteCount]`.
pub const GET_CELL_CORNERS: CommandSpec = CommandSpec {
    name: "GetCellCorners",
    shape: ResponseShape::Block {
        fields: 5,
        byte_count: 4,
        scope: ByteCountScope::Total,
        columns: None,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail(NO_GRID),
};

/// `[columnCount, byteCountPerColumn]`.
pub const GET_ACTIVE_CELL_INFO: CommandSpec = CommandSpec {
    name: "GetActiveCellInfo",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::PerColumn,
        columns: Some(0),
        element: ElementKind::I32,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[columnCount, byteCountPerColumn]`.
pub const GET_SELECTED_CELLS: CommandSpec = CommandSpec {
    name: "GetSelectedCells",
    shape: ResponseShape::Block {
        fields: 2,
        byte_count: 1,
        scope: ByteCountScope::PerColumn,
        columns: Some(0),
        element: ElementKind::I32,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[byteCount]`, six `i32` bounds per coarsening box.
pub const GET_COARSENING_INFO: CommandSpec = CommandSpec {
    name: "GetCoarseningInfo",
    shape: ResponseShape::Block {
        fields: 1,
        byte_count: 0,
        scope: ByteCountScope::Total,
        columns: None,
        element: ElementKind::I32,
    },
    zero_count: ZeroCountPolicy::Empty,
};

/// `[I, J, K]`.
pub const GET_MAIN_GRID_DIMENSIONS: CommandSpec = CommandSpec {
    name: "GetMainGridDimensions",
    shape: ResponseShape::HeaderOnly { fields: 3 },
    zero_count: ZeroCountPolicy::Empty,
};

/// Records of `(name, resultType)`.
pub const GET_PROPERTY_NAMES: CommandSpec = CommandSpec {
    name: "GetPropertyNames",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: &[FieldKind::Text, FieldKind::Text],
    }),
    zero_count: ZeroCountPolicy::Empty,
};

const CASE_RECORD: &[FieldKind] = &[FieldKind::I64, FieldKind::Text, FieldKind::Text, FieldKind::I64];

/// Records of `(caseId, name, type, groupId)`.
pub const GET_CASES: CommandSpec = CommandSpec {
    name: "GetCases",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: CASE_RECORD,
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// One `(caseId, name, type, groupId)` record.
pub const GET_CURRENT_CASE: CommandSpec = CommandSpec {
    name: "GetCurrentCase",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: false,
        record: CASE_RECORD,
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// Records of one well name each.
pub const GET_WELL_NAMES: CommandSpec = CommandSpec {
    name: "GetWellNames",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: &[FieldKind::Text],
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// Records of `(year, month, day, hour, minute, second)`.
pub const GET_TIME_STEP_DATES: CommandSpec = CommandSpec {
    name: "GetTimeStepDates",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: &[FieldKind::I32; 6],
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// Records of one day offset each.
pub const GET_TIME_STEP_DAYS: CommandSpec = CommandSpec {
    name: "GetTimeStepDays",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: &[FieldKind::F64],
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// Records of `(gridA, iA, jA, kA, gridB, iB, jB, kB)`.
pub const GET_NNC_CONNECTIONS: CommandSpec = CommandSpec {
    name: "GetNNCConnections",
    shape: ResponseShape::Catalog(CatalogLayout {
        counted: true,
        record: &[FieldKind::I32; 8],
    }),
    zero_count: ZeroCountPolicy::Empty,
};

/// Client writes `[timestepCount, bytesPerTimestep]` then the values.
pub const SET_ACTIVE_CELL_PROPERTY: CommandSpec = CommandSpec {
    name: "SetActiveCellProperty",
    shape: ResponseShape::Upload {
        fields: 2,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail("nothing to upload"),
};

/// Client writes `[I, J, K, timestepCount, bytesPerTimestep]` then the values.
pub const SET_GRID_PROPERTY: CommandSpec = CommandSpec {
    name: "SetGridProperty",
    shape: ResponseShape::Upload {
        fields: 5,
        element: ElementKind::F64,
    },
    zero_count: ZeroCountPolicy::Fail("nothing to upload"),
};

/// Every supported command.
pub const COMMANDS: &[CommandSpec] = &[
    GET_ACTIVE_CELL_PROPERTY,
    GET_GRID_PROPERTY,
    GET_GRID_PROPERTY_FOR_SELECTED_CELLS,
    GET_ACTIVE_CELL_CENTERS,
    GET_CELL_CENTERS,
    GET_ACTIVE_CELL_CORNERS,
    GET_CELL_CORNERS,
    GET_ACTIVE_CELL_INFO,
    GET_SELECTED_CELLS,
    GET_COARSENING_INFO,
    GET_MAIN_GRID_DIMENSIONS,
    GET_PROPERTY_NAMES,
    GET_CASES,
    GET_CURRENT_CASE,
    GET_WELL_NAMES,
    GET_TIME_STEP_DATES,
    GET_TIME_STEP_DAYS,
    GET_NNC_CONNECTIONS,
    SET_ACTIVE_CELL_PROPERTY,
    SET_GRID_PROPERTY,
];

/// Look up a descriptor by wire name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn names_are_unique_and_findable() {
        let names: HashSet<_> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), COMMANDS.len());
        assert_eq!(find("GetCases"), Some(&GET_CASES));
        assert!(find("GetUnknown").is_none());
    }

    #[test]
    fn geometry_commands_refuse_zero_cells() {
        for spec in [
            GET_ACTIVE_CELL_CENTERS,
            GET_CELL_CENTERS,
            GET_ACTIVE_CELL_CORNERS,
            GET_CELL_CORNERS,
        ] {
            assert!(matches!(spec.zero_count, ZeroCountPolicy::Fail(_)), "{}", spec.name);
        }
        for spec in [GET_ACTIVE_CELL_PROPERTY, GET_GRID_PROPERTY, GET_PROPERTY_NAMES] {
            assert_eq!(spec.zero_count, ZeroCountPolicy::Empty, "{}", spec.name);
        }
    }

    #[test]
    fn total_scope_keeps_declared_bytes() {
        let layout = GET_ACTIVE_CELL_PROPERTY
            .payload_layout(&[2, 16_000])
            .unwrap()
            .unwrap();
        assert_eq!(layout.total, 16_000);
        assert_eq!(layout.columns, 2);
        assert_eq!(layout.column_len(), 8_000);
    }

    #[test]
    fn per_column_scope_multiplies() {
        let layout = GET_GRID_PROPERTY
            .payload_layout(&[10, 10, 5, 3, 4_000])
            .unwrap()
            .unwrap();
        assert_eq!(layout.total, 12_000);
        assert_eq!(layout.column_len(), 4_000);
    }

    #[test]
    fn ragged_payload_is_a_shape_error() {
        let err = GET_ACTIVE_CELL_PROPERTY
            .payload_layout(&[3, 16_000])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = GET_COARSENING_INFO.payload_layout(&[6]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = GET_ACTIVE_CELL_PROPERTY.payload_layout(&[0, 800]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn overflowing_column_count_is_a_shape_error() {
        let err = GET_ACTIVE_CELL_PROPERTY
            .payload_layout(&[1 << 62, 16_000])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = GET_ACTIVE_CELL_INFO
            .payload_layout(&[u64::MAX / 2, 400])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn zero_columns_is_an_empty_payload() {
        let layout = GET_ACTIVE_CELL_INFO.payload_layout(&[0, 400]).unwrap().unwrap();
        assert_eq!(layout.total, 0);
    }

    #[test]
    fn non_block_shapes_have_no_payload() {
        assert!(GET_MAIN_GRID_DIMENSIONS.payload_layout(&[1, 2, 3]).unwrap().is_none());
        assert!(GET_CASES.payload_layout(&[]).unwrap().is_none());
    }
}
