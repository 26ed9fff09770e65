//! Typed query variants.
//!
//! Every optional argument is explicit in the variant, so the wire request is
//! fully determined before anything is encoded.

use std::fmt;
use std::str::FromStr;

use resbridge_wire::Request;
use serde::Serialize;

use crate::command::{self, CommandSpec};
use crate::error::{QueryError, Result};

/// Server-side case identifier. `-1` selects the current case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CaseId(pub i64);

impl CaseId {
    pub const CURRENT: CaseId = CaseId(-1);
}

impl Default for CaseId {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dual-porosity model selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum PorosityModel {
    #[default]
    Matrix,
    Fracture,
}

impl PorosityModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            PorosityModel::Matrix => "Matrix",
            PorosityModel::Fracture => "Fracture",
        }
    }
}

impl fmt::Display for PorosityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PorosityModel {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "matrix" => Ok(PorosityModel::Matrix),
            "fracture" => Ok(PorosityModel::Fracture),
            _ => Err(QueryError::InvalidArgument(format!(
                "porosity model must be Matrix or Fracture, got {s:?}"
            ))),
        }
    }
}

/// Time steps to fetch, numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum TimeSteps {
    #[default]
    All,
    Selected(Vec<u32>),
}

impl TimeSteps {
    /// Zero-based wire indices; empty for `All`.
    pub fn wire_indices(&self) -> Result<Vec<u32>> {
        match self {
            TimeSteps::All => Ok(Vec::new()),
            TimeSteps::Selected(steps) => {
                if steps.is_empty() {
                    return Err(QueryError::InvalidArgument(
                        "time step selection is empty".into(),
                    ));
                }
                steps.iter().map(|step| zero_based(*step)).collect()
            }
        }
    }
}

fn zero_based(step: u32) -> Result<u32> {
    step.checked_sub(1)
        .ok_or_else(|| QueryError::InvalidArgument("time steps are numbered from 1".into()))
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(QueryError::InvalidArgument(format!(
            "{what} {name:?} must be a single non-empty word"
        )));
    }
    Ok(())
}

/// One read-direction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Query {
    /// Property values for every active cell, one column per time step.
    ActiveCellProperty {
        case: CaseId,
        property: String,
        porosity: PorosityModel,
        steps: TimeSteps,
    },
    /// Property values on the full `I × J × K` grid, one block per time step.
    GridProperty {
        case: CaseId,
        grid: u32,
        property: String,
        porosity: PorosityModel,
        steps: TimeSteps,
    },
    /// Property values for the cells selected in the viewer.
    GridPropertyForSelectedCells {
        case: CaseId,
        property: String,
        porosity: PorosityModel,
        steps: TimeSteps,
    },
    ActiveCellCenters {
        case: CaseId,
        step: u32,
        porosity: PorosityModel,
    },
    CellCenters {
        case: CaseId,
        grid: u32,
        step: u32,
    },
    ActiveCellCorners {
        case: CaseId,
        step: u32,
        porosity: PorosityModel,
    },
    CellCorners {
        case: CaseId,
        grid: u32,
        step: u32,
    },
    ActiveCellInfo {
        case: CaseId,
        porosity: PorosityModel,
    },
    SelectedCells {
        case: CaseId,
    },
    CoarseningInfo {
        case: CaseId,
    },
    MainGridDimensions {
        case: CaseId,
    },
    PropertyNames {
        case: CaseId,
        porosity: PorosityModel,
    },
    /// Cases in a case group; `None` lists every case.
    Cases {
        group: Option<i64>,
    },
    CurrentCase,
    WellNames {
        case: CaseId,
    },
    TimeStepDates {
        case: CaseId,
    },
    TimeStepDays {
        case: CaseId,
    },
    NncConnections {
        case: CaseId,
    },
}

impl Query {
    pub fn spec(&self) -> &'static CommandSpec {
        match self {
            Query::ActiveCellProperty { .. } => &command::GET_ACTIVE_CELL_PROPERTY,
            Query::GridProperty { .. } => &command::GET_GRID_PROPERTY,
            Query::GridPropertyForSelectedCells { .. } => {
                &command::GET_GRID_PROPERTY_FOR_SELECTED_CELLS
            }
            Query::ActiveCellCenters { .. } => &command::GET_ACTIVE_CELL_CENTERS,
            Query::CellCenters { .. } => &command::GET_CELL_CENTERS,
            Query::ActiveCellCorners { .. } => &command::GET_ACTIVE_CELL_CORNERS,
            Query::CellCorners { .. } => &command::GET_CELL_CORNERS,
            Query::ActiveCellInfo { .. } => &command::GET_ACTIVE_CELL_INFO,
            Query::SelectedCells { .. } => &command::GET_SELECTED_CELLS,
            Query::CoarseningInfo { .. } => &command::GET_COARSENING_INFO,
            Query::MainGridDimensions { .. } => &command::GET_MAIN_GRID_DIMENSIONS,
            Query::PropertyNames { .. } => &command::GET_PROPERTY_NAMES,
            Query::Cases { .. } => &command::GET_CASES,
            Query::CurrentCase => &command::GET_CURRENT_CASE,
            Query::WellNames { .. } => &command::GET_WELL_NAMES,
            Query::TimeStepDates { .. } => &command::GET_TIME_STEP_DATES,
            Query::TimeStepDays { .. } => &command::GET_TIME_STEP_DAYS,
            Query::NncConnections { .. } => &command::GET_NNC_CONNECTIONS,
        }
    }

    /// Build the wire request. Time steps are converted to zero-based indices.
    pub fn request(&self) -> Result<Request> {
        let request = Request::new(self.spec().name);
        let request = match self {
            Query::ActiveCellProperty {
                case,
                property,
                porosity,
                steps,
            }
            | Query::GridPropertyForSelectedCells {
                case,
                property,
                porosity,
                steps,
            } => {
                check_name("property", property)?;
                with_steps(request.arg(case).arg(property).arg(porosity), steps)?
            }
            Query::GridProperty {
                case,
                grid,
                property,
                porosity,
                steps,
            } => {
                check_name("property", property)?;
                with_steps(
                    request.arg(case).arg(grid).arg(property).arg(porosity),
                    steps,
                )?
            }
            Query::ActiveCellCenters {
                case,
                step,
                porosity,
            }
            | Query::ActiveCellCorners {
                case,
                step,
                porosity,
            } => request.arg(case).arg(zero_based(*step)?).arg(porosity),
            Query::CellCenters { case, grid, step } | Query::CellCorners { case, grid, step } => {
                request.arg(case).arg(grid).arg(zero_based(*step)?)
            }
            Query::ActiveCellInfo { case, porosity } | Query::PropertyNames { case, porosity } => {
                request.arg(case).arg(porosity)
            }
            Query::SelectedCells { case }
            | Query::CoarseningInfo { case }
            | Query::MainGridDimensions { case }
            | Query::WellNames { case }
            | Query::TimeStepDates { case }
            | Query::TimeStepDays { case }
            | Query::NncConnections { case } => request.arg(case),
            Query::Cases { group } => request.arg(group.unwrap_or(-1)),
            Query::CurrentCase => request,
        };
        Ok(request)
    }
}

fn with_steps(mut request: Request, steps: &TimeSteps) -> Result<Request> {
    for index in steps.wire_indices()? {
        request = request.arg(index);
    }
    Ok(request)
}

/// One write-direction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Upload {
    /// Values for every active cell, one column per time step.
    ActiveCellProperty {
        case: CaseId,
        property: String,
        porosity: PorosityModel,
        steps: TimeSteps,
    },
    /// Values on the full `I × J × K` grid, one block per time step.
    GridProperty {
        case: CaseId,
        grid: u32,
        property: String,
        porosity: PorosityModel,
        steps: TimeSteps,
    },
}

impl Upload {
    pub fn spec(&self) -> &'static CommandSpec {
        match self {
            Upload::ActiveCellProperty { .. } => &command::SET_ACTIVE_CELL_PROPERTY,
            Upload::GridProperty { .. } => &command::SET_GRID_PROPERTY,
        }
    }

    pub fn steps(&self) -> &TimeSteps {
        match self {
            Upload::ActiveCellProperty { steps, .. } | Upload::GridProperty { steps, .. } => steps,
        }
    }

    pub fn request(&self) -> Result<Request> {
        let request = Request::new(self.spec().name);
        match self {
            Upload::ActiveCellProperty {
                case,
                property,
                porosity,
                steps,
            } => {
                check_name("property", property)?;
                with_steps(request.arg(case).arg(property).arg(porosity), steps)
            }
            Upload::GridProperty {
                case,
                grid,
                property,
                porosity,
                steps,
            } => {
                check_name("property", property)?;
                with_steps(
                    request.arg(case).arg(grid).arg(property).arg(porosity),
                    steps,
                )
            }
        }
    }
}
