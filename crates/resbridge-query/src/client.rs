//! Per-query adapters over the generic executor.
//!
//! Each call opens its own connection, runs exactly one exchange and drops
//! the socket. A `Client` is only configuration, so it is cheap to clone and
//! safe to share between threads.

use resbridge_wire::{f64s_to_le, Cancellation, TransferStats};
use tracing::{debug, info_span};

use crate::array::Array;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{QueryError, Result};
use crate::executor::{execute, execute_upload, Response};
use crate::query::{CaseId, PorosityModel, Query, TimeSteps, Upload};
use crate::records::{self, CaseInfo, GridDimensions, NncConnection, PropertyInfo, TimeStepDate};
use crate::reshape;

#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one query and return the unshaped response.
    pub fn run<C>(&self, query: &Query, cancel: &C) -> Result<Response>
    where
        C: Cancellation + ?Sized,
    {
        let spec = query.spec();
        let _span = info_span!("query", command = spec.name).entered();
        let request = query.request()?;
        let mut connection = Connection::open(&self.config, spec.name)?;
        execute(&mut connection, spec, &request, cancel)
    }

    /// Send `values` for the cells and time steps `upload` names.
    ///
    /// The last dimension of `values` is the time step axis and must match a
    /// selected step list.
    pub fn upload<C>(&self, upload: &Upload, values: &Array<f64>, cancel: &C) -> Result<TransferStats>
    where
        C: Cancellation + ?Sized,
    {
        let spec = upload.spec();
        let _span = info_span!("upload", command = spec.name).entered();
        let header = upload_header(upload, values)?;
        let request = upload.request()?;
        let payload = f64s_to_le(values.data());
        let mut connection = Connection::open(&self.config, spec.name)?;
        execute_upload(&mut connection, spec, &request, &header, &payload, cancel)
    }

    /// `[activeCells, timesteps]` values of one property.
    pub fn active_cell_property<C>(
        &self,
        case: CaseId,
        property: &str,
        porosity: PorosityModel,
        steps: TimeSteps,
        cancel: &C,
    ) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::ActiveCellProperty {
            case,
            property: property.to_string(),
            porosity,
            steps,
        };
        reshape::values_by_step(&self.run(&query, cancel)?)
    }

    /// `[I, J, K, timesteps]` values of one property on one grid.
    pub fn grid_property<C>(
        &self,
        case: CaseId,
        grid: u32,
        property: &str,
        porosity: PorosityModel,
        steps: TimeSteps,
        cancel: &C,
    ) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::GridProperty {
            case,
            grid,
            property: property.to_string(),
            porosity,
            steps,
        };
        reshape::grid_values(&self.run(&query, cancel)?)
    }

    /// `[selectedCells, timesteps]` values of one property.
    pub fn grid_property_for_selected_cells<C>(
        &self,
        case: CaseId,
        property: &str,
        porosity: PorosityModel,
        steps: TimeSteps,
        cancel: &C,
    ) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::GridPropertyForSelectedCells {
            case,
            property: property.to_string(),
            porosity,
            steps,
        };
        reshape::values_by_step(&self.run(&query, cancel)?)
    }

    /// `[activeCells, 3]` cell centers.
    pub fn active_cell_centers<C>(
        &self,
        case: CaseId,
        step: u32,
        porosity: PorosityModel,
        cancel: &C,
    ) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::ActiveCellCenters {
            case,
            step,
            porosity,
        };
        reshape::active_geometry(&self.run(&query, cancel)?, &[3])
    }

    /// `[I, J, K, 3]` cell centers.
    pub fn cell_centers<C>(&self, case: CaseId, grid: u32, step: u32, cancel: &C) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::CellCenters { case, grid, step };
        reshape::grid_geometry(&self.run(&query, cancel)?, &[3])
    }

    /// `[activeCells, 8, 3]` corner coordinates.
    pub fn active_cell_corners<C>(
        &self,
        case: CaseId,
        step: u32,
        porosity: PorosityModel,
        cancel: &C,
    ) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::ActiveCellCorners {
            case,
            step,
            porosity,
        };
        reshape::active_geometry(&self.run(&query, cancel)?, &[8, 3])
    }

    /// `[I, J, K, 8, 3]` corner coordinates.
    pub fn cell_corners<C>(&self, case: CaseId, grid: u32, step: u32, cancel: &C) -> Result<Array<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let query = Query::CellCorners { case, grid, step };
        reshape::grid_geometry(&self.run(&query, cancel)?, &[8, 3])
    }

    /// `[activeCells, columns]` of grid index, IJK, parent and coarsening data.
    pub fn active_cell_info<C>(&self, case: CaseId, porosity: PorosityModel, cancel: &C) -> Result<Array<i32>>
    where
        C: Cancellation + ?Sized,
    {
        reshape::table(&self.run(&Query::ActiveCellInfo { case, porosity }, cancel)?)
    }

    /// `[selectedCells, columns]` of grid index and IJK.
    pub fn selected_cells<C>(&self, case: CaseId, cancel: &C) -> Result<Array<i32>>
    where
        C: Cancellation + ?Sized,
    {
        reshape::table(&self.run(&Query::SelectedCells { case }, cancel)?)
    }

    /// `[boxes, 6]` coarsening bounds.
    pub fn coarsening_info<C>(&self, case: CaseId, cancel: &C) -> Result<Array<i32>>
    where
        C: Cancellation + ?Sized,
    {
        reshape::coarsening_boxes(&self.run(&Query::CoarseningInfo { case }, cancel)?)
    }

    pub fn main_grid_dimensions<C>(&self, case: CaseId, cancel: &C) -> Result<GridDimensions>
    where
        C: Cancellation + ?Sized,
    {
        reshape::grid_dimensions(&self.run(&Query::MainGridDimensions { case }, cancel)?)
    }

    pub fn property_names<C>(
        &self,
        case: CaseId,
        porosity: PorosityModel,
        cancel: &C,
    ) -> Result<Vec<PropertyInfo>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::PropertyNames { case, porosity }, cancel)?;
        decode(&response, PropertyInfo::from_record)
    }

    /// Cases in `group`, or every case.
    pub fn cases<C>(&self, group: Option<i64>, cancel: &C) -> Result<Vec<CaseInfo>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::Cases { group }, cancel)?;
        decode(&response, CaseInfo::from_record)
    }

    /// The case currently active in the viewer, if any.
    pub fn current_case<C>(&self, cancel: &C) -> Result<Option<CaseInfo>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::CurrentCase, cancel)?;
        let cases = decode(&response, CaseInfo::from_record)?;
        Ok(cases.into_iter().next().filter(|case| case.id >= 0))
    }

    pub fn well_names<C>(&self, case: CaseId, cancel: &C) -> Result<Vec<String>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::WellNames { case }, cancel)?;
        decode(&response, records::text)
    }

    pub fn time_step_dates<C>(&self, case: CaseId, cancel: &C) -> Result<Vec<TimeStepDate>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::TimeStepDates { case }, cancel)?;
        decode(&response, TimeStepDate::from_record)
    }

    /// Days since the first time step.
    pub fn time_step_days<C>(&self, case: CaseId, cancel: &C) -> Result<Vec<f64>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::TimeStepDays { case }, cancel)?;
        decode(&response, records::float)
    }

    pub fn nnc_connections<C>(&self, case: CaseId, cancel: &C) -> Result<Vec<NncConnection>>
    where
        C: Cancellation + ?Sized,
    {
        let response = self.run(&Query::NncConnections { case }, cancel)?;
        decode(&response, NncConnection::from_record)
    }

    pub fn set_active_cell_property<C>(
        &self,
        case: CaseId,
        property: &str,
        porosity: PorosityModel,
        steps: TimeSteps,
        values: &Array<f64>,
        cancel: &C,
    ) -> Result<TransferStats>
    where
        C: Cancellation + ?Sized,
    {
        let upload = Upload::ActiveCellProperty {
            case,
            property: property.to_string(),
            porosity,
            steps,
        };
        self.upload(&upload, values, cancel)
    }

    pub fn set_grid_property<C>(
        &self,
        case: CaseId,
        grid: u32,
        property: &str,
        porosity: PorosityModel,
        steps: TimeSteps,
        values: &Array<f64>,
        cancel: &C,
    ) -> Result<TransferStats>
    where
        C: Cancellation + ?Sized,
    {
        let upload = Upload::GridProperty {
            case,
            grid,
            property: property.to_string(),
            porosity,
            steps,
        };
        self.upload(&upload, values, cancel)
    }
}

fn decode<T>(
    response: &Response,
    from_record: fn(&'static str, &resbridge_wire::Record) -> Result<T>,
) -> Result<Vec<T>> {
    response
        .records()
        .iter()
        .map(|record| from_record(response.command, record))
        .collect()
}

/// Header the server expects ahead of uploaded values.
fn upload_header(upload: &Upload, values: &Array<f64>) -> Result<Vec<u64>> {
    let command = upload.spec().name;
    let dims = values.dims();
    let (cells, header): (&[usize], Vec<u64>) = match (upload, dims) {
        (Upload::ActiveCellProperty { .. }, [cells, steps]) => {
            (std::slice::from_ref(cells), vec![*steps as u64])
        }
        (Upload::GridProperty { .. }, [i, j, k, steps]) => {
            (&dims[..3], vec![*i as u64, *j as u64, *k as u64, *steps as u64])
        }
        (Upload::ActiveCellProperty { .. }, _) => {
            return Err(QueryError::shape(
                command,
                format!("values must be [cells, timesteps], got {dims:?}"),
            ))
        }
        (Upload::GridProperty { .. }, _) => {
            return Err(QueryError::shape(
                command,
                format!("values must be [I, J, K, timesteps], got {dims:?}"),
            ))
        }
    };

    let steps = dims[dims.len() - 1];
    if let TimeSteps::Selected(selected) = upload.steps() {
        if selected.len() != steps {
            return Err(QueryError::shape(
                command,
                format!("{} time steps selected but values hold {steps}", selected.len()),
            ));
        }
    }
    let per_step = cells
        .iter()
        .try_fold(8usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| QueryError::shape(command, format!("{dims:?} overflows")))?;

    let mut header = header;
    header.push(per_step as u64);
    debug!(command, ?header, "upload header");
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_upload(steps: TimeSteps) -> Upload {
        Upload::ActiveCellProperty {
            case: CaseId::CURRENT,
            property: "NEWPROP".into(),
            porosity: PorosityModel::Matrix,
            steps,
        }
    }

    #[test]
    fn active_upload_header_is_steps_and_bytes_per_step() {
        let values = Array::new("t", vec![1000, 2], vec![0.0; 2000]).unwrap();
        let header = upload_header(&active_upload(TimeSteps::All), &values).unwrap();
        assert_eq!(header, vec![2, 8000]);
    }

    #[test]
    fn grid_upload_header_carries_dimensions() {
        let upload = Upload::GridProperty {
            case: CaseId(0),
            grid: 0,
            property: "X".into(),
            porosity: PorosityModel::Matrix,
            steps: TimeSteps::Selected(vec![4]),
        };
        let values = Array::new("t", vec![2, 3, 4, 1], vec![0.0; 24]).unwrap();
        assert_eq!(upload_header(&upload, &values).unwrap(), vec![2, 3, 4, 1, 192]);
    }

    #[test]
    fn selected_steps_must_match_values() {
        let values = Array::new("t", vec![10, 2], vec![0.0; 20]).unwrap();
        let err = upload_header(&active_upload(TimeSteps::Selected(vec![1])), &values).unwrap_err();
        assert!(matches!(err, QueryError::Shape { .. }));
    }

    #[test]
    fn wrong_rank_is_rejected() {
        let values = Array::new("t", vec![10], vec![0.0; 10]).unwrap();
        assert!(upload_header(&active_upload(TimeSteps::All), &values).is_err());
    }

    #[test]
    fn client_rejects_remote_hosts() {
        let config = ClientConfig {
            host: "10.0.0.1".into(),
            ..ClientConfig::default()
        };
        let err = Client::new(config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }
}
