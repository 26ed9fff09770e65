use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use resbridge_query::{CaseId, Client, ClientConfig, PorosityModel, TimeSteps};

use crate::exit::{query_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod catalog;
pub mod doctor;
pub mod geometry;
pub mod property;
pub mod version;

/// Settings shared by every command.
pub struct Context {
    pub config: ClientConfig,
    pub format: OutputFormat,
    pub cancel: Arc<AtomicBool>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a property for every active cell.
    ActiveCellProperty(PropertyArgs),
    /// Fetch a property on the full I x J x K grid.
    GridProperty(GridPropertyArgs),
    /// Fetch a property for the cells selected in the viewer.
    SelectedCellProperty(PropertyArgs),
    /// Upload a property for every active cell.
    SetActiveCellProperty(SetPropertyArgs),
    /// Upload a property on the full I x J x K grid.
    SetGridProperty(SetGridPropertyArgs),
    /// Fetch cell center coordinates.
    CellCenters(GeometryArgs),
    /// Fetch the eight corner coordinates of each cell.
    CellCorners(GeometryArgs),
    /// Fetch grid index, IJK and parent data for active cells.
    ActiveCellInfo(PorosityCaseArgs),
    /// Fetch grid index and IJK for the cells selected in the viewer.
    SelectedCells(CaseArgs),
    /// Fetch coarsening boxes.
    CoarseningInfo(CaseArgs),
    /// Print the dimensions of the main grid.
    MainGridDimensions(CaseArgs),
    /// List result properties.
    PropertyNames(PorosityCaseArgs),
    /// List cases, optionally within one case group.
    Cases(CasesArgs),
    /// Show the case active in the viewer.
    CurrentCase,
    /// List report time step dates.
    TimeStepDates(CaseArgs),
    /// List days elapsed at each time step.
    TimeStepDays(CaseArgs),
    /// List well names.
    WellNames(CaseArgs),
    /// List non-neighbor connections.
    NncConnections(CaseArgs),
    /// Check configuration and server reachability.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::ActiveCellProperty(args) => property::active(args, ctx),
        Command::GridProperty(args) => property::grid(args, ctx),
        Command::SelectedCellProperty(args) => property::selected(args, ctx),
        Command::SetActiveCellProperty(args) => property::set_active(args, ctx),
        Command::SetGridProperty(args) => property::set_grid(args, ctx),
        Command::CellCenters(args) => geometry::centers(args, ctx),
        Command::CellCorners(args) => geometry::corners(args, ctx),
        Command::ActiveCellInfo(args) => geometry::active_cell_info(args, ctx),
        Command::SelectedCells(args) => geometry::selected_cells(args, ctx),
        Command::CoarseningInfo(args) => geometry::coarsening_info(args, ctx),
        Command::MainGridDimensions(args) => geometry::main_grid_dimensions(args, ctx),
        Command::PropertyNames(args) => catalog::property_names(args, ctx),
        Command::Cases(args) => catalog::cases(args, ctx),
        Command::CurrentCase => catalog::current_case(ctx),
        Command::TimeStepDates(args) => catalog::time_step_dates(args, ctx),
        Command::TimeStepDays(args) => catalog::time_step_days(args, ctx),
        Command::WellNames(args) => catalog::well_names(args, ctx),
        Command::NncConnections(args) => catalog::nnc_connections(args, ctx),
        Command::Doctor(args) => doctor::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

pub fn client(ctx: &Context, command: &str) -> CliResult<Client> {
    Client::new(ctx.config.clone()).map_err(|err| query_error(command, err))
}

/// Server address and timeout budgets.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Server host (loopback only).
    #[arg(long, env = "RESBRIDGE_HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,
    /// Server port.
    #[arg(long, env = "RESBRIDGE_PORT", default_value_t = resbridge_transport::DEFAULT_PORT, global = true)]
    pub port: u16,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub connect_timeout: String,
    /// Time allowed for the response header.
    #[arg(long, default_value = "60s", global = true)]
    pub header_timeout: String,
    /// Time allowed for each payload chunk.
    #[arg(long, default_value = "5s", global = true)]
    pub chunk_timeout: String,
    /// Longest wait between cancellation checks.
    #[arg(long, default_value = "100ms", global = true)]
    pub poll_interval: String,
    /// Values per transfer chunk.
    #[arg(long, value_name = "COUNT", global = true)]
    pub block_values: Option<usize>,
}

impl ConnectionArgs {
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: parse_duration(&self.connect_timeout)?,
            header_timeout: parse_duration(&self.header_timeout)?,
            chunk_timeout: parse_duration(&self.chunk_timeout)?,
            poll_interval: parse_duration(&self.poll_interval)?,
            max_block_value_count: self
                .block_values
                .unwrap_or(defaults.max_block_value_count),
        };
        config
            .validate()
            .map_err(|err| query_error("configuration", err))?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Porosity {
    #[default]
    Matrix,
    Fracture,
}

impl From<Porosity> for PorosityModel {
    fn from(value: Porosity) -> Self {
        match value {
            Porosity::Matrix => PorosityModel::Matrix,
            Porosity::Fracture => PorosityModel::Fracture,
        }
    }
}

#[derive(Args, Debug)]
pub struct CaseArgs {
    /// Case id; -1 selects the current case.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub case: i64,
}

impl CaseArgs {
    pub fn id(&self) -> CaseId {
        CaseId(self.case)
    }
}

#[derive(Args, Debug)]
pub struct PorosityCaseArgs {
    #[command(flatten)]
    pub case: CaseArgs,
    /// Porosity model.
    #[arg(long, value_enum, default_value_t)]
    pub porosity: Porosity,
}

#[derive(Args, Debug)]
pub struct PropertyArgs {
    /// Property name.
    pub property: String,
    #[command(flatten)]
    pub case: CaseArgs,
    /// Porosity model.
    #[arg(long, value_enum, default_value_t)]
    pub porosity: Porosity,
    /// Time steps, numbered from 1 (comma-separated). Default: all.
    #[arg(long, value_delimiter = ',')]
    pub steps: Option<Vec<u32>>,
}

impl PropertyArgs {
    pub fn time_steps(&self) -> TimeSteps {
        match &self.steps {
            Some(steps) => TimeSteps::Selected(steps.clone()),
            None => TimeSteps::All,
        }
    }
}

#[derive(Args, Debug)]
pub struct GridPropertyArgs {
    #[command(flatten)]
    pub property: PropertyArgs,
    /// Grid index; 0 is the main grid.
    #[arg(long, default_value_t = 0)]
    pub grid: u32,
}

#[derive(Args, Debug)]
pub struct SetPropertyArgs {
    #[command(flatten)]
    pub property: PropertyArgs,
    /// JSON file holding `{"dims": [...], "data": [...]}` in column-major order.
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,
}

#[derive(Args, Debug)]
pub struct SetGridPropertyArgs {
    #[command(flatten)]
    pub upload: SetPropertyArgs,
    /// Grid index; 0 is the main grid.
    #[arg(long, default_value_t = 0)]
    pub grid: u32,
}

#[derive(Args, Debug)]
pub struct GeometryArgs {
    #[command(flatten)]
    pub case: CaseArgs,
    /// Only active cells, in active-cell order.
    #[arg(long, conflicts_with = "grid")]
    pub active: bool,
    /// Grid index; 0 is the main grid.
    #[arg(long, default_value_t = 0)]
    pub grid: u32,
    /// Time step, numbered from 1.
    #[arg(long, default_value_t = 1)]
    pub step: u32,
    /// Porosity model (active cells only).
    #[arg(long, value_enum, default_value_t)]
    pub porosity: Porosity,
}

#[derive(Args, Debug)]
pub struct CasesArgs {
    /// Only cases in this case group.
    #[arg(long)]
    pub group: Option<i64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Skip the server reachability probe.
    #[arg(long)]
    pub offline: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0ms").is_err());
        assert!(parse_duration("soon").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn steps_default_to_all() {
        let args = PropertyArgs {
            property: "SOIL".into(),
            case: CaseArgs { case: -1 },
            porosity: Porosity::Matrix,
            steps: None,
        };
        assert_eq!(args.time_steps(), TimeSteps::All);
    }

    #[test]
    fn non_loopback_host_is_rejected() {
        let args = ConnectionArgs {
            host: "10.0.0.1".into(),
            port: 40001,
            connect_timeout: "5s".into(),
            header_timeout: "60s".into(),
            chunk_timeout: "5s".into(),
            poll_interval: "100ms".into(),
            block_values: None,
        };
        assert!(args.client_config().is_err());
    }
}
