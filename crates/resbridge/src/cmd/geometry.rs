use resbridge_query::GridDimensions;
use serde::Serialize;

use crate::cmd::{client, CaseArgs, Context, GeometryArgs, PorosityCaseArgs};
use crate::exit::{query_error, CliResult, SUCCESS};
use crate::output::{print_array, print_json, OutputFormat};

const XYZ: [&str; 3] = ["X", "Y", "Z"];
const CELL_INFO: [&str; 9] = [
    "GRID", "I", "J", "K", "PARENT", "PI", "PJ", "PK", "COARSE BOX",
];
const SELECTED_CELL: [&str; 4] = ["GRID", "I", "J", "K"];
const COARSENING_BOX: [&str; 6] = ["I1", "I2", "J1", "J2", "K1", "K2"];

#[derive(Serialize)]
struct DimensionsOutput<'a> {
    command: &'a str,
    #[serde(flatten)]
    dims: GridDimensions,
    cell_count: u64,
}

pub fn centers(args: GeometryArgs, ctx: &Context) -> CliResult<i32> {
    let client = client(ctx, "GetCellCenters")?;
    let cancel = ctx.cancel.as_ref();
    let (command, result) = if args.active {
        let porosity = args.porosity.into();
        (
            "GetActiveCellCenters",
            client.active_cell_centers(args.case.id(), args.step, porosity, cancel),
        )
    } else {
        (
            "GetCellCenters",
            client.cell_centers(args.case.id(), args.grid, args.step, cancel),
        )
    };
    let array = result.map_err(|err| query_error(command, err))?;
    print_array(command, &array, &labels(&XYZ), ctx.format);
    Ok(SUCCESS)
}

pub fn corners(args: GeometryArgs, ctx: &Context) -> CliResult<i32> {
    let client = client(ctx, "GetCellCorners")?;
    let cancel = ctx.cancel.as_ref();
    let (command, result) = if args.active {
        let porosity = args.porosity.into();
        (
            "GetActiveCellCorners",
            client.active_cell_corners(args.case.id(), args.step, porosity, cancel),
        )
    } else {
        (
            "GetCellCorners",
            client.cell_corners(args.case.id(), args.grid, args.step, cancel),
        )
    };
    let array = result.map_err(|err| query_error(command, err))?;
    print_array(command, &array, &labels(&XYZ), ctx.format);
    Ok(SUCCESS)
}

pub fn active_cell_info(args: PorosityCaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetActiveCellInfo";
    let array = client(ctx, command)?
        .active_cell_info(args.case.id(), args.porosity.into(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &labels(&CELL_INFO), ctx.format);
    Ok(SUCCESS)
}

pub fn selected_cells(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetSelectedCells";
    let array = client(ctx, command)?
        .selected_cells(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &labels(&SELECTED_CELL), ctx.format);
    Ok(SUCCESS)
}

pub fn coarsening_info(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetCoarseningInfo";
    let array = client(ctx, command)?
        .coarsening_info(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &labels(&COARSENING_BOX), ctx.format);
    Ok(SUCCESS)
}

pub fn main_grid_dimensions(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetMainGridDimensions";
    let dims = client(ctx, command)?
        .main_grid_dimensions(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    match ctx.format {
        OutputFormat::Json => print_json(&DimensionsOutput {
            command,
            dims,
            cell_count: dims.cell_count(),
        }),
        OutputFormat::Raw => println!("{} {} {}", dims.i, dims.j, dims.k),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "main grid: {} x {} x {} ({} cells)",
            dims.i,
            dims.j,
            dims.k,
            dims.cell_count()
        ),
    }
    Ok(SUCCESS)
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
