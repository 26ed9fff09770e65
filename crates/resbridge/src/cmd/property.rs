use std::fs;

use resbridge_query::{Array, TransferStats};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cmd::{
    client, Context, GridPropertyArgs, PropertyArgs, SetGridPropertyArgs, SetPropertyArgs,
};
use crate::exit::{io_error, query_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_array, print_json, OutputFormat};

/// Values file accepted by the upload commands.
#[derive(Debug, Deserialize)]
struct ValuesFile {
    dims: Vec<usize>,
    data: Vec<f64>,
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    command: &'a str,
    property: &'a str,
    dims: &'a [usize],
    bytes: usize,
    chunks: usize,
}

pub fn active(args: PropertyArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetActiveCellProperty";
    let array = client(ctx, command)?
        .active_cell_property(
            args.case.id(),
            &args.property,
            args.porosity.into(),
            args.time_steps(),
            ctx.cancel.as_ref(),
        )
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &step_labels(&args), ctx.format);
    Ok(SUCCESS)
}

pub fn grid(args: GridPropertyArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetGridProperty";
    let property = &args.property;
    let array = client(ctx, command)?
        .grid_property(
            property.case.id(),
            args.grid,
            &property.property,
            property.porosity.into(),
            property.time_steps(),
            ctx.cancel.as_ref(),
        )
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &step_labels(property), ctx.format);
    Ok(SUCCESS)
}

pub fn selected(args: PropertyArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetGridPropertyForSelectedCells";
    let array = client(ctx, command)?
        .grid_property_for_selected_cells(
            args.case.id(),
            &args.property,
            args.porosity.into(),
            args.time_steps(),
            ctx.cancel.as_ref(),
        )
        .map_err(|err| query_error(command, err))?;
    print_array(command, &array, &step_labels(&args), ctx.format);
    Ok(SUCCESS)
}

pub fn set_active(args: SetPropertyArgs, ctx: &Context) -> CliResult<i32> {
    let command = "SetActiveCellProperty";
    let values = load_values(command, &args)?;
    let property = &args.property;
    let stats = client(ctx, command)?
        .set_active_cell_property(
            property.case.id(),
            &property.property,
            property.porosity.into(),
            property.time_steps(),
            &values,
            ctx.cancel.as_ref(),
        )
        .map_err(|err| query_error(command, err))?;
    report_upload(command, &property.property, &values, stats, ctx.format);
    Ok(SUCCESS)
}

pub fn set_grid(args: SetGridPropertyArgs, ctx: &Context) -> CliResult<i32> {
    let command = "SetGridProperty";
    let values = load_values(command, &args.upload)?;
    let property = &args.upload.property;
    let stats = client(ctx, command)?
        .set_grid_property(
            property.case.id(),
            args.grid,
            &property.property,
            property.porosity.into(),
            property.time_steps(),
            &values,
            ctx.cancel.as_ref(),
        )
        .map_err(|err| query_error(command, err))?;
    report_upload(command, &property.property, &values, stats, ctx.format);
    Ok(SUCCESS)
}

fn load_values(command: &'static str, args: &SetPropertyArgs) -> CliResult<Array<f64>> {
    let path = &args.values;
    let text = fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed to read {}", path.display()), err))?;
    let file: ValuesFile = serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("{} is not a values file: {err}", path.display()),
        )
    })?;
    Array::new(command, file.dims, file.data).map_err(|err| query_error(command, err))
}

fn report_upload(
    command: &str,
    property: &str,
    values: &Array<f64>,
    stats: TransferStats,
    format: OutputFormat,
) {
    info!(command, bytes = stats.bytes, chunks = stats.chunks, "upload delivered");
    match format {
        OutputFormat::Json => print_json(&UploadOutput {
            command,
            property,
            dims: values.dims(),
            bytes: stats.bytes,
            chunks: stats.chunks,
        }),
        OutputFormat::Raw => println!("{}", stats.bytes),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "{command}: sent {} values of {property} ({} bytes in {} chunks)",
            values.len(),
            stats.bytes,
            stats.chunks
        ),
    }
}

fn step_labels(args: &PropertyArgs) -> Vec<String> {
    match &args.steps {
        Some(steps) => steps.iter().map(|s| format!("STEP {s}")).collect(),
        None => Vec::new(),
    }
}
