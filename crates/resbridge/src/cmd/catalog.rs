use serde::Serialize;

use crate::cmd::{client, CaseArgs, CasesArgs, Context, PorosityCaseArgs};
use crate::exit::{query_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_json, print_list, OutputFormat};

#[derive(Serialize)]
struct CurrentCaseOutput<'a, T> {
    command: &'a str,
    case: Option<T>,
}

pub fn property_names(args: PorosityCaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetPropertyNames";
    let names = client(ctx, command)?
        .property_names(args.case.id(), args.porosity.into(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(
        command,
        &names,
        &["NAME", "KIND"],
        |p| vec![p.name.clone(), p.kind.clone()],
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn cases(args: CasesArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetCases";
    let cases = client(ctx, command)?
        .cases(args.group, ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(
        command,
        &cases,
        &["ID", "NAME", "KIND", "GROUP"],
        |c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.kind.clone(),
                c.group_id.to_string(),
            ]
        },
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn current_case(ctx: &Context) -> CliResult<i32> {
    let command = "GetCurrentCase";
    let case = client(ctx, command)?
        .current_case(ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    let found = case.is_some();
    match ctx.format {
        OutputFormat::Json => print_json(&CurrentCaseOutput { command, case }),
        OutputFormat::Raw => {
            if let Some(case) = &case {
                println!("{}", case.id);
            }
        }
        OutputFormat::Table | OutputFormat::Pretty => match &case {
            Some(case) => println!("current case: {} {} ({})", case.id, case.name, case.kind),
            None => println!("no case is active"),
        },
    }
    Ok(if found { SUCCESS } else { DATA_INVALID })
}

pub fn time_step_dates(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetTimeStepDates";
    let dates = client(ctx, command)?
        .time_step_dates(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(
        command,
        &dates,
        &["DATE", "TIME"],
        |d| {
            vec![
                format!("{:04}-{:02}-{:02}", d.year, d.month, d.day),
                format!("{:02}:{:02}:{:02}", d.hour, d.minute, d.second),
            ]
        },
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn time_step_days(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetTimeStepDays";
    let days = client(ctx, command)?
        .time_step_days(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(
        command,
        &days,
        &["DAYS"],
        |d| vec![d.to_string()],
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn well_names(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetWellNames";
    let wells = client(ctx, command)?
        .well_names(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(command, &wells, &["WELL"], |w| vec![w.clone()], ctx.format);
    Ok(SUCCESS)
}

pub fn nnc_connections(args: CaseArgs, ctx: &Context) -> CliResult<i32> {
    let command = "GetNNCConnections";
    let connections = client(ctx, command)?
        .nnc_connections(args.id(), ctx.cancel.as_ref())
        .map_err(|err| query_error(command, err))?;
    print_list(
        command,
        &connections,
        &["GRID A", "CELL A", "GRID B", "CELL B"],
        |n| {
            vec![
                n.grid_a.to_string(),
                ijk(n.cell_a),
                n.grid_b.to_string(),
                ijk(n.cell_b),
            ]
        },
        ctx.format,
    );
    Ok(SUCCESS)
}

fn ijk(cell: [i32; 3]) -> String {
    format!("{},{},{}", cell[0], cell[1], cell[2])
}
