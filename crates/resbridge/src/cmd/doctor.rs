use resbridge_transport::TcpSocket;
use serde::Serialize;

use crate::cmd::{Context, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, ctx: &Context) -> CliResult<i32> {
    let mut checks = vec![config_check(ctx)];
    checks.push(if args.offline {
        CheckResult {
            name: "server_reachable".to_string(),
            status: CheckStatus::Skip,
            detail: "--offline".to_string(),
        }
    } else {
        server_check(ctx)
    });
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, ctx.format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn config_check(ctx: &Context) -> CheckResult {
    let config = &ctx.config;
    match config.validate() {
        Ok(endpoint) => CheckResult {
            name: "config".to_string(),
            status: CheckStatus::Pass,
            detail: format!(
                "{} header={:?} chunk={:?} block={} values",
                endpoint.addr(),
                config.header_timeout,
                config.chunk_timeout,
                config.max_block_value_count
            ),
        },
        Err(err) => CheckResult {
            name: "config".to_string(),
            status: CheckStatus::Fail,
            detail: err.to_string(),
        },
    }
}

fn server_check(ctx: &Context) -> CheckResult {
    let name = "server_reachable".to_string();
    let endpoint = match ctx.config.validate() {
        Ok(endpoint) => endpoint,
        Err(_) => {
            return CheckResult {
                name,
                status: CheckStatus::Skip,
                detail: "configuration invalid".to_string(),
            }
        }
    };

    match TcpSocket::connect(&endpoint, ctx.config.connect_timeout) {
        Ok(_) => CheckResult {
            name,
            status: CheckStatus::Pass,
            detail: format!("connected to {}", endpoint.addr()),
        },
        Err(err) => CheckResult {
            name,
            status: CheckStatus::Fail,
            detail: format!("{}: {err}", endpoint.addr()),
        },
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = vec!["cli"];
    if cfg!(feature = "async") {
        features.push("async");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("resbridge doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => println!("{}", output.overall),
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}
