//! snmp-walk: Walk an SNMP subtree with GETNEXT.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use snmp_engine::cli::args::{CommonArgs, OutputArgs};
use snmp_engine::cli::hints::parse_oid;
use snmp_engine::cli::output::{OutputContext, write_error, write_stats};

/// Walk an SNMP subtree.
#[derive(Debug, Parser)]
#[command(name = "snmp-walk", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Stop after this many results.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// OID subtree to walk (dotted notation or well-known name).
    #[arg(value_name = "OID", default_value = "system")]
    oid: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let target = match args.common.target_addr() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let root = match parse_oid(&args.oid) {
        Ok(oid) => oid,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match args.common.connect(target).await {
        Ok(client) => client,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let mut walk = client.walk(root);
    let mut varbinds = Vec::new();
    let mut failure = None;
    while args.limit.is_none_or(|limit| varbinds.len() < limit) {
        match walk.next().await {
            Some(Ok(vb)) => varbinds.push(vb),
            Some(Err(e)) => {
                failure = Some(e);
                break;
            }
            None => break,
        }
    }
    let elapsed = start.elapsed();

    if args.output.verbose > 0 {
        write_stats(&client.engine().stats());
    }
    client.engine().close().await;

    // partial results are still printed before the error
    let ctx = OutputContext {
        format: args.output.format,
        show_hints: !args.output.no_hints,
        force_hex: args.output.hex,
    };
    let timing = args.output.timing.then_some(elapsed);
    if let Err(e) = ctx.write_results(target, args.common.snmp_version, &varbinds, timing) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }

    match failure {
        Some(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}
