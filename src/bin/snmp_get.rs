//! snmp-get: Retrieve SNMP OID values.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use snmp_engine::Oid;
use snmp_engine::cli::args::{CommonArgs, OutputArgs};
use snmp_engine::cli::hints::parse_oid;
use snmp_engine::cli::output::{OutputContext, write_error, write_stats};

/// Retrieve one or more SNMP OID values with GET (or GETNEXT).
#[derive(Debug, Parser)]
#[command(name = "snmp-get", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Send GETNEXT instead of GET.
    #[arg(short = 'n', long)]
    next: bool,

    /// OIDs to retrieve (dotted notation or well-known names).
    #[arg(required = true, value_name = "OID")]
    oids: Vec<String>,
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

    let oids: Vec<Oid> = match args.oids.iter().map(|s| parse_oid(s)).collect() {
        Ok(oids) => oids,
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
    let result = if args.next {
        client.get_next(&oids).await
    } else {
        client.get(&oids).await
    };
    let elapsed = start.elapsed();

    if args.output.verbose > 0 {
        write_stats(&client.engine().stats());
    }
    client.engine().close().await;

    match result {
        Ok(varbinds) => {
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
            ExitCode::SUCCESS
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}
