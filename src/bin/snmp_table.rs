//! snmp-table: Walk a conceptual table and print it row by row.

use std::process::ExitCode;

use clap::Parser;
use snmp_engine::cli::args::{CommonArgs, OutputArgs};
use snmp_engine::cli::hints::parse_oid;
use snmp_engine::cli::output::{OutputContext, write_error, write_stats};

/// Retrieve an SNMP table.
#[derive(Debug, Parser)]
#[command(name = "snmp-table", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Table OID, e.g. `ifTable` or 1.3.6.1.2.1.2.2 (not the entry).
    #[arg(value_name = "TABLE")]
    table: String,
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

    let table_oid = match parse_oid(&args.table) {
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

    let result = client.table(&table_oid).await;
    if args.output.verbose > 0 {
        write_stats(&client.engine().stats());
    }
    client.engine().close().await;

    match result {
        Ok(table) => {
            let ctx = OutputContext {
                format: args.output.format,
                show_hints: !args.output.no_hints,
                force_hex: args.output.hex,
            };
            if let Err(e) = ctx.write_table(&table) {
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
