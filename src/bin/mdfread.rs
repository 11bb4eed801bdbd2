//! # mdfread CLI
//!
//! Thin dump tool over the library:
//!
//! ```bash
//! mdfread <file> tables                 # list user tables
//! mdfread <file> schema <table>         # column/type/key listing
//! mdfread <file> dump <table> [limit]   # decode rows
//! mdfread <file> near <table> <lat> <lon> <meters>
//! ```
//!
//! Exit codes: 0 success, 2 file not found, 3 corrupt file, 4 unknown table.

use eyre::{bail, Result, WrapErr};
use std::env;
use std::process::ExitCode;

use mdfread::{Database, Error, SpatialPoint, Value};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn exit_code_for(e: &eyre::Report) -> u8 {
    match e.downcast_ref::<Error>() {
        Some(Error::FileUnavailable { .. }) => 2,
        Some(Error::UnknownTable { .. }) => 4,
        Some(_) => 3,
        None => 1,
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        print_usage();
        return Ok(());
    }
    let path = &args[1];
    let command = args[2].as_str();

    let db = Database::open(path).wrap_err_with(|| format!("failed to open '{}'", path))?;

    match command {
        "tables" => {
            for schema in db.tables()? {
                println!("{}", schema.table.name());
            }
        }
        "schema" => {
            let name = arg(&args, 3, "schema <table>")?;
            let schema = db
                .find_table(name)?
                .ok_or(Error::UnknownTable { name: name.into() })?;
            print!("{}", schema.table.type_schema(schema.cluster.as_ref()));
        }
        "dump" => {
            let name = arg(&args, 3, "dump <table> [limit]")?;
            let limit: usize = args
                .get(4)
                .map(|s| s.parse())
                .transpose()
                .wrap_err("limit must be a number")?
                .unwrap_or(usize::MAX);
            let table = db.datatable(name)?;
            for row in table.rows()?.take(limit) {
                print_row(&row?.into_values());
            }
        }
        "near" => {
            let name = arg(&args, 3, "near <table> <lat> <lon> <meters>")?;
            let lat: f64 = arg(&args, 4, "latitude")?.parse().wrap_err("bad latitude")?;
            let lon: f64 = arg(&args, 5, "longitude")?.parse().wrap_err("bad longitude")?;
            let meters: f64 = arg(&args, 6, "radius")?.parse().wrap_err("bad radius")?;
            let scan = db.spatial_lookup(name, SpatialPoint::new(lat, lon), meters)?;
            for row in scan {
                print_row(&row?.into_values());
            }
        }
        other => bail!("unknown command '{}'", other),
    }
    Ok(())
}

fn arg<'a>(args: &'a [String], i: usize, usage: &str) -> Result<&'a str> {
    match args.get(i) {
        Some(s) => Ok(s),
        None => bail!("usage: mdfread <file> {}", usage),
    }
}

fn print_row(values: &[Value<'_>]) {
    let mut first = true;
    for v in values {
        if !first {
            print!("\t");
        }
        first = false;
        match v {
            Value::Null => print!("NULL"),
            Value::Bool(b) => print!("{}", b),
            Value::TinyInt(v) => print!("{}", v),
            Value::SmallInt(v) => print!("{}", v),
            Value::Int(v) => print!("{}", v),
            Value::BigInt(v) => print!("{}", v),
            Value::Float(v) => print!("{}", v),
            Value::Double(v) => print!("{}", v),
            Value::DateTime(dt) => print!("{}", dt),
            Value::Guid(g) => {
                for b in g {
                    print!("{:02x}", b);
                }
            }
            Value::String(s) => print!("{}", s),
            Value::Bytes(b) => print!("0x{}", hex(b)),
            Value::GeoRef(tag, b) => print!("{:?}[{}]", tag, b.len()),
        }
    }
    println!();
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn print_usage() {
    println!("mdfread - read-only database file inspector");
    println!();
    println!("USAGE:");
    println!("    mdfread <file> tables");
    println!("    mdfread <file> schema <table>");
    println!("    mdfread <file> dump <table> [limit]");
    println!("    mdfread <file> near <table> <lat> <lon> <meters>");
}
