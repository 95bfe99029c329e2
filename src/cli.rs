//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use rawhttp_core::{Method, timeout_from_secs};

/// Send a raw HTTP/1.1 request over TCP port 80 and print the response.
///
/// The request is built line by line from the options below. A 301/302
/// response is followed once to the host named in its Location header.
#[derive(Parser, Debug)]
#[command(name = "rawhttp")]
#[command(author, version, about)]
pub struct Args {
    /// Host to connect to [default: ya.ru]
    pub host: Option<String>,

    /// Request method: OPTIONS, GET, HEAD, POST, PUT, DELETE, TRACE, CONNECT [default: GET]
    #[arg(short = 'X', long, value_parser = parse_method)]
    pub method: Option<Method>,

    /// Request target [default: /]
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Connect/send/receive timeout in seconds, fractions allowed [default: 10]
    #[arg(short = 'T', long, value_parser = parse_timeout, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Extra header line `Name: value` (repeatable, sent in order)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Cookie input `key=value` (repeatable, aggregated into one Cookie header
    /// sent after all -H headers)
    #[arg(short = 'b', long = "cookie")]
    pub cookies: Vec<String>,

    /// Write the final response to this file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Do not follow a 301/302 redirect
    #[arg(long)]
    pub no_redirect: bool,

    /// Attempts per network exchange (1-10) [default: 5]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_tries: Option<u32>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_method(raw: &str) -> Result<Method, String> {
    raw.parse().map_err(|e: rawhttp_core::ClientError| e.to_string())
}

fn parse_timeout(raw: &str) -> Result<f64, String> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    timeout_from_secs(seconds).map_err(|e| e.to_string())?;
    Ok(seconds)
}
