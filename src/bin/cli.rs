use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser as ClapParser};
use tracing_subscriber::filter::LevelFilter;

use wirefeed::{
    AdapterConfig, ConnectionAdapter, ConnectionError, ConnectionId, EventRecorder,
    RequestAssembler, SinkFactory, format_debug, format_events, format_headers_only, format_json,
};

/// wirefeed CLI: replay a captured HTTP/1.x request stream through the
/// incremental parser.
///
/// Reads raw bytes from a file, --raw string, or stdin, delivers them to one
/// connection in chunks of --chunk-size bytes, and prints every request
/// (pipelined requests included) or the raw event stream.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full HTTP request as a single shell argument.
#[derive(ClapParser)]
#[command(name = "wirefeed-cli", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing raw HTTP requests.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP request string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Deliver the input in chunks of this many bytes (0 = one chunk).
    #[arg(long, default_value = "0")]
    chunk_size: usize,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// JSON file with an adapter configuration; flags below override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of headers allowed per request.
    #[arg(long)]
    max_headers: Option<usize>,

    /// Maximum length of a request line or header line.
    #[arg(long)]
    max_line_len: Option<usize>,

    /// Log every parse event to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output, one request per line
    Json,
    /// Human-readable debug output
    Debug,
    /// Request-line + headers only
    Headers,
    /// Raw parse events as JSON lines
    Events,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        })
        .init();

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading config: {e}");
            process::exit(1);
        }
    };

    let data = match read_input(&cli) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if data.is_empty() {
        eprintln!("Error: empty input");
        process::exit(1);
    }

    // Whatever completed before a parse error is still printed.
    let (output, outcome) = match cli.format {
        OutputFormat::Events => {
            let (recorder, outcome) =
                replay(config, |_: ConnectionId| EventRecorder::new(), &data, cli.chunk_size);
            let output = recorder
                .map(|recorder| format_events(&recorder.coalesced()))
                .unwrap_or_default();
            (output, outcome)
        }
        _ => {
            let (assembler, outcome) =
                replay(config, |_: ConnectionId| RequestAssembler::new(), &data, cli.chunk_size);
            let output = assembler
                .map(|mut assembler| {
                    assembler
                        .take_requests()
                        .iter()
                        .map(|request| match cli.format {
                            OutputFormat::Debug => format_debug(request),
                            OutputFormat::Headers => format_headers_only(request),
                            _ => format_json(request, cli.pretty) + "\n",
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();
            (output, outcome)
        }
    };

    print!("{output}");
    if let Err(e) = outcome {
        eprintln!("Parse error: {e}");
        process::exit(2);
    }
}

/// Deliver `data` to a single connection.
///
/// The sink comes back whenever the connection was bound, alongside the
/// first error the stream produced.
fn replay<F: SinkFactory>(
    config: AdapterConfig,
    factory: F,
    data: &[u8],
    chunk_size: usize,
) -> (Option<F::Sink>, Result<(), ConnectionError>) {
    let id = ConnectionId(0);
    let mut adapter = ConnectionAdapter::new(config, factory);
    if let Err(e) = adapter.on_connect(id) {
        return (None, Err(e));
    }

    let chunk_size = if chunk_size == 0 { data.len().max(1) } else { chunk_size };
    let fed = data
        .chunks(chunk_size)
        .try_for_each(|chunk| adapter.on_bytes(id, chunk).map(drop));

    // A poisoned connection disconnects cleanly, so `fed` carries its error.
    match adapter.on_disconnect(id) {
        Ok(sink) => (Some(sink), fed),
        Err(closed) => (closed.sink, fed.and(Err(closed.error))),
    }
}

fn load_config(cli: &Cli) -> Result<AdapterConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AdapterConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => AdapterConfig::default(),
    };
    if let Some(max) = cli.max_headers {
        config.parser.max_headers_count = max;
    }
    if let Some(max) = cli.max_line_len {
        config.parser.max_line_len = max;
    }
    config.debug_events |= cli.verbose;
    Ok(config)
}

/// Read raw HTTP bytes from --raw, a file, or stdin.
fn read_input(cli: &Cli) -> Result<Vec<u8>, std::io::Error> {
    if let Some(raw) = &cli.raw {
        return Ok(unescape(raw).into_bytes());
    }
    match &cli.file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
