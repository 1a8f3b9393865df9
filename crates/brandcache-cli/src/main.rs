//! brandcache: rebuild the brand cache from feed files and query it.
//!
//! Every invocation runs one full rebuild (authority terms from a JSON-lines
//! file, curated records from a JSON array file) and then answers the
//! requested command from the fresh snapshot.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use brandcache_core::{
    BrandCache, BrandService, CacheConfig, JsonLinesAuthorityFeed, JsonOverrideFeed, NoOverrides,
    OverrideFeed, RebuildReport, write_json_array, write_json_lines,
};
use brandcache_error::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit code for a `get` whose identifier is not cached.
const EXIT_NOT_FOUND: i32 = 7;
const EXIT_USAGE: i32 = 2;

fn main() {
    let exit_code = run_cli(std::env::args_os());
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run_cli<I>(os_args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_cli_with(os_args, |key| std::env::var(key).ok(), &mut out)
}

fn run_cli_with<I, E, W>(os_args: I, env: E, out: &mut W) -> i32
where
    I: IntoIterator<Item = OsString>,
    E: Fn(&str) -> Option<String>,
    W: Write,
{
    let raw: Vec<String> = os_args
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let tail = if raw.len() > 1 { &raw[1..] } else { &[] };

    if tail.is_empty() || tail.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return 0;
    }

    let mut config = CacheConfig::default();
    if let Err(err) = config.apply_env(env) {
        return report_error(&err);
    }

    let invocation = match parse_args(tail, config) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("error: {msg}");
            return EXIT_USAGE;
        }
    };

    init_logging(invocation.verbose);
    match execute(invocation, out) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    }
}

fn report_error(err: &brandcache_error::BrandCacheError) -> i32 {
    eprintln!("error: {err}");
    if let Some(hint) = err.suggestion() {
        eprintln!("hint: {hint}");
    }
    err.exit_code()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}

// ── Argument parsing ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Rebuild,
    Count,
    Ids,
    List,
    Links,
    Get(String),
}

#[derive(Debug)]
struct Invocation {
    config: CacheConfig,
    terms: PathBuf,
    overrides: Option<PathBuf>,
    verbose: bool,
    command: Command,
}

fn parse_args(tail: &[String], mut config: CacheConfig) -> std::result::Result<Invocation, String> {
    let mut terms: Option<PathBuf> = None;
    let mut overrides: Option<PathBuf> = None;
    let mut verbose = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < tail.len() {
        let flag = tail[i].as_str();
        let mut value = || {
            i += 1;
            tail.get(i)
                .cloned()
                .ok_or_else(|| format!("{flag} requires an argument"))
        };
        match flag {
            "--cache-file" => config.cache_file = PathBuf::from(value()?),
            "--terms" => terms = Some(PathBuf::from(value()?)),
            "--overrides" => overrides = Some(PathBuf::from(value()?)),
            "--taxonomy" => config.taxonomy_name = value()?,
            "--base-url" => config.base_url = value()?,
            "--page-size" => config.page_size = parse_count(flag, &value()?)?,
            "--queue-depth" => config.queue_depth = parse_count(flag, &value()?)?,
            "-v" | "--verbose" => verbose = true,
            other if other.starts_with('-') => return Err(format!("unknown option `{other}`")),
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        ["rebuild"] => Command::Rebuild,
        ["count"] => Command::Count,
        ["ids"] => Command::Ids,
        ["list"] => Command::List,
        ["links"] => Command::Links,
        ["get", id] => Command::Get((*id).to_owned()),
        ["get"] => return Err("get requires a brand identifier".to_owned()),
        [] => return Err("missing command".to_owned()),
        other => return Err(format!("unknown command `{}`", other.join(" "))),
    };
    let terms = terms.ok_or_else(|| "--terms is required".to_owned())?;

    Ok(Invocation {
        config,
        terms,
        overrides,
        verbose,
        command,
    })
}

fn parse_count(flag: &str, raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("{flag} expects a positive integer, got `{raw}`")),
        Ok(n) => Ok(n),
    }
}

// ── Execution ────────────────────────────────────────────────────────────

fn execute<W: Write>(invocation: Invocation, out: &mut W) -> Result<i32> {
    let Invocation {
        config,
        terms,
        overrides,
        command,
        ..
    } = invocation;

    let authority = JsonLinesAuthorityFeed::new(terms, config.page_size);
    let overrides: Arc<dyn OverrideFeed> = match overrides {
        Some(path) => Arc::new(JsonOverrideFeed::new(path)),
        None => Arc::new(NoOverrides),
    };
    let cache = BrandCache::new(config, authority, overrides)?;
    let report = cache.reload()?;
    info!(
        target: "brandcache.cli",
        command = ?command,
        terms = report.ingest.terms,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "cache rebuilt"
    );

    let result = answer(&cache, &command, &report, out);
    cache.shutdown()?;
    result
}

fn answer<W: Write>(
    cache: &BrandCache,
    command: &Command,
    report: &RebuildReport,
    out: &mut W,
) -> Result<i32> {
    match command {
        Command::Rebuild => {
            writeln!(
                out,
                "rebuilt {} brands from {} terms ({} curated, {} skipped) in {} ms",
                cache.count()?,
                report.ingest.terms,
                report.reconcile.written(),
                report.reconcile.skipped(),
                report.elapsed.as_millis()
            )?;
        }
        Command::Count => writeln!(out, "{}", cache.count()?)?,
        Command::Ids => {
            write_json_lines(out, cache.list_ids()?)?;
        }
        Command::List => {
            write_json_lines(out, cache.list_all()?)?;
        }
        Command::Links => {
            write_json_array(out, cache.list_default_links()?)?;
            writeln!(out)?;
        }
        Command::Get(id) => match cache.get_brand(id)? {
            Some(brand) => {
                write_json_lines(out, [Ok(brand)])?;
            }
            None => {
                eprintln!("error: no brand with identifier {id}");
                return Ok(EXIT_NOT_FOUND);
            }
        },
    }
    Ok(0)
}

fn print_help() {
    let text = "\
brandcache - Rebuild the brand cache from feed files and query it

USAGE:
    brandcache --terms <FILE> [OPTIONS] <COMMAND>

COMMANDS:
    rebuild               Rebuild and print a summary
    count                 Print the number of cached brands
    ids                   Print every identifier, one JSON object per line
    list                  Print every brand, one JSON object per line
    links                 Print a JSON array of brand links
    get <UUID>            Print one brand

OPTIONS:
    --terms <FILE>        Authority terms, one JSON object per line (required)
    --overrides <FILE>    Curated records as one JSON array
    --cache-file <PATH>   Store path (env CACHE_FILE_NAME, default: cache.db)
    --taxonomy <NAME>     Taxonomy name (env TAXONOMY_NAME, default: Brands)
    --page-size <N>       Terms per page (env MAX_RECORDS, default: 10000)
    --queue-depth <N>     Batches buffered for persistence (env QUEUE_DEPTH)
    --base-url <URL>      Prefix for links (env BASE_URL)
    -v, --verbose         Debug logging (RUST_LOG overrides)
    -h, --help            Show this help message

EXAMPLES:
    brandcache --terms terms.jsonl count
    brandcache --terms terms.jsonl --overrides curated.json get 89400620-0727-3b07-b39e-3e614c115706
";
    let _ = io::stdout().write_all(text.as_bytes());
}
