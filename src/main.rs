//! Jiten Dictionary Indexer and Searcher - Command Line Interface
//!
//! This binary builds checksum-gated caches for flat-file Japanese
//! dictionaries and runs boolean queries against them.
//!
//! # Commands
//!
//! - **`index`** - Normalizes, parses, and indexes a dictionary file
//! - **`search`** - Runs a query against an indexed dictionary
//! - **`info`** - Displays cache information for a dictionary
//!
//! # Cache Structure
//!
//! Caches live under the platform cache directory (or `--cache-dir`), one
//! subdirectory per dictionary and normalization setting:
//! ```text
//! ~/.cache/jiten/
//! └── edict2-ck/
//!     ├── normalized.bin   (folded source text)
//!     ├── parsed.rkyv      (token span table)
//!     └── index.rkyv       (inverted index)
//! ```
//!
//! # Usage Examples
//!
//! ```bash
//! # Build the cache for a dictionary
//! jiten index edict2
//!
//! # Search it
//! jiten search edict2 "word:食べる OR definition:eat"
//!
//! # View cache information
//! jiten info edict2
//!
//! # Show help
//! jiten --help
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - General error (invalid arguments, build failure, search failure)
//! - `2` - No cache for the dictionary's current contents (`search`/`info`)

use std::env;
use std::path::Path;
use std::process;

use jiten::{DictionaryKind, EngineConfig, NormalizationFlags, SearchOptions};

struct CliOptions {
    kind: Option<DictionaryKind>,
    config: EngineConfig,
    search: SearchOptions,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_help();
        return;
    }

    if args.len() < 3 {
        eprintln!("Error: Not enough arguments\n");
        print_help();
        process::exit(1);
    }

    let command = args[1].as_str();
    let (positional, options) = match parse_options(&args[2..]) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("Error: {message}\n");
            print_help();
            process::exit(1);
        }
    };

    match command {
        "index" => {
            let [file_path] = positional.as_slice() else {
                eprintln!("Error: 'index' command requires exactly one file path\n");
                print_help();
                process::exit(1);
            };
            handle_index(file_path, &options).await;
        }
        "search" => {
            let [file_path, query] = positional.as_slice() else {
                eprintln!("Error: 'search' command requires file path and query\n");
                print_help();
                process::exit(1);
            };
            handle_search(file_path, query, &options).await;
        }
        "info" => {
            let [file_path] = positional.as_slice() else {
                eprintln!("Error: 'info' command requires exactly one file path\n");
                print_help();
                process::exit(1);
            };
            handle_info(file_path, &options).await;
        }
        _ => {
            eprintln!("Error: Unknown command '{command}'\n");
            print_help();
            process::exit(1);
        }
    }
}

/// Splits flags from positional arguments.
fn parse_options(args: &[String]) -> Result<(Vec<String>, CliOptions), String> {
    let mut positional = Vec::new();
    let mut kind = None;
    let mut cache_dir = None;
    let mut normalization = NormalizationFlags::default();
    let mut search = SearchOptions::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--kind" => {
                let value = iter.next().ok_or("--kind requires a value")?;
                kind = Some(
                    DictionaryKind::parse_name(value)
                        .ok_or_else(|| format!("unknown dictionary kind '{value}'"))?,
                );
            }
            "--cache-dir" => {
                let value = iter.next().ok_or("--cache-dir requires a value")?;
                cache_dir = Some(value.clone());
            }
            "--no-case-fold" => normalization.case_fold = false,
            "--no-kana-fold" => normalization.kana_fold = false,
            "--filter-columns" => search.include_filter_columns = true,
            "--max" => {
                let value = iter.next().ok_or("--max requires a value")?;
                let max: usize = value
                    .parse()
                    .map_err(|_| format!("--max requires a number, got '{value}'"))?;
                search.max_results = Some(max);
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option '{flag}'"));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let config = match cache_dir {
        Some(dir) => EngineConfig::new(dir, normalization),
        None => EngineConfig::new(jiten::config::default_cache_dir(), normalization),
    };
    Ok((positional, CliOptions { kind, config, search }))
}

/// Handles the `index` command.
///
/// Builds (or refreshes) the three cache artifacts for the dictionary and
/// prints a summary. Exits 1 on any failure.
async fn handle_index(file_path: &str, options: &CliOptions) {
    println!("Indexing dictionary: {file_path}");

    match jiten::build_cache(Path::new(file_path), options.kind, &options.config).await {
        Ok(info) => {
            println!("\n✓ Cache ready!");
            println!("  Format:       {}", info.kind.name());
            println!("  Checksum:     {}", info.checksum);
            println!("  Lines:        {}", info.lines);
            println!("  Tokens:       {}", info.tokens);
            println!("  Index tokens: {}", info.index_tokens);
            if let Some(size) = info.disk_size {
                println!("  On disk:      {} bytes ({:.2} KB)", size, size as f64 / 1024.0);
            }
            println!("  Location:     {}", info.cache_dir.display());
        }
        Err(e) => {
            eprintln!("\n✗ Error during indexing: {e}");
            process::exit(1);
        }
    }
}

/// Handles the `search` command.
///
/// Requires a cache matching the file's current contents; builds nothing
/// implicitly so a stale cache is visible rather than silently repaired.
/// Exits 2 when the cache is missing or stale, 1 on search failure.
async fn handle_search(file_path: &str, query: &str, options: &CliOptions) {
    let path = Path::new(file_path);

    match jiten::cache_exists(path, options.kind, &options.config).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Error: No cache for the current contents of '{file_path}'");
            eprintln!("Run 'index' first to build the cache.");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: Could not check cache: {e}");
            process::exit(1);
        }
    }

    println!("Searching for '{query}' in {file_path}");

    match jiten::search(path, query, options.kind, options.search, &options.config).await {
        Ok(hits) if hits.is_empty() => {
            println!("\n✗ No matches");
        }
        Ok(hits) => {
            println!("\n✓ {} match(es):", hits.len());
            for hit in hits {
                println!("  {:>6}  {}", hit.line + 1, hit.text);
            }
        }
        Err(e) => {
            eprintln!("\n✗ Error during search: {e}");
            process::exit(1);
        }
    }
}

/// Handles the `info` command.
///
/// Exits 2 when no cache exists for the file's current contents.
async fn handle_info(file_path: &str, options: &CliOptions) {
    match jiten::cache_info(Path::new(file_path), options.kind, &options.config).await {
        Ok(Some(info)) => {
            println!("Cache information for: {file_path}");
            println!();
            println!("Format:       {}", info.kind.name());
            println!("Checksum:     {}", info.checksum);
            println!("Lines:        {}", info.lines);
            println!("Tokens:       {}", info.tokens);
            println!("Index tokens: {}", info.index_tokens);
            if let Some(size) = info.disk_size {
                println!("On disk:      {} bytes ({:.2} KB)", size, size as f64 / 1024.0);
            }
            println!("Location:     {}", info.cache_dir.display());
        }
        Ok(None) => {
            eprintln!("Error: No cache for the current contents of '{file_path}'");
            eprintln!("Run 'index' first to build the cache.");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("\n✗ Error reading cache information: {e}");
            process::exit(1);
        }
    }
}

fn print_help() {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "jiten".to_string());
    println!("Jiten Dictionary Indexer and Searcher");
    println!();
    println!("USAGE:");
    println!("  {program} index <dictionary> [options]");
    println!("  {program} search <dictionary> <query> [options]");
    println!("  {program} info <dictionary> [options]");
    println!("  {program} --help");
    println!();
    println!("COMMANDS:");
    println!("  index              Normalize, parse, and index a dictionary file");
    println!("  search             Run a boolean query against an indexed dictionary");
    println!("  info               Display cache information for a dictionary");
    println!();
    println!("OPTIONS:");
    println!("  --kind <name>      Dictionary format: edict, kanji, radicals, examples,");
    println!("                     unknown (default: guessed from the filename)");
    println!("  --cache-dir <dir>  Cache directory (default: platform cache dir)");
    println!("  --no-case-fold     Keep matching case sensitive");
    println!("  --no-kana-fold     Keep katakana and hiragana distinct");
    println!("  --filter-columns   Match in filter-only columns (tags, stroke counts)");
    println!("  --max <n>          Stop after n matches");
    println!("  --help, -h         Show this help message");
    println!();
    println!("QUERY SYNTAX:");
    println!("  term term          Both terms must match (implicit AND)");
    println!("  a AND b, a OR b    Explicit connectives (upper case)");
    println!("  (a OR b) c         Grouping with parentheses");
    println!("  column:term        Restrict a term to one column, e.g. word:cat");
    println!();
    println!("EXAMPLES:");
    println!("  # Build the cache");
    println!("  {program} index edict2");
    println!();
    println!("  # Search word and reading columns");
    println!("  {program} search edict2 \"word:食べる OR reading:たべる\"");
    println!();
    println!("  # Case-sensitive search with a result cap");
    println!("  {program} search edict2 eat --no-case-fold --max 10");
    println!();
    println!("NOTE:");
    println!("  - Caches are keyed by source checksum; editing the dictionary file");
    println!("    invalidates them and 'search' will ask you to re-index");
    println!("  - Each normalization setting keeps its own cache directory");
}
