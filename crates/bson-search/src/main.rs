//! Filter a stream of BSON documents by a queried value.
//!
//! ```text
//! <producer> | bson-search -t <type> [-k <dotted-key>] [-p <N>]
//!                          [--strfullmatch] [-o json|bson] <value>
//! ```
//!
//! Documents are pre-filtered with a search token before parsing; when a
//! key path is given, matches are confirmed via lookup. Matched documents
//! are written to stdout, one JSON object per line or as raw BSON bytes.

use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use bsonview::{BsonValue, DocumentStream, Error, ObjectId, SearchToken, Value};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "bson-search")]
#[command(about = "Search values in a stream of BSON documents read from stdin")]
struct Cli {
    /// Query value type
    #[arg(short = 't', long = "type", value_enum, default_value = "string")]
    query_type: QueryType,

    /// Dotted key path to match at; empty matches anywhere
    #[arg(short = 'k', long = "key", default_value = "")]
    key: String,

    /// Parallel worker lanes (<= 1 runs serially)
    #[arg(short = 'p', long = "parallel", default_value_t = 1)]
    parallel: usize,

    /// Require exact string equality instead of substring containment
    #[arg(long = "strfullmatch")]
    str_full_match: bool,

    /// Output encoding for matched documents
    #[arg(short = 'o', long = "output", value_enum, default_value = "json")]
    output: OutputFormat,

    /// Value to search for
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QueryType {
    String,
    Int32,
    Int64,
    Float64,
    Objid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Bson,
}

/// A parsed query value.
enum Query {
    Str(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    ObjectId(ObjectId),
}

impl Query {
    fn parse(kind: QueryType, input: &str) -> anyhow::Result<Self> {
        Ok(match kind {
            QueryType::String => Query::Str(input.to_string()),
            QueryType::Int32 => Query::Int32(input.parse().context("invalid int32 query")?),
            QueryType::Int64 => Query::Int64(input.parse().context("invalid int64 query")?),
            QueryType::Float64 => Query::Float64(input.parse().context("invalid float64 query")?),
            QueryType::Objid => Query::ObjectId(
                ObjectId::from_hex(input).ok_or_else(|| anyhow!("invalid objectid hex: {input}"))?,
            ),
        })
    }

    fn token(&self) -> bsonview::Result<SearchToken> {
        match self {
            Query::Str(s) => SearchToken::for_value(&s.as_str()),
            Query::Int32(i) => SearchToken::for_value(i),
            Query::Int64(i) => SearchToken::for_value(i),
            Query::Float64(f) => SearchToken::for_value(f),
            Query::ObjectId(id) => SearchToken::for_value(id),
        }
    }

    /// Confirm a lookup result against the query. String queries match by
    /// substring unless `full` is set; everything else compares the
    /// generic projections for equality.
    fn matches(&self, found: &Value, full: bool) -> bsonview::Result<bool> {
        if found.is_empty() {
            return Ok(false);
        }
        match self {
            Query::Str(needle) if !full => Ok(found
                .as_str()
                .map(|s| s.contains(needle.as_str()))
                .unwrap_or(false)),
            _ => {
                let expected = match self {
                    Query::Str(s) => BsonValue::Str(s.as_str()),
                    Query::Int32(i) => BsonValue::Int32(*i),
                    Query::Int64(i) => BsonValue::Int64(*i),
                    Query::Float64(f) => BsonValue::Double(*f),
                    Query::ObjectId(id) => BsonValue::ObjectId(*id),
                };
                Ok(found.value()? == expected)
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let query = Query::parse(cli.query_type, &cli.value)?;
    let token = query.token()?;
    let out = Mutex::new(BufWriter::with_capacity(1 << 20, io::stdout()));

    DocumentStream::new(io::stdin().lock()).dispatch(cli.parallel, |frame| {
        if !frame.fast_contains(&token) {
            return Ok(());
        }
        let doc = frame.document()?;
        if !cli.key.is_empty() {
            let found = doc.lookup(&cli.key)?;
            if !query.matches(&found, cli.str_full_match)? {
                return Ok(());
            }
        }
        let mut out = out.lock().expect("output writer poisoned");
        match cli.output {
            OutputFormat::Json => writeln!(out, "{}", doc.to_json()?).map_err(Error::Io),
            OutputFormat::Bson => out.write_all(frame.bytes()).map_err(Error::Io),
        }
    })?;

    out.into_inner()
        .expect("output writer poisoned")
        .flush()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("bson-search failed: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsonview::encode::marshal_single;
    use bsonview::Document;

    #[test]
    fn test_query_parse() {
        assert!(matches!(
            Query::parse(QueryType::Int32, "-456"),
            Ok(Query::Int32(-456))
        ));
        assert!(Query::parse(QueryType::Int32, "abc").is_err());
        assert!(Query::parse(QueryType::Objid, "0123").is_err());
        assert!(matches!(
            Query::parse(QueryType::Objid, "0123456789abcdef00112233"),
            Ok(Query::ObjectId(_))
        ));
    }

    #[test]
    fn test_string_substring_match() {
        let bytes = marshal_single("name", &"alice cooper").unwrap();
        let doc = Document::new(&bytes).unwrap();
        let found = doc.lookup("name").unwrap();

        let query = Query::Str("cooper".into());
        assert!(query.matches(&found, false).unwrap());
        assert!(!query.matches(&found, true).unwrap());

        let exact = Query::Str("alice cooper".into());
        assert!(exact.matches(&found, true).unwrap());
    }

    #[test]
    fn test_typed_match_is_kind_strict() {
        let bytes = marshal_single("n", &7i32).unwrap();
        let doc = Document::new(&bytes).unwrap();
        let found = doc.lookup("n").unwrap();

        assert!(Query::Int32(7).matches(&found, false).unwrap());
        // an int64 query does not match an int32 field
        assert!(!Query::Int64(7).matches(&found, false).unwrap());
        // a miss never matches
        let missing = doc.lookup("x").unwrap();
        assert!(!Query::Int32(7).matches(&missing, false).unwrap());
    }
}
