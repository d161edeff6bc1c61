//! exicodec CLI: JSON event streams <-> binary streams.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use exicodec::{
    Alignment, CodecOptions, DEFAULT_BLOCK_SIZE, Error, Grammar, Scanner, Scriber, load_grammar,
    read_events, write_events,
};

#[derive(Parser)]
#[command(name = "exicodec", about = "Grammar-driven binary event codec")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a JSON event array
    Encode(EncodeArgs),
    /// Decode a binary stream into a JSON event array
    Decode(DecodeArgs),
}

#[derive(Args)]
struct GrammarArgs {
    /// Grammar definition (JSON); the schemaless grammar when omitted
    #[arg(short, long)]
    grammar: Option<PathBuf>,
}

#[derive(Args)]
struct EncodeArgs {
    #[command(flatten)]
    grammar: GrammarArgs,

    /// JSON event array
    #[arg(short, long)]
    events: PathBuf,

    /// Output file (- for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    #[arg(long, value_enum, default_value_t = AlignmentArg::BitPacked)]
    alignment: AlignmentArg,

    /// Values per block in the channelled alignments
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Longest string value added to the string table
    #[arg(long)]
    value_max_length: Option<usize>,

    /// Maximum number of string table entries
    #[arg(long)]
    value_capacity: Option<usize>,

    /// Deflate level (0-9)
    #[arg(long)]
    level: Option<u32>,

    /// Write the "$EXI" cookie
    #[arg(long)]
    cookie: bool,
}

#[derive(Args)]
struct DecodeArgs {
    #[command(flatten)]
    grammar: GrammarArgs,

    /// Encoded stream
    input: PathBuf,

    /// Output file (- for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlignmentArg {
    BitPacked,
    ByteAligned,
    PreCompression,
    Compression,
}

impl From<AlignmentArg> for Alignment {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::BitPacked => Alignment::BitPacked,
            AlignmentArg::ByteAligned => Alignment::ByteAligned,
            AlignmentArg::PreCompression => Alignment::PreCompression,
            AlignmentArg::Compression => Alignment::Compression,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Encode(args) => run_encode(args),
        Command::Decode(args) => run_decode(args),
    }
}

fn grammar(args: &GrammarArgs) -> Result<Arc<Grammar>, Error> {
    let grammar = match &args.grammar {
        Some(path) => load_grammar(BufReader::new(File::open(path)?))?,
        None => Grammar::schemaless()?,
    };
    Ok(Arc::new(grammar))
}

fn output(path: &str) -> Result<Box<dyn Write>, Error> {
    if path == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(Path::new(path))?)))
    }
}

fn run_encode(args: EncodeArgs) -> Result<(), Error> {
    let grammar = grammar(&args.grammar)?;
    let events = read_events(BufReader::new(File::open(&args.events)?))?;
    let options = CodecOptions {
        alignment: args.alignment.into(),
        block_size: args.block_size,
        value_max_length: args.value_max_length,
        value_partition_capacity: args.value_capacity,
        compression_level: args.level,
        include_cookie: args.cookie,
    };

    let mut scriber = Scriber::builder(output(&args.output)?, grammar)
        .options(options)
        .build()?;
    scriber.scribe_all(&events)?;
    let mut sink = scriber.finish()?;
    sink.flush()?;
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<(), Error> {
    let grammar = grammar(&args.grammar)?;
    let source = BufReader::new(File::open(&args.input)?);
    let events = Scanner::builder(source, grammar)
        .build()?
        .collect::<Result<Vec<_>, Error>>()?;
    write_events(output(&args.output)?, &events)
}
