use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arith_oracle::catalog::{self, OpDesc, CATALOG};
use arith_oracle::emit::AsmSink;
use arith_oracle::record::JsonSink;
use arith_oracle::{emit_matrix, GenConfig, Generator, TestMatrix};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate integer arithmetic test vectors", long_about = None)]
struct Cli {
    /// RNG seed (hex or dec). Drawn from the OS and logged when omitted.
    #[arg(long)]
    seed: Option<String>,
    /// Operand range policy as JSON (GenConfig)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write output to file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Assembly test program
    Asm,
    /// Oracle records and data blocks as JSON
    Json,
    /// List opcodes and the forms generated for each
    Catalog {
        /// Only show this mnemonic (e.g. `mulh_i`)
        #[arg(long, value_name = "MNEMONIC")]
        op: Option<String>,
    },
}

fn parse_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u64>()?)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<GenConfig> {
    let Some(path) = path else { return Ok(GenConfig::default()) };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn open_out(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn print_catalog(out: &mut dyn Write, op: Option<&str>) -> Result<()> {
    let descs: Vec<&OpDesc> = match op {
        Some(name) => vec![catalog::by_mnemonic(name)
            .with_context(|| format!("unknown opcode {name:?}"))?],
        None => CATALOG.iter().collect(),
    };
    writeln!(out, "{:<8} {:<7} {:<6} forms", "opcode", "arity", "shift")?;
    for desc in descs {
        let forms: Vec<String> = catalog::valid_forms(desc)
            .map(|f| f.tag(desc.is_unary()))
            .collect();
        writeln!(
            out,
            "{:<8} {:<7} {:<6} {}",
            desc.mnemonic,
            if desc.is_unary() { "unary" } else { "binary" },
            if desc.is_shift() { "yes" } else { "no" },
            forms.join(" ")
        )?;
    }
    Ok(())
}

fn generate(seed: Option<&str>, config: Option<&PathBuf>) -> Result<TestMatrix> {
    let cfg = load_config(config)?;
    let seed = match seed {
        Some(s) => parse_u64(s).with_context(|| format!("invalid --seed {s:?}"))?,
        None => rand::random(),
    };
    info!(seed, ?cfg, "generating");
    Ok(Generator::from_seed(cfg, seed)?.generate()?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = open_out(cli.out.as_ref())?;
    let seed = cli.seed.as_deref();
    let config = cli.config.as_ref();

    match cli.cmd {
        Command::Catalog { op } => print_catalog(&mut out, op.as_deref())?,
        Command::Asm => {
            let matrix = generate(seed, config)?;
            emit_matrix(&matrix, &mut AsmSink::new(&mut out, "arith-gen"))?;
        }
        Command::Json => {
            let matrix = generate(seed, config)?;
            emit_matrix(&matrix, &mut JsonSink::new(&mut out))?;
        }
    }
    out.flush()?;
    Ok(())
}
