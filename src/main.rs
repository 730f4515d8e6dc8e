use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use vm_translator::{Bootstrap, Run};

#[derive(Parser)]
#[command(name = "vm-translator")]
#[command(about = "Translates VM code into Hack assembly")]
struct Args {
    /// A `.vm` file, or a directory whose `.vm` files form one program
    path: PathBuf,

    /// Output file (defaults to `<file>.asm`, or `<dir>/<dir>.asm`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Function the bootstrap jumps to
    #[arg(long, default_value = "Sys.init")]
    entry: String,

    /// Omit the bootstrap prologue
    #[arg(long)]
    no_bootstrap: bool,

    #[arg(short, long)]
    verbose: bool,
}

/// Unit name used to scope statics and labels: the file stem.
fn unit_name(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))
}

fn is_vm_file(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == "vm")
}

/// Returns the units to translate, in order, and the default output path.
fn discover(path: &Path) -> Result<(Vec<PathBuf>, PathBuf)> {
    if path.is_dir() {
        let mut files = fs::read_dir(path)
            .with_context(|| format!("reading directory {}", path.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        files.retain(|p| is_vm_file(p));
        files.sort();
        if files.is_empty() {
            bail!("no .vm files in {}", path.display());
        }
        let name = path
            .canonicalize()?
            .file_name()
            .map(|n| format!("{}.asm", n.to_string_lossy()))
            .with_context(|| format!("invalid directory name: {}", path.display()))?;
        let output = path.join(name);
        Ok((files, output))
    } else {
        Ok((vec![path.to_path_buf()], path.with_extension("asm")))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let (files, default_output) = discover(&args.path)?;
    let output = args.output.unwrap_or(default_output);

    let bootstrap = (!args.no_bootstrap).then(|| Bootstrap::with_entry(args.entry));
    let mut run = Run::new(bootstrap);
    for file in &files {
        let source = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        run.translate_unit(unit_name(file)?, &source)?;
    }

    fs::write(&output, run.finish()).with_context(|| format!("writing {}", output.display()))?;
    info!("wrote {} ({} units)", output.display(), files.len());
    Ok(())
}
