extern crate dhn;

use clap::Parser;
use dhn::output::FileOutput;
use dhn::{run_branch, BranchConfig, DamageMode};
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct BranchArgs {
    input_file: String,
    #[arg(
        long = "catalog",
        short,
        help = "Path to the pipe and insulation thickness catalogue in .json format"
    )]
    catalog_file: String,
    #[arg(
        long = "config",
        short = 'n',
        help = "Path to a run configuration in .json format (defaults apply without one)"
    )]
    config_file: Option<String>,
    #[arg(
        long,
        value_enum,
        default_value = "average",
        help = "How damaged insulation is assigned to segments"
    )]
    damage_mode: DamageMode,
    #[arg(
        long = "output-dir",
        short,
        help = "Directory to write result files into (defaults to one next to the input file)"
    )]
    output_directory: Option<String>,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = BranchArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(tracing::Level::TRACE);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .expect("setting tracing subscriber failed");

    let input_file = args.input_file.as_str();
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let input_file_stem = PathBuf::from(input_file_stem);

    let output_path = match args.output_directory {
        Some(directory) => PathBuf::from(directory),
        None => PathBuf::from(format!("{}__results", input_file_stem.display())),
    };
    fs::create_dir_all(&output_path)?;
    let input_file_name = input_file_stem
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("branch");
    let file_output = FileOutput::new(output_path, format!("{input_file_name}__{{}}.csv"));

    let config: BranchConfig = match args.config_file {
        Some(ref config_file) => {
            serde_json::from_reader(BufReader::new(File::open(Path::new(config_file))?))?
        }
        None => BranchConfig::default(),
    };

    run_branch(
        BufReader::new(File::open(Path::new(input_file))?),
        BufReader::new(File::open(Path::new(args.catalog_file.as_str()))?),
        config,
        args.damage_mode,
        &file_output,
    )?;

    Ok(())
}
