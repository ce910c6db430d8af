use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thrift_to_flow::{
    BasicFormatter, ConvertOptions, NameCase, SchemaFile, Syntax, convert_file, load_schema,
    load_schema_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thrift-to-flow")]
#[command(about = "Convert parsed Thrift schemas to Flow type declarations", long_about = None)]
struct Cli {
    /// JSON-encoded schema ASTs (use '-' to read one from stdin)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,

    /// Directory to write `<schema>.js.flow` files to (defaults to stdout)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Casing applied to declared type and value names
    #[arg(long, value_enum, default_value_t = CaseArg::Preserve)]
    case: CaseArg,

    /// Start each output with a comment naming the source schema
    #[arg(long)]
    source_comment: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseArg {
    Preserve,
    Pascal,
    Camel,
    Snake,
    Constant,
}

impl From<CaseArg> for NameCase {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::Preserve => NameCase::Preserve,
            CaseArg::Pascal => NameCase::Pascal,
            CaseArg::Camel => NameCase::Camel,
            CaseArg::Snake => NameCase::Snake,
            CaseArg::Constant => NameCase::Constant,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let case = NameCase::from(cli.case);
    let transform = move |name: &str| case.apply(name);
    let options = ConvertOptions {
        include_source_path: cli.source_comment,
        syntax: Syntax::Flow,
    };

    let mut failed = 0;
    for input in &cli.inputs {
        if let Err(e) = run(input, cli.out_dir.as_deref(), options, &transform) {
            tracing::error!(input = %input, "{e}");
            failed += 1;
        }
    }

    if failed > 0 {
        tracing::error!("{failed} of {} file(s) failed", cli.inputs.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(
    input: &str,
    out_dir: Option<&Path>,
    options: ConvertOptions,
    transform: &dyn Fn(&str) -> String,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = read_input(input)?;
    let flow = convert_file(&file, options, transform, &BasicFormatter)?;

    // Write output
    if let Some(out_dir) = out_dir {
        fs::create_dir_all(out_dir)?;
        let output_path = out_dir.join(output_name(&file.path));
        fs::write(&output_path, flow)?;
        tracing::info!(output = %output_path.display(), "wrote declarations");
    } else {
        print!("{}", flow);
    }

    Ok(())
}

fn read_input(input: &str) -> thrift_to_flow::Result<SchemaFile> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        load_schema(&buffer, Path::new("<stdin>"))
    } else {
        load_schema_file(Path::new(input))
    }
}

/// `foo/bar.thrift` -> `bar.js.flow`
fn output_name(schema_path: &Path) -> String {
    let stem = schema_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".to_string());
    format!("{stem}.js.flow")
}
