use clap::Parser;
use nb2jekyll::convert;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "nb2jekyll")]
#[command(version)]
#[command(about = "Convert a Jupyter notebook into a Jekyll blog post")]
#[command(long_about = "\
Convert a Jupyter notebook into a Jekyll blog post

Reads filename.ipynb and writes filename.md beside it, ready for a Jekyll
_posts directory. Markdown cells pass through verbatim; code cells and their
results become capture/highlight blocks handed to the notebook-cell.html
include; embedded PNG images are extracted to image1.png, image2.png, … in
the current directory and referenced under /public/img/nbexample/.

The conversion is all-or-nothing: a cell or output the converter does not
recognize aborts the run with the offending cell printed, and no files are
written.")]
#[command(after_help = "Will create filename.md.")]
struct Cli {
    /// Notebook file to convert (filename.ipynb)
    input: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_cli_error(err),
    };

    match convert::convert(&cli.input) {
        Ok(outcome) => {
            println!("{} created.", outcome.post_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Print a clap error and exit with its code. Genuine usage errors get a
/// second line naming the file a correct invocation would create; help and
/// version output pass through unchanged.
fn report_cli_error(err: clap::Error) -> ExitCode {
    let _ = err.print();
    if let Some(note) = usage_note(&err) {
        eprintln!("{note}");
    }
    ExitCode::from(err.exit_code() as u8)
}

fn usage_note(err: &clap::Error) -> Option<&'static str> {
    err.use_stderr().then_some("Will create filename.md.")
}
