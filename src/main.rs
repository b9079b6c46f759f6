use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pdf_editor::analysis::{self, UnwantedElementsAnalysis};
use pdf_editor::config::{self, settings::Settings};
use pdf_editor::edit;
use pdf_editor::error::{PdfEditError, Result};
use pdf_editor::preview;
use pdf_editor::removal::{self, ElementType};

const USAGE: &str = "\
Usage: pdf_editor [--settings <file>] <command> [args]

Commands:
  analyze <in.pdf> [--output <analysis.json>]
  remove-elements <in.pdf> <out.pdf> --type watermark|image [--ids <id,id,...>] [--analysis <analysis.json>]
  preview <in.pdf> <candidate-id> [--analysis <analysis.json>] [--dir <dir>]
  resave <in.pdf> <out.pdf>
  remove-pages <in.pdf> <out.pdf> <pages>";

/// Options that take a value.
const VALUE_OPTIONS: &[&str] = &["--settings", "--output", "--type", "--ids", "--analysis", "--dir"];

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_editor {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging();

    let cli = match CliArgs::parse(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let settings = match config::load_settings(cli.option("--settings").map(Path::new)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pdf_editor=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &CliArgs, settings: &Settings) -> Result<()> {
    let Some((command, rest)) = cli.positionals.split_first() else {
        return Err(PdfEditError::validation("missing command"));
    };

    match command.as_str() {
        "analyze" => {
            let [input] = expect_args::<1>(command, rest)?;
            let result = analysis::analyze(settings, Path::new(input))?;
            let json = result.to_json_pretty()?;
            match cli.option("--output") {
                Some(path) => {
                    std::fs::write(path, json)?;
                    eprintln!(
                        "OK: {input} -> {path} ({} candidates)",
                        result.image_candidates.len()
                    );
                }
                None => println!("{json}"),
            }
        }
        "remove-elements" => {
            let [input, output] = expect_args::<2>(command, rest)?;
            let element_type: ElementType = cli
                .option("--type")
                .ok_or_else(|| PdfEditError::validation("remove-elements requires --type"))?
                .parse()?;
            let ids: Vec<String> = cli
                .option("--ids")
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            let prior = load_analysis(cli)?;

            let outcome = removal::resolve_and_remove(
                settings,
                Path::new(input),
                Path::new(output),
                element_type,
                &ids,
                prior.as_ref(),
            )?;
            for warning in outcome.diagnostics.warnings() {
                eprintln!("WARN: {}", warning.message);
            }
            eprintln!(
                "OK: {input} -> {} ({:?}, {} images replaced)",
                outcome.output.display(),
                outcome.method,
                outcome.replaced.len()
            );
        }
        "preview" => {
            let [input, candidate_id] = expect_args::<2>(command, rest)?;
            let document = Path::new(input);
            let report = analysis::trusted_or_fresh(settings, document, load_analysis(cli)?)?;
            let candidate = report.find_image_candidate(candidate_id).ok_or_else(|| {
                PdfEditError::no_match(format!("candidate {candidate_id} not found"))
            })?;
            let dir = cli
                .option("--dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| settings.preview_dir.clone());
            let path = preview::extract_preview(settings, document, candidate, &dir)?;
            println!("{}", path.display());
        }
        "resave" => {
            let [input, output] = expect_args::<2>(command, rest)?;
            edit::resave(settings, Path::new(input), Path::new(output))?;
            eprintln!("OK: {input} -> {output}");
        }
        "remove-pages" => {
            let [input, output, pages] = expect_args::<3>(command, rest)?;
            let removed = edit::remove_pages(settings, Path::new(input), Path::new(output), pages)?;
            eprintln!("OK: {input} -> {output} ({} pages removed)", removed.len());
        }
        other => {
            return Err(PdfEditError::validation(format!("unknown command '{other}'")));
        }
    }
    Ok(())
}

fn load_analysis(cli: &CliArgs) -> Result<Option<UnwantedElementsAnalysis>> {
    cli.option("--analysis")
        .map(|path| UnwantedElementsAnalysis::from_file(Path::new(path)))
        .transpose()
}

fn expect_args<'a, const N: usize>(command: &str, rest: &'a [String]) -> Result<[&'a str; N]> {
    let refs: Vec<&str> = rest.iter().map(String::as_str).collect();
    refs.try_into().map_err(|_| {
        PdfEditError::validation(format!(
            "{command} expects {N} arguments, got {}",
            rest.len()
        ))
    })
}

/// Positional arguments plus `--name value` options.
struct CliArgs {
    positionals: Vec<String>,
    options: BTreeMap<String, String>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut positionals = Vec::new();
        let mut options = BTreeMap::new();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg.starts_with("--") {
                if !VALUE_OPTIONS.contains(&arg.as_str()) {
                    return Err(PdfEditError::validation(format!("unknown option '{arg}'")));
                }
                let value = iter
                    .next()
                    .ok_or_else(|| PdfEditError::validation(format!("{arg} requires a value")))?;
                options.insert(arg.clone(), value.clone());
            } else {
                positionals.push(arg.clone());
            }
        }

        Ok(CliArgs {
            positionals,
            options,
        })
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}
