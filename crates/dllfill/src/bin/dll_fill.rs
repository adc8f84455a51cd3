use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use dllfill::{
    BoundTable, BoundTarget, ConfigError, FillConfig, FillError, LessonPlanDocument,
    TemplateSource, load_binding_table, render,
};
use dllfill_common::SheetLocator;
use dllfill_workbook::{NameScope, TemplateReader, UmyaTemplate};
use tracing_subscriber::EnvFilter;

const STDIO: &str = "-";

#[derive(Parser, Debug)]
#[command(
    name = "dll-fill",
    version,
    about = "Fill Daily Lesson Log spreadsheet templates from lesson-plan JSON"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG applies otherwise.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a template with a lesson-plan document.
    Fill(FillArgs),
    /// Validate a binding table, optionally against a template.
    Lint(LintArgs),
    /// List the defined names of a template.
    Names(NamesArgs),
    /// Print the binding table JSON schema.
    Schema,
}

#[derive(Parser, Debug)]
struct FillArgs {
    /// YAML config file with `template`, `bindings`, `legacy`, `output_dir`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Template workbook (.xlsx).
    #[arg(long, env = "DLLFILL_TEMPLATE")]
    template: Option<PathBuf>,

    /// Lesson-plan JSON document, or `-` for stdin.
    #[arg(long)]
    input: PathBuf,

    /// Binding table (YAML or JSON). Defaults to the bundled weekly table.
    #[arg(long, env = "DLLFILL_BINDINGS", conflicts_with = "legacy")]
    bindings: Option<PathBuf>,

    /// Use the bundled table for `generatedLesson` payloads.
    #[arg(long)]
    legacy: bool,

    /// Output path, or `-` for stdout. Defaults to a name derived from the header.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the fill report as JSON on stderr.
    #[arg(long)]
    report: bool,
}

#[derive(Parser, Debug)]
struct LintArgs {
    /// Binding table (YAML or JSON).
    #[arg(long)]
    bindings: PathBuf,

    /// Also check targets against this template.
    #[arg(long)]
    template: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct NamesArgs {
    #[arg(long, env = "DLLFILL_TEMPLATE")]
    template: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Fill(args) => run_fill(args),
        Command::Lint(args) => run_lint(args),
        Command::Names(args) => run_names(args),
        Command::Schema => {
            println!("{}", dllfill_spec::generate_schema_json_pretty());
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err:#}", error_code(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(fill) = err.downcast_ref::<FillError>() {
        return fill.kind().as_str();
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "config";
    }
    "error"
}

fn run_fill(args: FillArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => FillConfig::from_path(path)?,
        None => FillConfig::default(),
    };
    let config = file_config.merge(FillConfig {
        template: args.template,
        bindings: args.bindings,
        legacy: args.legacy,
        output_dir: None,
    });

    let template_path = config.template_path()?;
    let source = TemplateSource::from_path(template_path).map_err(FillError::from)?;
    let bindings = BoundTable::new(config.binding_table()?)?;
    let document = read_document(&args.input)?;

    let rendered = render(&source, &document, &bindings)?;
    tracing::info!(
        template = %template_path.display(),
        table = %bindings.table().table.id,
        cells = rendered.report.cells_written,
        "filled template"
    );

    if args.report {
        let report = serde_json::to_string_pretty(&rendered.report)?;
        eprintln!("{report}");
    }

    let output = match args.output {
        Some(path) => path,
        None => config
            .output_path(&document.header())
            .unwrap_or_else(|| PathBuf::from(document.header().file_name())),
    };
    if output.as_os_str() == STDIO {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&rendered.bytes)?;
        stdout.flush()?;
    } else {
        write_atomically(&output, &rendered.bytes)?;
        eprintln!("wrote {}", output.display());
    }
    Ok(())
}

fn read_document(input: &Path) -> Result<LessonPlanDocument> {
    if input.as_os_str() == STDIO {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading document from stdin")?;
        return Ok(LessonPlanDocument::from_json_str(&text)?);
    }
    let file = std::fs::File::open(input)
        .with_context(|| format!("opening document `{}`", input.display()))?;
    Ok(LessonPlanDocument::from_reader(std::io::BufReader::new(file))?)
}

/// Write through a temp file in the destination directory, then rename into place.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating `{}`", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in `{}`", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("writing `{}`", path.display()))?;
    Ok(())
}

fn run_lint(args: LintArgs) -> Result<()> {
    let table = load_binding_table(&args.bindings)?;
    if let Err(err) = table.validate() {
        for issue in err.issues() {
            println!("{}: {issue}", args.bindings.display());
        }
        bail!(
            "{} has {} issue(s)",
            args.bindings.display(),
            err.issues().len()
        );
    }
    let bound = BoundTable::new(table)?;

    let Some(template_path) = args.template else {
        println!("{}: ok ({} rules)", args.bindings.display(), bound.rules().len());
        return Ok(());
    };

    let template = UmyaTemplate::open_path(&template_path).map_err(FillError::from)?;
    let mut problems = 0usize;
    for rule in bound.rules() {
        let problem = match &rule.target {
            BoundTarget::Name(name) => template
                .resolve_named_range(name)
                .is_empty()
                .then(|| format!("named range `{name}` is not defined")),
            BoundTarget::Cell { sheet, .. } => template
                .resolve_sheet(&SheetLocator::name_or_first(sheet.as_deref()))
                .err()
                .map(|err| err.to_string()),
            BoundTarget::DayBlock { .. } => {
                let sheet = bound.layout().and_then(|layout| layout.sheet.as_deref());
                template
                    .resolve_sheet(&SheetLocator::name_or_first(sheet))
                    .err()
                    .map(|err| err.to_string())
            }
        };
        if let Some(problem) = problem {
            problems += 1;
            println!("{}: rule `{}`: {problem}", template_path.display(), rule.id);
        }
    }
    if problems > 0 {
        bail!(
            "{problems} rule(s) do not match `{}`",
            template_path.display()
        );
    }
    println!(
        "{}: ok against {} ({} rules)",
        args.bindings.display(),
        template_path.display(),
        bound.rules().len()
    );
    Ok(())
}

fn run_names(args: NamesArgs) -> Result<()> {
    let template = UmyaTemplate::open_path(&args.template).map_err(FillError::from)?;
    for entry in template.defined_names() {
        let scope = match &entry.scope {
            NameScope::Workbook => "workbook".to_string(),
            NameScope::Sheet(sheet) => format!("sheet:{sheet}"),
        };
        println!("{}\t{scope}\t{}", entry.name, entry.definition);
    }
    Ok(())
}
