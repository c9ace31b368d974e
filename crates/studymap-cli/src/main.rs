use serde::Serialize;
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use studymap::render::raster::{self, RasterError, RasterFormat, RasterOptions};
use studymap::render::{
    HeadlessError, LayoutOptions, MindmapSession, SvgRenderOptions, render_chart_svg,
    render_session_svg, sanitize_svg_id,
};
use studymap::{
    ChartSeriesBuilder, ExtractionResult, NodeId, ShapeTag, StructuredExtractor, StudyConfig,
    Table, TabularClassifier,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(studymap::Error),
    Headless(HeadlessError),
    Raster(RasterError),
    Json(serde_json::Error),
    Malformed { raw: String, reason: String },
    NotGraded,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Malformed { reason, .. } => write!(f, "malformed model output: {reason}"),
            CliError::NotGraded => write!(f, "table is not a grade sheet; nothing to chart"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<studymap::Error> for CliError {
    fn from(value: studymap::Error) -> Self {
        match value {
            studymap::Error::MalformedOutput { raw, reason } => Self::Malformed { raw, reason },
            other => Self::Core(other),
        }
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    Classify,
    Chart,
    #[default]
    Extract,
    Layout,
    Render,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum InputShape {
    Text,
    Pairs,
    #[default]
    Tree,
    Table,
}

impl FromStr for InputShape {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("table") {
            return Ok(Self::Table);
        }
        match s.parse::<ShapeTag>().map_err(|_| ())? {
            ShapeTag::FlatText => Ok(Self::Text),
            ShapeTag::PairArray => Ok(Self::Pairs),
            ShapeTag::DiagramTree => Ok(Self::Tree),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RenderFormat {
    #[default]
    Svg,
    Raster(RasterFormat),
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("svg") {
            return Ok(Self::Svg);
        }
        s.parse::<RasterFormat>().map(Self::Raster).map_err(|_| ())
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    shape: Option<InputShape>,
    collapse: Vec<NodeId>,
    pretty: bool,
    chartjs: bool,
    render_format: RenderFormat,
    render_scale: Option<f32>,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "studymap\n\
\n\
USAGE:\n\
  studymap classify [--config <path>] [--pretty] [<path>|-]\n\
  studymap chart [--config <path>] [--chartjs] [--pretty] [<path>|-]\n\
  studymap extract [--shape text|pairs|tree] [--config <path>] [--pretty] [<path>|-]\n\
  studymap layout [--collapse <node-id>]... [--config <path>] [--pretty] [<path>|-]\n\
  studymap render [--shape tree|table] [--collapse <node-id>]... [--format svg|png|jpg|pdf] [--scale <n>] [--background <css-color>] [--id <diagram-id>] [--out <path>] [--config <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - classify/chart read a JSON array of row objects.\n\
  - extract/layout/render read raw generated text and recover the JSON inside it.\n\
  - Node ids are printed by layout (n0 is the root).\n\
  - render prints SVG to stdout by default; raster formats default to writing next to the\n\
    input file (or ./out.<ext> for stdin).\n\
  - Exit codes: 0 ok, 1 error, 2 usage, 3 malformed model output (raw text on stderr).\n\
  - Set STUDYMAP_LOG (e.g. STUDYMAP_LOG=debug) for diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "classify" => args.command = Command::Classify,
            "chart" => args.command = Command::Chart,
            "extract" => args.command = Command::Extract,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--chartjs" => args.chartjs = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--shape" => {
                let Some(shape) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.shape = Some(
                    shape
                        .parse::<InputShape>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--collapse" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.collapse
                    .push(id.parse::<NodeId>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let scale = scale.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.render_scale = Some(scale);
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    let shape_ok = match (args.command, args.shape) {
        (_, None) => true,
        (Command::Extract, Some(s)) => s != InputShape::Table,
        (Command::Render, Some(s)) => matches!(s, InputShape::Tree | InputShape::Table),
        _ => false,
    };
    if !shape_ok {
        return Err(CliError::Usage(usage()));
    }

    // `--collapse` names mindmap nodes, so it only pairs with a tree input.
    let collapse_ok = args.collapse.is_empty()
        || match args.command {
            Command::Layout => true,
            Command::Render => args.shape != Some(InputShape::Table),
            _ => false,
        };
    if !collapse_ok {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn load_config(path: Option<&str>) -> Result<StudyConfig, CliError> {
    match path {
        None => Ok(StudyConfig::default()),
        Some(path) => Ok(StudyConfig::from_override_text(&std::fs::read_to_string(
            path,
        )?)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> PathBuf {
    match input {
        Some(path) if path != "-" => PathBuf::from(path).with_extension(ext),
        _ => PathBuf::from(format!("out.{ext}")),
    }
}

fn read_table(text: &str) -> Result<Table, CliError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(Table::from_json(&value)?)
}

fn recovered<T>(result: ExtractionResult<T>) -> Result<T, CliError> {
    Ok(result.into_result()?)
}

fn mindmap_session(
    text: &str,
    config: &StudyConfig,
    collapse: &[NodeId],
) -> Result<MindmapSession, CliError> {
    let model = recovered(StructuredExtractor::from_config(config).extract_diagram(text))?;
    let mut session = MindmapSession::new(model, LayoutOptions::from_config(config));
    for id in collapse {
        session.collapse(*id).map_err(HeadlessError::from)?;
    }
    Ok(session)
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Classify => {
            let table = read_table(&text)?;
            let verdict = TabularClassifier::from_config(&config).classify(&table);
            write_json(&verdict, args.pretty)
        }
        Command::Chart => {
            let table = read_table(&text)?;
            let verdict = TabularClassifier::from_config(&config).classify(&table);
            if !verdict.is_graded {
                let out = json!({
                    "graded": false,
                    "reason": verdict.reason,
                    "columns": table.columns(),
                    "rows": table.len(),
                });
                return write_json(&out, args.pretty);
            }
            let dataset = ChartSeriesBuilder::from_config(&config).build(&table)?;
            if args.chartjs {
                write_json(&dataset.to_chartjs(), args.pretty)
            } else {
                write_json(&dataset, args.pretty)
            }
        }
        Command::Extract => {
            let extractor = StructuredExtractor::from_config(&config);
            match args.shape.unwrap_or_default() {
                InputShape::Text => write_json(&recovered(extractor.extract_text(&text))?, args.pretty),
                InputShape::Pairs => {
                    let set = recovered(extractor.extract_flashcards(&text))?;
                    if set.dropped > 0 {
                        tracing::warn!(dropped = set.dropped, "some flashcards were incomplete");
                    }
                    write_json(&set, args.pretty)
                }
                InputShape::Tree | InputShape::Table => {
                    let model = recovered(extractor.extract_diagram(&text))?;
                    write_json(&model.to_json(), args.pretty)
                }
            }
        }
        Command::Layout => {
            let session = mindmap_session(&text, &config, &args.collapse)?;
            write_json(session.layout(), args.pretty)
        }
        Command::Render => {
            let layout_options = LayoutOptions::from_config(&config);
            let svg_options = SvgRenderOptions {
                diagram_id: args.diagram_id.as_deref().map(sanitize_svg_id),
                ..SvgRenderOptions::default()
            };
            let svg = match args.shape.unwrap_or_default() {
                InputShape::Table => {
                    let table = read_table(&text)?;
                    if !TabularClassifier::from_config(&config)
                        .classify(&table)
                        .is_graded
                    {
                        return Err(CliError::NotGraded);
                    }
                    let dataset = ChartSeriesBuilder::from_config(&config).build(&table)?;
                    render_chart_svg(&dataset, &layout_options, &svg_options)?
                }
                _ => {
                    let session = mindmap_session(&text, &config, &args.collapse)?;
                    render_session_svg(&session, &svg_options)
                }
            };

            match args.render_format {
                RenderFormat::Svg => write_text(&svg, args.out.as_deref()),
                RenderFormat::Raster(format) => {
                    let mut options = RasterOptions::from_config(&config);
                    if let Some(scale) = args.render_scale {
                        options.scale = scale;
                    }
                    if let Some(bg) = args.background {
                        options.background = bg;
                    }
                    let bytes = raster::export(&svg, format, &options)?;
                    let out = args.out.map(PathBuf::from).unwrap_or_else(|| {
                        default_raster_out_path(args.input.as_deref(), format.extension())
                    });
                    std::fs::write(&out, bytes)?;
                    tracing::info!(path = %out.display(), "wrote raster output");
                    Ok(())
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("STUDYMAP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Malformed { raw, reason }) => {
            eprintln!("malformed model output: {reason}");
            eprintln!("{raw}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
