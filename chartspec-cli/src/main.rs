use chartspec_common::error::{ChartSpecError, Result, ResultWithContext};
use chartspec_common::query::{QueryMetadata, QueryResult};
use chartspec_core::layout::{LayoutConfig, LayoutContext, LayoutEngine, Measurement};
use chartspec_core::plan::{derive_render_plan, QueryContext};
use chartspec_core::spec::{Dialect, Notation, VisualizationOptions};
use chartspec_core::theme::Theme;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NotationArg {
    Json,
    Yaml,
}

impl From<NotationArg> for Notation {
    fn from(value: NotationArg) -> Self {
        match value {
            NotationArg::Json => Notation::Json,
            NotationArg::Yaml => Notation::Yaml,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DialectArg {
    Vega,
    VegaLite,
}

impl From<DialectArg> for Dialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Vega => Dialect::Vega,
            DialectArg::VegaLite => Dialect::VegaLite,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContextArg {
    Widget,
    Editor,
    Query,
}

impl From<ContextArg> for LayoutContext {
    fn from(value: ContextArg) -> Self {
        match value {
            ContextArg::Widget => LayoutContext::Widget,
            ContextArg::Editor => LayoutContext::Editor,
            ContextArg::Query => LayoutContext::Query,
        }
    }
}

/// Compile a chart spec and print the renderer handoff as JSON
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Spec file. A blank or missing spec is synthesized from the query columns
    #[clap(long)]
    pub spec: Option<PathBuf>,

    /// Query result file with `columns` and `rows`
    #[clap(long)]
    pub columns: Option<PathBuf>,

    /// Query name, used as the title of a synthesized spec
    #[clap(long, default_value = "")]
    pub query_name: String,

    /// Export url of the query result, referenced by a synthesized spec
    #[clap(long)]
    pub data_url: Option<String>,

    /// Spec notation. Inferred from the spec file extension when omitted
    #[clap(long, value_enum)]
    pub notation: Option<NotationArg>,

    /// Dialect whose default document is shown when the spec cannot be read
    #[clap(long, value_enum, default_value = "vega-lite")]
    pub dialect: DialectArg,

    /// Theme name
    #[clap(long, default_value = "custom")]
    pub theme: String,

    /// Rendering context
    #[clap(long, value_enum, default_value = "widget")]
    pub context: ContextArg,

    /// Container width in pixels
    #[clap(long, default_value = "800")]
    pub width: f64,

    /// Container height in pixels
    #[clap(long, default_value = "600")]
    pub height: f64,

    /// Layout configuration JSON file
    #[clap(long)]
    pub layout_config: Option<PathBuf>,

    /// Log layout and compilation decisions
    #[clap(long, short, num_args = 0)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let spec_text = match &args.spec {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read spec file {}", path.display()))?,
        None => String::new(),
    };
    let notation = args
        .notation
        .map(Notation::from)
        .or_else(|| args.spec.as_deref().and_then(notation_from_extension))
        .unwrap_or_default();

    let query: QueryResult = match &args.columns {
        Some(path) => read_json(path)?,
        None => QueryResult::default(),
    };
    let metadata = QueryMetadata {
        id: None,
        name: args.query_name.clone(),
        data_url: args.data_url.clone(),
    };

    let layout_config: LayoutConfig = match &args.layout_config {
        Some(path) => read_json(path)?,
        None => LayoutConfig::default(),
    };

    let context = LayoutContext::from(args.context);
    let mut engine = LayoutEngine::new(context, layout_config.clone());
    let parent_size = engine
        .mount(Measurement::new(args.width, args.height))
        .ok_or_else(|| {
            ChartSpecError::specification(format!(
                "Container size must be positive, received {}x{}",
                args.width, args.height
            ))
        })?;

    let mut options = VisualizationOptions::new(spec_text, notation, args.dialect.into());
    options.theme = Theme::from(args.theme.clone());

    let plan = derive_render_plan(
        &options,
        &parent_size,
        context,
        QueryContext {
            columns: &query.columns,
            metadata: &metadata,
        },
        &layout_config,
    );
    if let Some(error) = &plan.error {
        log::warn!("Invalid specification: {error}");
        eprintln!("warning: {error}");
    }

    let handoff = plan.handoff(&query.rows);
    println!("{}", serde_json::to_string_pretty(&handoff)?);
    Ok(())
}

fn notation_from_extension(path: &Path) -> Option<Notation> {
    match path.extension()?.to_str()? {
        "json" => Some(Notation::Json),
        "yaml" | "yml" => Some(Notation::Yaml),
        _ => None,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
