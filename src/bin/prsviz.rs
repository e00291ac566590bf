use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use prs_viz::charts::{ComparisonPlot, Group, create_comparison_plot};
use prs_viz::export::{
    ExportFormat, ExportOptions, PRS_MIN_DPI, PRS_MIN_WIDTH_GRAPH, PRS_MIN_WIDTH_SINGLE,
    save_prs_figure, validate_figure_file,
};
use prs_viz::legend::resolve_legend;
use prs_viz::palettes::{
    CATEGORICAL, COLOR_FAMILIES, DIVERGING, NAMED_PALETTES, Rgb8, SEQUENTIAL_BLUES,
};
use prs_viz::{Comparison, LegendPosition, LegendRequest, StyleConfig};

#[derive(Parser, Debug)]
#[command(
    name = "prsviz",
    version,
    about = "Journal-ready chart styling, bracket layout and figure export"
)]
struct Cli {
    /// JSON file with style overrides (cycle, font_size, show_grid, ...).
    #[arg(long, global = true)]
    style: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the palettes with hex and CMYK values.
    Palettes,
    /// Show the legend layout chosen for the given labels.
    Columns(ColumnsArgs),
    /// Render the grouped-bar demo with stacked significance brackets.
    Demo(DemoArgs),
    /// Check an existing figure file against the journal requirements.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct ColumnsArgs {
    /// Legend labels.
    #[arg(required = true)]
    labels: Vec<String>,
    /// top, top-smart, outside, best, or a location like "upper left".
    #[arg(long, default_value = "best")]
    position: String,
    /// Treat the chart as a bar chart (enlarged handles).
    #[arg(long, default_value_t = false)]
    bar: bool,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Output file (.tiff, .png, .jpeg or .svg).
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = PRS_MIN_DPI)]
    dpi: u32,
    /// Width in inches.
    #[arg(long, default_value_t = PRS_MIN_WIDTH_GRAPH)]
    width: f64,
    /// Write RGB instead of CMYK TIFF.
    #[arg(long, default_value_t = false)]
    rgb: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    file: PathBuf,
    #[arg(long, default_value_t = PRS_MIN_DPI)]
    min_dpi: u32,
    #[arg(long, default_value_t = PRS_MIN_WIDTH_SINGLE)]
    min_width: f64,
    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn cmyk_pct(c: Rgb8) -> String {
    let (c, m, y, k) = c.to_cmyk();
    format!(
        "C{:.0} M{:.0} Y{:.0} K{:.0}",
        c * 100.0,
        m * 100.0,
        y * 100.0,
        k * 100.0
    )
}

fn print_list(name: &str, colors: &[Rgb8]) {
    println!("{name}");
    for c in colors {
        println!("  {c}  {}", cmyk_pct(*c));
    }
}

fn load_style(path: Option<&PathBuf>) -> Result<StyleConfig> {
    match path {
        Some(p) => StyleConfig::from_json_file(p)
            .with_context(|| format!("failed to load style from {}", p.display())),
        None => Ok(StyleConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let style = load_style(cli.style.as_ref())?;
    match cli.cmd {
        Command::Palettes => cmd_palettes(),
        Command::Columns(args) => cmd_columns(args),
        Command::Demo(args) => cmd_demo(args, &style),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn cmd_palettes() -> Result<()> {
    for palette in NAMED_PALETTES {
        println!("{}", palette.name);
        for (name, c) in palette.entries {
            println!("  {name:<16} {c}  {}", cmyk_pct(*c));
        }
    }
    print_list("Categorical", &CATEGORICAL);
    print_list("Sequential Blues", &SEQUENTIAL_BLUES);
    print_list("Diverging", &DIVERGING);
    println!("Color families");
    for fam in COLOR_FAMILIES {
        println!("  {:<16} light {}  dark {}", fam.name, fam.light, fam.dark);
    }
    Ok(())
}

fn cmd_columns(args: ColumnsArgs) -> Result<()> {
    let position: LegendPosition = args.position.parse()?;
    let plan = resolve_legend(&LegendRequest::at(position), &args.labels, args.bar);
    println!("position: {position}");
    println!("columns:  {}", plan.ncol);
    println!("location: {}", plan.location);
    match plan.anchor {
        Some((x, y)) => println!("anchor:   ({x}, {y})"),
        None => println!("anchor:   inside"),
    }
    println!("frame:    {}", plan.frame);
    Ok(())
}

fn demo_plot() -> ComparisonPlot {
    let mut plot = ComparisonPlot::new(
        vec![Group::new("Treatment", vec![1250.0, 1680.0, 2150.0, 2890.0])],
        ["Baseline", "1 Month", "3 Months", "6 Months"]
            .map(String::from)
            .to_vec(),
        "Wound area (mm²)",
    );
    plot.title = Some("Healing progression".to_string());
    plot.comparisons = vec![
        Comparison::new(2, 3, 0.025),
        Comparison::new(1, 3, 0.008),
        Comparison::new(0, 3, 0.0002),
    ];
    plot
}

fn cmd_demo(args: DemoArgs, style: &StyleConfig) -> Result<()> {
    let fig = create_comparison_plot(&demo_plot(), style)?;
    let options = ExportOptions {
        dpi: args.dpi,
        width_inches: Some(args.width),
        format: Some(ExportFormat::from_path(&args.out)?),
        cmyk: !args.rgb,
        validate: true,
    };
    let saved = save_prs_figure(&fig, &args.out, &options)?;
    for w in &saved.warnings {
        eprintln!("warning: {w}");
    }
    eprintln!(
        "Wrote {} ({}x{} px)",
        saved.path.display(),
        saved.pixels.0,
        saved.pixels.1
    );
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let report = validate_figure_file(&args.file, args.min_dpi, args.min_width);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    if !report.valid {
        anyhow::bail!("{} does not meet the figure requirements", args.file.display());
    }
    Ok(())
}
