use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "reelwright", version)]
struct Cli {
    /// Debug-level logging (overridden by `RUST_LOG`).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Narrate, compose and encode one video (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Show which sections would be narrated, without narrating them.
    Plan(PlanArgs),
    /// List the built-in category themes.
    Themes,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Script JSON: an object of section key to text.
    #[arg(long)]
    script: PathBuf,

    /// Category (sign) the video is about, e.g. `mesh` or `Aries`.
    #[arg(long)]
    category: String,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Run configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Director screenplay JSON carrying the mood.
    #[arg(long)]
    mood_file: Option<PathBuf>,

    /// Second line of the title card.
    #[arg(long)]
    title_subline: Option<String>,

    /// Category image library.
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Background music library.
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// Seed for music selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Keep intermediate artifacts.
    #[arg(long)]
    keep_scratch: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[arg(long)]
    script: PathBuf,

    /// Category whose theme is reported; the default theme when omitted.
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Themes => cmd_themes(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<reelwright::RunConfig> {
    let cfg = match path {
        Some(p) => reelwright::RunConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => reelwright::RunConfig::default(),
    };
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(s) = args.title_subline {
        config.title_subline = s;
    }
    if args.images_dir.is_some() {
        config.images_dir = args.images_dir;
    }
    if args.music_dir.is_some() {
        config.music_dir = args.music_dir;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.keep_scratch |= args.keep_scratch;
    config.validate(true)?;

    if !reelwright::is_ffmpeg_on_path() || !reelwright::is_ffprobe_on_path() {
        anyhow::bail!("ffmpeg and ffprobe must be on PATH to render");
    }

    let script = reelwright::Script::from_path(&args.script)?;
    let store = reelwright::FsAssetStore::new(config.images_dir.clone(), config.music_dir.clone());
    let compiler = reelwright::FfmpegCompiler::default();
    let screenplay = args.mood_file.map(reelwright::ScreenplayFile::new);
    let rasterizer = Arc::new(reelwright::SvgRasterizer::with_system_fonts());
    if rasterizer.font_face_count() == 0 {
        tracing::warn!("no system fonts found; captions will not render text");
    }

    let collab = reelwright::Collaborators {
        probe: &reelwright::FfprobeAudio,
        store: &store,
        compiler: &compiler,
        classifier: screenplay
            .as_ref()
            .map(|s| s as &dyn reelwright::MoodClassifier),
        rasterizer,
    };
    let mut ctx = reelwright::RunContext::from_config(&config, &args.category)?;
    let request = reelwright::RunRequest {
        script,
        category: args.category,
        out_path: args.out,
    };

    let report = reelwright::run(&config, &mut ctx, &collab, &request)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!("wrote {}", report.output.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    config.validate(false)?;
    let script = reelwright::Script::from_path(&args.script)?;
    let report = reelwright::plan(&config, &script, args.category.as_deref().unwrap_or_default())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_themes() -> anyhow::Result<()> {
    let themes = reelwright::ThemeResolver.all();
    println!("{}", serde_json::to_string_pretty(&themes)?);
    Ok(())
}
