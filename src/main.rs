// ABOUTME: Main entry point for the folio command line tools
// ABOUTME: Provides CLI interface and executes commands from the library

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use clap::{Args, Parser, Subcommand};
    use folio::carousel::{Carousel, PointerSource};
    use folio::headless::{advance_time, ManualTimers, RecordingSurface};
    use folio::page::{self, PageOptions};
    use folio::contact;
    use folio::{Config, Document, ResourceFile, WatchConfig};
    use std::fs;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    struct Cli {
        #[command(subcommand)]
        command: Option<Commands>,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Install carousel markup into a portfolio page
        Transform(TransformArgs),

        /// Prerender every page matching a glob pattern
        Batch(BatchArgs),

        /// Report which sections would become carousels
        Inspect(InspectArgs),

        /// Drive a headless carousel and print its timeline
        Simulate(SimulateArgs),

        /// Re-prerender a page whenever it or its resources change
        Watch(WatchArgs),
    }

    #[derive(Args)]
    struct LayoutArgs {
        /// Viewport width in CSS pixels to lay carousels out for
        #[arg(long)]
        width: Option<u32>,

        /// Section rules file replacing the built-in table
        #[arg(long)]
        rules: Option<PathBuf>,
    }

    #[derive(Args)]
    struct ResourceArgs {
        /// CSS files to include (local paths, or URLs which are always linked)
        #[arg(long, value_delimiter = ',')]
        css: Option<Vec<String>>,

        /// JavaScript files to include (local paths, or URLs which are always linked)
        #[arg(long, value_delimiter = ',')]
        js: Option<Vec<String>>,

        /// Mode for CSS/JS: 'embed' to embed content or 'link' to reference
        #[arg(long, default_value = "embed")]
        mode: String,
    }

    impl ResourceArgs {
        fn css_files(&self) -> Vec<ResourceFile> {
            self.css
                .iter()
                .flatten()
                .map(|path| ResourceFile::stylesheet(path))
                .collect()
        }

        fn js_files(&self) -> Vec<ResourceFile> {
            self.js
                .iter()
                .flatten()
                .map(|path| ResourceFile::script(path))
                .collect()
        }
    }

    #[derive(Args)]
    struct TransformArgs {
        /// Path to the source page
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the prerendered page
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        resources: ResourceArgs,
    }

    #[derive(Args)]
    struct BatchArgs {
        /// Glob pattern selecting source pages
        #[arg(short, long)]
        pattern: String,

        /// Directory receiving the prerendered pages
        #[arg(long)]
        out_dir: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    }

    #[derive(Args)]
    struct InspectArgs {
        /// Path to the source page
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    }

    #[derive(Args)]
    struct SimulateArgs {
        /// Number of slides
        #[arg(long, default_value_t = 5)]
        slides: usize,

        /// Viewport width in CSS pixels
        #[arg(long, default_value_t = 1440)]
        width: u32,

        /// Virtual time to run for, in milliseconds
        #[arg(long, default_value_t = 12000)]
        duration_ms: u64,

        /// Swipe by this many pixels (positive moves left) before running
        #[arg(long, allow_hyphen_values = true)]
        swipe: Option<f64>,
    }

    #[derive(Args)]
    struct WatchArgs {
        /// Path to the source page
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the prerendered page
        #[arg(short, long)]
        output: PathBuf,

        /// Debounce time for file events in milliseconds
        #[arg(long, default_value_t = 500)]
        debounce_ms: u64,

        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        resources: ResourceArgs,
    }

    fn app_config(layout: &LayoutArgs) -> Config {
        let mut config = Config::from_env();
        if let Some(width) = layout.width {
            config.viewport_width = width;
        }
        if let Some(rules) = &layout.rules {
            config.rules_path = Some(rules.clone());
        }
        config
    }

    fn embed_mode(mode: &str) -> anyhow::Result<bool> {
        match mode {
            "embed" => Ok(true),
            "link" => Ok(false),
            other => anyhow::bail!("Unknown resource mode '{}', expected embed or link", other),
        }
    }

    fn transform(args: &TransformArgs) -> anyhow::Result<()> {
        let config = app_config(&args.layout);
        let mut options = PageOptions::from_config(&config)?;
        options.css_files = args.resources.css_files();
        options.js_files = args.resources.js_files();
        options.embed_resources = embed_mode(&args.resources.mode)?;

        let (html, report) = page::prerender_file(&args.input, &options)?;
        page::write_html_to_file(&html, &args.output)?;
        for plan in &report.plans {
            println!(
                "#{}: {} slides, {} indicator(s)",
                plan.id, plan.slide_count, plan.indicator_count
            );
        }
        println!("Page written: {:?}", args.output);
        Ok(())
    }

    fn batch(args: &BatchArgs) -> anyhow::Result<()> {
        let options = PageOptions::from_config(&app_config(&args.layout))?;
        let written = page::prerender_batch(&args.pattern, &args.out_dir, &options)?;
        for path in &written {
            println!("{}", path.display());
        }
        println!("{} page(s) written to {:?}", written.len(), args.out_dir);
        Ok(())
    }

    fn inspect(args: &InspectArgs) -> anyhow::Result<()> {
        let options = PageOptions::from_config(&app_config(&args.layout))?;
        let source = fs::read_to_string(&args.input)?;
        let (_, report) = page::prerender(&source, &options)?;
        println!(
            "{:<40} {:<28} {:>8} {:>9}  result",
            "selector", "carousel id", "children", "threshold"
        );
        for outcome in &report.outcomes {
            println!(
                "{:<40} {:<28} {:>8} {:>9}  {}",
                outcome.selector,
                outcome.carousel_id,
                outcome.child_count,
                outcome.threshold.to_string(),
                if outcome.converted { "carousel" } else { "static" }
            );
        }
        for text in contact::copy_targets(&Document::parse(&source)?)? {
            println!("copies on click: {}", text);
        }
        Ok(())
    }

    fn simulate(args: &SimulateArgs) -> anyhow::Result<()> {
        let settings = Config::from_env().carousel_settings();
        let per_view = settings.breakpoints.slides_per_view(args.width);
        let indicators = folio::factory::indicator_count(args.slides, per_view);
        let mut carousel = Carousel::new(
            args.slides,
            args.width,
            settings,
            RecordingSurface::new(indicators, true),
            ManualTimers::default(),
        );
        println!(
            "{} slides, {} per view, max index {}",
            args.slides,
            per_view,
            carousel.max_index()
        );

        if let Some(distance) = args.swipe {
            carousel.drag_start(distance.max(0.0), PointerSource::Touch);
            carousel.drag_move(distance.max(0.0) - distance);
            carousel.drag_end();
            println!("swipe {:+}px -> index {}", distance, carousel.current_index());
        }

        let step = u64::from(settings.autoplay_ms);
        let mut elapsed = 0;
        while elapsed + step <= args.duration_ms {
            advance_time(&mut carousel, step);
            elapsed += step;
            println!(
                "t={:>6}ms index={} offset={}",
                elapsed,
                carousel.current_index(),
                folio::carousel::translate_x(carousel.surface().offset_percent)
            );
        }
        Ok(())
    }

    fn watch(args: &WatchArgs) -> anyhow::Result<()> {
        let mut app = app_config(&args.layout);
        app.embed_resources = embed_mode(&args.resources.mode)?;
        let watch_config = WatchConfig {
            page_path: args.input.clone(),
            html_output: args.output.clone(),
            css_files: args.resources.css_files(),
            js_files: args.resources.js_files(),
            debounce_ms: args.debounce_ms,
        };
        folio::watch_page(watch_config, &app)?;
        Ok(())
    }

    pub fn run() -> anyhow::Result<()> {
        let cli = Cli::parse();
        match &cli.command {
            Some(Commands::Transform(args)) => transform(args),
            Some(Commands::Batch(args)) => batch(args),
            Some(Commands::Inspect(args)) => inspect(args),
            Some(Commands::Simulate(args)) => simulate(args),
            Some(Commands::Watch(args)) => watch(args),
            None => {
                println!("No command specified. Use --help for usage information.");
                Ok(())
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
