use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};

use wordcard::{
    find_size_profile, segment, CardRasterizer, CardSizeProfile, ExportJob, FontCatalog,
    FsAssetSource, OverlayTransform, WordEntry, WordLibrary,
};

#[derive(Parser, Debug)]
#[command(name = "wordcard", version)]
struct Cli {
    /// Log render progress to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single card as a PNG.
    Card(CardArgs),
    /// Export selected cards as a multi-page A4 PDF.
    Pdf(ExportArgs),
    /// Export selected cards as a ZIP of PNGs.
    Archive(ExportArgs),
}

#[derive(Parser, Debug)]
struct CardArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Word id to render.
    #[arg(long)]
    word: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Word ids to export, in order. Defaults to the whole library.
    #[arg(long = "words", value_delimiter = ',')]
    words: Vec<String>,

    /// Output file path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Word library JSON. Artwork paths resolve relative to its directory.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Photo to overlay on every card.
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Segmentation service URL; when set, the photo's background is
    /// removed before rendering (best effort).
    #[arg(long)]
    segment_endpoint: Option<String>,

    /// Artwork template to prefer.
    #[arg(long, default_value = "cartoon")]
    template: String,

    /// Card size id (extra-large, large, standard, small, square, mini).
    #[arg(long, default_value = "standard")]
    size: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Card(args) => cmd_card(args),
        Command::Pdf(args) => cmd_export(args, Format::Pdf),
        Command::Archive(args) => cmd_export(args, Format::Archive),
    }
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_library(path: &Path) -> anyhow::Result<WordLibrary> {
    let bytes =
        fs::read(path).with_context(|| format!("open word library '{}'", path.display()))?;
    let library: WordLibrary =
        serde_json::from_slice(&bytes).with_context(|| "parse word library JSON")?;
    library.validate()?;
    Ok(library)
}

fn resolve_size(id: &str) -> anyhow::Result<CardSizeProfile> {
    match find_size_profile(id) {
        Some(profile) => Ok(*profile),
        None => bail!("unknown card size '{id}'"),
    }
}

fn load_photo(common: &CommonArgs) -> anyhow::Result<Option<image::RgbaImage>> {
    let Some(path) = &common.photo else {
        return Ok(None);
    };
    let mut bytes =
        fs::read(path).with_context(|| format!("open photo '{}'", path.display()))?;
    if let Some(endpoint) = &common.segment_endpoint {
        let client = reqwest::blocking::Client::new();
        bytes = segment::remove_background(&client, endpoint, bytes);
    }
    let img = image::load_from_memory(&bytes).context("decode photo")?;
    Ok(Some(img.to_rgba8()))
}

fn select_words(library: &WordLibrary, ids: &[String]) -> anyhow::Result<Vec<WordEntry>> {
    if ids.is_empty() {
        return Ok(library.words.clone());
    }
    ids.iter()
        .map(|id| {
            library
                .words
                .iter()
                .find(|w| &w.id == id)
                .cloned()
                .with_context(|| format!("word id '{id}' not in library"))
        })
        .collect()
}

enum Format {
    Pdf,
    Archive,
}

fn cmd_card(args: CardArgs) -> anyhow::Result<()> {
    let library = read_library(&args.common.in_path)?;
    let size = resolve_size(&args.common.size)?;
    let photo = load_photo(&args.common)?;
    let words = select_words(&library, std::slice::from_ref(&args.word))?;

    let assets_root = args
        .common
        .in_path
        .parent()
        .unwrap_or_else(|| Path::new("."));
    let source = FsAssetSource::new(assets_root);
    let fonts = FontCatalog::discover().ok();
    if fonts.is_none() {
        eprintln!("warning: no system fonts found, cards will have no text");
    }
    let raster = CardRasterizer::new(&source, fonts.as_ref());

    let word = &words[0];
    let card = raster.render(
        word,
        photo.as_ref(),
        &OverlayTransform::from_anchor(&word.anchor),
        &args.common.template,
        &size,
    );
    card.pixels
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write card '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs, format: Format) -> anyhow::Result<()> {
    let library = read_library(&args.common.in_path)?;
    let size = resolve_size(&args.common.size)?;
    let photo = load_photo(&args.common)?;
    let words = select_words(&library, &args.words)?;

    let assets_root = args
        .common
        .in_path
        .parent()
        .unwrap_or_else(|| Path::new("."));
    let source = FsAssetSource::new(assets_root);
    let fonts = FontCatalog::discover().ok();
    if fonts.is_none() {
        eprintln!("warning: no system fonts found, cards will have no text");
    }
    let raster = CardRasterizer::new(&source, fonts.as_ref());

    let mut job = ExportJob::new(words, size);
    job.photo = photo;
    job.template = args.common.template.clone();

    let bytes = match format {
        Format::Pdf => job.export_pdf(&raster)?,
        Format::Archive => job.export_archive(&raster)?,
    };
    fs::write(&args.out, bytes)
        .with_context(|| format!("write output '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
