use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use thiep::{
    CompositionRequest, Compositor, DownloadChannel, Exporter, LoadedFont, PreviewController,
    TemplateRegistry, suggested_file_name,
};

#[derive(Parser, Debug)]
#[command(name = "thiep", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one personalized invitation and save it as a PNG.
    Compose(ComposeArgs),
    /// List registered template ids.
    Templates(TemplatesArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Template id (e.g. `hanoi`).
    #[arg(long)]
    template: String,

    /// Guest name to render onto the template.
    #[arg(long)]
    name: String,

    /// Output directory for the personalized PNG.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Directory containing template art.
    #[arg(long, default_value = "assets/templates")]
    assets_root: PathBuf,

    /// Font file used for name rendering.
    #[arg(long, default_value = "assets/fonts/DejaVuSerif-Italic.ttf")]
    font: PathBuf,

    /// JSON registry (array of template descriptors) replacing the built-in
    /// template set.
    #[arg(long)]
    registry: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// JSON registry replacing the built-in template set.
    #[arg(long)]
    registry: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Templates(args) => cmd_templates(args),
    }
}

fn load_registry(path: Option<&PathBuf>) -> anyhow::Result<TemplateRegistry> {
    match path {
        Some(p) => {
            let json = fs::read_to_string(p)
                .with_context(|| format!("read registry '{}'", p.display()))?;
            Ok(TemplateRegistry::from_json_str(&json)?)
        }
        None => Ok(TemplateRegistry::builtin()),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_ref())?;
    let font = LoadedFont::from_path("DejaVu Serif", &args.font)?;
    let mut controller =
        PreviewController::new(registry, Compositor::new(font), &args.assets_root);

    let request = CompositionRequest::new(args.template, &args.name)?;
    controller.on_input_changed(&request)?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let mut exporter = Exporter::new(vec![Box::new(DownloadChannel::new(&args.out))]);
    let result = controller.on_export_requested(&mut exporter)?;
    anyhow::ensure!(result.success, "download channel did not deliver");

    let out = args.out.join(suggested_file_name(&args.name));
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_ref())?;
    for id in registry.ids() {
        println!("{id}");
    }
    Ok(())
}
