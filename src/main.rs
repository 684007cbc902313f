use anyhow::{Context, Result};
use clap::Parser;
use figure_panel::{capture, cli, config, export, notify, panel, sink, upload};
use cli::{Cli, Commands};
use config::Config;
use export::{ExportKind, ExportPipeline, ExportRequest};
use panel::Panel;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display())),
        None => Ok(Config::load()?),
    }
}

fn load_panel(inputs: &[PathBuf], config: &Config) -> Result<Panel> {
    let payloads = upload::read_inputs(inputs).context("画像の読み込みに失敗しました")?;
    let mut panel = Panel::new(config.layout, config.caption.clone());
    panel.add_images(payloads);
    Ok(panel)
}

fn print_rows(panel: &Panel) -> Result<()> {
    let rows = panel.rows()?;
    for (index, row) in rows.rows().iter().enumerate() {
        let names: Vec<&str> = row.iter().map(|item| item.file_name.as_str()).collect();
        println!("  行{}: {}", index + 1, names.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Compose {
            inputs,
            captions,
            moves,
            format,
            clipboard,
            scale,
            background,
            output,
            out_dir,
            gap,
            padding,
        } => {
            println!("🖼  figure-panel - パネル作成\n");

            if let Some(format) = format {
                config.format = format;
            }
            if let Some(scale) = scale {
                config.scale = scale;
            }
            if let Some(background) = background {
                config.background = background;
            }
            if let Some(output) = output {
                config.filename = output;
            }
            if let Some(gap) = gap {
                config.layout.gap = gap;
            }
            if let Some(padding) = padding {
                config.layout.padding = padding;
            }
            config.validate()?;

            // 1. 画像読み込み
            println!("[1/3] 画像を読み込み中...");
            let mut panel = load_panel(&inputs, &config)?;
            println!("✔ {}枚の画像を追加\n", panel.len());

            // 2. 並べ替え・キャプション
            println!("[2/3] レイアウト中...");
            for arg in &moves {
                let (from, to) = cli::parse_move_arg(arg).map_err(anyhow::Error::msg)?;
                panel
                    .reorder(from, to)
                    .with_context(|| format!("並べ替えできません: {}", arg))?;
            }
            for arg in &captions {
                let (seq, text) = cli::parse_caption_arg(arg).map_err(anyhow::Error::msg)?;
                panel.set_caption_by_seq(seq, &text)?;
            }
            print_rows(&panel)?;
            println!();

            // 3. エクスポート
            let kind = if clipboard {
                ExportKind::Clipboard
            } else {
                ExportKind::from(config.format)
            };
            println!("[3/3] エクスポート中... ({} / {})", config.scale, config.background);
            let request = ExportRequest::from_config(&config, kind);
            let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
            let pipeline = ExportPipeline::new(
                capture::GridRasterizer::new(config.cell_width, config.image_height),
                sink::FsSink::new(out_dir),
                notify::ConsoleNotifier,
            )
            .with_settle(Duration::from_millis(config.settle_ms));

            let mut scene = panel.render_scene()?;
            let outcome = match pipeline.export(&mut scene, &request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // 通知済みなので再表示しない
                    tracing::debug!(error = %err, "export failed");
                    std::process::exit(1);
                }
            };
            if let Some(path) = outcome.path() {
                println!("✔ 出力: {}", path.display());
            }
        }

        Commands::Layout { inputs } => {
            println!("📐 figure-panel - 行分割\n");
            let panel = load_panel(&inputs, &config)?;
            println!("{}枚 / {}行", panel.len(), panel.rows()?.row_count());
            print_rows(&panel)?;
        }

        Commands::Config { show } => {
            if show {
                let path = match &cli.config {
                    Some(path) => path.clone(),
                    None => Config::config_path()?,
                };
                println!("設定ファイル: {}\n", path.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("使用方法: figure-panel config --show");
            }
        }
    }

    Ok(())
}
