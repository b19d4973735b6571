// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// walletsheet: render a wallet recovery sheet from backup JSON.
//
// Entry point. Initialises logging, layers render options (defaults, options
// file, flags), and writes the sheet as HTML or PDF.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{error, info};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{ImageFormat, PaperSize, QrErrorCorrection};
use walletsheet_core::RenderOverrides;
use walletsheet_document::{HtmlTemplate, RecoverySheet, RenderModel, dataurl};

#[derive(Parser, Debug)]
#[command(name = "walletsheet")]
#[command(about = "Render a printable wallet recovery sheet", long_about = None)]
#[command(version)]
struct Cli {
    /// Backup data JSON file
    #[arg(short, long)]
    backup: PathBuf,

    /// Wallet identifier printed on the sheet
    #[arg(short, long)]
    identifier: String,

    /// Extra info JSON file (object or array)
    #[arg(short, long)]
    extra: Option<PathBuf>,

    /// Render options JSON file, applied before the flags below
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pdf)]
    format: OutputFormat,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// HTML template file (HTML output only)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Leave out the backup info page
    #[arg(long)]
    no_page1: bool,

    /// Leave out the password encrypted secret page
    #[arg(long)]
    no_page2: bool,

    /// Leave out the recovery instructions
    #[arg(long)]
    no_page3: bool,

    /// Network name used in the title
    #[arg(long)]
    network: Option<String>,

    /// Branding image (PNG or JPEG) drawn at the top of every page
    #[arg(long)]
    branding: Option<PathBuf>,

    /// Paper size for PDF output
    #[arg(long, value_enum)]
    paper: Option<Paper>,

    /// QR error correction level
    #[arg(long, value_enum)]
    qr_level: Option<QrLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Paper {
    A4,
    A5,
    Letter,
    Legal,
}

impl From<Paper> for PaperSize {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A4 => PaperSize::A4,
            Paper::A5 => PaperSize::A5,
            Paper::Letter => PaperSize::Letter,
            Paper::Legal => PaperSize::Legal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QrLevel {
    Low,
    Medium,
    Quartile,
    High,
}

impl From<QrLevel> for QrErrorCorrection {
    fn from(level: QrLevel) -> Self {
        match level {
            QrLevel::Low => QrErrorCorrection::Low,
            QrLevel::Medium => QrErrorCorrection::Medium,
            QrLevel::Quartile => QrErrorCorrection::Quartile,
            QrLevel::High => QrErrorCorrection::High,
        }
    }
}

impl Cli {
    /// Overrides given directly on the command line.
    fn flag_overrides(&self) -> Result<RenderOverrides> {
        let branding_image = match &self.branding {
            Some(path) => Some(load_branding(path)?),
            None => None,
        };
        Ok(RenderOverrides {
            page1: self.no_page1.then_some(false),
            page2: self.no_page2.then_some(false),
            page3: self.no_page3.then_some(false),
            branding_image,
            network: self.network.clone(),
            paper_size: self.paper.map(PaperSize::from),
            qr_error_correction: self.qr_level.map(QrErrorCorrection::from),
        })
    }

    /// Options file first, flags on top.
    fn overrides(&self) -> Result<RenderOverrides> {
        let from_file = match &self.options {
            Some(path) => serde_json::from_value(read_json(path)?)?,
            None => RenderOverrides::default(),
        };
        Ok(from_file.or_from(self.flag_overrides()?))
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        SheetError::InvalidInput(format!("cannot read {}: {err}", path.display()))
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn load_branding(path: &Path) -> Result<walletsheet_core::types::ImageRef> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| {
            SheetError::InvalidInput(format!(
                "branding image must be .png, .jpg or .jpeg: {}",
                path.display()
            ))
        })?;
    let bytes = std::fs::read(path)?;
    Ok(dataurl::encode(format, &bytes))
}

async fn run(cli: Cli) -> Result<()> {
    // Fail on a bad template before any parsing or QR work.
    let template = match (&cli.template, cli.format) {
        (Some(path), OutputFormat::Html) => Some(HtmlTemplate::load(path)?),
        (None, OutputFormat::Html) => Some(HtmlTemplate::builtin()),
        (_, OutputFormat::Pdf) => None,
    };

    let backup = read_json(&cli.backup)?;
    let extra = match &cli.extra {
        Some(path) => read_json(path)?,
        None => Value::Null,
    };
    let model = RenderModel::from_json(cli.identifier.clone(), &backup, &extra, cli.overrides()?)?;
    info!(
        identifier = model.identifier(),
        keys = model.public_keys().len(),
        "Render model ready"
    );

    let sheet = RecoverySheet::new(model);
    match template {
        Some(template) => sheet.write_html_to_file(&template, &cli.output)?,
        None => {
            let bytes = sheet.render_pdf_async().await?;
            std::fs::write(&cli.output, bytes)?;
            info!("Wrote PDF sheet to {}", cli.output.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Rendering failed");
            if err.is_caller_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
