use std::io::{self, IsTerminal, Read};

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "chat-ocr-rust",
    version,
    about = "Rebuild speaker-attributed chat messages from screenshot OCR output"
)]
struct Cli {
    /// OCR output file (stdin when omitted)
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Input format: json (blocks of lines) or tsv (tesseract TSV)
    #[arg(short = 'I', long = "input-format")]
    input_format: Option<String>,

    /// Screenshot width in pixels (overrides the input)
    #[arg(long = "width")]
    width: Option<u32>,

    /// Screenshot height in pixels (overrides the input)
    #[arg(long = "height")]
    height: Option<u32>,

    /// Attribution strategy: group or line (default from settings)
    #[arg(short = 's', long = "strategy")]
    strategy: Option<String>,

    /// Locale pack code (e.g. ko, en)
    #[arg(short = 'l', long = "locale")]
    locale: Option<String>,

    /// Display name of the conversation partner
    #[arg(short = 'p', long = "partner")]
    partner: Option<String>,

    /// Output format: json or text
    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    chat_ocr_rust::logging::init(cli.verbose)?;

    let input = if cli.data.is_some() || io::stdin().is_terminal() {
        None
    } else {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer)
            .map_err(|_| anyhow!("stdin must be UTF-8 OCR output (binary detected)"))?;
        Some(text)
    };

    let output = chat_ocr_rust::run(
        chat_ocr_rust::Config {
            data: cli.data,
            input_format: cli.input_format,
            width: cli.width,
            height: cli.height,
            strategy: cli.strategy,
            locale: cli.locale,
            partner_name: cli.partner,
            output_format: cli.format,
            settings_path: cli.read_settings,
        },
        input,
    )?;

    println!("{}", output);
    Ok(())
}
