// Copyright (c) 2026 n0cturne

use std::io::IsTerminal;

use clap::Parser;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  redrain --fps 60 --token XYZTENA --reset-pct 2.5\n\nKEY CONTROLS:\n  q or Esc quit, space restart, t theme, p pause, c cursor";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_block(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  redrain") {
            out.push_str("  \x1b[1;34mredrain\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        out.push_str(line);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_block(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "redrain", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS for every animation clock (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 'l',
        long = "light",
        help_heading = "APPEARANCE",
        help = "Start in the light theme (blue rain on white)"
    )]
    pub light: bool,

    #[arg(
        long = "no-cursor",
        help_heading = "GENERAL",
        help = "Disable the pointer dot and its trailing ring"
    )]
    pub no_cursor: bool,

    #[arg(
        long = "no-panel",
        help_heading = "GENERAL",
        help = "Disable the bordered token panel and its rain"
    )]
    pub no_panel: bool,

    #[arg(
        short = 't',
        long = "token",
        default_value = "XYZTENA",
        help_heading = "APPEARANCE",
        help = "Brand token shown on the panel and mixed into its glyphs"
    )]
    pub token: String,

    #[arg(
        long = "reset-pct",
        default_value_t = 2.5,
        help_heading = "PERFORMANCE",
        help = "Chance per frame that a finished column restarts, in percent (min 0 max 100)"
    )]
    pub reset_pct: f32,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,8,24). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-themes",
        help_heading = "HELP",
        help = "List available themes and exit"
    )]
    pub list_themes: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn print_list_themes() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE THEMES:\x1b[0m");
        println!("\x1b[2mNOTE: The t key flips between them at runtime.\x1b[0m");
    } else {
        println!("AVAILABLE THEMES:");
        println!("NOTE: The t key flips between them at runtime.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("dark         Red rain on near-black (default)");
    println!("light        Blue rain on white (--light)");
}
