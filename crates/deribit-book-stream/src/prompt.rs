/*
[INPUT]:  Operator input on standard input
[OUTPUT]: Validated instrument identifier
[POS]:    CLI interactive flow
[UPDATE]: When changing how the instrument is collected
*/

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use dialoguer::{Input, theme::ColorfulTheme};

use crate::config::validate_instrument;

const PROMPT: &str = "Enter the instrument name (e.g., BTC-PERPETUAL)";

/// Ask for the instrument. Uses an interactive prompt on a terminal and a
/// single line read otherwise, so the binary can be driven from a pipe.
pub fn prompt_instrument() -> Result<String> {
    let raw = if io::stdin().is_terminal() {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()
            .context("read instrument from terminal")?
    } else {
        let mut stderr = io::stderr();
        write!(stderr, "{PROMPT}: ").context("write prompt")?;
        stderr.flush().context("flush prompt")?;
        read_line(io::stdin().lock())?
    };
    validate_instrument(&raw)
}

fn read_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("read instrument from stdin")?;
    Ok(line)
}
