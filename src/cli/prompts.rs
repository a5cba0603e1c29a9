//! User prompt functions for interactive CLI input.

use std::io::{self, BufRead, Write};

use crate::api::Credentials;

/// Ask for OAuth client credentials on the terminal. Returns `None` when the
/// user leaves either field empty.
pub fn prompt_credentials() -> io::Result<Option<Credentials>> {
    let stdin = io::stdin();
    read_credentials(&mut stdin.lock(), &mut io::stdout())
}

fn read_credentials<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<Credentials>> {
    writeln!(output)?;
    writeln!(output, "╔═══════════════════════════════════════════════════════════════╗")?;
    writeln!(output, "║  Mapwatch - osu! API credentials                              ║")?;
    writeln!(output, "╚═══════════════════════════════════════════════════════════════╝")?;
    writeln!(output)?;
    writeln!(output, "Create an OAuth application at https://osu.ppy.sh/home/account/edit")?;
    writeln!(output, "and paste its client id and secret. Leave empty to skip.")?;
    writeln!(output)?;

    let client_id = read_field(input, output, "Client ID: ")?;
    if client_id.is_empty() {
        return Ok(None);
    }
    let client_secret = read_field(input, output, "Client secret: ")?;
    if client_secret.is_empty() {
        return Ok(None);
    }

    writeln!(output)?;
    Ok(Some(Credentials::new(client_id, client_secret)))
}

fn read_field<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> io::Result<String> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
