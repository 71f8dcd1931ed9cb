//! Sourcing command synthesis
//!
//! Builds the single line the wrapper shell function evaluates. Nothing is
//! executed here.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use crate::modules::error::InvalidModuleError;
use crate::modules::metadata::Language;

/// Build the sourcing line for an already-parsed language
pub fn build_source_command(
    lang: Language,
    entry: &Path,
    args: &[String],
) -> Result<String, InvalidModuleError> {
    let entry_str = entry
        .to_str()
        .ok_or_else(|| InvalidModuleError::UnrepresentablePath {
            path: entry.to_path_buf(),
        })?;

    let mut line = String::from(lang.source_keyword());
    line.push(' ');
    line.push_str(&quote(lang, entry_str));
    for arg in args {
        line.push(' ');
        line.push_str(&quote(lang, arg));
    }
    Ok(line)
}

/// Same as [`build_source_command`] for a language name that has not been
/// checked yet
pub fn build_source_command_for(
    lang: &str,
    entry: &Path,
    args: &[String],
) -> Result<String, InvalidModuleError> {
    let lang: Language = lang.parse()?;
    build_source_command(lang, entry, args)
}

/// Quote one word so the target shell reads it back as exactly `arg`
pub fn quote(lang: Language, arg: &str) -> Cow<'_, str> {
    match lang {
        Language::Bash => quote_posix(arg),
        Language::Pwsh => Cow::Owned(quote_pwsh(arg)),
    }
}

fn is_posix_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '/' | ',' | ':' | '@' | '%' | '+' | '=')
}

fn quote_posix(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_posix_safe) {
        return Cow::Borrowed(arg);
    }

    if arg.chars().any(char::is_control) {
        return Cow::Owned(quote_ansi_c(arg));
    }

    Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
}

/// `$'...'` quoting keeps control characters on one line
fn quote_ansi_c(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 3);
    out.push_str("$'");
    for c in arg.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c if c.is_control() && (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// PowerShell treats the typographic single quotes like `'`
fn is_pwsh_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

fn is_pwsh_double_quote(c: char) -> bool {
    matches!(c, '"' | '\u{201C}' | '\u{201D}' | '\u{201E}')
}

fn quote_pwsh(arg: &str) -> String {
    if arg.chars().any(char::is_control) {
        return quote_pwsh_expandable(arg);
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for c in arg.chars() {
        if is_pwsh_single_quote(c) {
            out.push(c);
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Double-quoted literal with backtick escapes, used only when control
/// characters would otherwise break the line
fn quote_pwsh_expandable(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        match c {
            '`' | '$' => {
                out.push('`');
                out.push(c);
            }
            c if is_pwsh_double_quote(c) => {
                out.push('`');
                out.push(c);
            }
            '\0' => out.push_str("`0"),
            '\u{07}' => out.push_str("`a"),
            '\u{08}' => out.push_str("`b"),
            '\u{0C}' => out.push_str("`f"),
            '\n' => out.push_str("`n"),
            '\r' => out.push_str("`r"),
            '\t' => out.push_str("`t"),
            '\u{0B}' => out.push_str("`v"),
            '\u{1B}' => out.push_str("`e"),
            c if c.is_control() => {
                let _ = write!(out, "`u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
