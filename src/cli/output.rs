use serde_json::Value;
use std::borrow::Cow;
use std::io::{self, Write};

use crate::modules::editor::EditorOutcome;
use crate::modules::lifecycle::CreatedModule;
use crate::modules::resolver::{EntryStatus, ResolvedModule, ScopeContents, ScopeListing};

const DESCRIPTION_WIDTH: usize = 80;
const ANNOTATION_WIDTH: usize = 50;

/// Truncate to `width` characters, appending `...` when shortened
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width).collect();
    format!("{head}...")
}

/// Strings print bare; other JSON values keep their JSON form
fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Render `list` output grouped by scope
pub fn write_listing(out: &mut impl Write, listings: &[ScopeListing]) -> io::Result<()> {
    writeln!(out, "Available modules:")?;

    for listing in listings {
        writeln!(out)?;
        writeln!(out, "  {}:", listing.scope.title())?;

        let modules = match &listing.contents {
            ScopeContents::DirectoryMissing => {
                writeln!(out, "    (directory not found)")?;
                continue;
            }
            ScopeContents::PermissionDenied => {
                writeln!(out, "    (permission denied)")?;
                continue;
            }
            ScopeContents::Modules(modules) => modules,
        };

        if modules.is_empty() {
            writeln!(out, "    (no modules found)")?;
            continue;
        }

        for module in modules {
            match &module.status {
                EntryStatus::Valid(descriptor) => {
                    writeln!(out, "    - {} (v{})", module.dir_name, descriptor.version)?;
                    if !descriptor.description.is_empty() {
                        writeln!(
                            out,
                            "      {}",
                            truncate(&descriptor.description, DESCRIPTION_WIDTH)
                        )?;
                    }
                }
                EntryStatus::MissingDescriptor => {
                    writeln!(out, "    - {} (⚠ Missing meta.json)", module.dir_name)?;
                }
                EntryStatus::Invalid(reason) => {
                    writeln!(
                        out,
                        "    - {} (⚠ Invalid: {})",
                        module.dir_name,
                        truncate(reason, ANNOTATION_WIDTH)
                    )?;
                }
                EntryStatus::Rejected(reason) => {
                    writeln!(
                        out,
                        "    - {} (⚠ Rejected: {})",
                        module.dir_name,
                        truncate(reason, ANNOTATION_WIDTH)
                    )?;
                }
            }
        }
    }

    Ok(())
}

/// Render `info` output for a resolved module
pub fn write_module_info(out: &mut impl Write, module: &ResolvedModule) -> io::Result<()> {
    let descriptor = module.descriptor();
    let name = module
        .dir()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| descriptor.name.clone());

    writeln!(out)?;
    writeln!(out, "Module: {name}")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "  Scope:       {}", module.scope())?;
    writeln!(out, "  Version:     {}", descriptor.version)?;
    writeln!(out, "  Description: {}", descriptor.description)?;
    writeln!(out, "  Language:    {}", descriptor.lang)?;
    writeln!(out, "  Entry:       {}", descriptor.entry)?;
    writeln!(out, "  Path:        {}", module.dir().display())?;

    if !descriptor.args.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Arguments:")?;
        for arg in &descriptor.args {
            writeln!(out, "    {}:", arg.name)?;
            writeln!(out, "      Description: {}", arg.description)?;
            writeln!(out, "      Type:        {}", arg.arg_type)?;
            if let Some(default) = &arg.default_value {
                writeln!(out, "      Default:     {}", display_value(default))?;
            }
        }
    }

    Ok(())
}

/// Render the summary printed after `create`
pub fn write_created(out: &mut impl Write, created: &CreatedModule) -> io::Result<()> {
    writeln!(out, "✓ Module '{}' created successfully.", created.name)?;
    writeln!(out, "  Location: {}", created.dir.display())?;
    writeln!(out, "  Metadata: {}", created.descriptor_file.display())?;
    writeln!(out, "  Script:   {}", created.script_file.display())?;

    match &created.editor {
        EditorOutcome::Opened | EditorOutcome::Backgrounded => {}
        EditorOutcome::Skipped(_) | EditorOutcome::Failed(_) => {
            writeln!(out)?;
            writeln!(out, "  Edit your module files at: {}", created.dir.display())?;
        }
    }

    Ok(())
}
