//! Module lifecycle: creation and invocation
//!
//! Composes name validation, resolution, descriptor validation and command
//! synthesis. Every operation takes its configuration explicitly.

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::FootoConfig;
use crate::modules::command::build_source_command;
use crate::modules::editor::{EditorLauncher, EditorOutcome};
use crate::modules::error::{FootoError, InvalidModuleError, Result};
use crate::modules::metadata::{Descriptor, DESCRIPTOR_FILE, MAX_SCRIPT_SIZE};
use crate::modules::name::ModuleName;
use crate::modules::path_guard::{check_file_size, confine};
use crate::modules::permissions::{create_private_dir, write_private_file};
use crate::modules::resolver::{ModuleResolver, ResolvedModule, Scope, ScopeListing};

/// Files written by a successful `create`
#[derive(Debug, Clone)]
pub struct CreatedModule {
    pub name: ModuleName,
    pub dir: PathBuf,
    pub descriptor_file: PathBuf,
    pub script_file: PathBuf,
    pub editor: EditorOutcome,
}

pub struct ModuleLifecycle<'a> {
    config: &'a FootoConfig,
    editor: Box<dyn EditorLauncher + 'a>,
}

impl<'a> ModuleLifecycle<'a> {
    pub fn new(config: &'a FootoConfig, editor: Box<dyn EditorLauncher + 'a>) -> Self {
        Self { config, editor }
    }

    pub fn resolver(&self) -> ModuleResolver<'a> {
        ModuleResolver::new(self.config)
    }

    /// Create a new module skeleton in the local scope
    pub async fn create(&self, raw_name: &str) -> Result<CreatedModule> {
        let name = ModuleName::parse(raw_name)?;

        if let Some(existing) = self.resolver().locate(&name) {
            return Err(FootoError::AlreadyExists {
                name: name.to_string(),
                scope: existing.scope.to_string(),
            });
        }

        let dir = self.config.scope_dir(Scope::Local).join(&name);
        info!("Creating new module: {}", name);

        create_private_dir(&dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => FootoError::AlreadyExists {
                name: name.to_string(),
                scope: Scope::Local.to_string(),
            },
            _ => FootoError::io(format!("create module directory {}", dir.display()), e),
        })?;

        let descriptor = Descriptor::template(name.as_str());
        let (descriptor_file, script_file) = match write_skeleton(&dir, &descriptor) {
            Ok(files) => files,
            Err(e) => {
                error!("Module creation failed, removing {}: {}", dir.display(), e);
                if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                    warn!("Failed to remove partial module {}: {}", dir.display(), cleanup);
                }
                return Err(e);
            }
        };

        let editor = self
            .editor
            .open(&[descriptor_file.clone(), script_file.clone()])
            .await;
        if !editor.opened() {
            warn!("Editor not opened for module '{}': {:?}", name, editor);
        }

        info!("Module '{}' created successfully", name);
        Ok(CreatedModule {
            name,
            dir,
            descriptor_file,
            script_file,
            editor,
        })
    }

    /// Resolve and validate a module for display
    pub fn info(&self, raw_name: &str) -> Result<ResolvedModule> {
        self.resolver().resolve(raw_name)
    }

    /// Resolve, validate and build the sourcing line for a module
    pub fn run(&self, raw_name: &str, args: &[String]) -> Result<String> {
        let module = self.resolver().resolve(raw_name)?;
        let descriptor = module.descriptor();

        let candidate = module.entry_path();
        if !candidate.is_file() {
            return Err(InvalidModuleError::EntryMissing {
                entry: descriptor.entry.clone(),
            }
            .into());
        }

        let entry = confine(&candidate, module.dir())?;
        check_file_size(&entry, MAX_SCRIPT_SIZE)?;

        let line = build_source_command(descriptor.lang, &entry, args)?;
        info!(
            "Executed module '{}' from {} scope",
            raw_name,
            module.scope()
        );
        Ok(line)
    }

    /// Enumerate modules per scope. Never fails as a whole.
    pub fn list(&self) -> Vec<ScopeListing> {
        self.resolver().list()
    }
}

fn write_skeleton(dir: &std::path::Path, descriptor: &Descriptor) -> Result<(PathBuf, PathBuf)> {
    let descriptor_file = dir.join(DESCRIPTOR_FILE);
    let json = descriptor.to_json_pretty().map_err(|e| {
        FootoError::io(
            "serialize descriptor",
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    write_private_file(&descriptor_file, json.as_bytes(), false)
        .map_err(|e| FootoError::io(format!("write {}", descriptor_file.display()), e))?;

    let script_file = dir.join(&descriptor.entry);
    write_private_file(&script_file, script_template(descriptor).as_bytes(), true)
        .map_err(|e| FootoError::io(format!("write {}", script_file.display()), e))?;

    Ok((descriptor_file, script_file))
}

fn script_template(descriptor: &Descriptor) -> String {
    format!(
        r#"#!/usr/bin/env {lang}
# Module: {name}
# Description: {description}
# Version: {version}
#
# This file is sourced into the calling shell, so changes to variables,
# aliases and the working directory persist after it returns.

echo "Hello from {name}!"
echo "Arguments: $@"

# Your code here
"#,
        lang = descriptor.lang,
        name = descriptor.name,
        description = descriptor.description,
        version = descriptor.version,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::editor::NoopEditor;
    use crate::modules::error::SecurityError;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FootoConfig) {
        let temp_dir = TempDir::new().unwrap();
        let config = FootoConfig::with_root(temp_dir.path().join("footo"));
        config.initialize_directories().unwrap();
        (temp_dir, config)
    }

    fn lifecycle(config: &FootoConfig) -> ModuleLifecycle<'_> {
        ModuleLifecycle::new(config, Box::new(NoopEditor))
    }

    #[tokio::test]
    async fn test_create_then_run() {
        let (_guard, config) = setup();
        let lifecycle = lifecycle(&config);

        let created = lifecycle.create("hello").await.unwrap();
        assert!(created.descriptor_file.is_file());
        assert!(created.script_file.is_file());
        assert!(!created.editor.opened());

        let line = lifecycle
            .run("hello", &["a b".to_string(), "it's".to_string()])
            .unwrap();
        let words = shell_words::split(&line).unwrap();
        assert_eq!(words[0], "source");
        assert!(words[1].ends_with("local/hello/script.sh"));
        assert_eq!(&words[2..], ["a b", "it's"]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_name_without_writes() {
        let (_guard, config) = setup();
        let result = lifecycle(&config).create("../escape").await;
        assert!(matches!(result, Err(FootoError::Validation(_))));
        assert_eq!(
            std::fs::read_dir(config.scope_dir(Scope::Local)).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_create_twice_is_a_collision() {
        let (_guard, config) = setup();
        let lifecycle = lifecycle(&config);
        lifecycle.create("hello").await.unwrap();

        assert!(matches!(
            lifecycle.create("hello").await,
            Err(FootoError::AlreadyExists { scope, .. }) if scope == "local"
        ));
    }

    #[test]
    fn test_run_missing_entry_script() {
        let (_guard, config) = setup();
        let dir = config.scope_dir(Scope::Local).join("noscript");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(DESCRIPTOR_FILE),
            r#"{"name":"noscript","version":"1.0.0","description":"d","lang":"bash","entry":"script.sh"}"#,
        )
        .unwrap();

        assert!(matches!(
            lifecycle(&config).run("noscript", &[]),
            Err(FootoError::InvalidModule(InvalidModuleError::EntryMissing { .. }))
        ));
    }

    #[test]
    fn test_run_rejects_entry_escaping_module_dir() {
        let (_guard, config) = setup();
        let local = config.scope_dir(Scope::Local);
        let dir = local.join("sneaky");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(local.join("outside.sh"), "echo pwned\n").unwrap();
        std::fs::write(
            dir.join(DESCRIPTOR_FILE),
            r#"{"name":"sneaky","version":"1.0.0","description":"d","lang":"bash","entry":"../outside.sh"}"#,
        )
        .unwrap();

        assert!(matches!(
            lifecycle(&config).run("sneaky", &[]),
            Err(FootoError::Security(SecurityError::OutsideRoot { .. }))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_rejects_symlinked_entry() {
        let (guard, config) = setup();
        let dir = config.scope_dir(Scope::Local).join("linked");
        std::fs::create_dir_all(&dir).unwrap();
        let target = guard.path().join("payload.sh");
        std::fs::write(&target, "echo pwned\n").unwrap();
        std::os::unix::fs::symlink(&target, dir.join("script.sh")).unwrap();
        std::fs::write(
            dir.join(DESCRIPTOR_FILE),
            r#"{"name":"linked","version":"1.0.0","description":"d","lang":"bash","entry":"script.sh"}"#,
        )
        .unwrap();

        assert!(matches!(
            lifecycle(&config).run("linked", &[]),
            Err(FootoError::Security(SecurityError::Symlink { .. }))
        ));
    }

    #[test]
    fn test_run_pwsh_module() {
        let (_guard, config) = setup();
        let dir = config.scope_dir(Scope::Bundled).join("pwshmod");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Main.ps1"), "Write-Host hi\n").unwrap();
        std::fs::write(
            dir.join(DESCRIPTOR_FILE),
            r#"{"name":"pwshmod","version":"2.0.0","description":"d","lang":"pwsh","entry":"Main.ps1"}"#,
        )
        .unwrap();

        let line = lifecycle(&config)
            .run("pwshmod", &["it's".to_string()])
            .unwrap();
        assert!(line.starts_with(". '"));
        assert!(line.ends_with("Main.ps1' 'it''s'"));
    }
}
