//! Scope-ordered module lookup and listing

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::config::FootoConfig;
use crate::modules::error::{FootoError, InvalidModuleError, SecurityError};
use crate::modules::metadata::{load_descriptor, Descriptor, DESCRIPTOR_FILE};
use crate::modules::name::ModuleName;
use crate::modules::path_guard::confine;

/// Location a module may live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Bundled,
    /// Provisioned on disk but not searched by resolution yet
    Community,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Local, Scope::Bundled, Scope::Community];

    /// Priority order used by resolution. Local shadows bundled.
    pub const RESOLUTION_ORDER: [Scope; 2] = [Scope::Local, Scope::Bundled];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Bundled => "bundled",
            Scope::Community => "community",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Scope::Local => "Local",
            Scope::Bundled => "Bundled",
            Scope::Community => "Community",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module directory that passed path confinement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub name: ModuleName,
    pub dir: PathBuf,
    pub scope: Scope,
}

/// A module whose directory and descriptor both passed validation.
///
/// Only produced by [`ModuleResolver::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    descriptor: Descriptor,
    dir: PathBuf,
    scope: Scope,
}

impl ResolvedModule {
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(&self.descriptor.entry)
    }
}

/// What `list` found for one directory entry
#[derive(Debug, Clone)]
pub enum EntryStatus {
    Valid(Descriptor),
    MissingDescriptor,
    Invalid(String),
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct ListedModule {
    pub dir_name: String,
    pub status: EntryStatus,
}

/// What `list` found for one scope
#[derive(Debug, Clone)]
pub enum ScopeContents {
    DirectoryMissing,
    PermissionDenied,
    Modules(Vec<ListedModule>),
}

#[derive(Debug, Clone)]
pub struct ScopeListing {
    pub scope: Scope,
    pub contents: ScopeContents,
}

pub struct ModuleResolver<'a> {
    config: &'a FootoConfig,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(config: &'a FootoConfig) -> Self {
        Self { config }
    }

    /// Find the first scope holding a confined directory for `name`.
    ///
    /// A scope whose candidate fails confinement is logged and skipped so a
    /// compromised entry cannot hide a legitimate module elsewhere.
    pub fn locate(&self, name: &ModuleName) -> Option<ModuleLocation> {
        let modules_root = self.config.modules_dir();

        for scope in Scope::RESOLUTION_ORDER {
            let candidate = self.config.scope_dir(scope).join(name);
            match std::fs::metadata(&candidate) {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    error!(
                        "Security violation for module {}: cannot inspect {}: {}",
                        name,
                        candidate.display(),
                        e
                    );
                    continue;
                }
            }

            match confine(&candidate, &modules_root) {
                Ok(dir) => {
                    debug!("Found module '{}' in {} scope", name, scope);
                    return Some(ModuleLocation {
                        name: name.clone(),
                        dir,
                        scope,
                    });
                }
                Err(e) => {
                    error!("Security violation for module {}: {}", name, e);
                    continue;
                }
            }
        }

        None
    }

    /// Resolve a raw name to a validated module
    pub fn resolve(&self, raw_name: &str) -> Result<ResolvedModule, FootoError> {
        let name = ModuleName::parse(raw_name)?;

        let location = self
            .locate(&name)
            .ok_or_else(|| FootoError::ModuleNotFound {
                name: name.to_string(),
                searched: Scope::RESOLUTION_ORDER
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })?;

        let descriptor = load_location_descriptor(&location)?;
        if descriptor.name != location.name.as_str() {
            warn!(
                "Descriptor name '{}' differs from directory '{}'; using directory name",
                descriptor.name, location.name
            );
        }

        Ok(ResolvedModule {
            descriptor,
            dir: location.dir,
            scope: location.scope,
        })
    }

    /// Scopes rendered by `list`
    pub fn listed_scopes(&self) -> Vec<Scope> {
        if self.config.include_community_in_list {
            Scope::ALL.to_vec()
        } else {
            Scope::RESOLUTION_ORDER.to_vec()
        }
    }

    pub fn list(&self) -> Vec<ScopeListing> {
        self.listed_scopes()
            .into_iter()
            .map(|scope| ScopeListing {
                scope,
                contents: self.list_scope(scope),
            })
            .collect()
    }

    /// Enumerate one scope. Problems with individual modules are annotated,
    /// never raised.
    pub fn list_scope(&self, scope: Scope) -> ScopeContents {
        let scope_dir = self.config.scope_dir(scope);
        if !scope_dir.is_dir() {
            return ScopeContents::DirectoryMissing;
        }

        let mut modules = Vec::new();
        let walker = WalkDir::new(&scope_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let denied = e
                        .io_error()
                        .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied);
                    if denied && e.depth() == 0 {
                        return ScopeContents::PermissionDenied;
                    }
                    warn!("Failed to read entry in {}: {}", scope_dir.display(), e);
                    continue;
                }
            };

            let dir_name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type();

            if file_type.is_symlink() {
                if entry.path().is_dir() {
                    warn!("Symlinked module directory rejected: {}", entry.path().display());
                    modules.push(ListedModule {
                        dir_name,
                        status: EntryStatus::Rejected("symlinks are not allowed".to_string()),
                    });
                }
                continue;
            }
            if !file_type.is_dir() {
                continue;
            }

            let status = self.inspect(scope, &dir_name, entry.path());
            modules.push(ListedModule { dir_name, status });
        }

        ScopeContents::Modules(modules)
    }

    fn inspect(&self, scope: Scope, dir_name: &str, dir: &Path) -> EntryStatus {
        if let Err(e) = ModuleName::parse(dir_name) {
            warn!("Module directory '{}' in {} scope has an invalid name: {}", dir_name, scope, e);
            return EntryStatus::Rejected(e.to_string());
        }

        if let Err(e) = confine(dir, &self.config.modules_dir()) {
            error!("Security violation for module {}: {}", dir_name, e);
            return EntryStatus::Rejected(e.to_string());
        }

        let file = match descriptor_file(dir) {
            Ok(Some(file)) => file,
            Ok(None) => return EntryStatus::MissingDescriptor,
            Err(FootoError::Security(e)) => {
                error!("Security violation for module {}: {}", dir_name, e);
                return EntryStatus::Rejected(e.to_string());
            }
            Err(e) => {
                warn!("Invalid module {}: {}", dir_name, e);
                return EntryStatus::Invalid(e.to_string());
            }
        };

        match load_descriptor(&file) {
            Ok(descriptor) => EntryStatus::Valid(descriptor),
            Err(e) => {
                warn!("Invalid module {}: {}", dir_name, e);
                EntryStatus::Invalid(e.to_string())
            }
        }
    }
}

/// Path of the descriptor in `dir`, or `None` when there is none. A
/// symlinked descriptor is a security violation.
fn descriptor_file(dir: &Path) -> Result<Option<PathBuf>, FootoError> {
    let file = dir.join(DESCRIPTOR_FILE);

    match std::fs::symlink_metadata(&file) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            Err(SecurityError::Symlink { path: file }.into())
        }
        Ok(_) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(InvalidModuleError::Unreadable { file, error }.into()),
    }
}

fn load_location_descriptor(location: &ModuleLocation) -> Result<Descriptor, FootoError> {
    let file = descriptor_file(&location.dir)?.ok_or_else(|| {
        InvalidModuleError::MissingDescriptor {
            module: location.name.to_string(),
        }
    })?;

    Ok(load_descriptor(&file)?)
}
