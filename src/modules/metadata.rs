//! Module descriptor (`meta.json`) model and validation

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::modules::error::{InvalidModuleError, SecurityError};

pub const DESCRIPTOR_FILE: &str = "meta.json";
pub const MAX_META_SIZE: u64 = 100 * 1024;
pub const MAX_SCRIPT_SIZE: u64 = 10 * 1024 * 1024;

const REQUIRED_FIELDS: [&str; 5] = ["name", "version", "description", "lang", "entry"];

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("version pattern is valid"));

/// Script language a module is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bash,
    Pwsh,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Bash, Language::Pwsh];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Bash => "bash",
            Language::Pwsh => "pwsh",
        }
    }

    /// Extension the entry script must carry
    pub fn extension(self) -> &'static str {
        match self {
            Language::Bash => ".sh",
            Language::Pwsh => ".ps1",
        }
    }

    /// Keyword that sources a script into the current shell
    pub fn source_keyword(self) -> &'static str {
        match self {
            Language::Bash => "source",
            Language::Pwsh => ".",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = InvalidModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| InvalidModuleError::UnsupportedLanguage {
                lang: s.to_string(),
            })
    }
}

/// Documented module argument. Not enforced at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub arg_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// Validated module descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub lang: Language,
    pub entry: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSpec>,
}

impl Descriptor {
    /// Descriptor written for a freshly created module
    pub fn template(name: &str) -> Self {
        let lang = Language::Bash;
        Self {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: format!("A new {name} module."),
            lang,
            entry: format!("script{}", lang.extension()),
            args: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Load and validate a descriptor file. Validation is all-or-nothing.
///
/// Only a regular file is opened, and at most `MAX_META_SIZE` bytes are
/// read from it, so a FIFO or device node cannot stall the caller.
pub fn load_descriptor(file: &Path) -> Result<Descriptor, InvalidModuleError> {
    let unreadable = |error| InvalidModuleError::Unreadable {
        file: file.to_path_buf(),
        error,
    };

    if !std::fs::symlink_metadata(file).map_err(unreadable)?.is_file() {
        return Err(InvalidModuleError::NotARegularFile {
            file: file.to_path_buf(),
        });
    }

    let handle = File::open(file).map_err(unreadable)?;
    let metadata = handle.metadata().map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(InvalidModuleError::NotARegularFile {
            file: file.to_path_buf(),
        });
    }
    if metadata.len() > MAX_META_SIZE {
        return Err(oversized(file));
    }

    let mut content = String::new();
    handle
        .take(MAX_META_SIZE + 1)
        .read_to_string(&mut content)
        .map_err(unreadable)?;
    if content.len() as u64 > MAX_META_SIZE {
        return Err(oversized(file));
    }

    let value: Value = serde_json::from_str(&content).map_err(|error| InvalidModuleError::Parse {
        file: file.to_path_buf(),
        error,
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| InvalidModuleError::NotAnObject {
            file: file.to_path_buf(),
        })?;

    let descriptor = validate_descriptor(object)?;
    debug!("Validated metadata for module: {}", descriptor.name);
    Ok(descriptor)
}

fn oversized(file: &Path) -> InvalidModuleError {
    InvalidModuleError::Oversized(SecurityError::FileTooLarge {
        file: file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string()),
        max_size: MAX_META_SIZE,
    })
}

/// Schema-check a parsed descriptor object
pub fn validate_descriptor(object: &Map<String, Value>) -> Result<Descriptor, InvalidModuleError> {
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(InvalidModuleError::MissingField { field });
        }
    }

    let name = string_field(object, "name")?;
    let version = string_field(object, "version")?;
    let description = string_field(object, "description")?;
    let lang_raw = string_field(object, "lang")?;
    let entry = string_field(object, "entry")?;

    let lang: Language = lang_raw.parse()?;

    if !VERSION_PATTERN.is_match(version) {
        return Err(InvalidModuleError::InvalidVersion {
            version: version.to_string(),
        });
    }

    if !entry.ends_with(lang.extension()) {
        return Err(InvalidModuleError::ExtensionMismatch {
            expected: lang.extension(),
            lang: lang.as_str(),
        });
    }

    let args = match object.get("args") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value::<Vec<ArgSpec>>(raw.clone()).map_err(|e| {
            InvalidModuleError::InvalidArgs {
                reason: e.to_string(),
            }
        })?,
    };

    Ok(Descriptor {
        name: name.to_string(),
        version: version.to_string(),
        description: description.to_string(),
        lang,
        entry: entry.to_string(),
        args,
    })
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, InvalidModuleError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(InvalidModuleError::WrongType {
            field,
            expected: "string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn valid() -> Value {
        json!({
            "name": "demo",
            "version": "1.2.3",
            "description": "A demo module",
            "lang": "bash",
            "entry": "script.sh"
        })
    }

    fn validate(value: &Value) -> Result<Descriptor, InvalidModuleError> {
        validate_descriptor(value.as_object().unwrap())
    }

    #[test]
    fn test_valid_descriptor() {
        let descriptor = validate(&valid()).unwrap();
        assert_eq!(descriptor.name, "demo");
        assert_eq!(descriptor.lang, Language::Bash);
        assert_eq!(descriptor.entry, "script.sh");
        assert!(descriptor.args.is_empty());
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for field in REQUIRED_FIELDS {
            let mut value = valid();
            value.as_object_mut().unwrap().remove(field);
            match validate(&value) {
                Err(InvalidModuleError::MissingField { field: missing }) => {
                    assert_eq!(missing, field)
                }
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsupported_language() {
        let mut value = valid();
        value["lang"] = json!("zsh");
        assert!(matches!(
            validate(&value),
            Err(InvalidModuleError::UnsupportedLanguage { lang }) if lang == "zsh"
        ));
    }

    #[test]
    fn test_version_must_be_numeric_triplet() {
        for version in ["1.2", "1.2.3-beta", "v1.2.3", "1.2.3.4", "a.b.c", ""] {
            let mut value = valid();
            value["version"] = json!(version);
            assert!(
                matches!(validate(&value), Err(InvalidModuleError::InvalidVersion { .. })),
                "version {version:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_extension_must_match_language() {
        let mut value = valid();
        value["entry"] = json!("script.ps1");
        assert!(matches!(
            validate(&value),
            Err(InvalidModuleError::ExtensionMismatch {
                expected: ".sh",
                lang: "bash"
            })
        ));

        let mut value = valid();
        value["lang"] = json!("pwsh");
        assert!(matches!(
            validate(&value),
            Err(InvalidModuleError::ExtensionMismatch {
                expected: ".ps1",
                ..
            })
        ));

        value["entry"] = json!("Module.ps1");
        assert_eq!(validate(&value).unwrap().lang, Language::Pwsh);
    }

    #[test]
    fn test_non_string_fields_rejected() {
        let mut value = valid();
        value["version"] = json!(1);
        assert!(matches!(
            validate(&value),
            Err(InvalidModuleError::WrongType { field: "version", .. })
        ));
    }

    #[test]
    fn test_args_are_parsed() {
        let mut value = valid();
        value["args"] = json!([
            {"name": "target", "description": "Where to go", "type": "string"},
            {"name": "depth", "description": "How deep", "type": "int", "defaultValue": 3}
        ]);
        let descriptor = validate(&value).unwrap();
        assert_eq!(descriptor.args.len(), 2);
        assert_eq!(descriptor.args[1].arg_type, "int");
        assert_eq!(descriptor.args[1].default_value, Some(json!(3)));
    }

    #[test]
    fn test_malformed_args_rejected() {
        let mut value = valid();
        value["args"] = json!("not a list");
        assert!(matches!(
            validate(&value),
            Err(InvalidModuleError::InvalidArgs { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_json_and_oversize() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(DESCRIPTOR_FILE);

        std::fs::write(&file, "{ not json").unwrap();
        assert!(matches!(
            load_descriptor(&file),
            Err(InvalidModuleError::Parse { .. })
        ));

        std::fs::write(&file, "[1, 2, 3]").unwrap();
        assert!(matches!(
            load_descriptor(&file),
            Err(InvalidModuleError::NotAnObject { .. })
        ));

        std::fs::write(&file, vec![b' '; (MAX_META_SIZE + 1) as usize]).unwrap();
        assert!(matches!(
            load_descriptor(&file),
            Err(InvalidModuleError::Oversized(_))
        ));
    }

    #[test]
    fn test_load_rejects_directory_in_place_of_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(DESCRIPTOR_FILE);
        std::fs::create_dir(&file).unwrap();

        assert!(matches!(
            load_descriptor(&file),
            Err(InvalidModuleError::NotARegularFile { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_rejects_fifo_without_blocking() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(DESCRIPTOR_FILE);
        let status = std::process::Command::new("mkfifo")
            .arg(&file)
            .status()
            .unwrap();
        assert!(status.success());

        let (tx, rx) = std::sync::mpsc::channel();
        let path = file.clone();
        std::thread::spawn(move || {
            let _ = tx.send(matches!(
                load_descriptor(&path),
                Err(InvalidModuleError::NotARegularFile { .. })
            ));
        });

        let rejected = rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("loading a FIFO descriptor must not block");
        assert!(rejected);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_does_not_follow_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real.json");
        std::fs::write(&target, valid().to_string()).unwrap();
        let file = temp_dir.path().join(DESCRIPTOR_FILE);
        std::os::unix::fs::symlink(&target, &file).unwrap();

        assert!(matches!(
            load_descriptor(&file),
            Err(InvalidModuleError::NotARegularFile { .. })
        ));
    }

    #[test]
    fn test_template_round_trips_through_validation() {
        let json = Descriptor::template("demo").to_json_pretty().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let descriptor = validate(&value).unwrap();
        assert_eq!(descriptor.version, "0.1.0");
        assert_eq!(descriptor.entry, "script.sh");
        assert_eq!(descriptor.description, "A new demo module.");
        assert!(value.get("args").is_none());
    }
}
