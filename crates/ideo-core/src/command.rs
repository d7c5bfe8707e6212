//! Compile and run command lines for the supported languages.
//!
//! Paths are interpolated as-is. Nothing is quoted or escaped, so a path
//! containing spaces or shell metacharacters produces a broken (or unsafe)
//! command line for the host shell.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IdeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    Compile,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Cpp,
    Java,
    C,
}

impl Language {
    /// Extension match is exact and case-sensitive (`.py`, `.c`, `.cpp`, `.java`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "py" => Some(Self::Python),
            "c" => Some(Self::C),
            "cpp" => Some(Self::Cpp),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Cpp => "C++",
            Self::Java => "Java",
            Self::C => "C",
        }
    }
}

/// A single compile/run invocation, derived from a saved document's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub language: Language,
    pub source_path: PathBuf,
}

impl RunRequest {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let source_path = path.into();
        let language = Language::from_path(&source_path).ok_or_else(|| {
            IdeError::UnsupportedLanguage(
                source_path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| source_path.display().to_string()),
            )
        })?;
        Ok(Self {
            language,
            source_path,
        })
    }

    /// Path without its extension; the name given to compiled executables.
    fn stem(&self) -> PathBuf {
        self.source_path.with_extension("")
    }

    /// Java class name: the file name without extension.
    fn class_name(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn directory(&self) -> PathBuf {
        match self.source_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Names of the external tools. Overridable from the `[toolchain]` settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    pub python: String,
    pub gcc: String,
    pub gxx: String,
    pub javac: String,
    pub java: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            gcc: "gcc".to_string(),
            gxx: "g++".to_string(),
            javac: "javac".to_string(),
            java: "java".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    toolchain: Toolchain,
}

impl CommandBuilder {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn build(&self, action: BuildAction, path: &Path) -> Result<String> {
        let request = RunRequest::from_path(path)?;
        Ok(self.build_request(action, &request))
    }

    pub fn build_request(&self, action: BuildAction, request: &RunRequest) -> String {
        let tc = &self.toolchain;
        let src = request.source_path.display();
        let stem = request.stem();

        match (request.language, action) {
            (Language::Python, BuildAction::Compile) => {
                format!("{} -m py_compile {}", tc.python, src)
            }
            (Language::Python, BuildAction::Run) => format!("{} {}", tc.python, src),
            (Language::C, BuildAction::Compile) => {
                format!("{} {} -o {}", tc.gcc, src, stem.display())
            }
            (Language::C, BuildAction::Run) => format!(
                "{} {} -o {} && {}",
                tc.gcc,
                src,
                stem.display(),
                executable_invocation(&stem)
            ),
            (Language::Cpp, BuildAction::Compile) => {
                format!("{} {} -o {}", tc.gxx, src, stem.display())
            }
            (Language::Cpp, BuildAction::Run) => executable_invocation(&stem),
            (Language::Java, BuildAction::Compile) => format!("{} {}", tc.javac, src),
            (Language::Java, BuildAction::Run) => {
                let dir = request.directory();
                format!(
                    "{} -d {} {} && {} -cp {} {}",
                    tc.javac,
                    dir.display(),
                    src,
                    tc.java,
                    dir.display(),
                    request.class_name()
                )
            }
        }
    }
}

/// Build a command with the default toolchain.
pub fn build_command(action: BuildAction, path: impl AsRef<Path>) -> Result<String> {
    CommandBuilder::default().build(action, path.as_ref())
}

/// How the host shell launches a freshly built executable.
fn executable_invocation(stem: &Path) -> String {
    let has_dir = stem
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());
    if cfg!(windows) || has_dir {
        stem.display().to_string()
    } else {
        format!("./{}", stem.display())
    }
}
