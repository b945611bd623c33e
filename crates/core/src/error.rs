use std::path::PathBuf;

/// A draft failed input validation. The whole draft is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid draft at '{field}': {message}")]
pub struct DraftError {
    /// Dotted path of the offending field, e.g. `layout[2].name`.
    pub field: String,
    pub message: String,
}

impl DraftError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        DraftError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while loading, merging, or validating theme fragments.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// A preset was referenced by name but no fragment file exists for it.
    #[error("theme fragment not found: {category}/{name} ({})", .path.display())]
    FragmentNotFound {
        category: String,
        name: String,
        path: PathBuf,
    },

    /// A preset name that cannot be used as a file name inside its bucket.
    #[error("invalid theme preset name for {category}: '{name}'")]
    InvalidName { category: String, name: String },

    /// A fragment file exists but could not be read.
    #[error("could not read theme fragment '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fragment file is not valid JSON or is not a JSON object.
    #[error("malformed theme fragment '{}': {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    /// The merged theme does not satisfy the theme schema.
    #[error("theme schema violation at '{path}': {message}")]
    Schema { path: String, message: String },
}

/// A fatal error while walking and copying the import graph.
///
/// Unresolved specifiers and unparsable files are not errors; they are
/// reported as warnings in the traversal report.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not copy '{}' to '{}': {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file lies outside the aliased source root and cannot be mirrored.
    #[error("'{}' is outside the source root '{}'", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A syntax error inside a single source file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScanError {
    pub line: u32,
    pub message: String,
}

impl ScanError {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        ScanError {
            line,
            message: message.into(),
        }
    }
}
