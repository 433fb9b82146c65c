//! Error handling for the genoview CLI

use genoview_core::url_state::UrlStateError;
use genoview_core::ViewerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid data fixture {path}: {message}")]
    InvalidFixture { path: PathBuf, message: String },

    #[error("Invalid URL state: {0}")]
    State(#[from] UrlStateError),

    #[error("Viewer error: {0}")]
    Viewer(#[from] ViewerError),

    #[error("Timed out after {secs}s waiting for tracks: {pending}")]
    LoadTimeout { secs: u64, pending: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_fixture<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::InvalidFixture {
            path,
            message: message.into(),
        }
    }

    pub fn rendering<S: Into<String>>(message: S) -> Self {
        Self::Rendering { message: message.into() }
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::InvalidFixture { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • The fixture must be a JSON object of the form {\"sources\": {name: {chromosome: features}}}\n\
                 • Every chromosome of one source must carry the same feature kind\n\
                 • See demos/tp53.json for a complete example",
            );
        }

        CliError::State(_) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Use the form ?chr=17&start=7565097&end=7590856&samples=S001,S004\n\
                 • chr, start and end must be given together; start and end are 0-based\n\
                 • Filters are written filter.<key>=<op>:<value>, e.g. filter.mapq=range:30..",
            );
        }

        CliError::Viewer(ViewerError::InvalidRegion(_)) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check the chromosome name against the configured genome\n\
                 • Loci are 1-based and inclusive: chr17:7,565,098-7,590,856",
            );
        }

        CliError::Viewer(ViewerError::UnknownSource { .. }) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Every track `source` must name a source in the --data fixture\n\
                 • Run 'genoview config --example' to see the default track list",
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your genoview.toml configuration file\n\
                 • Use 'genoview config --example' to generate a sample configuration",
            );
        }

        CliError::LoadTimeout { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Raise general.load_timeout_secs in genoview.toml\n\
                 • Run with -v to see which requests are still in flight",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use genoview_core::RegionError;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("tp53.json"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the file path is correct"));
    }

    #[test]
    fn test_viewer_error_conversion() {
        let viewer = ViewerError::InvalidRegion(RegionError::UnknownChromosome("chrZ".into()));
        let err: CliError = viewer.into();
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("chrZ"));
        assert!(formatted.contains("1-based"));
    }
}
