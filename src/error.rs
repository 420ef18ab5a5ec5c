use thiserror::Error;

/// Configuration errors, raised eagerly at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// One or more values are out of range; every problem is listed
    #[error("Configuration validation failed:\n{}", format_problems(.0))]
    Invalid(Vec<String>),
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bot error taxonomy
///
/// These are the failures raised by the command collaborators (games, image
/// processing, score storage). Each variant maps to a stable kind name used
/// by the error tracker.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration issue detected by a collaborator
    #[error("{0}")]
    Configuration(String),
    /// Data loading or processing failed
    #[error("{0}")]
    Data(String),
    /// Game logic failed
    #[error("{0}")]
    Game(String),
    /// Image processing failed
    #[error("{0}")]
    ImageProcessing(String),
    /// Requested operator does not exist
    #[error("Operator not found: {0}")]
    OperatorNotFound(String),
    /// Game is in an invalid state
    #[error("{0}")]
    InvalidGameState(String),
    /// Score management failed
    #[error("{0}")]
    Score(String),
    /// A required file is missing
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Stable kind name of this error
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Data(_) => "DataError",
            Self::Game(_) => "GameError",
            Self::ImageProcessing(_) => "ImageProcessingError",
            Self::OperatorNotFound(_) => "OperatorNotFoundError",
            Self::InvalidGameState(_) => "InvalidGameStateError",
            Self::Score(_) => "ScoreError",
            Self::FileNotFound(_) => "FileNotFoundError",
            Self::Io(_) => "IoError",
        }
    }
}
