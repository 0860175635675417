pub mod config;
pub mod document;
pub mod drive;
pub mod external;
pub mod extract;
pub mod knowledge_base;

pub use config::Config;
pub use document::{DocumentKind, ExtractedDocument, FileDescriptor};
pub use drive::{DriveApi, DriveClient, DriveError, FolderWalker};
pub use external::{summarizer_from_config, Summarizer, SummarizerError, Summary};
pub use extract::{DefaultTextExtractor, ExtractError, TextExtractor};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseBuilder};
