pub mod answer_llm;
pub mod media;
pub mod pdf;
pub mod session_store;
pub mod transcribe;

pub use answer_llm::OllamaAnswerAdapter;
pub use media::FfmpegAudioExtractor;
pub use pdf::PdfExtractAdapter;
pub use session_store::InMemorySessionStore;
pub use transcribe::OpenAiTranscribeAdapter;
