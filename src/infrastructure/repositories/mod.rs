pub mod elevenlabs_voice_repository;
pub mod history_repository;
pub mod storage_repository;
pub mod supabase_storage_repository;
pub mod voice_clone_repository;

pub use elevenlabs_voice_repository::ElevenLabsVoiceRepository;
pub use history_repository::{HistoryRepository, PgHistoryRepository};
pub use storage_repository::StorageRepository;
pub use supabase_storage_repository::SupabaseStorageRepository;
pub use voice_clone_repository::VoiceCloneRepository;
