pub mod engine;
pub mod media;
pub mod synth;

pub use engine::{
    EspeakEngine, GttsEngine, SUPPORTED_LANGUAGES, SpeechEngine, TtsBackendKind, create_engine,
};
pub use media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_file};
pub use synth::{VoiceoverAsset, synthesize};
