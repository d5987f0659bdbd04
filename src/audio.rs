pub mod mix;

pub use mix::{AudioManifest, AudioSegment, build_audio_manifest, mix_manifest, write_mix_to_f32le_file};
