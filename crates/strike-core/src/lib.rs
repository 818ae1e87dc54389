pub mod audio;
pub mod config;
pub mod constants;
pub mod effects;
pub mod grade;
pub mod modifier;
pub mod music;
pub mod pipeline;
pub mod postfx;
pub mod sequence;

pub use audio::*;
pub use config::*;
pub use effects::*;
pub use grade::*;
pub use music::{bpm_for, layer_mix, CombatIntensity, MusicDirector, MusicState};
pub use pipeline::{PipelineComposer, PipelineError, RebuildEvent};
pub use postfx::PostFxManager;
pub use sequence::{midi_to_hz, LayerSequencer, NoteEvent, Voice};
