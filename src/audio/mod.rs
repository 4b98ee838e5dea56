//! Audio input: device capture, WAV files, and fixed-duration framing.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod frame;
pub mod frame_source;
pub mod source;
pub mod wav;

pub use frame::AudioFrame;
pub use frame_source::FrameSource;
pub use source::{AudioSource, MockAudioSource};
pub use wav::{WavAudioSource, load_wav};
