use crate::media::{MediaConstraints, MediaError, MediaTrack};

/// Camera / microphone access provided by the platform layer.
pub trait CaptureDevice: Send + Sync {
    /// Opens the requested inputs and returns one track per opened input.
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<MediaTrack>, MediaError>;

    /// Stops the inputs behind `tracks`. Called exactly once per acquisition.
    fn release(&self, tracks: &[MediaTrack]);
}
