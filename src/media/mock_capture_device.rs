use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::media::{CaptureDevice, MediaConstraints, MediaError, MediaTrack, TrackKind};

/// In-process capture device for tests and headless demos.
///
/// Hands out synthetic tracks and counts acquisitions and releases.
#[derive(Debug, Default)]
pub struct MockCaptureDevice {
    acquired: AtomicUsize,
    released: AtomicUsize,
    failure: Mutex<Option<MediaError>>,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device whose every `acquire` fails with `err`.
    pub fn failing(err: MediaError) -> Self {
        Self {
            failure: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<MediaTrack>, MediaError> {
        let failure = self
            .failure
            .lock()
            .map_err(|_| MediaError::DeviceUnavailable("mock lock poisoned".into()))?
            .clone();
        if let Some(err) = failure {
            return Err(err);
        }

        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(MediaTrack::new(format!("mock-audio-{n}"), TrackKind::Audio));
        }
        if constraints.video {
            tracks.push(MediaTrack::new(format!("mock-video-{n}"), TrackKind::Video));
        }
        Ok(tracks)
    }

    fn release(&self, _tracks: &[MediaTrack]) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
