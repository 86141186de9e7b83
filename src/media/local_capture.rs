use std::fmt;
use std::sync::Arc;

use crate::media::{CaptureDevice, MediaConstraints, MediaError, MediaTrack, TrackKind};

/// The call's single local capture, shared by every session of the call.
///
/// Held in an `Arc`; the device is released when the last reference drops.
pub struct LocalCapture {
    device: Arc<dyn CaptureDevice>,
    tracks: Vec<MediaTrack>,
}

impl LocalCapture {
    pub fn acquire(
        device: Arc<dyn CaptureDevice>,
        constraints: &MediaConstraints,
    ) -> Result<Arc<Self>, MediaError> {
        if constraints.is_empty() {
            return Err(MediaError::NothingRequested);
        }
        let tracks = device.acquire(constraints)?;
        Ok(Arc::new(Self { device, tracks }))
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    /// Mute / unmute. Returns `false` when there is no audio track.
    pub fn set_audio_enabled(&self, enabled: bool) -> bool {
        self.set_kind_enabled(TrackKind::Audio, enabled)
    }

    /// Camera on / off. Returns `false` when there is no video track.
    pub fn set_video_enabled(&self, enabled: bool) -> bool {
        self.set_kind_enabled(TrackKind::Video, enabled)
    }

    fn set_kind_enabled(&self, kind: TrackKind, enabled: bool) -> bool {
        let mut found = false;
        for t in self.tracks.iter().filter(|t| t.kind() == kind) {
            t.set_enabled(enabled);
            found = true;
        }
        found
    }
}

impl fmt::Debug for LocalCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCapture")
            .field("tracks", &self.tracks)
            .finish_non_exhaustive()
    }
}

impl Drop for LocalCapture {
    fn drop(&mut self) {
        self.device.release(&self.tracks);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::MockCaptureDevice;

    #[test]
    fn released_once_when_last_reference_drops() {
        let device = Arc::new(MockCaptureDevice::new());
        let capture = LocalCapture::acquire(device.clone(), &MediaConstraints::default()).unwrap();
        let second = Arc::clone(&capture);

        drop(capture);
        assert_eq!(device.release_count(), 0);
        drop(second);
        assert_eq!(device.release_count(), 1);
        assert_eq!(device.acquire_count(), 1);
    }

    #[test]
    fn audio_only_has_no_video_toggle() {
        let device = Arc::new(MockCaptureDevice::new());
        let capture = LocalCapture::acquire(device, &MediaConstraints::audio_only()).unwrap();
        assert!(capture.has_kind(TrackKind::Audio));
        assert!(!capture.set_video_enabled(false));
        assert!(capture.set_audio_enabled(false));
        assert!(capture.tracks().iter().all(|t| !t.is_enabled()));
    }

    #[test]
    fn empty_constraints_are_rejected() {
        let device = Arc::new(MockCaptureDevice::new());
        let none = MediaConstraints {
            audio: false,
            video: false,
        };
        let err = LocalCapture::acquire(device.clone(), &none).unwrap_err();
        assert_eq!(err, MediaError::NothingRequested);
        assert_eq!(device.acquire_count(), 0);
    }
}
