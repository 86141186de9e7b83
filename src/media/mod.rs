//! Local capture and the tracks it hands out to negotiation sessions.

pub mod capture_device;
pub mod local_capture;
pub mod media_constraints;
pub mod media_error;
pub mod media_track;
pub mod mock_capture_device;

pub use capture_device::CaptureDevice;
pub use local_capture::LocalCapture;
pub use media_constraints::MediaConstraints;
pub use media_error::MediaError;
pub use media_track::{MediaTrack, TrackKind};
pub use mock_capture_device::MockCaptureDevice;
