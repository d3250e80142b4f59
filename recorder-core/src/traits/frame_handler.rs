/// Receives frames in push mode.
///
/// Called directly on the engine's capture thread, which may be real-time.
/// Implementations must return promptly: no blocking, no locks that a
/// non-audio thread can hold for long, no unbounded work. Consumers that
/// cannot promise this should register a [`FrameQueue`](crate::bridge::callback::FrameQueue)
/// and process frames on their own thread.
///
/// `frame` always holds exactly `frame_length` samples and is only valid
/// for the duration of the call.
pub trait FrameHandler: Send + Sync {
    fn on_frame(&self, frame: &[i16]);
}

impl<F> FrameHandler for F
where
    F: Fn(&[i16]) + Send + Sync,
{
    fn on_frame(&self, frame: &[i16]) {
        self(frame)
    }
}
