use crate::error::MdanceioError;

/// Receives notifications the editing core emits while commands run.
pub trait EventPublisher {
    fn publish_update_duration_event(&mut self, current_duration: u32, last_duration: u32);
    fn publish_undo_change_event(&mut self, can_undo: bool, can_redo: bool);
    fn publish_error_event(&mut self, error: &MdanceioError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventPublisher;

impl EventPublisher for NullEventPublisher {
    fn publish_update_duration_event(&mut self, current_duration: u32, last_duration: u32) {
        log::trace!(
            "Duration updated from {} to {}",
            last_duration,
            current_duration
        );
    }

    fn publish_undo_change_event(&mut self, _can_undo: bool, _can_redo: bool) {}

    fn publish_error_event(&mut self, error: &MdanceioError) {
        log::error!("{}", error);
    }
}
