use std::{cell::RefCell, rc::Rc};

use mdanceio_command::{
    event_publisher::EventPublisher,
    model::{Bone, Model, Morph},
    project::{ModelHandle, Project},
    MdanceioError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    UpdateDuration(u32, u32),
    UndoChange(bool, bool),
    Error(String),
}

/// Collects every published event so tests can look at them after the project took ownership
/// of the publisher.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventPublisher {
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl EventPublisher for RecordingEventPublisher {
    fn publish_update_duration_event(&mut self, current_duration: u32, last_duration: u32) {
        self.events
            .borrow_mut()
            .push(Event::UpdateDuration(current_duration, last_duration));
    }

    fn publish_undo_change_event(&mut self, can_undo: bool, can_redo: bool) {
        self.events
            .borrow_mut()
            .push(Event::UndoChange(can_undo, can_redo));
    }

    fn publish_error_event(&mut self, error: &MdanceioError) {
        self.events
            .borrow_mut()
            .push(Event::Error(error.reason().to_owned()));
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn recording_project() -> (Project, Rc<RefCell<Vec<Event>>>) {
    let publisher = RecordingEventPublisher::default();
    let events = publisher.events.clone();
    (Project::with_event_publisher(Box::new(publisher)), events)
}

pub fn add_test_model(project: &mut Project) -> ModelHandle {
    project.add_model(Model::new(
        "初音ミク",
        vec![
            Bone::new("センター"),
            Bone::new_rotatable("左腕"),
            Bone::new("左足ＩＫ"),
        ],
        vec![Morph::new("まばたき"), Morph::new("あ")],
    ))
}
