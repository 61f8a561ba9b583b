use std::collections::HashMap;

use crate::{
    accessory::Accessory,
    camera::PerspectiveCamera,
    command::{Command, CommandStack},
    error::MdanceioError,
    event_publisher::{EventPublisher, NullEventPublisher},
    light::DirectionalLight,
    model::Model,
    motion::Motion,
    shadow_camera::ShadowCamera,
};

pub type ModelHandle = u32;
pub type AccessoryHandle = u32;
pub type MotionHandle = u32;

#[derive(Debug, Clone, Copy, Default)]
struct HandleAllocator(u32);

impl HandleAllocator {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectStates {
    pub enable_bezier_curve_adjustment: bool,
    pub enable_physics_simulation_for_bone_keyframe: bool,
}

impl Default for ProjectStates {
    fn default() -> Self {
        Self {
            enable_bezier_curve_adjustment: true,
            enable_physics_simulation_for_bone_keyframe: true,
        }
    }
}

/// Owns every entity and motion an editing session works on, together with its undo history.
///
/// Motions are addressed by [`MotionHandle`]; a motion removed with [`Project::remove_motion`]
/// is detached and commands still referring to it do nothing.
pub struct Project {
    camera: PerspectiveCamera,
    light: DirectionalLight,
    shadow_camera: ShadowCamera,
    motions: HashMap<MotionHandle, Motion>,
    camera_motion: MotionHandle,
    light_motion: MotionHandle,
    self_shadow_motion: MotionHandle,
    model_handle_map: HashMap<ModelHandle, Model>,
    model_to_motion: HashMap<ModelHandle, MotionHandle>,
    accessory_handle_map: HashMap<AccessoryHandle, Accessory>,
    accessory_to_motion: HashMap<AccessoryHandle, MotionHandle>,
    object_handler_allocator: HandleAllocator,
    base_duration: u32,
    local_frame_index: u32,
    state_flags: ProjectStates,
    undo_stack: CommandStack<Project>,
    model_undo_stacks: HashMap<ModelHandle, CommandStack<Project>>,
    active_model: Option<ModelHandle>,
    event_publisher: Box<dyn EventPublisher>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("motions", &self.motions.len())
            .field("models", &self.model_handle_map.len())
            .field("accessories", &self.accessory_handle_map.len())
            .field("base_duration", &self.base_duration)
            .field("local_frame_index", &self.local_frame_index)
            .field("state_flags", &self.state_flags)
            .field("undo_stack", &self.undo_stack)
            .field("active_model", &self.active_model)
            .finish()
    }
}

impl Project {
    pub const MINIMUM_BASE_DURATION: u32 = 300;
    pub const MAXIMUM_BASE_DURATION: u32 = i32::MAX as u32;
    pub const UNDO_HARD_LIMIT: usize = 1024;
    pub const DEFAULT_UNDO_SOFT_LIMIT: usize = 64;

    pub fn new() -> Self {
        Self::with_event_publisher(Box::new(NullEventPublisher))
    }

    pub fn with_event_publisher(event_publisher: Box<dyn EventPublisher>) -> Self {
        let mut object_handler_allocator = HandleAllocator::new();
        let mut motions = HashMap::new();
        let camera_motion = object_handler_allocator.next();
        motions.insert(camera_motion, Motion::empty());
        let light_motion = object_handler_allocator.next();
        motions.insert(light_motion, Motion::empty());
        let self_shadow_motion = object_handler_allocator.next();
        motions.insert(self_shadow_motion, Motion::empty());
        Self {
            camera: PerspectiveCamera::new(),
            light: DirectionalLight::new(),
            shadow_camera: ShadowCamera::new(),
            motions,
            camera_motion,
            light_motion,
            self_shadow_motion,
            model_handle_map: HashMap::new(),
            model_to_motion: HashMap::new(),
            accessory_handle_map: HashMap::new(),
            accessory_to_motion: HashMap::new(),
            object_handler_allocator,
            base_duration: Self::MINIMUM_BASE_DURATION,
            local_frame_index: 0,
            state_flags: ProjectStates::default(),
            undo_stack: CommandStack::with_limits(
                Self::DEFAULT_UNDO_SOFT_LIMIT,
                Self::UNDO_HARD_LIMIT,
            ),
            model_undo_stacks: HashMap::new(),
            active_model: None,
            event_publisher,
        }
    }

    pub fn state_flags(&self) -> &ProjectStates {
        &self.state_flags
    }

    pub fn state_flags_mut(&mut self) -> &mut ProjectStates {
        &mut self.state_flags
    }

    pub fn is_bezier_curve_adjustment_enabled(&self) -> bool {
        self.state_flags.enable_bezier_curve_adjustment
    }

    pub fn is_physics_simulation_enabled_for_bone_keyframe(&self) -> bool {
        self.state_flags.enable_physics_simulation_for_bone_keyframe
    }

    pub fn event_publisher(&mut self) -> &mut dyn EventPublisher {
        self.event_publisher.as_mut()
    }

    pub fn global_camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn global_camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn global_light(&self) -> &DirectionalLight {
        &self.light
    }

    pub fn global_light_mut(&mut self) -> &mut DirectionalLight {
        &mut self.light
    }

    pub fn shadow_camera(&self) -> &ShadowCamera {
        &self.shadow_camera
    }

    pub fn shadow_camera_mut(&mut self) -> &mut ShadowCamera {
        &mut self.shadow_camera
    }
}

impl Project {
    /// Registers `model` together with a fresh empty motion and its own undo history, which
    /// starts with the soft limit of the project history.
    pub fn add_model(&mut self, model: Model) -> ModelHandle {
        let handle = self.object_handler_allocator.next();
        self.model_handle_map.insert(handle, model);
        let motion = self.add_motion(Motion::empty());
        self.model_to_motion.insert(handle, motion);
        self.model_undo_stacks.insert(
            handle,
            CommandStack::with_limits(self.undo_stack.soft_limit(), Self::UNDO_HARD_LIMIT),
        );
        handle
    }

    /// The model whose undo history `push_undo`, `undo` and `redo` work on.
    pub fn active_model(&self) -> Option<ModelHandle> {
        self.active_model
    }

    /// Unknown handles deactivate the current model.
    pub fn set_active_model(&mut self, value: Option<ModelHandle>) {
        let value = value.filter(|handle| self.model_handle_map.contains_key(handle));
        if self.active_model != value {
            self.active_model = value;
            self.publish_undo_change();
        }
    }

    pub fn model(&self, handle: ModelHandle) -> Option<&Model> {
        self.model_handle_map.get(&handle)
    }

    pub fn find_model_mut(&mut self, handle: ModelHandle) -> Option<&mut Model> {
        self.model_handle_map.get_mut(&handle)
    }

    /// Registers `accessory` together with a fresh empty motion.
    pub fn add_accessory(&mut self, accessory: Accessory) -> AccessoryHandle {
        let handle = self.object_handler_allocator.next();
        self.accessory_handle_map.insert(handle, accessory);
        let motion = self.add_motion(Motion::empty());
        self.accessory_to_motion.insert(handle, motion);
        handle
    }

    pub fn accessory(&self, handle: AccessoryHandle) -> Option<&Accessory> {
        self.accessory_handle_map.get(&handle)
    }

    pub fn find_accessory_mut(&mut self, handle: AccessoryHandle) -> Option<&mut Accessory> {
        self.accessory_handle_map.get_mut(&handle)
    }

    /// Handles of every accessory in registration order.
    pub fn accessory_handles(&self) -> Vec<AccessoryHandle> {
        let mut handles = self.accessory_handle_map.keys().copied().collect::<Vec<_>>();
        handles.sort_unstable();
        handles
    }
}

impl Project {
    /// Attaches `motion` to the project without binding it to any entity.
    pub fn add_motion(&mut self, motion: Motion) -> MotionHandle {
        let handle = self.object_handler_allocator.next();
        self.motions.insert(handle, motion);
        handle
    }

    /// Detaches the motion and every binding to it. Commands holding `handle` become no-ops.
    pub fn remove_motion(&mut self, handle: MotionHandle) -> Option<Motion> {
        self.model_to_motion.retain(|_, motion| *motion != handle);
        self.accessory_to_motion.retain(|_, motion| *motion != handle);
        self.motions.remove(&handle)
    }

    pub fn contains_motion(&self, handle: MotionHandle) -> bool {
        self.motions.contains_key(&handle)
    }

    pub fn motion(&self, handle: MotionHandle) -> Option<&Motion> {
        self.motions.get(&handle)
    }

    pub fn motion_mut(&mut self, handle: MotionHandle) -> Option<&mut Motion> {
        self.motions.get_mut(&handle)
    }

    /// Binds the attached motion `motion` to `model`, returning the previously bound one.
    pub fn set_model_motion(
        &mut self,
        model: ModelHandle,
        motion: MotionHandle,
    ) -> Option<MotionHandle> {
        if self.model_handle_map.contains_key(&model) && self.contains_motion(motion) {
            self.model_to_motion.insert(model, motion)
        } else {
            None
        }
    }

    pub fn resolve_model_motion(&self, model: ModelHandle) -> Option<MotionHandle> {
        self.model_to_motion.get(&model).copied()
    }

    pub fn resolve_accessory_motion(&self, accessory: AccessoryHandle) -> Option<MotionHandle> {
        self.accessory_to_motion.get(&accessory).copied()
    }

    pub fn camera_motion(&self) -> MotionHandle {
        self.camera_motion
    }

    pub fn light_motion(&self) -> MotionHandle {
        self.light_motion
    }

    pub fn self_shadow_motion(&self) -> MotionHandle {
        self.self_shadow_motion
    }
}

impl Project {
    pub fn duration(&self, base_duration: u32) -> u32 {
        self.motions.values().fold(
            base_duration.clamp(Self::MINIMUM_BASE_DURATION, Self::MAXIMUM_BASE_DURATION),
            |duration, motion| duration.max(motion.duration()),
        )
    }

    pub fn project_duration(&self) -> u32 {
        self.duration(self.base_duration)
    }

    pub fn base_duration(&self) -> u32 {
        self.base_duration
    }

    pub fn set_base_duration(&mut self, value: u32) {
        let last_duration = self.project_duration();
        self.base_duration = value
            .clamp(Self::MINIMUM_BASE_DURATION, Self::MAXIMUM_BASE_DURATION)
            .max(self.base_duration);
        self.publish_duration_change(last_duration);
    }

    pub fn current_local_frame_index(&self) -> u32 {
        self.local_frame_index
    }

    pub fn set_local_frame_index(&mut self, value: u32) {
        self.local_frame_index = value;
    }

    /// Finishes a motion edit: sorts the keyframes, marks the motion dirty and publishes the
    /// duration change against `last_duration` if there is one.
    pub fn commit_motion(&mut self, handle: MotionHandle, last_duration: u32) {
        if let Some(motion) = self.motions.get_mut(&handle) {
            motion.sort_all_keyframes();
            motion.set_dirty(true);
        }
        self.publish_duration_change(last_duration);
    }

    fn publish_duration_change(&mut self, last_duration: u32) {
        let current_duration = self.project_duration();
        if current_duration != last_duration {
            self.event_publisher
                .publish_update_duration_event(current_duration, last_duration);
        }
    }
}

impl Project {
    /// The history `push_undo`, `undo` and `redo` work on: the one of the active model, or
    /// the project history when no model is active.
    pub fn undo_stack(&self) -> &CommandStack<Project> {
        self.active_model
            .and_then(|model| self.model_undo_stacks.get(&model))
            .unwrap_or(&self.undo_stack)
    }

    pub fn project_undo_stack(&self) -> &CommandStack<Project> {
        &self.undo_stack
    }

    pub fn model_undo_stack(&self, model: ModelHandle) -> Option<&CommandStack<Project>> {
        self.model_undo_stacks.get(&model)
    }

    /// Runs `command` and records it in the active undo history.
    pub fn push_undo(&mut self, command: Box<dyn Command<Project>>) -> Result<(), MdanceioError> {
        self.with_undo_stack(self.active_model, |stack, project| {
            stack.push(command, project)
        })
    }

    /// Runs `command` and records it in the undo history of `model`.
    pub fn push_model_undo(
        &mut self,
        model: ModelHandle,
        command: Box<dyn Command<Project>>,
    ) -> Result<(), MdanceioError> {
        if !self.model_undo_stacks.contains_key(&model) {
            return Err(MdanceioError::model_not_found());
        }
        self.with_undo_stack(Some(model), |stack, project| stack.push(command, project))
    }

    pub fn undo(&mut self) -> Result<(), MdanceioError> {
        self.with_undo_stack(self.active_model, |stack, project| stack.undo(project))
    }

    pub fn redo(&mut self) -> Result<(), MdanceioError> {
        self.with_undo_stack(self.active_model, |stack, project| stack.redo(project))
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack().can_undo(self)
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack().can_redo(self)
    }

    /// True while the project history or any model history is away from its save point.
    pub fn is_dirty(&self) -> bool {
        self.undo_stack.is_dirty() || self.model_undo_stacks.values().any(CommandStack::is_dirty)
    }

    pub fn mark_saved(&mut self) {
        self.undo_stack.mark_saved();
        for stack in self.model_undo_stacks.values_mut() {
            stack.mark_saved();
        }
    }

    /// Applies to the project history and every model history.
    pub fn set_undo_soft_limit(&mut self, value: usize) {
        self.undo_stack.set_soft_limit(value);
        for stack in self.model_undo_stacks.values_mut() {
            stack.set_soft_limit(value);
        }
    }

    pub fn clear_undo_stack(&mut self) {
        self.undo_stack.clear();
        for stack in self.model_undo_stacks.values_mut() {
            stack.clear();
        }
        self.publish_undo_change();
    }

    /// Moves the selected history out while `f` runs so commands can borrow the project
    /// mutably. `owner` falls back to the project history when the model has none.
    fn with_undo_stack<F>(&mut self, owner: Option<ModelHandle>, f: F) -> Result<(), MdanceioError>
    where
        F: FnOnce(&mut CommandStack<Project>, &mut Project) -> Result<(), MdanceioError>,
    {
        let model = owner.filter(|model| self.model_undo_stacks.contains_key(model));
        let mut stack = match model.and_then(|model| self.model_undo_stacks.remove(&model)) {
            Some(stack) => stack,
            None => std::mem::replace(&mut self.undo_stack, CommandStack::new(1)),
        };
        let result = f(&mut stack, self);
        match model {
            Some(model) => {
                self.model_undo_stacks.insert(model, stack);
            }
            None => self.undo_stack = stack,
        }
        if let Err(err) = &result {
            self.event_publisher.publish_error_event(err);
        }
        self.publish_undo_change();
        result
    }

    fn publish_undo_change(&mut self) {
        let (can_undo, can_redo) = (self.can_undo(), self.can_redo());
        self.event_publisher
            .publish_undo_change_event(can_undo, can_redo);
    }
}
