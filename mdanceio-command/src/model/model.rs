use std::collections::BTreeMap;

use cgmath::Vector4;

use super::{bone::BoneSet, morph::MorphSet, Bone, Morph};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ModelStates {
    pub visible: bool,
    pub enable_add_blend: bool,
    pub physics_simulation: bool,
    pub has_edge_option: bool,
    pub dirty: bool,
}

impl Default for ModelStates {
    fn default() -> Self {
        Self {
            visible: true,
            enable_add_blend: false,
            physics_simulation: true,
            has_edge_option: false,
            dirty: false,
        }
    }
}

/// The parts of a loaded model that motions animate.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    pub bones: BoneSet,
    pub morphs: MorphSet,
    /// Enabled flag of each constraint, keyed by the name of its target bone.
    constraint_states: BTreeMap<String, bool>,
    /// `(object, bone)` each subject bone is parented to.
    outside_parents: BTreeMap<String, (String, String)>,
    edge_color: Vector4<f32>,
    edge_size_scale_factor: f32,
    pub states: ModelStates,
}

impl Model {
    pub const INITIAL_EDGE_COLOR: Vector4<f32> = Vector4::new(0f32, 0f32, 0f32, 1f32);

    pub fn new(name: &str, bones: Vec<Bone>, morphs: Vec<Morph>) -> Self {
        Self {
            name: name.to_owned(),
            bones: BoneSet::new(bones),
            morphs: MorphSet::new(morphs),
            constraint_states: BTreeMap::new(),
            outside_parents: BTreeMap::new(),
            edge_color: Self::INITIAL_EDGE_COLOR,
            edge_size_scale_factor: 1f32,
            states: ModelStates::default(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.bones.find(name)
    }

    pub fn find_bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.bones.find_mut(name)
    }

    pub fn find_morph(&self, name: &str) -> Option<&Morph> {
        self.morphs.find(name)
    }

    pub fn find_morph_mut(&mut self, name: &str) -> Option<&mut Morph> {
        self.morphs.find_mut(name)
    }

    pub fn has_any_dirty_bone(&self) -> bool {
        self.bones.has_any_dirty_bone()
    }

    pub fn is_visible(&self) -> bool {
        self.states.visible
    }

    pub fn set_visible(&mut self, value: bool) {
        if self.states.visible != value {
            self.states.visible = value;
            self.states.dirty = true;
        }
    }

    pub fn is_physics_simulation_enabled(&self) -> bool {
        self.states.physics_simulation
    }

    pub fn is_add_blending_enabled(&self) -> bool {
        self.states.enable_add_blend
    }

    pub fn has_edge_option(&self) -> bool {
        self.states.has_edge_option
    }

    pub fn edge_color(&self) -> Vector4<f32> {
        self.edge_color
    }

    pub fn edge_size_scale_factor(&self) -> f32 {
        self.edge_size_scale_factor
    }

    pub fn constraint_states(&self) -> impl Iterator<Item = (&String, bool)> {
        self.constraint_states
            .iter()
            .map(|(name, enabled)| (name, *enabled))
    }

    /// Registers or updates the constraint targeting `bone_name`.
    pub fn set_constraint_enabled(&mut self, bone_name: &str, enabled: bool) {
        self.constraint_states.insert(bone_name.to_owned(), enabled);
    }

    pub fn is_constraint_enabled(&self, bone_name: &str) -> Option<bool> {
        self.constraint_states.get(bone_name).copied()
    }

    pub fn outside_parents(&self) -> impl Iterator<Item = (&String, &(String, String))> {
        self.outside_parents.iter()
    }

    pub fn set_outside_parent(&mut self, subject_bone_name: &str, parent: Option<(String, String)>) {
        match parent {
            Some(parent) => {
                self.outside_parents
                    .insert(subject_bone_name.to_owned(), parent);
            }
            None => {
                self.outside_parents.remove(subject_bone_name);
            }
        }
    }
}

#[test]
fn test_model_bindings() {
    let mut model = Model::new("miku", vec![Bone::new("左足ＩＫ")], vec![]);
    model.set_constraint_enabled("左足ＩＫ", false);
    model.set_outside_parent("左足ＩＫ", Some(("stage".to_owned(), "root".to_owned())));
    assert_eq!(Some(false), model.is_constraint_enabled("左足ＩＫ"));
    assert_eq!(1, model.outside_parents().count());
    model.set_outside_parent("左足ＩＫ", None);
    assert_eq!(0, model.outside_parents().count());
}
