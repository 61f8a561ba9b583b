use std::collections::HashMap;

use super::MorphIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct Morph {
    pub name: String,
    pub canonical_name: String,
    pub weight: f32,
    pub dirty: bool,
}

impl Morph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            canonical_name: name.to_owned(),
            weight: 0f32,
            dirty: false,
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, value: f32) {
        self.dirty = self.weight.abs() > f32::EPSILON || value.abs() > f32::EPSILON;
        self.weight = value;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MorphSet {
    morphs: Vec<Morph>,
    morphs_by_name: HashMap<String, MorphIndex>,
}

impl MorphSet {
    pub fn new(morphs: Vec<Morph>) -> Self {
        let mut morphs_by_name = HashMap::new();
        for (idx, morph) in morphs.iter().enumerate() {
            morphs_by_name.insert(morph.name.clone(), idx);
            morphs_by_name
                .entry(morph.canonical_name.clone())
                .or_insert(idx);
        }
        Self {
            morphs,
            morphs_by_name,
        }
    }

    pub fn find(&self, name: &str) -> Option<&Morph> {
        self.morphs_by_name
            .get(name)
            .and_then(|idx| self.morphs.get(*idx))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Morph> {
        self.morphs_by_name
            .get(name)
            .and_then(|idx| self.morphs.get_mut(*idx))
    }

    pub fn len(&self) -> usize {
        self.morphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.morphs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Morph> {
        self.morphs.iter()
    }
}

#[test]
fn test_set_weight_marks_dirty() {
    let mut morph = Morph::new("あ");
    morph.set_weight(0f32);
    assert!(!morph.dirty);
    morph.set_weight(0.5f32);
    assert!(morph.dirty);
    assert_eq!(0.5f32, morph.weight());
}
