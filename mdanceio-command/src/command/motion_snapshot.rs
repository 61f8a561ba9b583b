use nanoem::motion::MotionKeyframeTypes;

use crate::{
    error::MdanceioError,
    motion::Motion,
    motion_keyframe_selection::MotionKeyframeSelection,
    project::{MotionHandle, Project},
};

use super::Command;

/// LZ4 block holding a serialized motion, with the size it inflates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedSnapshot {
    data: Vec<u8>,
    inflated_size: usize,
}

impl CompressedSnapshot {
    /// An LZ4 block cannot inflate beyond this many bytes per compressed byte.
    const MAX_INFLATION_RATIO: usize = 255;

    pub fn compress(bytes: &[u8]) -> Self {
        Self {
            data: lz4_flex::block::compress(bytes),
            inflated_size: bytes.len(),
        }
    }

    pub fn from_raw_parts(data: Vec<u8>, inflated_size: usize) -> Self {
        Self {
            data,
            inflated_size,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn inflated_size(&self) -> usize {
        self.inflated_size
    }

    pub fn decompress(&self) -> Result<Vec<u8>, MdanceioError> {
        let limit = self
            .data
            .len()
            .saturating_mul(Self::MAX_INFLATION_RATIO)
            .saturating_add(16);
        if self.inflated_size > limit {
            return Err(MdanceioError::snapshot_corrupted(&format!(
                "{} bytes cannot inflate to {} bytes",
                self.data.len(),
                self.inflated_size
            )));
        }
        let inflated = lz4_flex::block::decompress(&self.data, self.inflated_size)
            .map_err(|err| MdanceioError::snapshot_corrupted(&err.to_string()))?;
        if inflated.len() != self.inflated_size {
            return Err(MdanceioError::snapshot_corrupted(&format!(
                "expected {} bytes but got {}",
                self.inflated_size,
                inflated.len()
            )));
        }
        Ok(inflated)
    }
}

/// Keyframes of some types plus their selection, taken at one point of an edit.
#[derive(Debug, Clone)]
pub struct MotionSnapshot {
    keyframes: CompressedSnapshot,
    selection: MotionKeyframeSelection,
}

impl MotionSnapshot {
    pub fn capture(motion: &Motion, types: MotionKeyframeTypes) -> Result<Self, MdanceioError> {
        let bytes = motion.save_snapshot(types)?;
        Ok(Self {
            keyframes: CompressedSnapshot::compress(&bytes),
            selection: motion.selection().clone(),
        })
    }

    pub fn from_parts(keyframes: CompressedSnapshot, selection: MotionKeyframeSelection) -> Self {
        Self {
            keyframes,
            selection,
        }
    }

    pub fn keyframes(&self) -> &CompressedSnapshot {
        &self.keyframes
    }

    pub fn selection(&self) -> &MotionKeyframeSelection {
        &self.selection
    }
}

/// Swaps whole keyframe channels of a motion between two snapshots.
///
/// Bulk edits capture a [`MotionSnapshot`] before touching the motion, edit it in place and
/// then build this command, which captures the edited state as the redo side.
#[derive(Debug, Clone)]
pub struct MotionSnapshotCommand {
    motion: MotionHandle,
    types: MotionKeyframeTypes,
    current: MotionSnapshot,
    last: MotionSnapshot,
}

impl MotionSnapshotCommand {
    pub fn create(
        project: &Project,
        motion: MotionHandle,
        last: MotionSnapshot,
        types: MotionKeyframeTypes,
    ) -> Result<Self, MdanceioError> {
        let current = MotionSnapshot::capture(
            project
                .motion(motion)
                .ok_or_else(MdanceioError::motion_not_found)?,
            types,
        )?;
        Ok(Self {
            motion,
            types,
            current,
            last,
        })
    }

    pub fn motion(&self) -> MotionHandle {
        self.motion
    }

    pub fn types(&self) -> MotionKeyframeTypes {
        self.types
    }

    pub fn current(&self) -> &MotionSnapshot {
        &self.current
    }

    pub fn last(&self) -> &MotionSnapshot {
        &self.last
    }

    fn execute(
        handle: MotionHandle,
        types: MotionKeyframeTypes,
        snapshot: &MotionSnapshot,
        project: &mut Project,
    ) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let motion = match project.motion_mut(handle) {
            Some(motion) => motion,
            None => {
                log::debug!("Motion {} is detached, skip restoring snapshot", handle);
                return Ok(());
            }
        };
        let bytes = snapshot.keyframes.decompress().map_err(|err| {
            log::warn!("Snapshot of motion {} is not restored: {}", handle, err);
            err
        })?;
        motion.load_snapshot(types, &bytes)?;
        motion.selection_mut().restore(types, &snapshot.selection);
        project.commit_motion(handle, last_duration);
        Ok(())
    }
}

impl Command<Project> for MotionSnapshotCommand {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        Self::execute(self.motion, self.types, &self.last, project)
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        Self::execute(self.motion, self.types, &self.current, project)
    }

    fn name(&self) -> &str {
        "MotionSnapshotCommand"
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DomainType;

    use super::CompressedSnapshot;

    #[test]
    fn test_compressed_snapshot() {
        let bytes = b"keyframes keyframes keyframes keyframes".to_vec();
        let snapshot = CompressedSnapshot::compress(&bytes);
        assert_eq!(bytes.len(), snapshot.inflated_size());
        assert_eq!(bytes, snapshot.decompress().unwrap());
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() {
        let snapshot = CompressedSnapshot::compress(&[7u8; 256]);
        let truncated = CompressedSnapshot::from_raw_parts(
            snapshot.data()[..snapshot.data().len() / 2].to_vec(),
            snapshot.inflated_size(),
        );
        assert!(truncated.decompress().is_err());
    }

    #[test]
    fn test_oversized_inflated_size_is_rejected() {
        let snapshot = CompressedSnapshot::compress(&[7u8; 64]);
        for inflated_size in [usize::MAX, snapshot.data().len() * 256 + 17] {
            let oversized =
                CompressedSnapshot::from_raw_parts(snapshot.data().to_vec(), inflated_size);
            let err = oversized.decompress().unwrap_err();
            assert_eq!(DomainType::Command, err.domain());
        }
    }
}
