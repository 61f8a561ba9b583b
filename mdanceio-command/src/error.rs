use nanoem::common::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainType {
    Nanoem,
    Application,
    Command,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdanceioError {
    reason: String,
    recovery_suggestion: String,
    code: i32,
    domain: DomainType,
}

impl std::fmt::Display for MdanceioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let recovery_hint = if self.recovery_suggestion.is_empty() {
            "".to_owned()
        } else {
            format!("(Try \"{}\" to recover)", self.recovery_suggestion)
        };
        write!(
            f,
            "[{:?} - {}]{}{}",
            self.domain, self.code, self.reason, recovery_hint
        )
    }
}

impl std::error::Error for MdanceioError {}

impl MdanceioError {
    pub fn new(reason: &str, recovery_suggestion: &str, domain: DomainType) -> Self {
        Self {
            reason: reason.to_owned(),
            recovery_suggestion: recovery_suggestion.to_owned(),
            code: 0,
            domain,
        }
    }

    pub fn from_nanoem(message: &str, status: Status) -> Self {
        Self {
            reason: format!("{}{:?}", message, status),
            recovery_suggestion: "".to_owned(),
            code: status.code(),
            domain: DomainType::Nanoem,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn domain(&self) -> DomainType {
        self.domain
    }

    /// The status a nanoem failure was created from.
    pub fn is_nanoem_status(&self, status: Status) -> bool {
        self.domain == DomainType::Nanoem && self.code == status.code()
    }

    pub fn model_not_found() -> Self {
        Self::new(
            "The model is not registered to the project",
            "Add the model before editing its keyframes",
            DomainType::Application,
        )
    }

    pub fn accessory_not_found() -> Self {
        Self::new(
            "The accessory is not registered to the project",
            "Add the accessory before editing its keyframes",
            DomainType::Application,
        )
    }

    pub fn bone_not_found(name: &str) -> Self {
        Self::new(
            &format!("The bone {} is not in the model", name),
            "",
            DomainType::Application,
        )
    }

    pub fn motion_not_found() -> Self {
        Self::new(
            "No motion is attached to the target",
            "Attach a motion before editing keyframes",
            DomainType::Application,
        )
    }

    pub fn snapshot_corrupted(reason: &str) -> Self {
        Self {
            reason: format!("Cannot restore the motion snapshot: {}", reason),
            recovery_suggestion: "".to_owned(),
            code: 1,
            domain: DomainType::Command,
        }
    }
}

#[test]
fn test_display_with_recovery_suggestion() {
    let error = MdanceioError::new("reason", "restart", DomainType::Application);
    assert_eq!(
        "[Application - 0]reason(Try \"restart\" to recover)",
        error.to_string()
    );
}

#[test]
fn test_from_nanoem_keeps_status_code() {
    let error = MdanceioError::from_nanoem(
        "Cannot add the bone keyframe: ",
        Status::ErrorMotionBoneKeyframeAlreadyExists,
    );
    assert_eq!(DomainType::Nanoem, error.domain());
    assert!(error.is_nanoem_status(Status::ErrorMotionBoneKeyframeAlreadyExists));
    assert!(!error.is_nanoem_status(Status::ErrorMotionBoneKeyframeNotFound));
}
