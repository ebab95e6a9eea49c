use crate::arena::JointHandle;

/// Ordered pool of short-lived joints, usually the contacts of one step.
///
/// The world owns the joints themselves; a group only records membership so
/// that emptying it can destroy every member at once.
#[derive(Debug, Clone, Default)]
pub struct JointGroup {
    pub(crate) joints: Vec<JointHandle>,
}

impl JointGroup {
    #[must_use]
    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
