use rs_sim::{AnimatorError, Effector, IkCorrector, LimbRole, Skeleton, SpineJoints};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("joint {joint} lists parent {parent}, which does not come before it")]
    ParentOrder { joint: usize, parent: usize },
    #[error("rig {rig:?} has no joint named {name:?}")]
    UnknownJoint { rig: &'static str, name: &'static str },
    #[error(transparent)]
    Binding(#[from] AnimatorError),
}

#[derive(Debug, Clone, Copy)]
pub struct JointDef {
    pub name: &'static str,
    /// Index of the parent joint. Parents always precede their children.
    pub parent: Option<usize>,
    /// Rest translation from the parent (or from the character root), metres,
    /// character facing +Z.
    pub offset: [f32; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct EffectorDef {
    pub tip: &'static str,
    pub role: LimbRole,
}

/// Joints the ground fit re-orients, by name.
#[derive(Debug, Clone, Copy)]
pub struct SpineDef {
    pub spine: &'static str,
    pub neck: &'static str,
    pub left_shoulder: &'static str,
    pub right_shoulder: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RigDef {
    pub name: &'static str,
    pub joints: &'static [JointDef],
    pub effectors: &'static [EffectorDef],
    pub spine: Option<SpineDef>,
}

impl RigDef {
    pub fn validate(&self) -> Result<(), RigError> {
        for (joint, def) in self.joints.iter().enumerate() {
            if let Some(parent) = def.parent {
                if parent >= joint {
                    return Err(RigError::ParentOrder { joint, parent });
                }
            }
        }
        for effector in self.effectors {
            self.index_of(effector.tip)?;
        }
        if let Some(spine) = self.spine {
            for name in [spine.spine, spine.neck, spine.left_shoulder, spine.right_shoulder] {
                self.index_of(name)?;
            }
        }
        Ok(())
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    fn index_of(&self, name: &'static str) -> Result<usize, RigError> {
        self.joint_index(name).ok_or(RigError::UnknownJoint {
            rig: self.name,
            name,
        })
    }

    pub fn children(&self, joint: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, def)| def.parent == Some(joint))
            .map(|(i, _)| i)
    }

    pub fn build_effectors(&self) -> Result<Vec<Effector>, RigError> {
        self.effectors
            .iter()
            .map(|def| Ok(Effector::new(self.index_of(def.tip)?, def.role)))
            .collect()
    }

    /// Spine roles looked up by name on the posed skeleton.
    pub fn spine_joints<S: Skeleton + ?Sized>(
        &self,
        skeleton: &S,
    ) -> Result<Option<SpineJoints>, RigError> {
        let Some(spine) = self.spine else {
            return Ok(None);
        };
        let joints = SpineJoints::resolve(
            skeleton,
            spine.spine,
            spine.neck,
            spine.left_shoulder,
            spine.right_shoulder,
        )?;
        Ok(Some(joints))
    }

    /// IK set-up for this rig; goals are planted once the animator binds it.
    pub fn ik_corrector<S: Skeleton + ?Sized>(&self, skeleton: &S) -> Result<IkCorrector, RigError> {
        Ok(IkCorrector::new(
            self.build_effectors()?,
            self.spine_joints(skeleton)?,
        ))
    }
}
