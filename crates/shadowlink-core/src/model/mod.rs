//! Override shadows, rig data and the property schema

pub mod rig;
pub mod schema;
pub mod shadow;

pub use rig::{Constraint, ConstraintKind, Joint, RigData, TransformLocks};
pub use schema::{
    IDENTITY_PROPERTIES, JOINT_CHANNELS, OBJECT_PROPERTIES, PropertySchema,
    constraint_influence_path, joint_channel_path,
};
pub use shadow::{LinkedRef, OverrideShadow, ScriptBinding, ShadowKind, unique_instance_name};
