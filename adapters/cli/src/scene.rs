//! Scene adapter that narrates simulation calls through the log.

use berry_grove_core::{Container, Scene, SceneNode};
use glam::Vec3;
use log::trace;

/// Scene that emits a trace record for every call instead of drawing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LogScene;

impl Scene for LogScene {
    fn set_active(&self, node: SceneNode, active: bool) {
        trace!("{node:?} active={active}");
    }

    fn set_position(&self, node: SceneNode, position: Vec3) {
        trace!("{node:?} moved to {position}");
    }

    fn set_parent(&self, node: SceneNode, container: Container) {
        trace!("{node:?} parented under {container:?}");
    }
}
