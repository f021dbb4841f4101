//! Opaque calls the simulation issues against the host scene graph.

use std::cell::RefCell;

use glam::Vec3;

use crate::{ActorId, CollectibleId};

/// Scene object addressed by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneNode {
    /// Visual representation of a pooled projectile.
    Projectile(ActorId),
    /// Visual representation of a collectible entity.
    Collectible(CollectibleId),
}

/// Hierarchy container a scene node may be parented under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    /// Holding area for inactive pooled projectiles.
    Pool,
    /// Root of the live world.
    World,
}

/// Host scene collaborator.
///
/// Methods take `&self` because handles to the scene are shared between every
/// system; implementations that record state use interior mutability.
pub trait Scene {
    /// Shows or hides the node and enables or disables its physical presence.
    fn set_active(&self, node: SceneNode, active: bool);

    /// Moves the node to a world-space position.
    fn set_position(&self, node: SceneNode, position: Vec3);

    /// Reparents the node under the provided container.
    fn set_parent(&self, node: SceneNode, container: Container);
}

/// Scene that discards every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScene;

impl Scene for NullScene {
    fn set_active(&self, _node: SceneNode, _active: bool) {}

    fn set_position(&self, _node: SceneNode, _position: Vec3) {}

    fn set_parent(&self, _node: SceneNode, _container: Container) {}
}

/// Single call captured by [`RecordingScene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneCall {
    /// Captured `set_active` call.
    SetActive {
        /// Node addressed by the call.
        node: SceneNode,
        /// Requested activity.
        active: bool,
    },
    /// Captured `set_position` call.
    SetPosition {
        /// Node addressed by the call.
        node: SceneNode,
        /// Requested position.
        position: Vec3,
    },
    /// Captured `set_parent` call.
    SetParent {
        /// Node addressed by the call.
        node: SceneNode,
        /// Requested container.
        container: Container,
    },
}

/// Scene that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingScene {
    calls: RefCell<Vec<SceneCall>>,
}

impl RecordingScene {
    /// Creates an empty recording scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<SceneCall> {
        self.calls.borrow().clone()
    }

    /// Removes and returns every call recorded so far.
    pub fn take(&self) -> Vec<SceneCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Activity most recently requested for the node, if any.
    #[must_use]
    pub fn is_active(&self, node: SceneNode) -> Option<bool> {
        self.calls.borrow().iter().rev().find_map(|call| match *call {
            SceneCall::SetActive {
                node: recorded,
                active,
            } if recorded == node => Some(active),
            _ => None,
        })
    }

    /// Position most recently requested for the node, if any.
    #[must_use]
    pub fn position(&self, node: SceneNode) -> Option<Vec3> {
        self.calls.borrow().iter().rev().find_map(|call| match *call {
            SceneCall::SetPosition {
                node: recorded,
                position,
            } if recorded == node => Some(position),
            _ => None,
        })
    }
}

impl Scene for RecordingScene {
    fn set_active(&self, node: SceneNode, active: bool) {
        self.calls
            .borrow_mut()
            .push(SceneCall::SetActive { node, active });
    }

    fn set_position(&self, node: SceneNode, position: Vec3) {
        self.calls
            .borrow_mut()
            .push(SceneCall::SetPosition { node, position });
    }

    fn set_parent(&self, node: SceneNode, container: Container) {
        self.calls
            .borrow_mut()
            .push(SceneCall::SetParent { node, container });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_scene_reports_latest_activity() {
        let scene = RecordingScene::new();
        let node = SceneNode::Collectible(CollectibleId::new(4));

        assert_eq!(scene.is_active(node), None);
        scene.set_active(node, false);
        scene.set_active(SceneNode::Projectile(ActorId::new(0)), true);
        scene.set_active(node, true);

        assert_eq!(scene.is_active(node), Some(true));
        assert_eq!(scene.calls().len(), 3);
    }

    #[test]
    fn take_drains_recorded_calls() {
        let scene = RecordingScene::new();
        let node = SceneNode::Projectile(ActorId::new(1));
        scene.set_parent(node, Container::Pool);
        scene.set_position(node, Vec3::ONE);

        let calls = scene.take();

        assert_eq!(
            calls,
            vec![
                SceneCall::SetParent {
                    node,
                    container: Container::Pool,
                },
                SceneCall::SetPosition {
                    node,
                    position: Vec3::ONE,
                },
            ]
        );
        assert!(scene.calls().is_empty());
        assert_eq!(scene.position(node), None);
    }
}
