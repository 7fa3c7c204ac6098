use std::collections::HashMap;

use foundation::math::Vec3;
use layers::{LabelId, LabelKind, LabelSystem, OverlayContainer};
use scene::components::{ComponentBounds, Transform};
use scene::{NodeId, World};
use tracing::{debug, warn};

use crate::manifest::{NodeEntry, NodeEntryKind, ViewerManifest};
use crate::package::ManifestError;

/// Scene built from a manifest, with manifest ids resolved to nodes.
#[derive(Debug, Default)]
pub struct SceneBuild {
    pub world: World,
    pub nodes: HashMap<String, NodeId>,
}

impl SceneBuild {
    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.nodes.get(id).copied()
    }
}

pub fn build_world(manifest: &ViewerManifest) -> Result<SceneBuild, ManifestError> {
    let mut by_id: HashMap<&str, &NodeEntry> = HashMap::with_capacity(manifest.nodes.len());
    for entry in &manifest.nodes {
        if by_id.insert(entry.id.as_str(), entry).is_some() {
            return Err(ManifestError::DuplicateId {
                id: entry.id.clone(),
            });
        }
    }
    for entry in &manifest.nodes {
        if let Some(parent) = &entry.parent
            && !by_id.contains_key(parent.as_str())
        {
            return Err(ManifestError::UnknownParent {
                node: entry.id.clone(),
                parent: parent.clone(),
            });
        }
    }

    let mut build = SceneBuild::default();
    for entry in &manifest.nodes {
        spawn_entry(&mut build, &by_id, entry, 0)?;
    }
    debug!(nodes = build.nodes.len(), "scene built from manifest");
    Ok(build)
}

fn spawn_entry(
    build: &mut SceneBuild,
    by_id: &HashMap<&str, &NodeEntry>,
    entry: &NodeEntry,
    depth: usize,
) -> Result<NodeId, ManifestError> {
    if let Some(node) = build.node(&entry.id) {
        return Ok(node);
    }
    // Deeper than the table means the parent links form a cycle.
    if depth > by_id.len() {
        return Err(ManifestError::UnknownParent {
            node: entry.id.clone(),
            parent: entry.parent.clone().unwrap_or_default(),
        });
    }

    let parent = match entry.parent.as_deref() {
        Some(parent_id) => {
            let parent_entry = by_id.get(parent_id).ok_or_else(|| ManifestError::UnknownParent {
                node: entry.id.clone(),
                parent: parent_id.to_string(),
            })?;
            Some(spawn_entry(build, by_id, parent_entry, depth + 1)?)
        }
        None => None,
    };

    let world = &mut build.world;
    let node = match entry.kind {
        NodeEntryKind::Group => world.spawn_group(parent),
        NodeEntryKind::Mesh => {
            let size = entry.size.unwrap_or([0.0; 3]);
            world.spawn_mesh(parent, ComponentBounds::sized(vec3(size)))
        }
    };
    let mut transform = Transform::translate(vec3(entry.position))
        .with_rotation_y(entry.rotation_y_deg.to_radians());
    if let Some(scale) = entry.scale {
        transform = transform.with_scale(vec3(scale));
    }
    world.set_transform(node, transform);
    world.set_name(node, entry.id.clone());
    build.nodes.insert(entry.id.clone(), node);
    Ok(node)
}

fn vec3(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// Register every manifest label. Labels whose target is missing are skipped.
pub fn register_labels<C: OverlayContainer>(
    manifest: &ViewerManifest,
    build: &SceneBuild,
    labels: &mut LabelSystem<C>,
) -> Vec<LabelId> {
    let mut out = Vec::with_capacity(manifest.labels.len());
    for entry in &manifest.labels {
        let target = build.node(&entry.target);
        let color = entry.color.clone();
        let result = match entry.kind {
            LabelKind::Standard => labels.register(&build.world, target, entry.text.as_str(), color),
            LabelKind::Compass => labels.register_compass(&build.world, target, entry.text.as_str(), color),
        };
        match result {
            Ok(id) => out.push(id),
            Err(err) => warn!(target = %entry.target, error = %err, "manifest label skipped"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use layers::{LabelColor, LabelConfig, MemoryOverlay};
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_nested_nodes_in_any_order() {
        let manifest = ViewerManifest::new("nested")
            .mesh("spire", Some("palace"), [0.0, 10.0, 0.0], [4.0, 20.0, 4.0])
            .group("palace", None, [0.0, 80.0, 0.0]);

        let build = build_world(&manifest).expect("build");
        let spire = build.node("spire").expect("spire");
        let palace = build.node("palace").expect("palace");

        assert_eq!(build.world.parent(spire), Some(palace));
        assert_eq!(build.world.world_position(spire), Some(Vec3::new(0.0, 90.0, 0.0)));
        assert_eq!(build.world.world_bounds(palace).map(|b| b.height()), Some(20.0));
        assert_eq!(build.world.find_by_name("palace"), Some(palace));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let manifest = ViewerManifest::new("dup")
            .group("a", None, [0.0; 3])
            .group("a", None, [1.0, 0.0, 0.0]);
        assert!(matches!(build_world(&manifest), Err(ManifestError::DuplicateId { id }) if id == "a"));
    }

    #[test]
    fn rejects_unknown_and_cyclic_parents() {
        let manifest = ViewerManifest::new("orphan").group("a", Some("missing"), [0.0; 3]);
        assert!(matches!(
            build_world(&manifest),
            Err(ManifestError::UnknownParent { node, parent }) if node == "a" && parent == "missing"
        ));

        let manifest = ViewerManifest::new("cycle")
            .group("a", Some("b"), [0.0; 3])
            .group("b", Some("a"), [0.0; 3]);
        assert!(matches!(build_world(&manifest), Err(ManifestError::UnknownParent { .. })));
    }

    #[test]
    fn registers_labels_and_skips_missing_targets() {
        let manifest = ViewerManifest::new("labels")
            .group("east", None, [240.0, 6.0, 0.0])
            .label("east", "Eastern Continent", LabelColor::Hex(0xa9a9a9))
            .label("nowhere", "Lost", LabelColor::default());
        let build = build_world(&manifest).unwrap();
        let overlay = MemoryOverlay::new();
        let mut labels = LabelSystem::new(overlay.clone(), LabelConfig::default());

        let ids = register_labels(&manifest, &build, &mut labels);
        assert_eq!(ids.len(), 1);
        assert_eq!(overlay.live_count(), 1);
        assert_eq!(labels.anchor(ids[0]).map(|a| a.text.as_str()), Some("Eastern Continent"));
    }

    #[test]
    fn shipped_world_manifest_builds() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../apps/viewer_web/assets")
            .join(crate::package::MANIFEST_FILE_NAME);
        let manifest = ViewerManifest::load_file(path).expect("load shipped manifest");
        let build = build_world(&manifest).expect("build");
        let overlay = MemoryOverlay::new();
        let mut labels = LabelSystem::new(overlay, manifest.config.labels);
        let ids = register_labels(&manifest, &build, &mut labels);
        assert_eq!(ids.len(), manifest.labels.len());
        assert!(build.node("eastern_continent").is_some());
    }
}
