use std::collections::HashSet;
use std::fmt;

use glam::{Mat4, Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::backend::RenderBackend;
use crate::geometry::PlaneGeometry;
use crate::material::ShaderMaterial;

/// Index of a node in a [`Scene`]. Ids are never reused within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Identifier of a geometry owned by a mesh in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryId(pub u64);

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry#{}", self.0)
    }
}

/// Local transform of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    geometry_id: GeometryId,
    pub geometry: PlaneGeometry,
    pub material: ShaderMaterial,
}

impl Mesh {
    pub fn geometry_id(&self) -> GeometryId {
        self.geometry_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh(Mesh),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Self::with_content(name, NodeContent::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::with_content(name, NodeContent::Mesh(mesh))
    }

    fn with_content(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            content,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            NodeContent::Group => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            NodeContent::Group => None,
        }
    }
}

/// What [`Scene::dispose_all`] released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisposeReport {
    pub nodes: usize,
    pub geometries: usize,
    pub textures: usize,
}

/// Scene graph stored as an arena of nodes under a permanent root.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    next_geometry: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::group("scene"))],
            root: NodeId(0),
            next_geometry: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Pairs a geometry with a material, giving the geometry its id.
    pub fn create_mesh(&mut self, geometry: PlaneGeometry, material: ShaderMaterial) -> Mesh {
        let geometry_id = GeometryId(self.next_geometry);
        self.next_geometry += 1;
        Mesh {
            geometry_id,
            geometry,
            material,
        }
    }

    /// Adds a node directly under the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        let root = self.root;
        self.attach(root, node)
    }

    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        self.node(parent)?;
        Some(self.attach(parent, node))
    }

    fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(Some(node));
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        self.node(id).and_then(Node::as_mesh)
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        self.node_mut(id).and_then(Node::as_mesh_mut)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Detaches a subtree and drops it without releasing backend resources.
    /// The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || self.node(id).is_none() {
            return false;
        }
        if let Some(parent) = self.node(id).and_then(Node::parent) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        for node in self.post_order(id) {
            self.nodes[node.0] = None;
        }
        true
    }

    /// Snapshot of the subtree under `from`, children before parents.
    pub fn post_order(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if self.node(from).is_none() {
            return order;
        }
        // (node, children already expanded)
        let mut stack = vec![(from, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.children(id).iter().rev() {
                stack.push((*child, false));
            }
        }
        order
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.node(id);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|parent| self.node(parent));
        }
        matrix
    }

    /// Every mesh reachable from the root with its world matrix, in
    /// traversal order.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &Mesh, Mat4)> + '_ {
        let mut order = self.post_order(self.root);
        order.reverse();
        order.into_iter().filter_map(move |id| {
            self.mesh(id)
                .map(|mesh| (id, mesh, self.world_matrix(id)))
        })
    }

    /// Releases every geometry and texture in the graph through `backend`,
    /// then detaches all nodes below the root.
    ///
    /// Nodes are visited children first over a snapshot of ids taken up
    /// front. Geometries and textures shared between meshes are released
    /// once.
    pub fn dispose_all<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> DisposeReport {
        let mut report = DisposeReport::default();
        let mut released_geometry = HashSet::new();

        for id in self.post_order(self.root) {
            if let Some(mesh) = self.mesh(id) {
                let geometry = mesh.geometry_id;
                if released_geometry.insert(geometry) {
                    backend.dispose_geometry(geometry);
                    report.geometries += 1;
                }
                for texture in mesh.material.disposables() {
                    if texture.dispose() {
                        backend.dispose_texture(texture);
                        report.textures += 1;
                    }
                }
            }

            let children = self
                .node_mut(id)
                .map(|node| std::mem::take(&mut node.children))
                .unwrap_or_default();
            for child in children {
                self.nodes[child.0] = None;
                report.nodes += 1;
            }
        }

        debug!(
            "disposed {} nodes, {} geometries, {} textures",
            report.nodes, report.geometries, report.textures
        );
        report
    }
}
