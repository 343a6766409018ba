//! Petri net page model
//!
//! The net owns its places, transitions and arcs. Element order is insertion
//! order, which is also the order the oracle sees them in.

use crate::geometry::{Point, Shape};
use crate::ids::{ArcId, NodeId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Default radius of a place circle
pub const DEFAULT_PLACE_RADIUS: f32 = 20.0;
/// Default transition rectangle width
pub const DEFAULT_TRANSITION_WIDTH: f32 = 30.0;
/// Default transition rectangle height
pub const DEFAULT_TRANSITION_HEIGHT: f32 = 50.0;

/// Arc type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArcKind {
    Regular,
    Inhibitor,
    Bidirectional,
}

/// A token-holding node
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub id: NodeId,
    pub name: Option<String>,
    pub position: Point,
    pub tokens: u32,
    pub radius: f32,
    pub bounded: bool,
    pub capacity: Option<u32>,
}

impl Place {
    pub fn new(id: impl Into<NodeId>, position: Point) -> Self {
        Self {
            id: id.into(),
            name: None,
            position,
            tokens: 0,
            radius: DEFAULT_PLACE_RADIUS,
            bounded: false,
            capacity: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Bound the place to a maximum token count
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.bounded = true;
        self.capacity = Some(capacity);
        self
    }
}

/// A firing rule node
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub id: NodeId,
    pub name: Option<String>,
    pub position: Point,
    pub enabled: bool,
    pub width: f32,
    pub height: f32,
    pub arc_ids: SmallVec<[ArcId; 4]>,
}

impl Transition {
    pub fn new(id: impl Into<NodeId>, position: Point) -> Self {
        Self {
            id: id.into(),
            name: None,
            position,
            enabled: false,
            width: DEFAULT_TRANSITION_WIDTH,
            height: DEFAULT_TRANSITION_HEIGHT,
            arc_ids: SmallVec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Connection between one place and one transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arc {
    pub id: ArcId,
    pub kind: ArcKind,
    pub source: NodeId,
    pub target: NodeId,
}

impl Arc {
    pub fn new(
        id: impl Into<ArcId>,
        kind: ArcKind,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether the arc touches `node` at either end
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }

    /// Whether both arcs join the same unordered pair of nodes
    pub fn is_sibling_of(&self, other: &Arc) -> bool {
        (self.source == other.source && self.target == other.target)
            || (self.source == other.target && self.target == other.source)
    }

    /// The endpoint opposite to `node`
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Borrowed view of either kind of node
#[derive(Clone, Copy, Debug)]
pub enum Element<'a> {
    Place(&'a Place),
    Transition(&'a Transition),
}

impl Element<'_> {
    pub fn id(&self) -> &NodeId {
        match self {
            Element::Place(p) => &p.id,
            Element::Transition(t) => &t.id,
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Element::Place(p) => p.position,
            Element::Transition(t) => t.position,
        }
    }

    /// Outline used to find where arcs meet the node
    pub fn shape(&self) -> Shape {
        match self {
            Element::Place(p) => Shape::Circle {
                center: p.position,
                radius: p.radius,
            },
            Element::Transition(t) => Shape::Rect {
                center: t.position,
                half_width: t.width / 2.0,
                half_height: t.height / 2.0,
            },
        }
    }
}

/// A Petri net page
#[derive(Clone, Debug, Default)]
pub struct Net {
    places: IndexMap<NodeId, Place, FxBuildHasher>,
    transitions: IndexMap<NodeId, Transition, FxBuildHasher>,
    arcs: Vec<Arc>,
}

impl Net {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_place(&mut self, place: Place) {
        self.places.insert(place.id.clone(), place);
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.insert(transition.id.clone(), transition);
    }

    /// Add an arc and record it on the transition it touches
    ///
    /// Endpoints are not validated; arcs may outlive the nodes they reference.
    pub fn add_arc(&mut self, arc: Arc) {
        for end in [&arc.source, &arc.target] {
            if let Some(t) = self.transitions.get_mut(end) {
                if !t.arc_ids.contains(&arc.id) {
                    t.arc_ids.push(arc.id.clone());
                }
            }
        }
        self.arcs.push(arc);
    }

    pub fn place(&self, id: &NodeId) -> Option<&Place> {
        self.places.get(id)
    }

    pub fn place_mut(&mut self, id: &NodeId) -> Option<&mut Place> {
        self.places.get_mut(id)
    }

    pub fn transition(&self, id: &NodeId) -> Option<&Transition> {
        self.transitions.get(id)
    }

    pub fn transition_mut(&mut self, id: &NodeId) -> Option<&mut Transition> {
        self.transitions.get_mut(id)
    }

    /// Look up a node of either kind
    pub fn element(&self, id: &NodeId) -> Option<Element<'_>> {
        self.places
            .get(id)
            .map(Element::Place)
            .or_else(|| self.transitions.get(id).map(Element::Transition))
    }

    pub fn arc(&self, id: &ArcId) -> Option<&Arc> {
        self.arcs.iter().find(|a| &a.id == id)
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn transitions_mut(&mut self) -> impl Iterator<Item = &mut Transition> {
        self.transitions.values_mut()
    }

    /// Arcs with the transition at either end
    pub fn arcs_of<'a>(&'a self, transition: &'a NodeId) -> impl Iterator<Item = &'a Arc> + 'a {
        self.arcs.iter().filter(move |a| a.touches(transition))
    }

    /// Current token count of a place
    pub fn tokens(&self, place: &NodeId) -> Option<u32> {
        self.places.get(place).map(|p| p.tokens)
    }

    /// Overwrite a place's displayed token count; unknown ids are ignored
    pub fn set_tokens(&mut self, place: &NodeId, tokens: u32) {
        if let Some(p) = self.places.get_mut(place) {
            p.tokens = tokens;
        } else {
            tracing::debug!("set_tokens: place {} no longer exists", place);
        }
    }
}
