//! JSON wire format shared by requests and responses
//!
//! The oracle receives the whole page and answers in the same shape with the
//! new marking and enabled flags. Fields the oracle leaves out keep their
//! previous value on our side.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokenflow_core::{Arc, ArcId, ArcKind, Net, NodeId, Place, Point, Transition};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDto {
    pub id: NodeId,
    /// Absent in a response when the oracle leaves the count alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDto {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub arc_ids: Vec<ArcId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcDto {
    pub id: ArcId,
    #[serde(rename = "type")]
    pub kind: ArcKind,
    /// Source node
    pub incoming_id: NodeId,
    /// Target node
    pub outgoing_id: NodeId,
}

/// A whole page as exchanged with the oracle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetPayload {
    #[serde(default)]
    pub places: Vec<PlaceDto>,
    #[serde(default)]
    pub transitions: Vec<TransitionDto>,
    #[serde(default)]
    pub arcs: Vec<ArcDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deterministic_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set on conflict-resolution requests only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_transition_id: Option<NodeId>,
}

impl NetPayload {
    /// Serialize the current state of a net
    pub fn from_net(net: &Net) -> Self {
        let places = net
            .places()
            .map(|p| PlaceDto {
                id: p.id.clone(),
                tokens: Some(p.tokens),
                name: p.name.clone(),
                x: Some(p.position.x),
                y: Some(p.position.y),
                radius: Some(p.radius),
                bounded: Some(p.bounded),
                capacity: p.capacity,
            })
            .collect();

        let transitions = net
            .transitions()
            .map(|t| TransitionDto {
                id: t.id.clone(),
                enabled: Some(t.enabled),
                arc_ids: t.arc_ids.to_vec(),
                name: t.name.clone(),
                x: Some(t.position.x),
                y: Some(t.position.y),
                width: Some(t.width),
                height: Some(t.height),
            })
            .collect();

        let arcs = net
            .arcs()
            .iter()
            .map(|a| ArcDto {
                id: a.id.clone(),
                kind: a.kind,
                incoming_id: a.source.clone(),
                outgoing_id: a.target.clone(),
            })
            .collect();

        Self {
            places,
            transitions,
            arcs,
            ..Self::default()
        }
    }

    pub fn with_deterministic_mode(mut self, deterministic: bool) -> Self {
        self.deterministic_mode = Some(deterministic);
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_selected_transition(mut self, id: NodeId) -> Self {
        self.selected_transition_id = Some(id);
        self
    }

    /// Build a net from a payload, filling in default geometry
    pub fn into_net(self) -> Net {
        let mut net = Net::new();
        for p in self.places {
            let mut place = Place::new(
                p.id,
                Point::new(p.x.unwrap_or_default(), p.y.unwrap_or_default()),
            )
            .with_tokens(p.tokens.unwrap_or_default());
            place.name = p.name;
            if let Some(radius) = p.radius {
                place.radius = radius;
            }
            place.bounded = p.bounded.unwrap_or(p.capacity.is_some());
            place.capacity = p.capacity;
            net.add_place(place);
        }
        for t in self.transitions {
            let mut transition = Transition::new(
                t.id,
                Point::new(t.x.unwrap_or_default(), t.y.unwrap_or_default()),
            )
            .with_enabled(t.enabled.unwrap_or_default());
            transition.name = t.name;
            if let (Some(width), Some(height)) = (t.width, t.height) {
                transition = transition.with_size(width, height);
            }
            net.add_transition(transition);
        }
        for a in self.arcs {
            net.add_arc(Arc::new(a.id, a.kind, a.incoming_id, a.outgoing_id));
        }
        net
    }

    /// Token count per place that carries one
    pub fn marking(&self) -> FxHashMap<NodeId, u32> {
        self.places
            .iter()
            .filter_map(|p| Some((p.id.clone(), p.tokens?)))
            .collect()
    }

    /// Enabled flag per transition that carries one
    pub fn enabled_flags(&self) -> FxHashMap<NodeId, bool> {
        self.transitions
            .iter()
            .filter_map(|t| Some((t.id.clone(), t.enabled?)))
            .collect()
    }
}
