//! Tokenflow Core
//!
//! Foundational types shared by the token-flow animation engine:
//!
//! - **Net Model**: places, transitions and typed arcs of a Petri net page
//! - **Geometry**: boundary anchors on node shapes and fan offsets for parallel arcs
//! - **Paths**: drawable token paths with arc-length sampling
//!
//! # Example
//!
//! ```rust
//! use tokenflow_core::{build_path, Arc, ArcKind, Net, PathStyle, Place, Point, Transition};
//!
//! let mut net = Net::new();
//! net.add_place(Place::new("p1", Point::new(0.0, 0.0)).with_tokens(1));
//! net.add_transition(Transition::new("t1", Point::new(200.0, 0.0)));
//! net.add_arc(Arc::new("a1", ArcKind::Regular, "p1", "t1"));
//!
//! let arc = net.arc(&"a1".into()).unwrap();
//! let from = net.element(&arc.source).unwrap();
//! let to = net.element(&arc.target).unwrap();
//! let path = build_path(&from, &to, arc, net.arcs(), &PathStyle::default());
//! assert!(path.length() > 0.0);
//! ```

pub mod geometry;
pub mod ids;
pub mod net;
pub mod path;

pub use geometry::{anchor_point, canonical_normal, parallel_offset, Point, Shape, Vec2};
pub use ids::{ArcId, NodeId};
pub use net::{Arc, ArcKind, Element, Net, Place, Transition};
pub use path::{build_path, FlowPath, PathCommand, PathStyle};
