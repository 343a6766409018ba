//! Token paths
//!
//! Builds the path a token travels along an arc: boundary anchor to boundary
//! anchor, fanned out for parallel arcs, and extended part of the way into
//! both nodes so the token never visibly jumps across the node outline.

use crate::geometry::{anchor_point, canonical_normal, parallel_offset, Point};
use crate::net::{Arc, Element};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Segments used when flattening a quadratic curve
const CURVE_SEGMENTS: usize = 16;

/// Path construction settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    /// Spacing between parallel sibling arcs
    pub offset_amount: f32,
    /// Fraction of the anchor-to-center distance the path reaches into a node
    pub extension: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            offset_amount: 20.0,
            extension: 0.5,
        }
    }
}

impl PathStyle {
    pub fn with_offset_amount(mut self, amount: f32) -> Self {
        self.offset_amount = amount;
        self
    }

    pub fn with_extension(mut self, extension: f32) -> Self {
        self.extension = extension;
        self
    }
}

/// Path command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, end: Point },
}

/// A drawable token path with its arc length
#[derive(Clone, Debug, PartialEq)]
pub struct FlowPath {
    commands: Vec<PathCommand>,
    /// Flattened polyline
    points: Vec<Point>,
    /// Arc length at each polyline point
    distances: Vec<f32>,
}

impl FlowPath {
    /// Create a path from commands, flattening curves for length and sampling
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        let mut points: Vec<Point> = Vec::with_capacity(commands.len() + CURVE_SEGMENTS);
        for cmd in &commands {
            match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => points.push(p),
                PathCommand::QuadTo { control, end } => {
                    let start = points.last().copied().unwrap_or(control);
                    for i in 1..=CURVE_SEGMENTS {
                        let t = i as f32 / CURVE_SEGMENTS as f32;
                        let a = start.lerp(control, t);
                        let b = control.lerp(end, t);
                        points.push(a.lerp(b, t));
                    }
                }
            }
        }

        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            distances.push(total);
        }

        Self {
            commands,
            points,
            distances,
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Total arc length, including the extensions into both nodes
    pub fn length(&self) -> f32 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    /// Position at `fraction` (0.0 to 1.0) of the path's arc length
    pub fn point_at(&self, fraction: f32) -> Point {
        let length = self.length();
        if self.points.len() < 2 || length <= 0.0 {
            return self.start();
        }

        let target = fraction.clamp(0.0, 1.0) * length;
        let i = self
            .distances
            .partition_point(|d| *d < target)
            .clamp(1, self.points.len() - 1);
        let (d0, d1) = (self.distances[i - 1], self.distances[i]);
        let span = d1 - d0;
        let t = if span > 0.0 { (target - d0) / span } else { 0.0 };
        self.points[i - 1].lerp(self.points[i], t)
    }

    /// SVG path data (`M x y L x y Q cx cy x y`)
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for cmd in &self.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            // Writing to a String cannot fail.
            let _ = match cmd {
                PathCommand::MoveTo(p) => write!(out, "M {:.1} {:.1}", p.x, p.y),
                PathCommand::LineTo(p) => write!(out, "L {:.1} {:.1}", p.x, p.y),
                PathCommand::QuadTo { control, end } => write!(
                    out,
                    "Q {:.1} {:.1} {:.1} {:.1}",
                    control.x, control.y, end.x, end.y
                ),
            };
        }
        out
    }
}

/// Build the path a token follows along `arc` from `source` to `target`
pub fn build_path(
    source: &Element<'_>,
    target: &Element<'_>,
    arc: &Arc,
    all_arcs: &[Arc],
    style: &PathStyle,
) -> FlowPath {
    let source_center = source.center();
    let target_center = target.center();
    let source_anchor = anchor_point(&source.shape(), target_center);
    let target_anchor = anchor_point(&target.shape(), source_center);

    let offset = parallel_offset(arc, all_arcs, style.offset_amount);
    let normal = canonical_normal((source.id(), source_center), (target.id(), target_center));
    let shift = normal * offset;
    let start = source_anchor + shift;
    let end = target_anchor + shift;

    let start_inside = start + (source_center - source_anchor) * style.extension;
    let end_inside = end + (target_center - target_anchor) * style.extension;

    let middle = if offset != 0.0 {
        PathCommand::QuadTo {
            control: start.midpoint(end) + shift,
            end,
        }
    } else {
        PathCommand::LineTo(end)
    };

    FlowPath::from_commands(vec![
        PathCommand::MoveTo(start_inside),
        PathCommand::LineTo(start),
        middle,
        PathCommand::LineTo(end_inside),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{ArcKind, Net, Place, Transition};

    const EPS: f32 = 1e-3;

    fn two_nodes() -> Net {
        let mut net = Net::new();
        net.add_place(Place::new("p1", Point::new(0.0, 0.0)));
        net.add_transition(Transition::new("t1", Point::new(200.0, 0.0)));
        net
    }

    #[test]
    fn test_straight_path_extends_into_nodes() {
        let mut net = two_nodes();
        net.add_arc(Arc::new("a1", ArcKind::Regular, "p1", "t1"));
        let arc = net.arc(&"a1".into()).unwrap();
        let from = net.element(&arc.source).unwrap();
        let to = net.element(&arc.target).unwrap();

        let path = build_path(&from, &to, arc, net.arcs(), &PathStyle::default());

        // Place radius 20 and transition half width 15, each half-extended inward.
        assert!((path.start().x - 10.0).abs() < EPS);
        assert!((path.end().x - 192.5).abs() < EPS);
        assert!((path.length() - 182.5).abs() < EPS);
        assert_eq!(path.commands().len(), 4);
        assert!(matches!(path.commands()[2], PathCommand::LineTo(_)));
    }

    #[test]
    fn test_parallel_path_curves() {
        let mut net = two_nodes();
        net.add_arc(Arc::new("a1", ArcKind::Regular, "p1", "t1"));
        net.add_arc(Arc::new("a2", ArcKind::Regular, "p1", "t1"));
        let arc = net.arc(&"a2".into()).unwrap();
        let from = net.element(&arc.source).unwrap();
        let to = net.element(&arc.target).unwrap();

        let path = build_path(&from, &to, arc, net.arcs(), &PathStyle::default());
        assert!(matches!(path.commands()[2], PathCommand::QuadTo { .. }));
        assert!((path.start().y - 10.0).abs() < EPS);
        // The bulge makes the curve longer than the straight version.
        assert!(path.length() > 182.5);
        assert!(path.to_svg().contains(" Q "));
    }

    #[test]
    fn test_return_leg_stays_in_its_lane() {
        let mut net = two_nodes();
        net.add_arc(Arc::new("a1", ArcKind::Regular, "p1", "t1"));
        net.add_arc(Arc::new("a2", ArcKind::Bidirectional, "p1", "t1"));
        let style = PathStyle::default();
        let p1 = net.element(&"p1".into()).unwrap();
        let t1 = net.element(&"t1".into()).unwrap();
        let regular = net.arc(&"a1".into()).unwrap();
        let shared = net.arc(&"a2".into()).unwrap();

        let outbound = build_path(&p1, &t1, shared, net.arcs(), &style);
        let inbound = build_path(&t1, &p1, shared, net.arcs(), &style);
        let other = build_path(&p1, &t1, regular, net.arcs(), &style);

        let mid_out = outbound.point_at(0.5);
        let mid_in = inbound.point_at(0.5);
        let mid_other = other.point_at(0.5);
        assert!(mid_out.y > 0.0);
        assert!((mid_out.y - mid_in.y).abs() < EPS);
        assert!(mid_other.y < 0.0);

        // Same lane, walked the other way round
        assert!((outbound.start().distance(inbound.end())) < EPS);
        assert!((outbound.end().distance(inbound.start())) < EPS);
    }

    #[test]
    fn test_point_at_walks_the_path() {
        let path = FlowPath::from_commands(vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::LineTo(Point::new(10.0, 0.0)),
            PathCommand::LineTo(Point::new(10.0, 10.0)),
        ]);
        assert_eq!(path.length(), 20.0);
        assert_eq!(path.point_at(0.0), Point::new(0.0, 0.0));
        assert_eq!(path.point_at(0.25), Point::new(5.0, 0.0));
        assert_eq!(path.point_at(0.75), Point::new(10.0, 5.0));
        assert_eq!(path.point_at(2.0), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_svg_output() {
        let path = FlowPath::from_commands(vec![
            PathCommand::MoveTo(Point::new(1.0, 2.0)),
            PathCommand::LineTo(Point::new(3.5, 4.0)),
        ]);
        assert_eq!(path.to_svg(), "M 1.0 2.0 L 3.5 4.0");
    }
}
