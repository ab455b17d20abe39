//! Glyph outlines as quadratic TrueType contours in unrounded font units.
//!
//! Points are kept as `f64` so that chains of transforms (em rescale, fitting,
//! center-preserving scales) accumulate no rounding error; coordinates are only
//! rounded to integers when a glyph is written back to a `glyf` table.

use kurbo::{Affine, BezPath, ParamCurveExtrema, Point, Rect};
use read_fonts::tables::glyf::{CurvePoint, SimpleGlyph as ReadSimpleGlyph};
use write_fonts::tables::glyf::{Bbox, Contour, SimpleGlyph};

/// A single outline point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OutlinePoint {
    pub pos: Point,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub const fn on(x: f64, y: f64) -> Self {
        Self { pos: Point::new(x, y), on_curve: true }
    }

    pub const fn off(x: f64, y: f64) -> Self {
        Self { pos: Point::new(x, y), on_curve: false }
    }
}

/// A glyph outline: zero or more closed quadratic contours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    contours: Vec<Vec<OutlinePoint>>,
}

impl Outline {
    pub fn new(contours: Vec<Vec<OutlinePoint>>) -> Self {
        let contours = contours.into_iter().filter(|c| !c.is_empty()).collect();
        Self { contours }
    }

    /// Build an outline from a parsed `glyf` simple glyph.
    pub fn from_simple(glyph: &ReadSimpleGlyph) -> Self {
        let mut contours = Vec::new();
        let mut points = glyph.points();
        let mut current = 0usize;

        for end_pt in glyph.end_pts_of_contours() {
            let end = end_pt.get() as usize;
            let mut contour = Vec::new();
            while current <= end {
                if let Some(pt) = points.next() {
                    contour.push(OutlinePoint {
                        pos: Point::new(f64::from(pt.x), f64::from(pt.y)),
                        on_curve: pt.on_curve,
                    });
                }
                current += 1;
            }
            if !contour.is_empty() {
                contours.push(contour);
            }
        }

        Self { contours }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Vec<OutlinePoint>] {
        &self.contours
    }

    pub fn num_points(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }

    /// Append the contours of another outline.
    pub fn extend(&mut self, other: Outline) {
        self.contours.extend(other.contours);
    }

    pub fn transform(&mut self, affine: Affine) {
        for point in self.contours.iter_mut().flatten() {
            point.pos = affine * point.pos;
        }
    }

    /// Tight bounding box of the drawn curves, or `None` for an empty outline.
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        let mut include = |rect: Rect| {
            bounds = Some(match bounds {
                Some(b) => b.union(rect),
                None => rect,
            });
        };

        for point in self.contours.iter().flatten().filter(|p| p.on_curve) {
            include(Rect::from_points(point.pos, point.pos));
        }
        for seg in self.to_bezpath().segments() {
            include(seg.bounding_box());
        }
        bounds
    }

    /// Convert to a kurbo path, expanding implied on-curve points.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for contour in &self.contours {
            append_contour(contour, &mut path);
        }
        path
    }

    /// Round the outline into a `glyf` simple glyph without instructions.
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn to_simple_glyph(&self) -> Option<SimpleGlyph> {
        if self.is_empty() {
            return None;
        }

        let rounded: Vec<Vec<CurvePoint>> = self
            .contours
            .iter()
            .map(|contour| {
                contour
                    .iter()
                    .map(|p| {
                        CurvePoint::new(p.pos.x.round() as i16, p.pos.y.round() as i16, p.on_curve)
                    })
                    .collect()
            })
            .collect();

        let mut bbox: Option<Bbox> = None;
        for p in rounded.iter().flatten() {
            bbox = Some(match bbox {
                None => Bbox { x_min: p.x, y_min: p.y, x_max: p.x, y_max: p.y },
                Some(b) => Bbox {
                    x_min: b.x_min.min(p.x),
                    y_min: b.y_min.min(p.y),
                    x_max: b.x_max.max(p.x),
                    y_max: b.y_max.max(p.y),
                },
            });
        }

        let contours: Vec<Contour> = rounded.into_iter().map(Contour::from).collect();
        Some(SimpleGlyph { bbox: bbox?, contours, instructions: vec![] })
    }
}

fn append_contour(points: &[OutlinePoint], path: &mut BezPath) {
    let n = points.len();
    if n == 0 {
        return;
    }

    // Start on an on-curve point; an all off-curve contour starts at the implied
    // midpoint between its last and first points.
    let (start, sequence): (Point, Vec<OutlinePoint>) =
        match points.iter().position(|p| p.on_curve) {
            Some(first_on) => {
                let start = points[first_on].pos;
                let mut seq: Vec<OutlinePoint> =
                    (1..n).map(|k| points[(first_on + k) % n]).collect();
                seq.push(points[first_on]);
                (start, seq)
            }
            None => {
                let start = points[n - 1].pos.midpoint(points[0].pos);
                let mut seq = points.to_vec();
                seq.push(OutlinePoint { pos: start, on_curve: true });
                (start, seq)
            }
        };

    path.move_to(start);
    let mut control: Option<Point> = None;
    for point in sequence {
        if point.on_curve {
            match control.take() {
                Some(c) => path.quad_to(c, point.pos),
                None => path.line_to(point.pos),
            }
        } else {
            if let Some(c) = control {
                path.quad_to(c, c.midpoint(point.pos));
            }
            control = Some(point.pos);
        }
    }
    path.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Outline {
        Outline::new(vec![vec![
            OutlinePoint::on(x0, y0),
            OutlinePoint::on(x0, y1),
            OutlinePoint::on(x1, y1),
            OutlinePoint::on(x1, y0),
        ]])
    }

    #[test]
    fn test_bounds_of_square() {
        let outline = square(100.0, -20.0, 400.0, 700.0);
        let bounds = outline.bounds().unwrap();
        assert_eq!(bounds, Rect::new(100.0, -20.0, 400.0, 700.0));
    }

    #[test]
    fn test_bounds_are_tight_for_curves() {
        // A quadratic bump whose control point sits well above the curve.
        let outline = Outline::new(vec![vec![
            OutlinePoint::on(0.0, 0.0),
            OutlinePoint::off(50.0, 100.0),
            OutlinePoint::on(100.0, 0.0),
        ]]);
        let bounds = outline.bounds().unwrap();
        assert!((bounds.y1 - 50.0).abs() < 1e-9);
        assert_eq!(bounds.x0, 0.0);
        assert_eq!(bounds.x1, 100.0);
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::default();
        assert!(outline.is_empty());
        assert!(outline.bounds().is_none());
        assert!(outline.to_simple_glyph().is_none());
    }

    #[test]
    fn test_transform_and_round() {
        let mut outline = square(0.0, 0.0, 100.0, 100.0);
        outline.transform(Affine::translate((10.4, -0.6)));
        let glyph = outline.to_simple_glyph().unwrap();
        assert_eq!(glyph.bbox, Bbox { x_min: 10, y_min: -1, x_max: 110, y_max: 99 });
    }

    #[test]
    fn test_all_off_curve_contour() {
        let outline = Outline::new(vec![vec![
            OutlinePoint::off(0.0, 100.0),
            OutlinePoint::off(100.0, 100.0),
            OutlinePoint::off(100.0, 0.0),
            OutlinePoint::off(0.0, 0.0),
        ]]);
        // The implied on-curve points are the edge midpoints.
        let bounds = outline.bounds().unwrap();
        assert!((bounds.x0 - 0.0).abs() < 1e-9 && (bounds.x1 - 100.0).abs() < 1e-9);
        assert!((bounds.y0 - 0.0).abs() < 1e-9 && (bounds.y1 - 100.0).abs() < 1e-9);
    }
}
