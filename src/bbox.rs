//! Point clouds collected by the renderer, and the bounding boxes computed from them.

/// The vertices collected during a render pass, in document coordinates.
///
/// Coordinates are kept in two parallel arrays.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PointCloud {
    pub fn new() -> PointCloud {
        Default::default()
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// The bounds of the points from index `start` on.
    pub fn bounds_since(&self, start: usize) -> Bounds {
        calc_bounds(self.iter().skip(start))
    }

    /// Bounds of all the points.
    pub fn bounds(&self) -> Bounds {
        self.bounds_since(0)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    /// Whether `(x, y)` is inside, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }
}

/// Bounds of a set of points; all zeros if there are none.
pub fn calc_bounds(points: impl IntoIterator<Item = (f64, f64)>) -> Bounds {
    let mut points = points.into_iter();

    let Some((x, y)) = points.next() else {
        return Bounds::default();
    };

    points.fold(
        Bounds {
            xmin: x,
            xmax: x,
            ymin: y,
            ymax: y,
        },
        |b, (x, y)| Bounds {
            xmin: b.xmin.min(x),
            xmax: b.xmax.max(x),
            ymin: b.ymin.min(y),
            ymax: b.ymax.max(y),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cloud_has_zero_bounds() {
        assert_eq!(PointCloud::new().bounds(), Bounds::default());
        assert_eq!(
            PointCloud::new().bounds(),
            Bounds { xmin: 0.0, xmax: 0.0, ymin: 0.0, ymax: 0.0 }
        );
    }

    #[test]
    fn computes_bounds() {
        let mut cloud = PointCloud::new();
        cloud.push(1.0, 5.0);
        cloud.push(-2.0, 3.0);
        cloud.push(4.0, -1.0);

        let b = cloud.bounds();
        assert_eq!(b, Bounds { xmin: -2.0, xmax: 4.0, ymin: -1.0, ymax: 5.0 });
        assert_eq!(b.width(), 6.0);
        assert_eq!(b.height(), 6.0);
        assert_eq!(b.center(), (1.0, 2.0));

        assert_eq!(
            cloud.bounds_since(1),
            Bounds { xmin: -2.0, xmax: 4.0, ymin: -1.0, ymax: 3.0 }
        );
        assert_eq!(cloud.bounds_since(3), Bounds::default());
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Bounds { xmin: 0.0, xmax: 10.0, ymin: 0.0, ymax: 5.0 };

        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(10.0, 5.0));
        assert!(b.contains(3.0, 4.0));
        assert!(!b.contains(10.1, 4.0));
        assert!(!b.contains(3.0, -0.1));
    }
}
