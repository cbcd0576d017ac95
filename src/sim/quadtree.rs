// Region-splitting quadtree for radius-bounded neighbour queries.
//
// Rebuilt from scratch at the start of every tick over borrowed boid
// references and dropped before integration; it never outlives the agent
// list it indexes.

use glam::Vec2;

/// Items a leaf holds before it subdivides.
const NODE_CAPACITY: usize = 4;

/// Nodes at this depth never split, so more than `NODE_CAPACITY` coincident
/// points grow the leaf instead of recursing forever.
const MAX_DEPTH: u8 = 16;

/// Axis-aligned rectangle. Containment is half-open: `min` inclusive,
/// `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// Bound/circle overlap test: true when the centre lies inside the
    /// rectangle, otherwise when the centre's closest point on the rectangle
    /// is nearer than `radius`.
    pub fn intersects_circle(&self, centre: Vec2, radius: f32) -> bool {
        if self.contains(centre) {
            return true;
        }
        let closest = centre.clamp(self.min, self.max);
        (centre - closest).length_squared() < radius * radius
    }
}

/// Anything storable in the quadtree: needs a 2D position.
pub trait Positioned {
    fn position(&self) -> Vec2;
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn position(&self) -> Vec2 {
        (**self).position()
    }
}

/// Quadtree node: a leaf holding up to `NODE_CAPACITY` items, or an internal
/// node owning exactly four children that partition its bound into equal
/// quadrants. Once split, a node never reverts to a leaf.
pub struct Quadtree<T> {
    bounds: Rect,
    depth: u8,
    // Child order everywhere: top-left, top-right, bottom-left, bottom-right.
    // "Top" is min-y; the world uses y-down screen coordinates.
    children: Option<Box<[Quadtree<T>; 4]>>,
    items: Vec<T>,
}

impl<T: Positioned + Copy> Quadtree<T> {
    pub fn new(bounds: Rect) -> Self {
        Self::with_depth(bounds, 0)
    }

    fn with_depth(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            items: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Insert an item. A leaf past capacity splits and redistributes its
    /// items into the new quadrants, ties at the midpoints routing to the
    /// left/top child via strictly-less comparisons.
    pub fn insert(&mut self, item: T) {
        if self.is_leaf() {
            if self.items.len() < NODE_CAPACITY || self.depth >= MAX_DEPTH {
                self.items.push(item);
                return;
            }
            self.split();
            for existing in std::mem::take(&mut self.items) {
                self.insert_into_child(existing);
            }
        }
        self.insert_into_child(item);
    }

    fn split(&mut self) {
        let Rect { min, max } = self.bounds;
        let mid = self.bounds.center();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            Quadtree::with_depth(Rect::new(min, mid), depth),
            Quadtree::with_depth(
                Rect::new(Vec2::new(mid.x, min.y), Vec2::new(max.x, mid.y)),
                depth,
            ),
            Quadtree::with_depth(
                Rect::new(Vec2::new(min.x, mid.y), Vec2::new(mid.x, max.y)),
                depth,
            ),
            Quadtree::with_depth(Rect::new(mid, max), depth),
        ]));
    }

    fn insert_into_child(&mut self, item: T) {
        let mid = self.bounds.center();
        let pos = item.position();
        let index = match (pos.y < mid.y, pos.x < mid.x) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        if let Some(children) = self.children.as_deref_mut() {
            children[index].insert(item);
        }
    }

    /// All stored items whose position lies strictly inside the circle.
    /// Subtrees whose bound misses the circle are pruned; results come back
    /// in a deterministic top-left, top-right, bottom-left, bottom-right
    /// traversal order.
    pub fn points_within_circle(&self, centre: Vec2, radius: f32) -> Vec<T> {
        let mut found = Vec::new();
        self.collect_within_circle(centre, radius, &mut found);
        found
    }

    fn collect_within_circle(&self, centre: Vec2, radius: f32, out: &mut Vec<T>) {
        if !self.bounds.intersects_circle(centre, radius) {
            return;
        }
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.collect_within_circle(centre, radius, out);
                }
            }
            None => {
                let radius_sq = radius * radius;
                for item in &self.items {
                    if (item.position() - centre).length_squared() < radius_sq {
                        out.push(*item);
                    }
                }
            }
        }
    }

    /// Bounds of every leaf, for the diagnostic overlay. The simulation
    /// itself never reads these.
    pub fn leaf_bounds(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.collect_leaf_bounds(None, &mut out);
        out
    }

    /// Bounds of the leaves overlapping the given circle, for highlighting a
    /// single boid's neighbourhood in the overlay.
    pub fn leaf_bounds_intersecting_circle(&self, centre: Vec2, radius: f32) -> Vec<Rect> {
        let mut out = Vec::new();
        self.collect_leaf_bounds(Some((centre, radius)), &mut out);
        out
    }

    fn collect_leaf_bounds(&self, filter: Option<(Vec2, f32)>, out: &mut Vec<Rect>) {
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.collect_leaf_bounds(filter, out);
                }
            }
            None => {
                let keep = filter.map_or(true, |(centre, radius)| {
                    self.bounds.intersects_circle(centre, radius)
                });
                if keep {
                    out.push(self.bounds);
                }
            }
        }
    }
}
