use hanare_ipc::RectInfo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Side of a rectangle, also used as a direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Screen rectangle in physical pixels.
///
/// Edges are inclusive: a point on `right()` or `bottom()` is inside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Area shared with `other`, 0 when they don't overlap.
    pub fn intersection_area(&self, other: &Rect) -> u64 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0) as u64;
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0) as u64;
        w * h
    }

    /// Shrink by `inset` on every side, never below a 1x1 rectangle.
    pub fn inset(&self, inset: u32) -> Rect {
        let width = self.width.saturating_sub(inset.saturating_mul(2)).max(1);
        let height = self.height.saturating_sub(inset.saturating_mul(2)).max(1);
        let dx = ((self.width - width) / 2) as i32;
        let dy = ((self.height - height) / 2) as i32;
        Rect::new(self.x + dx, self.y + dy, width, height)
    }

    /// Move (and shrink if needed) so the rectangle lies within `bounds`.
    pub fn clamp_into(&self, bounds: &Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let max_x = bounds.right() - width as i32;
        let max_y = bounds.bottom() - height as i32;
        Rect {
            x: self.x.clamp(bounds.x, max_x),
            y: self.y.clamp(bounds.y, max_y),
            width,
            height,
        }
    }

    /// Length of the overlap between the spans of the two rectangles on the
    /// axis perpendicular to `side`.
    pub fn perpendicular_overlap(&self, other: &Rect, side: Side) -> i32 {
        if side.is_horizontal() {
            (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0)
        } else {
            (self.right().min(other.right()) - self.x.max(other.x)).max(0)
        }
    }

    /// How far this rectangle sticks out of `bounds` on each side.
    pub fn overflow(&self, bounds: &Rect) -> Overflow {
        Overflow {
            left: bounds.x.saturating_sub(self.x).max(0),
            right: self.right().saturating_sub(bounds.right()).max(0),
            top: bounds.y.saturating_sub(self.y).max(0),
            bottom: self.bottom().saturating_sub(bounds.bottom()).max(0),
        }
    }
}

impl From<Rect> for RectInfo {
    fn from(rect: Rect) -> Self {
        RectInfo {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overflow {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Overflow {
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }

    /// Keep only the sides the window is travelling toward.
    pub fn toward(&self, push: (f64, f64)) -> Overflow {
        Overflow {
            left: if push.0 < 0.0 { self.left } else { 0 },
            right: if push.0 > 0.0 { self.right } else { 0 },
            top: if push.1 < 0.0 { self.top } else { 0 },
            bottom: if push.1 > 0.0 { self.bottom } else { 0 },
        }
    }

    /// Side with the largest overflow, preferring the axis of `push`
    /// when both axes overflow by the same amount.
    pub fn dominant_side(&self, push: (f64, f64)) -> Option<(Side, i32)> {
        let horizontal = if self.right >= self.left {
            (Side::Right, self.right)
        } else {
            (Side::Left, self.left)
        };
        let vertical = if self.bottom >= self.top {
            (Side::Bottom, self.bottom)
        } else {
            (Side::Top, self.top)
        };

        let pick = match horizontal.1.cmp(&vertical.1) {
            std::cmp::Ordering::Greater => horizontal,
            std::cmp::Ordering::Less => vertical,
            std::cmp::Ordering::Equal => {
                if push.0.abs() >= push.1.abs() {
                    horizontal
                } else {
                    vertical
                }
            }
        };

        (pick.1 > 0).then_some(pick)
    }
}
