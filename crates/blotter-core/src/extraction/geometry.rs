/// Box in a top-left-origin coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn from_origin_size(left: f32, top: f32, width: f32, height: f32) -> Self {
        BBox {
            x_min: left,
            y_min: top,
            x_max: left + width,
            y_max: top + height,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    pub fn mid_y(&self) -> f32 {
        (self.y_min + self.y_max) * 0.5
    }

    pub fn scaled(&self, scale: Scale) -> BBox {
        BBox {
            x_min: self.x_min * scale.x,
            y_min: self.y_min * scale.y,
            x_max: self.x_max * scale.x,
            y_max: self.y_max * scale.y,
        }
    }
}

/// Factors converting one coordinate space into another.
///
/// Tokens are positioned in page units while rendered images are positioned in
/// pixels of the render, so image boxes go through a `Scale` before their
/// midpoints are compared against line tops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    /// Scale mapping a `from_width` x `from_height` space onto `to_width` x `to_height`.
    ///
    /// A degenerate source dimension maps with factor 1.0 on that axis.
    pub fn between(from_width: f32, from_height: f32, to_width: f32, to_height: f32) -> Scale {
        Scale {
            x: ratio(to_width, from_width),
            y: ratio(to_height, from_height),
        }
    }
}

fn ratio(to: f32, from: f32) -> f32 {
    if from > 0.0 && from.is_finite() && to.is_finite() {
        to / from
    } else {
        1.0
    }
}
