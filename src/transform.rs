use kurbo::{Point, Vec2};

use crate::model::OverlayAnchor;

/// Smallest overlay width a resize gesture can reach, in percent.
pub const MIN_WIDTH_PCT: f64 = 10.0;
/// Largest overlay width, in percent.
pub const MAX_WIDTH_PCT: f64 = 80.0;

/// Resize displacement is damped so the overlay grows at half the pointer
/// speed, matching the editing surface feel.
const RESIZE_DAMPING: f64 = 0.5;

/// Position, size and rotation of the photo overlay, in percent of the
/// card's square photo area. `x`/`y` anchor the overlay square's top-left
/// corner. Invariants after every operation:
/// `0 <= x <= 100 - width`, `0 <= y <= 100 - width`,
/// `0 <= width <= 80`, `0 <= rotation < 360`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayTransform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub rotation: f64,
}

impl OverlayTransform {
    /// Build the initial per-word transform from the library anchor,
    /// clamping into the invariant region.
    pub fn from_anchor(anchor: &OverlayAnchor) -> Self {
        let width = anchor.width.clamp(0.0, MAX_WIDTH_PCT);
        Self {
            x: anchor.x.clamp(0.0, 100.0 - width),
            y: anchor.y.clamp(0.0, 100.0 - width),
            width,
            rotation: normalize_deg(anchor.rotation),
        }
    }

    /// Center of the overlay square.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.width / 2.0)
    }

    /// Re-anchor the overlay so its center tracks the pointer, clamped so
    /// the square stays inside the card.
    fn moved_to(mut self, pointer: Point) -> Self {
        self.x = (pointer.x - self.width / 2.0).clamp(0.0, 100.0 - self.width);
        self.y = (pointer.y - self.width / 2.0).clamp(0.0, 100.0 - self.width);
        self
    }

    fn resized(self, corner: Corner, press: Point, pointer: Point) -> Self {
        let delta = pointer - press;
        let magnitude = delta.hypot();
        let direction = corner.growth_direction(delta);

        let mut width = (self.width + magnitude * direction * RESIZE_DAMPING)
            .clamp(MIN_WIDTH_PCT, MAX_WIDTH_PCT);
        // The square must not spill past the card from its current corner.
        width = width.min((100.0 - self.x).min(100.0 - self.y));

        Self { width, ..self }
    }

    fn rotated(self, press_angle_deg: f64, pointer: Point) -> Self {
        let current = pointer_angle_deg(self.center(), pointer);
        let mut diff = current - press_angle_deg;
        // Correct the atan2 wraparound so crossing the ±180° boundary stays
        // continuous instead of jumping a full turn.
        if diff > 180.0 {
            diff -= 360.0;
        }
        if diff < -180.0 {
            diff += 360.0;
        }
        Self {
            rotation: normalize_deg(self.rotation + diff),
            ..self
        }
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r == 360.0 { 0.0 } else { r }
}

fn pointer_angle_deg(center: Point, pointer: Point) -> f64 {
    let v: Vec2 = pointer - center;
    v.y.atan2(v.x).to_degrees()
}

/// Corner handle a resize gesture was started from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Whether a pointer displacement grows (+1) or shrinks (-1) the
    /// overlay: dragging a corner away from the square's center grows it.
    fn growth_direction(self, delta: Vec2) -> f64 {
        let shrinks = match self {
            Corner::BottomRight => delta.x < 0.0 || delta.y < 0.0,
            Corner::BottomLeft => delta.x > 0.0 || delta.y < 0.0,
            Corner::TopRight => delta.x < 0.0 || delta.y > 0.0,
            Corner::TopLeft => delta.x > 0.0 || delta.y > 0.0,
        };
        if shrinks { -1.0 } else { 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging,
    Resizing {
        corner: Corner,
        press: Point,
        initial: OverlayTransform,
    },
    Rotating {
        press_angle_deg: f64,
        initial: OverlayTransform,
    },
}

/// Pointer event in card-percent space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    PressMove,
    PressResize { corner: Corner, at: Point },
    PressRotate { at: Point },
    Motion { at: Point },
    Release,
}

/// Result of feeding one event into the session: the transform to show,
/// and whether it was committed (only a `Release` commits).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureUpdate {
    pub transform: OverlayTransform,
    pub committed: bool,
}

/// Per-word editing session. Holds the last committed transform and the
/// active gesture; `Motion` events produce preview transforms computed from
/// the state captured at press time, so out-of-order pointer deltas can
/// never accumulate drift.
#[derive(Clone, Copy, Debug)]
pub struct GestureSession {
    committed: OverlayTransform,
    preview: OverlayTransform,
    state: GestureState,
}

impl GestureSession {
    pub fn new(initial: OverlayTransform) -> Self {
        Self {
            committed: initial,
            preview: initial,
            state: GestureState::Idle,
        }
    }

    pub fn committed(&self) -> OverlayTransform {
        self.committed
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn apply(&mut self, event: GestureEvent) -> GestureUpdate {
        match event {
            GestureEvent::PressMove => {
                self.state = GestureState::Dragging;
                self.preview = self.committed;
                self.update(false)
            }
            GestureEvent::PressResize { corner, at } => {
                self.state = GestureState::Resizing {
                    corner,
                    press: at,
                    initial: self.committed,
                };
                self.preview = self.committed;
                self.update(false)
            }
            GestureEvent::PressRotate { at } => {
                self.state = GestureState::Rotating {
                    press_angle_deg: pointer_angle_deg(self.committed.center(), at),
                    initial: self.committed,
                };
                self.preview = self.committed;
                self.update(false)
            }
            GestureEvent::Motion { at } => {
                self.preview = match self.state {
                    GestureState::Idle => self.committed,
                    GestureState::Dragging => self.committed.moved_to(at),
                    GestureState::Resizing {
                        corner,
                        press,
                        initial,
                    } => initial.resized(corner, press, at),
                    GestureState::Rotating {
                        press_angle_deg,
                        initial,
                    } => initial.rotated(press_angle_deg, at),
                };
                self.update(false)
            }
            GestureEvent::Release => {
                self.committed = self.preview;
                self.state = GestureState::Idle;
                self.update(true)
            }
        }
    }

    fn update(&self, committed: bool) -> GestureUpdate {
        GestureUpdate {
            transform: self.preview,
            committed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> OverlayTransform {
        OverlayTransform {
            x: 40.0,
            y: 40.0,
            width: 20.0,
            rotation: 0.0,
        }
    }

    fn assert_invariants(t: OverlayTransform) {
        assert!(t.x >= 0.0 && t.x + t.width <= 100.0 + 1e-9, "{t:?}");
        assert!(t.y >= 0.0 && t.y + t.width <= 100.0 + 1e-9, "{t:?}");
        assert!(t.width <= MAX_WIDTH_PCT, "{t:?}");
        assert!((0.0..360.0).contains(&t.rotation), "{t:?}");
    }

    #[test]
    fn from_anchor_clamps_into_bounds() {
        let t = OverlayTransform::from_anchor(&crate::model::OverlayAnchor {
            x: 95.0,
            y: 95.0,
            width: 90.0,
            rotation: -30.0,
        });
        assert_eq!(t.width, MAX_WIDTH_PCT);
        assert_eq!(t.x, 20.0);
        assert_eq!(t.y, 20.0);
        assert_eq!(t.rotation, 330.0);
        assert_invariants(t);
    }

    #[test]
    fn drag_centers_overlay_on_pointer_and_clamps() {
        let mut s = GestureSession::new(base());
        s.apply(GestureEvent::PressMove);
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(50.0, 50.0),
        });
        assert_eq!(up.transform.x, 40.0);
        assert_eq!(up.transform.y, 40.0);
        assert!(!up.committed);

        // Pointer past the edge: top-left clamps to 100 - width.
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(200.0, -50.0),
        });
        assert_eq!(up.transform.x, 80.0);
        assert_eq!(up.transform.y, 0.0);
        assert_invariants(up.transform);
    }

    #[test]
    fn motion_previews_do_not_commit() {
        let mut s = GestureSession::new(base());
        s.apply(GestureEvent::PressMove);
        s.apply(GestureEvent::Motion {
            at: Point::new(10.0, 10.0),
        });
        assert_eq!(s.committed(), base());

        let up = s.apply(GestureEvent::Release);
        assert!(up.committed);
        assert_eq!(s.committed(), up.transform);
        assert_eq!(s.state(), GestureState::Idle);
    }

    #[test]
    fn resize_from_bottom_right_grows_and_shrinks() {
        let mut s = GestureSession::new(base());
        s.apply(GestureEvent::PressResize {
            corner: Corner::BottomRight,
            at: Point::new(60.0, 60.0),
        });

        // Away from center: grows by hypot * 0.5.
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(66.0, 68.0),
        });
        assert!((up.transform.width - 25.0).abs() < 1e-9);

        // Toward center: shrinks from the width captured at press.
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(54.0, 52.0),
        });
        assert!((up.transform.width - 15.0).abs() < 1e-9);
        assert_invariants(up.transform);
    }

    #[test]
    fn resize_respects_width_floor_and_ceiling() {
        let mut s = GestureSession::new(base());
        s.apply(GestureEvent::PressResize {
            corner: Corner::BottomRight,
            at: Point::new(60.0, 60.0),
        });
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(-500.0, 60.0),
        });
        assert_eq!(up.transform.width, MIN_WIDTH_PCT);

        let up = s.apply(GestureEvent::Motion {
            at: Point::new(500.0, 60.0),
        });
        // Capped first at 80, then by distance to the card edge (100 - 40).
        assert_eq!(up.transform.width, 60.0);
        assert_invariants(up.transform);
    }

    #[test]
    fn rotation_is_continuous_across_the_wraparound() {
        // One big drag: press right of center, sweep to just below the
        // negative x axis.
        let mut big = GestureSession::new(base());
        big.apply(GestureEvent::PressRotate {
            at: Point::new(60.0, 50.0),
        });
        big.apply(GestureEvent::Motion {
            at: Point::new(40.0, 50.1),
        });
        let end_big = big.apply(GestureEvent::Release).transform.rotation;

        // The same sweep as many small increments, each its own gesture.
        let mut small = GestureSession::new(base());
        let steps = 64;
        let total_rad = (Point::new(40.0, 50.1) - Point::new(50.0, 50.0)).atan2();
        let on_circle = |rad: f64| Point::new(50.0 + 10.0 * rad.cos(), 50.0 + 10.0 * rad.sin());
        let mut prev = Point::new(60.0, 50.0);
        for i in 0..steps {
            let next = on_circle(total_rad / steps as f64 * (i + 1) as f64);
            small.apply(GestureEvent::PressRotate { at: prev });
            small.apply(GestureEvent::Motion { at: next });
            small.apply(GestureEvent::Release);
            prev = next;
        }
        let end_small = small.committed().rotation;

        let wrap_diff = normalize_deg(end_big - end_small).min(normalize_deg(end_small - end_big));
        assert!(wrap_diff < 1.0, "big={end_big} small={end_small}");
    }

    #[test]
    fn rotation_normalizes_into_zero_to_360() {
        let mut s = GestureSession::new(OverlayTransform {
            rotation: 350.0,
            ..base()
        });
        s.apply(GestureEvent::PressRotate {
            at: Point::new(60.0, 50.0),
        });
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(50.0, 60.0),
        });
        // +90° from 350° wraps to 80°.
        assert!((up.transform.rotation - 80.0).abs() < 1e-9);
        assert_invariants(up.transform);
    }

    #[test]
    fn resize_then_move_stays_in_bounds() {
        let mut s = GestureSession::new(base());
        s.apply(GestureEvent::PressResize {
            corner: Corner::BottomRight,
            at: Point::new(60.0, 60.0),
        });
        s.apply(GestureEvent::Motion {
            at: Point::new(500.0, 60.0),
        });
        s.apply(GestureEvent::Release);

        s.apply(GestureEvent::PressMove);
        let up = s.apply(GestureEvent::Motion {
            at: Point::new(99.0, 99.0),
        });
        s.apply(GestureEvent::Release);
        assert_invariants(up.transform);
    }
}
