//! Pairwise AABB collision between one mover and an ordered list of targets.
//!
//! Entity counts are tiny, so there is no broad phase: every target is tested.
//! Each overlapping pair is corrected along a single axis, the one with the
//! smaller penetration (ties go to Y). Resolution runs in two passes:
//!
//!  1. **Vertical pass** -- the first target whose overlap is Y-dominant snaps
//!     the mover onto its top or bottom face.
//!  2. **Horizontal pass** -- overlap is re-tested at the corrected height; the
//!     first X-dominant target pushes the mover out sideways.
//!
//! Only one correction per axis is applied per call. Running the vertical pass
//! first means a mover resting across a tile seam lands on the tile it stands
//! on before the neighbouring tile is considered, so seams never register as
//! walls.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn new(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }

    /// Overlap depth along each axis, or `None` when the boxes are separated
    /// or merely touching.
    pub fn penetration(&self, other: &Aabb) -> Option<Vec2> {
        let pen_x = self.half_w + other.half_w - (self.center_x - other.center_x).abs();
        let pen_y = self.half_h + other.half_h - (self.center_y - other.center_y).abs();
        (pen_x > 0.0 && pen_y > 0.0).then_some(Vec2::new(pen_x, pen_y))
    }

    #[allow(dead_code)]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.penetration(other).is_some()
    }
}

/// Which edges of the mover touched something during the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl ContactState {
    pub fn union(self, other: ContactState) -> ContactState {
        ContactState {
            top: self.top || other.top,
            bottom: self.bottom || other.bottom,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    #[allow(dead_code)]
    pub fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }

    /// Contact on the top, left or right edge.
    pub fn any_except_bottom(&self) -> bool {
        self.top || self.left || self.right
    }
}

/// Snapshot of the entity being corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mover {
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub active: bool,
}

/// Snapshot of an entity the mover is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub aabb: Aabb,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub center: Vec2,
    pub velocity: Vec2,
    pub contacts: ContactState,
    /// Index into the target list of the vertical correction, if any.
    pub y_target: Option<usize>,
    /// Index into the target list of the horizontal correction, if any.
    pub x_target: Option<usize>,
}

impl Resolution {
    fn untouched(mover: &Mover) -> Self {
        Self {
            center: mover.aabb.center(),
            velocity: mover.velocity,
            contacts: ContactState::default(),
            y_target: None,
            x_target: None,
        }
    }
}

pub fn resolve(mover: Mover, targets: &[Target]) -> Resolution {
    let mut result = Resolution::untouched(&mover);
    if !mover.active {
        return result;
    }

    let mut aabb = mover.aabb;

    for (index, target) in targets.iter().enumerate() {
        if !target.active {
            continue;
        }
        let Some(pen) = aabb.penetration(&target.aabb) else {
            continue;
        };
        if pen.y > pen.x {
            continue;
        }

        if aabb.center_y >= target.aabb.center_y {
            aabb.center_y = target.aabb.top() + aabb.half_h;
            result.contacts.bottom = true;
            if result.velocity.y < 0.0 {
                result.velocity.y = 0.0;
            }
        } else {
            aabb.center_y = target.aabb.bottom() - aabb.half_h;
            result.contacts.top = true;
            if result.velocity.y > 0.0 {
                result.velocity.y = 0.0;
            }
        }
        result.y_target = Some(index);
        break;
    }

    for (index, target) in targets.iter().enumerate() {
        if !target.active {
            continue;
        }
        let Some(pen) = aabb.penetration(&target.aabb) else {
            continue;
        };
        if pen.y <= pen.x {
            continue;
        }

        if aabb.center_x <= target.aabb.center_x {
            aabb.center_x = target.aabb.left() - aabb.half_w;
            result.contacts.right = true;
        } else {
            aabb.center_x = target.aabb.right() + aabb.half_w;
            result.contacts.left = true;
        }
        result.x_target = Some(index);
        break;
    }

    result.center = aabb.center();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-4;

    fn tile(x: f32, y: f32) -> Target {
        Target {
            aabb: Aabb::new(Vec2::new(x, y), 1.0, 1.0),
            active: true,
        }
    }

    fn ground_row() -> Vec<Target> {
        (0..11).map(|i| tile(-5.0 + i as f32, -3.25)).collect()
    }

    fn mover_at(x: f32, y: f32, size: f32, velocity: Vec2) -> Mover {
        Mover {
            aabb: Aabb::new(Vec2::new(x, y), size, size),
            velocity,
            active: true,
        }
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::new(Vec2::new(4.0, -2.25), 1.0, 1.0);
        let b = Aabb::new(Vec2::new(4.0, -3.25), 1.0, 1.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn falling_mover_lands_on_tile_top() {
        // Player sunk slightly into the ground row after a gravity step.
        let mover = mover_at(-4.0, -2.36, 0.8, Vec2::new(0.0, -0.5));
        let result = resolve(mover, &ground_row());

        assert!((result.center.y - (-2.35)).abs() < EPS);
        assert!(result.contacts.bottom);
        assert!(!result.contacts.left && !result.contacts.right && !result.contacts.top);
        assert_eq!(result.velocity.y, 0.0);
        assert_eq!(result.y_target, Some(1));
    }

    #[test]
    fn rising_mover_bonks_ceiling() {
        let ceiling = [tile(-4.0, 0.5)];
        // Top edge at 0.05, ceiling bottom at 0.0.
        let mover = mover_at(-4.0, -0.35, 0.8, Vec2::new(0.0, 3.0));
        let result = resolve(mover, &ceiling);

        assert!(result.contacts.top);
        assert!((result.center.y - (-0.4)).abs() < EPS);
        assert_eq!(result.velocity.y, 0.0);
    }

    #[test]
    fn shallow_side_overlap_resolves_horizontally() {
        // Enemy to the right, overlapping the mover's right edge by 0.02.
        let enemy = Target {
            aabb: Aabb::new(Vec2::new(0.88, -2.25), 1.0, 1.0),
            active: true,
        };
        let mover = mover_at(0.0, -2.35, 0.8, Vec2::ZERO);
        let result = resolve(mover, &[enemy]);

        assert!(result.contacts.right);
        assert!(!result.contacts.bottom && !result.contacts.top);
        assert!((result.center.x - (0.38 - 0.4)).abs() < EPS);
        assert_eq!(result.x_target, Some(0));
        assert_eq!(result.y_target, None);
    }

    #[test]
    fn overlap_from_the_right_sets_left_contact() {
        let wall = tile(0.0, 0.0);
        let mover = mover_at(0.85, 0.0, 0.8, Vec2::ZERO);
        let result = resolve(mover, &[wall]);
        assert!(result.contacts.left);
        assert!((result.center.x - 0.9).abs() < EPS);
    }

    #[test]
    fn tile_seam_is_not_a_wall() {
        // Straddling two ground tiles, slightly sunk: only a landing.
        let mover = mover_at(-3.55, -2.352, 0.8, Vec2::new(-1.0, -0.2));
        let result = resolve(mover, &ground_row());
        assert!(result.contacts.bottom);
        assert!(!result.contacts.left && !result.contacts.right);
    }

    #[test]
    fn only_first_target_corrects_vertical_axis() {
        // Both tiles sink into the mover's bottom edge; only the first applies.
        let targets = [tile(0.0, -0.95), tile(0.0, -0.9)];
        let mover = mover_at(0.0, -0.1, 0.8, Vec2::new(0.0, -1.0));
        let result = resolve(mover, &targets);
        assert_eq!(result.y_target, Some(0));
        assert_eq!(result.x_target, None);
        assert!((result.center.y - (-0.05)).abs() < EPS);
        assert!(result.contacts.bottom);
    }

    #[test]
    fn only_first_target_corrects_horizontal_axis() {
        // Both walls overlap the mover's left edge; only the first applies.
        let targets = [tile(0.0, 0.0), tile(0.1, 0.0)];
        let mover = mover_at(0.85, 0.0, 0.8, Vec2::ZERO);
        let result = resolve(mover, &targets);
        assert_eq!(result.x_target, Some(0));
        assert_eq!(result.y_target, None);
        assert!((result.center.x - 0.9).abs() < EPS);
        assert!(result.contacts.left);
    }

    #[test]
    fn inactive_mover_is_never_corrected() {
        let mut mover = mover_at(-4.0, -2.36, 0.8, Vec2::new(0.0, -0.5));
        mover.active = false;
        let result = resolve(mover, &ground_row());
        assert_eq!(result.center, mover.aabb.center());
        assert!(!result.contacts.any());
    }

    #[test]
    fn inactive_targets_are_skipped() {
        let mut target = tile(-4.0, -3.25);
        target.active = false;
        let mover = mover_at(-4.0, -2.36, 0.8, Vec2::new(0.0, -0.5));
        let result = resolve(mover, &[target]);
        assert!(!result.contacts.any());
        assert_eq!(result.velocity.y, -0.5);
    }

    #[test]
    fn contact_union_merges_flags() {
        let a = ContactState {
            bottom: true,
            ..Default::default()
        };
        let b = ContactState {
            right: true,
            ..Default::default()
        };
        let merged = a.union(b);
        assert!(merged.bottom && merged.right);
        assert!(merged.any_except_bottom());
        assert!(!a.any_except_bottom());
    }

    proptest! {
        #[test]
        fn resolution_removes_overlap_on_corrected_axis(
            mx in -3.0f32..3.0, my in -3.0f32..3.0,
            mw in 0.2f32..2.0, mh in 0.2f32..2.0,
            tw in 0.2f32..2.0, th in 0.2f32..2.0,
            fx in -0.95f32..0.95, fy in -0.95f32..0.95,
        ) {
            // Offsets are a fraction of the summed half extents, so the pair overlaps.
            let tx = mx + fx * (mw + tw) * 0.5;
            let ty = my + fy * (mh + th) * 0.5;
            let mover = Mover {
                aabb: Aabb::new(Vec2::new(mx, my), mw, mh),
                velocity: Vec2::ZERO,
                active: true,
            };
            let target = Target { aabb: Aabb::new(Vec2::new(tx, ty), tw, th), active: true };
            prop_assume!(mover.aabb.overlaps(&target.aabb));

            let result = resolve(mover, &[target]);
            let moved = Aabb::new(result.center, mw, mh);
            prop_assert!(result.y_target.is_some() || result.x_target.is_some());

            if result.y_target.is_some() {
                let gap = (moved.center_y - target.aabb.center_y).abs()
                    - (moved.half_h + target.aabb.half_h);
                prop_assert!(gap >= -EPS);
                prop_assert_eq!(moved.center_x, mover.aabb.center_x);
            } else {
                let gap = (moved.center_x - target.aabb.center_x).abs()
                    - (moved.half_w + target.aabb.half_w);
                prop_assert!(gap >= -EPS);
                prop_assert_eq!(moved.center_y, mover.aabb.center_y);
            }
        }
    }
}
