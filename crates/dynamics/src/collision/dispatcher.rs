//! Collision detection dispatcher that routes to the appropriate algorithm

use std::collections::HashMap;
use std::sync::OnceLock;

use super::box_box::box_box;
use super::capsule::capsule_capsule;
use super::gjk::convex_convex;
use super::plane::{box_plane, capsule_plane, convex_plane, cylinder_plane};
use super::ray::{ray_box, ray_capsule, ray_plane, ray_sphere};
use super::sphere::{sphere_box, sphere_capsule, sphere_plane, sphere_sphere};
use super::ContactGeom;
use crate::error::PhysicsError;
use crate::geometry::{Frame, Shape, ShapeKind};

/// Signature shared by every pairwise test. Implementations append their
/// contacts, normals pointing from the first shape to the second.
pub type CollisionDetector = fn(&Shape, &Frame, &Shape, &Frame, &mut Vec<ContactGeom>);

#[derive(Clone, Copy)]
struct Entry {
    detector: CollisionDetector,
    /// Registered for the opposite order; arguments are swapped on the way
    /// in and normals flipped on the way out.
    swapped: bool,
}

/// Table of narrow-phase tests indexed by shape kind pairs.
pub struct CollisionDispatcher {
    detectors: HashMap<(ShapeKind, ShapeKind), Entry>,
}

impl Default for CollisionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionDispatcher {
    /// Create a dispatcher with every built-in test registered
    #[must_use]
    pub fn new() -> Self {
        let mut dispatcher = Self {
            detectors: HashMap::new(),
        };
        dispatcher.register_detectors();
        dispatcher
    }

    /// Process-wide dispatcher used by worlds.
    pub fn shared() -> &'static CollisionDispatcher {
        static SHARED: OnceLock<CollisionDispatcher> = OnceLock::new();
        SHARED.get_or_init(CollisionDispatcher::new)
    }

    fn register_detectors(&mut self) {
        use ShapeKind::{Box, Capsule, Convex, Cylinder, Plane, Ray, Sphere};

        // closed forms
        self.register(Sphere, Sphere, sphere_sphere);
        self.register(Sphere, Box, sphere_box);
        self.register(Sphere, Plane, sphere_plane);
        self.register(Sphere, Capsule, sphere_capsule);
        self.register(Box, Box, box_box);
        self.register(Box, Plane, box_plane);
        self.register(Capsule, Capsule, capsule_capsule);
        self.register(Capsule, Plane, capsule_plane);
        self.register(Cylinder, Plane, cylinder_plane);
        self.register(Convex, Plane, convex_plane);

        self.register(Ray, Sphere, ray_sphere);
        self.register(Ray, Box, ray_box);
        self.register(Ray, Plane, ray_plane);
        self.register(Ray, Capsule, ray_capsule);

        // everything else that has a support mapping goes through GJK/EPA
        for (a, b) in [
            (Convex, Convex),
            (Box, Convex),
            (Sphere, Convex),
            (Capsule, Box),
            (Cylinder, Sphere),
            (Cylinder, Box),
            (Cylinder, Cylinder),
            (Capsule, Cylinder),
            (Capsule, Convex),
            (Cylinder, Convex),
        ] {
            self.register(a, b, convex_convex);
        }
    }

    /// Register a detector for a pair; the reverse order is derived.
    pub fn register(&mut self, first: ShapeKind, second: ShapeKind, detector: CollisionDetector) {
        self.detectors.insert(
            (first, second),
            Entry {
                detector,
                swapped: false,
            },
        );
        if first != second {
            self.detectors.insert(
                (second, first),
                Entry {
                    detector,
                    swapped: true,
                },
            );
        }
    }

    #[must_use]
    pub fn supports(&self, first: ShapeKind, second: ShapeKind) -> bool {
        self.detectors.contains_key(&(first, second))
    }

    /// Collide two placed shapes, keeping at most `max_contacts` points,
    /// deepest first.
    pub fn collide(
        &self,
        a: &Shape,
        frame_a: &Frame,
        b: &Shape,
        frame_b: &Frame,
        max_contacts: usize,
    ) -> Result<Vec<ContactGeom>, PhysicsError> {
        let key = (a.kind(), b.kind());
        let entry = self.detectors.get(&key).ok_or(PhysicsError::NoCollider {
            first: key.0,
            second: key.1,
        })?;

        let mut contacts = Vec::new();
        if entry.swapped {
            (entry.detector)(b, frame_b, a, frame_a, &mut contacts);
            for contact in &mut contacts {
                *contact = contact.flipped();
            }
        } else {
            (entry.detector)(a, frame_a, b, frame_b, &mut contacts);
        }

        if contacts.len() > max_contacts {
            contacts.sort_by(|x, y| y.depth.total_cmp(&x.depth));
            contacts.truncate(max_contacts);
        }
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ConvexHull;
    use glam::Vec3;

    #[test]
    fn reversed_order_flips_the_normal() {
        let dispatcher = CollisionDispatcher::new();
        let sphere = Shape::sphere(0.5);
        let cube = Shape::cuboid(Vec3::ONE);
        let at = Frame::from_position(Vec3::new(0.0, 1.3, 0.0));
        let forward = dispatcher.collide(&sphere, &at, &cube, &Frame::default(), 4).unwrap();
        let backward = dispatcher.collide(&cube, &Frame::default(), &sphere, &at, 4).unwrap();
        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        assert!((forward[0].normal + backward[0].normal).length() < 1e-6);
        assert!((backward[0].normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn missing_pairs_are_errors() {
        let dispatcher = CollisionDispatcher::new();
        let plane = Shape::plane(Vec3::Y, 0.0);
        let err = dispatcher
            .collide(&plane, &Frame::default(), &plane, &Frame::default(), 1)
            .unwrap_err();
        assert_eq!(
            err,
            PhysicsError::NoCollider {
                first: ShapeKind::Plane,
                second: ShapeKind::Plane
            }
        );
        assert!(!dispatcher.supports(ShapeKind::Ray, ShapeKind::Convex));
        assert!(!dispatcher.supports(ShapeKind::Cylinder, ShapeKind::Ray));
    }

    #[test]
    fn every_solid_pair_is_covered() {
        use ShapeKind::{Box, Capsule, Convex, Cylinder, Plane, Sphere};
        let dispatcher = CollisionDispatcher::new();
        let solids = [Sphere, Box, Capsule, Cylinder, Convex];
        for a in solids {
            for b in solids {
                assert!(dispatcher.supports(a, b), "{a:?} vs {b:?} has no collider");
            }
            assert!(dispatcher.supports(a, Plane) && dispatcher.supports(Plane, a));
        }
    }

    #[test]
    fn contact_count_is_capped_deepest_first() {
        let dispatcher = CollisionDispatcher::new();
        let hull = Shape::Convex(ConvexHull::cuboid(Vec3::splat(0.5)));
        let tilted = Frame::new(Vec3::new(0.0, 0.3, 0.0), glam::Quat::from_rotation_z(0.2));
        let all = dispatcher
            .collide(&hull, &tilted, &Shape::plane(Vec3::Y, 0.0), &Frame::default(), 8)
            .unwrap();
        let capped = dispatcher
            .collide(&hull, &tilted, &Shape::plane(Vec3::Y, 0.0), &Frame::default(), 1)
            .unwrap();
        assert!(all.len() > 1);
        assert_eq!(capped.len(), 1);
        let deepest = all.iter().map(|c| c.depth).fold(0.0, f32::max);
        assert!((capped[0].depth - deepest).abs() < 1e-6);
    }
}
