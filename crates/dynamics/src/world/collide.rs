use tracing::trace;

use super::{stale, World};
use crate::arena::{BodyHandle, GeomHandle, JointGroupHandle, SpaceHandle};
use crate::collision::{collide_shapes, ContactGeom};
use crate::error::PhysicsError;
use crate::geometry::{Aabb, Geom};
use crate::joint::{Contact, SurfaceParams};
use crate::space::{cross_pairs, Member, Space, SpaceKind};

impl World {
    pub fn create_space(&mut self, kind: SpaceKind) -> SpaceHandle {
        SpaceHandle(self.spaces.insert(Space::new(kind)))
    }

    /// Destroys a space. Its members are left in no space.
    pub fn destroy_space(&mut self, handle: SpaceHandle) -> Result<(), PhysicsError> {
        let space = self.spaces.remove(handle.0).ok_or(stale("space"))?;
        for member in space.members {
            match member {
                Member::Geom(g) => {
                    if let Some(geom) = self.geoms.get_mut(g.0) {
                        geom.space = None;
                    }
                }
                Member::Space(s) => {
                    if let Some(child) = self.spaces.get_mut(s.0) {
                        child.parent = None;
                    }
                }
            }
        }
        if let Some(parent) = space.parent.and_then(|p| self.spaces.get_mut(p.0)) {
            parent.remove_member(Member::Space(handle));
        }
        Ok(())
    }

    pub fn space(&self, handle: SpaceHandle) -> Result<&Space, PhysicsError> {
        self.space_ref(handle)
    }

    pub fn space_add(&mut self, space: SpaceHandle, geom: GeomHandle) -> Result<(), PhysicsError> {
        self.space_ref(space)?;
        let g = self.geoms.get_mut(geom.0).ok_or(stale("geom"))?;
        if g.space.is_some() {
            return Err(PhysicsError::GeomAlreadyInSpace);
        }
        g.space = Some(space);
        if let Some(s) = self.spaces.get_mut(space.0) {
            s.members.push(Member::Geom(geom));
        }
        Ok(())
    }

    /// Removes a geom from `space`. Geoms in another space are left alone.
    pub fn space_remove(&mut self, space: SpaceHandle, geom: GeomHandle) -> Result<(), PhysicsError> {
        self.space_ref(space)?;
        let g = self.geoms.get_mut(geom.0).ok_or(stale("geom"))?;
        if g.space != Some(space) {
            return Ok(());
        }
        g.space = None;
        if let Some(s) = self.spaces.get_mut(space.0) {
            s.remove_member(Member::Geom(geom));
        }
        Ok(())
    }

    /// Nests `child` inside `parent`.
    pub fn space_add_space(
        &mut self,
        parent: SpaceHandle,
        child: SpaceHandle,
    ) -> Result<(), PhysicsError> {
        self.space_ref(parent)?;
        if self.space_ref(child)?.parent.is_some() {
            return Err(PhysicsError::GeomAlreadyInSpace);
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(PhysicsError::SpaceCycle);
            }
            ancestor = self.space_ref(a)?.parent;
        }
        if let Some(c) = self.spaces.get_mut(child.0) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.spaces.get_mut(parent.0) {
            p.members.push(Member::Space(child));
        }
        Ok(())
    }

    pub fn space_remove_space(
        &mut self,
        parent: SpaceHandle,
        child: SpaceHandle,
    ) -> Result<(), PhysicsError> {
        self.space_ref(parent)?;
        if self.space_ref(child)?.parent != Some(parent) {
            return Ok(());
        }
        if let Some(c) = self.spaces.get_mut(child.0) {
            c.parent = None;
        }
        if let Some(p) = self.spaces.get_mut(parent.0) {
            p.remove_member(Member::Space(child));
        }
        Ok(())
    }

    /// Enabled geoms below `member` with their bounds, in member order.
    fn leaves(&self, member: Member, out: &mut Vec<(GeomHandle, Aabb)>) {
        match member {
            Member::Geom(handle) => {
                if let Some(geom) = self.geoms.get(handle.0).filter(|g| g.enabled) {
                    out.push((handle, Aabb::of_shape(&geom.shape, &self.frame_of(geom))));
                }
            }
            Member::Space(handle) => {
                if let Some(space) = self.spaces.get(handle.0) {
                    for &m in &space.members {
                        self.leaves(m, out);
                    }
                }
            }
        }
    }

    fn is_resting(&self, body: Option<BodyHandle>) -> bool {
        body.and_then(|b| self.bodies.get(b.0))
            .map_or(true, |b| !b.enabled)
    }

    /// Pair filter applied before any narrow-phase work.
    fn may_collide(&self, a: &Geom, b: &Geom) -> bool {
        if a.body.is_none() && b.body.is_none() {
            return false;
        }
        if a.body.is_some() && a.body == b.body {
            return false;
        }
        if self.is_resting(a.body) && self.is_resting(b.body) {
            return false;
        }
        a.accepts(b)
    }

    fn collect_pairs(&mut self, handle: SpaceHandle, out: &mut Vec<(GeomHandle, GeomHandle)>) {
        let Some(members) = self.spaces.get(handle.0).map(|s| s.members.clone()) else {
            return;
        };
        for &member in &members {
            if let Member::Space(child) = member {
                self.collect_pairs(child, out);
            }
        }

        let mut entries = Vec::with_capacity(members.len());
        for &member in &members {
            let mut leaves = Vec::new();
            self.leaves(member, &mut leaves);
            let Some(bounds) = leaves.iter().map(|(_, b)| *b).reduce(|a, b| a.union(&b)) else {
                continue;
            };
            entries.push((leaves, bounds));
        }
        let boxes: Vec<Aabb> = entries.iter().map(|(_, b)| *b).collect();

        let mut candidates = Vec::new();
        let strategy_name = match self.spaces.get_mut(handle.0) {
            Some(space) => {
                space.strategy.find_pairs(&boxes, &mut candidates);
                space.strategy.name()
            }
            None => return,
        };
        candidates.sort_unstable();

        let before = out.len();
        let mut cross = Vec::new();
        for (i, j) in candidates {
            let (left, right) = (&entries[i].0, &entries[j].0);
            let left_boxes: Vec<Aabb> = left.iter().map(|(_, b)| *b).collect();
            let right_boxes: Vec<Aabb> = right.iter().map(|(_, b)| *b).collect();
            cross.clear();
            cross_pairs(&left_boxes, &right_boxes, &mut cross);
            cross.sort_unstable();
            for &(a, b) in &cross {
                let (ga, gb) = (left[a].0, right[b].0);
                let (Some(a), Some(b)) = (self.geoms.get(ga.0), self.geoms.get(gb.0)) else {
                    continue;
                };
                if self.may_collide(a, b) {
                    out.push((ga, gb));
                }
            }
        }
        trace!(
            space = %handle,
            strategy = strategy_name,
            members = boxes.len(),
            pairs = out.len() - before,
            "broad-phase query"
        );
    }

    /// Candidate geom pairs whose bounds overlap, over `space` and every
    /// space nested in it.
    ///
    /// Each unordered pair appears once. Pairs of static geoms, geoms on
    /// the same body, geoms whose bodies are all disabled, disabled geoms
    /// and pairs rejected by the category bits are left out.
    pub fn space_collide(
        &mut self,
        space: SpaceHandle,
    ) -> Result<Vec<(GeomHandle, GeomHandle)>, PhysicsError> {
        self.space_ref(space)?;
        let mut pairs = Vec::new();
        self.collect_pairs(space, &mut pairs);
        Ok(pairs)
    }

    /// Narrow-phase test between two geoms, deepest contacts first.
    pub fn collide(
        &self,
        first: GeomHandle,
        second: GeomHandle,
        max_contacts: usize,
    ) -> Result<Vec<ContactGeom>, PhysicsError> {
        let a = self.geom(first)?;
        let b = self.geom(second)?;
        collide_shapes(&a.shape, &self.frame_of(a), &b.shape, &self.frame_of(b), max_contacts)
    }

    /// Runs a broad and narrow phase over `space` and creates a contact joint
    /// in `group` for every contact found, all sharing `surface`.
    ///
    /// Returns the number of contact joints created. If any candidate pair
    /// has no collider, nothing is created.
    pub fn auto_contacts(
        &mut self,
        space: SpaceHandle,
        group: JointGroupHandle,
        max_per_pair: usize,
        surface: SurfaceParams,
    ) -> Result<usize, PhysicsError> {
        self.group_ref(group)?;
        let pairs = self.space_collide(space)?;
        let mut found = Vec::new();
        for (a, b) in pairs {
            let contacts = self.collide(a, b, max_per_pair)?;
            if contacts.is_empty() {
                continue;
            }
            let bodies = (self.geom(a)?.body, self.geom(b)?.body);
            found.push((bodies, contacts));
        }

        let mut created = 0;
        for ((body1, body2), contacts) in found {
            for geom in contacts {
                let joint = self.create_contact(Some(group), &Contact::new(geom, surface))?;
                self.attach(joint, body1, body2)?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Whether any joint links the two bodies.
    pub fn are_connected(&self, a: BodyHandle, b: BodyHandle) -> Result<bool, PhysicsError> {
        self.body(a)?;
        self.body(b)?;
        Ok(self
            .joints
            .iter()
            .any(|(_, j)| j.connects(a) && j.connects(b)))
    }
}
