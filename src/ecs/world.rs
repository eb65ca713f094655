//! World wrapper around hecs

use hecs::Entity;

/// Registry of live actors and their components
pub struct World {
    inner: hecs::World,
}

impl World {
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an actor from its component bundle
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Shared borrow of one component of an actor
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Borrow several components of one entity at once
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Shared query over every live actor
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    /// Live entities in ascending id order
    pub fn entities_sorted(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.inner.iter().map(|entity| entity.entity()).collect();
        entities.sort_by_key(|entity| entity.id());
        entities
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_sorted_after_despawn() {
        let mut world = World::new();
        let first = world.spawn((1u32,));
        let second = world.spawn((2u32,));
        world.spawn((3u32,));
        world.despawn(second).unwrap();
        let fourth = world.spawn((4u32,));

        let entities = world.entities_sorted();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0], first);
        assert!(entities.contains(&fourth));
        assert!(!entities.contains(&second));
        assert!(entities.windows(2).all(|pair| pair[0].id() < pair[1].id()));
        assert_eq!(*world.get::<u32>(fourth).unwrap(), 4);
        assert!(world.despawn(second).is_err());
    }
}
