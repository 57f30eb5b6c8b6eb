//! Hit-scan world query (raycast для выстрелов)
//!
//! Архитектура:
//! - Core знает только trait `WorldQuery` (origin, direction, max distance, filter)
//! - Host с настоящей физикой ставит свою реализацию в resource `HitScanWorld`
//! - Headless (тесты, runner): `SphereWorld`, собирается каждый тик из `HitSphere`
//!   компонентов — замена физическим коллайдерам без physics engine

use bevy::prelude::*;

/// Collision layer по умолчанию (все слои)
pub const ALL_LAYERS: u32 = u32::MAX;

/// Фильтр raycast'а (аналог layer mask)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    /// С какими слоями пересекаемся
    pub layers: u32,
    /// Игнорируемая entity (обычно сам стрелок)
    pub exclude: Option<Entity>,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layers: ALL_LAYERS,
            exclude: None,
        }
    }
}

impl CollisionFilter {
    pub fn with_layers(layers: u32) -> Self {
        Self {
            layers,
            exclude: None,
        }
    }

    pub fn excluding(self, entity: Entity) -> Self {
        Self {
            exclude: Some(entity),
            ..self
        }
    }

    pub fn accepts(&self, entity: Option<Entity>, layers: u32) -> bool {
        if self.layers & layers == 0 {
            return false;
        }
        match (self.exclude, entity) {
            (Some(excluded), Some(entity)) => excluded != entity,
            _ => true,
        }
    }
}

/// Результат raycast'а: ближайшее препятствие
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Entity препятствия (None для статической геометрии)
    pub entity: Option<Entity>,
    /// Можно ли нанести урон (есть Health)
    pub damageable: bool,
}

/// Hit-test port (реализуется host'ом)
pub trait WorldQuery: Send + Sync {
    /// Ближайшее препятствие вдоль луча, или None
    ///
    /// `direction` не обязан быть нормализован.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &CollisionFilter,
    ) -> Option<RayHit>;
}

/// Resource: host-provided hit-test (перекрывает headless SphereWorld)
#[derive(Resource)]
pub struct HitScanWorld(pub Box<dyn WorldQuery>);

/// Сферический коллайдер для headless hit-test
#[derive(Component, Debug, Clone, Copy)]
pub struct HitSphere {
    pub radius: f32,
    pub layers: u32,
}

impl Default for HitSphere {
    fn default() -> Self {
        Self {
            radius: 0.5,
            layers: ALL_LAYERS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SphereCollider {
    pub entity: Option<Entity>,
    pub center: Vec3,
    pub radius: f32,
    pub layers: u32,
    pub damageable: bool,
}

/// Headless world: набор сфер, ray-sphere intersection
#[derive(Debug, Clone, Default)]
pub struct SphereWorld {
    pub colliders: Vec<SphereCollider>,
}

impl SphereWorld {
    pub fn push(&mut self, collider: SphereCollider) {
        self.colliders.push(collider);
    }
}

impl WorldQuery for SphereWorld {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &CollisionFilter,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;

        self.colliders
            .iter()
            .filter(|collider| filter.accepts(collider.entity, collider.layers))
            .filter_map(|collider| {
                let distance = ray_sphere_distance(origin, dir, collider.center, collider.radius)?;
                (distance <= max_distance).then(|| {
                    let point = origin + dir * distance;
                    RayHit {
                        point,
                        normal: (point - collider.center).normalize_or_zero(),
                        distance,
                        entity: collider.entity,
                        damageable: collider.damageable,
                    }
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Расстояние вдоль нормализованного луча до первой точки входа в сферу
///
/// Origin внутри сферы → 0 (попадание сразу у дула).
fn ray_sphere_distance(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = to_origin.dot(dir);
    if b > 0.0 {
        // Сфера позади луча
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    Some(-b - discriminant.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(index: u32, center: Vec3, damageable: bool) -> SphereCollider {
        SphereCollider {
            entity: Some(Entity::from_raw(index)),
            center,
            radius: 1.0,
            layers: ALL_LAYERS,
            damageable,
        }
    }

    #[test]
    fn test_ray_hits_nearest_sphere() {
        let mut world = SphereWorld::default();
        world.push(sphere(1, Vec3::new(0.0, 0.0, -10.0), true));
        world.push(sphere(2, Vec3::new(0.0, 0.0, -5.0), false));

        let hit = world
            .cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, &CollisionFilter::default())
            .expect("ray should hit");

        assert_eq!(hit.entity, Some(Entity::from_raw(2)));
        assert!(!hit.damageable);
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_respects_range_and_filter() {
        let mut world = SphereWorld::default();
        world.push(sphere(1, Vec3::new(0.0, 0.0, -10.0), true));

        // Вне дальности
        assert!(world
            .cast_ray(Vec3::ZERO, Vec3::NEG_Z, 5.0, &CollisionFilter::default())
            .is_none());

        // Исключённая entity
        let filter = CollisionFilter::default().excluding(Entity::from_raw(1));
        assert!(world.cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, &filter).is_none());

        // Несовпадающий слой
        let filter = CollisionFilter::with_layers(0);
        assert!(world.cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, &filter).is_none());
    }

    #[test]
    fn test_sphere_behind_ray_is_ignored() {
        let mut world = SphereWorld::default();
        world.push(sphere(1, Vec3::new(0.0, 0.0, 10.0), true));

        assert!(world
            .cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, &CollisionFilter::default())
            .is_none());
    }
}
