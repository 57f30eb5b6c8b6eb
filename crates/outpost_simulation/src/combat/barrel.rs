//! Barrel + shot resolution engine (hit-scan)
//!
//! Порядок разрешения выстрела (на каждый баррель):
//! 1. Rate limit: cooldown барреля не истёк ИЛИ оружие busy → тихий отказ
//!    (прошли gate → cooldown барреля уже потрачен)
//! 2. Legality: Continuous требует can_fire, ShotByShot — can_fire или force_fire
//! 3. Busy, −1 патрон, dispersion (h вокруг up, v вокруг right), raycast
//! 4. Hit: damageable → damaging, иначе non-damaging; промах → точка на max range
//! 5. Busy снимается

use bevy::prelude::*;
use rand::Rng;

use super::hitscan::{CollisionFilter, RayHit, WorldQuery};
use super::weapon::{FireRejected, Weapon};

/// Один ствол оружия
#[derive(Debug, Clone)]
pub struct Barrel {
    /// Выстрелов в секунду
    pub cadence: f32,
    /// Конус разброса (градусы): x = horizontal, y = vertical
    pub dispersion: Vec2,
    /// Дальность raycast'а (метры)
    pub range: f32,
    pub damage: u32,
    /// Позиция дула в локальных координатах агента
    pub muzzle_offset: Vec3,
    pub filter: CollisionFilter,

    /// Раньше этого времени баррель не стреляет
    pub(crate) next_shot_time: f64,
    /// Continuous: trigger зажат → стреляем каждый тик
    pub(crate) continuous_firing: bool,
    /// ShotByShot: ожидающий запрос выстрела
    pub(crate) trigger_pulled: bool,
    pub(crate) muzzle_flash_lit: bool,
}

impl Default for Barrel {
    fn default() -> Self {
        Self {
            cadence: 10.0,
            dispersion: Vec2::new(5.0, 5.0),
            range: 100.0,
            damage: 5,
            muzzle_offset: Vec3::new(0.0, 1.4, -0.5),
            filter: CollisionFilter::default(),
            next_shot_time: 0.0,
            continuous_firing: false,
            trigger_pulled: false,
            muzzle_flash_lit: false,
        }
    }
}

impl Barrel {
    /// Минимальный интервал между выстрелами (секунды)
    pub fn cooldown(&self) -> f64 {
        1.0 / self.cadence as f64
    }

    pub fn next_shot_time(&self) -> f64 {
        self.next_shot_time
    }

    pub fn is_ready(&self, now: f64) -> bool {
        now >= self.next_shot_time
    }

    pub fn is_continuous_firing(&self) -> bool {
        self.continuous_firing
    }

    pub fn is_muzzle_flash_lit(&self) -> bool {
        self.muzzle_flash_lit
    }
}

/// Ориентация ствола в момент выстрела
#[derive(Debug, Clone, Copy)]
pub struct MuzzlePose {
    pub origin: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl MuzzlePose {
    /// Поза дула: offset в пространстве агента, направление — на aim point
    /// (если он есть и не совпадает с дулом), иначе forward агента.
    pub fn from_agent(transform: &Transform, muzzle_offset: Vec3, aim_point: Option<Vec3>) -> Self {
        let origin = transform.transform_point(muzzle_offset);
        let agent_forward = transform.forward().as_vec3();
        let agent_up = transform.up().as_vec3();
        let agent_right = transform.right().as_vec3();

        let Some(forward) = aim_point.and_then(|aim| (aim - origin).try_normalize()) else {
            return Self {
                origin,
                forward: agent_forward,
                up: agent_up,
                right: agent_right,
            };
        };

        // Вертикальный aim: world up вырождается, берём right агента
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(agent_right);
        let up = right.cross(forward).normalize_or_zero();

        Self {
            origin,
            forward,
            up,
            right,
        }
    }

    /// Forward, повёрнутый на (h, v) градусов: rot(up, h) · rot(right, v) · forward
    pub fn dispersed(&self, horizontal_deg: f32, vertical_deg: f32) -> Vec3 {
        let horizontal = Quat::from_axis_angle(self.up, horizontal_deg.to_radians());
        let vertical = Quat::from_axis_angle(self.right, vertical_deg.to_radians());
        (horizontal * vertical * self.forward).normalize_or_zero()
    }
}

/// Результат успешного выстрела
#[derive(Debug, Clone, PartialEq)]
pub struct ShotReport {
    pub barrel: usize,
    pub muzzle: Vec3,
    pub direction: Vec3,
    /// Точка попадания, либо max-range точка при промахе
    pub terminal_point: Vec3,
    pub hit: Option<RayHit>,
    /// Попали в damageable цель
    pub damaging: bool,
    pub damage: u32,
    /// Дёрнуть "Shoot" анимацию
    pub play_animation: bool,
}

/// Итог попытки выстрела
#[derive(Debug, Clone, PartialEq)]
pub enum ShotAttempt {
    /// Cooldown не истёк или weapon busy — без side effects
    RateLimited,
    /// Нелегальный выстрел; `notify` — первый отказ в серии
    Rejected { reason: FireRejected, notify: bool },
    Fired(ShotReport),
}

/// Разрешить одну попытку выстрела барреля `barrel_index`
pub fn resolve_shot<R: Rng>(
    weapon: &mut Weapon,
    barrel_index: usize,
    shooter: Entity,
    transform: &Transform,
    now: f64,
    rng: &mut R,
    world: &dyn WorldQuery,
) -> ShotAttempt {
    let Some(barrel) = weapon.barrels.get(barrel_index) else {
        return ShotAttempt::RateLimited;
    };

    // 1. Rate limit
    if !barrel.is_ready(now) || weapon.shooting {
        return ShotAttempt::RateLimited;
    }
    let cooldown = barrel.cooldown();
    weapon.barrels[barrel_index].next_shot_time = now + cooldown;

    // 2. Legality
    if let Err((reason, notify)) = weapon.check_fire_legality() {
        return ShotAttempt::Rejected { reason, notify };
    }

    // 3. Выстрел
    weapon.shooting = true;
    weapon.adjust_ammo(-1);
    let play_animation = weapon.take_shot_animation();

    let barrel = &weapon.barrels[barrel_index];
    let pose = MuzzlePose::from_agent(transform, barrel.muzzle_offset, weapon.aim_point);

    let horizontal = rng.gen_range(-barrel.dispersion.x..=barrel.dispersion.x);
    let vertical = rng.gen_range(-barrel.dispersion.y..=barrel.dispersion.y);
    let direction = pose.dispersed(horizontal, vertical);

    let filter = barrel.filter.excluding(shooter);
    let hit = world.cast_ray(pose.origin, direction, barrel.range, &filter);

    // 4. Hit outcome
    let terminal_point = hit
        .map(|hit| hit.point)
        .unwrap_or(pose.origin + direction * barrel.range);
    let damaging = hit.is_some_and(|hit| hit.damageable && hit.entity.is_some());

    let report = ShotReport {
        barrel: barrel_index,
        muzzle: pose.origin,
        direction,
        terminal_point,
        hit,
        damaging,
        damage: barrel.damage,
        play_animation,
    };

    weapon.barrels[barrel_index].muzzle_flash_lit = true;

    // 5. Busy снят
    weapon.shooting = false;

    ShotAttempt::Fired(report)
}
