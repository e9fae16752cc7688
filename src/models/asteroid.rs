use std::collections::VecDeque;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::models::{
    traits::{IAgent, IMovable, ISpatialQuery, IThreat, LayerMask},
    common::{AgentStatus, MotionState, Vector2},
    station::Viewport,
};
use crate::scenario::{AsteroidTrackConfig, AsteroidWaveConfig};

/// 小惑星エージェント（脅威エンティティ）
///
/// 等速直線運動する小惑星です。可視フラグは一度視界に入ると戻らず、
/// 評価済みフラグは軌道が変わるたびに自身でリセットします。
#[derive(Debug, Clone)]
pub struct Asteroid {
    /// 小惑星の一意識別子
    pub id: String,
    /// 所属する航跡・波のID
    pub group_id: String,
    /// 現在位置
    pub position: Vector2,
    /// 速度ベクトル
    pub velocity: Vector2,
    /// 現在状態
    pub status: AgentStatus,
    /// スポーン時刻（秒）
    pub spawn_time: f64,
    /// 一度でも視界に入ったか
    pub is_visible: bool,
    /// 現在の軌道について評価済みか
    pub is_assessed: bool,
    /// 出現直後に即時評価するか
    pub instant_scan: bool,
    /// 予定された軌道変更（時刻, 新しい速度）
    pub course_changes: VecDeque<(f64, Vector2)>,
}

impl Asteroid {
    /// 新しい小惑星を作成（スポーン時刻まで非アクティブ）
    pub fn new(id: String, position: Vector2, velocity: Vector2, group_id: String, spawn_time: f64) -> Self {
        Self {
            id,
            group_id,
            position,
            velocity,
            status: AgentStatus::Inactive,
            spawn_time,
            is_visible: false,
            is_assessed: false,
            instant_scan: false,
            course_changes: VecDeque::new(),
        }
    }

    /// シナリオの航跡定義から作成
    pub fn from_track(track: &AsteroidTrackConfig) -> Self {
        let mut asteroid = Self::new(
            track.id.clone(),
            Vector2::new(track.position.x_m, track.position.y_m),
            Vector2::new(track.velocity.vx_mps, track.velocity.vy_mps),
            track.id.clone(),
            track.spawn_time_s,
        );
        asteroid.instant_scan = track.instant_scan;

        let mut changes: Vec<(f64, Vector2)> = track
            .course_changes
            .iter()
            .map(|c| (c.time_s, Vector2::new(c.velocity.vx_mps, c.velocity.vy_mps)))
            .collect();
        changes.sort_by(|a, b| a.0.total_cmp(&b.0));
        asteroid.course_changes = changes.into();
        asteroid
    }

    /// スポーン判定
    ///
    /// スポーン時刻に達したら発射します。速度がゼロの小惑星は発射に失敗し破棄されます。
    ///
    /// # 戻り値
    ///
    /// このタイミングで出現した場合はtrue
    pub fn check_spawn(&mut self, current_time: f64) -> bool {
        if self.status != AgentStatus::Inactive || current_time < self.spawn_time {
            return false;
        }
        let velocity = self.velocity;
        self.launch(velocity)
    }

    /// 指定速度で小惑星を発射
    pub fn launch(&mut self, velocity: Vector2) -> bool {
        if velocity.magnitude() > 0.0 {
            self.velocity = velocity;
            self.status = AgentStatus::Active;
            info!(
                asteroid_id = %self.id,
                group_id = %self.group_id,
                position_x = self.position.x,
                position_y = self.position.y,
                velocity_x = self.velocity.x,
                velocity_y = self.velocity.y,
                "ASTEROID_LAUNCHED: 小惑星が出現しました"
            );
            return true;
        }

        warn!(asteroid_id = %self.id, "ASTEROID_DISCARDED: 速度ゼロの小惑星は発射できません");
        self.status = AgentStatus::Destroyed;
        false
    }

    /// 軌道変更（小惑星同士の衝突など）
    ///
    /// 軌道が変わったため、評価済みフラグをリセットします。
    pub fn change_course(&mut self, velocity: Vector2) {
        self.velocity = velocity;
        self.is_assessed = false;
        debug!(
            asteroid_id = %self.id,
            velocity_x = velocity.x,
            velocity_y = velocity.y,
            "ASTEROID_COURSE_CHANGED: 小惑星の軌道が変化しました"
        );
    }

    /// 予定時刻に達した軌道変更を適用
    pub fn apply_course_changes(&mut self, current_time: f64) {
        while let Some(&(time, velocity)) = self.course_changes.front() {
            if time > current_time {
                break;
            }
            self.course_changes.pop_front();
            if self.status == AgentStatus::Active {
                self.change_course(velocity);
            }
        }
    }

    /// 可視判定（一度trueになったら戻らない）
    pub fn update_visibility(&mut self, viewport: &Viewport) {
        if !self.is_visible && self.status == AgentStatus::Active && viewport.contains(self.position) {
            self.is_visible = true;
            debug!(asteroid_id = %self.id, "ASTEROID_VISIBLE: 小惑星が視界に入りました");
        }
    }

    /// 一度視界に入った後、視界外に出たか
    pub fn has_left_view(&self, viewport: &Viewport) -> bool {
        self.is_visible && !viewport.contains(self.position)
    }

    /// 魚雷による破壊
    pub fn destroy(&mut self) {
        self.status = AgentStatus::Destroyed;
    }
}

impl IThreat for Asteroid {
    fn get_motion_state(&self) -> MotionState {
        MotionState::new(self.position, self.velocity)
    }

    fn is_visible(&self) -> bool {
        self.is_visible
    }

    fn is_assessed(&self) -> bool {
        self.is_assessed
    }

    fn set_assessed(&mut self, assessed: bool) {
        self.is_assessed = assessed;
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }
}

impl IAgent for Asteroid {
    fn initialize(&mut self, _scenario_config: &crate::scenario::ScenarioConfig) {
        self.status = AgentStatus::Inactive;
        self.is_visible = false;
        self.is_assessed = false;
    }

    fn tick(&mut self, dt: f64) {
        if self.status == AgentStatus::Active {
            self.move_agent(dt);
        }
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

impl IMovable for Asteroid {
    fn move_agent(&mut self, dt: f64) {
        // 等速直線運動
        self.position = self.position + self.velocity * dt;
    }

    fn get_position(&self) -> Vector2 {
        self.position
    }

    fn get_velocity(&self) -> Vector2 {
        self.velocity
    }

    fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vector2) {
        self.change_course(velocity);
    }
}

/// 小惑星の集合（レーダーに対する空間検索プロバイダ）
#[derive(Debug, Default)]
pub struct AsteroidField {
    pub asteroids: Vec<Asteroid>,
}

impl AsteroidField {
    pub fn new() -> Self {
        Self { asteroids: Vec::new() }
    }

    pub fn add(&mut self, asteroid: Asteroid) {
        self.asteroids.push(asteroid);
    }

    pub fn active_count(&self) -> usize {
        self.asteroids.iter().filter(|a| a.is_active()).count()
    }

    /// 終了状態（破壊・衝突・離脱）の小惑星を取り除く
    pub fn remove_finished(&mut self) {
        self.asteroids.retain(|a| matches!(a.status, AgentStatus::Active | AgentStatus::Inactive));
    }
}

impl ISpatialQuery for AsteroidField {
    fn query_within_radius(&mut self, center: Vector2, radius: f64, layer: LayerMask) -> Vec<&mut dyn IThreat> {
        if !layer.contains(LayerMask::ASTEROID) {
            return Vec::new();
        }

        self.asteroids
            .iter_mut()
            .filter(|a| a.is_active() && a.position.distance(&center) <= radius)
            .map(|a| a as &mut dyn IThreat)
            .collect()
    }
}

/// ランダムな小惑星の波を生成するヘルパー構造体
///
/// 中心を囲む円周上のランダムな位置から、中心方向を ±`spawn_angle_range` 度
/// ずらした向きに、[`min_speed`, `max_speed`] の速さで小惑星を発射します。
pub struct AsteroidWave {
    pub id: String,
    /// 最初の小惑星の出現時刻（秒）
    pub spawn_time: f64,
    pub count: u32,
    /// 出現間隔（秒）
    pub spawn_interval: f64,
    /// 出現円の中心（ステーション位置）
    pub center: Vector2,
    pub spawn_circle_radius: f64,
    pub spawn_angle_range: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl AsteroidWave {
    pub fn from_config(config: &AsteroidWaveConfig, center: Vector2) -> Self {
        Self {
            id: config.id.clone(),
            spawn_time: config.spawn_time_s,
            count: config.count,
            spawn_interval: config.spawn_interval_s,
            center,
            spawn_circle_radius: config.spawn_circle_radius_m,
            spawn_angle_range: config.spawn_angle_range_deg,
            min_speed: config.min_speed_mps,
            max_speed: config.max_speed_mps,
        }
    }

    /// 出現円上のランダムな位置
    fn random_launch_position(&self, rng: &mut ChaCha8Rng) -> Vector2 {
        let angle = rng.gen_range(0.0..360.0_f64).to_radians();
        Vector2::new(
            self.center.x + self.spawn_circle_radius * angle.sin(),
            self.center.y + self.spawn_circle_radius * angle.cos(),
        )
    }

    /// 中心方向を基準としたランダムな発射速度
    fn random_launch_velocity(&self, position: Vector2, rng: &mut ChaCha8Rng) -> Vector2 {
        let direction = (self.center - position).normalize();
        let speed = rng.gen_range(self.min_speed..=self.max_speed);
        let offset = rng.gen_range(-self.spawn_angle_range..=self.spawn_angle_range);
        direction.rotate_deg(offset) * speed
    }

    /// 波に含まれる全小惑星を生成
    pub fn generate_asteroids(&self, rng: &mut ChaCha8Rng) -> Vec<Asteroid> {
        (0..self.count)
            .map(|index| {
                let position = self.random_launch_position(rng);
                let velocity = self.random_launch_velocity(position, rng);
                Asteroid::new(
                    format!("{}_A{:03}", self.id, index + 1),
                    position,
                    velocity,
                    self.id.clone(),
                    self.spawn_time + index as f64 * self.spawn_interval,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::intercept::trajectory_angle;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn viewport() -> Viewport {
        Viewport::new(Vector2::new(-40.0, -40.0), Vector2::new(40.0, 40.0))
    }

    fn spawned(id: &str, position: Vector2, velocity: Vector2) -> Asteroid {
        let mut asteroid = Asteroid::new(id.to_string(), position, velocity, "G".to_string(), 0.0);
        assert!(asteroid.check_spawn(0.0));
        asteroid
    }

    fn wave() -> AsteroidWave {
        AsteroidWave {
            id: "W1".to_string(),
            spawn_time: 5.0,
            count: 20,
            spawn_interval: 2.0,
            center: Vector2::ZERO,
            spawn_circle_radius: 50.0,
            spawn_angle_range: 35.0,
            min_speed: 3.0,
            max_speed: 10.0,
        }
    }

    #[test]
    fn test_spawn_waits_for_spawn_time() {
        let mut asteroid = Asteroid::new("A1".to_string(), Vector2::ZERO, Vector2::new(1.0, 0.0), "G".to_string(), 2.0);
        assert!(!asteroid.check_spawn(1.9));
        assert!(!asteroid.is_active());
        assert!(asteroid.check_spawn(2.0));
        assert!(asteroid.is_active());
        assert!(!asteroid.check_spawn(2.1));
    }

    #[test]
    fn test_zero_velocity_launch_is_discarded() {
        let mut asteroid = Asteroid::new("A1".to_string(), Vector2::ZERO, Vector2::ZERO, "G".to_string(), 0.0);
        assert!(!asteroid.check_spawn(0.0));
        assert_eq!(asteroid.status, AgentStatus::Destroyed);
    }

    #[test]
    fn test_visibility_latches() {
        let mut asteroid = spawned("A1", Vector2::new(45.0, 0.0), Vector2::new(-5.0, 0.0));
        asteroid.update_visibility(&viewport());
        assert!(!asteroid.is_visible);

        asteroid.tick(1.0);
        asteroid.update_visibility(&viewport());
        assert!(asteroid.is_visible);
        assert!(!asteroid.has_left_view(&viewport()));

        asteroid.set_position(Vector2::new(100.0, 0.0));
        asteroid.update_visibility(&viewport());
        assert!(asteroid.is_visible);
        assert!(asteroid.has_left_view(&viewport()));
    }

    #[test]
    fn test_course_change_resets_assessed() {
        let mut asteroid = spawned("A1", Vector2::new(30.0, 0.0), Vector2::new(-5.0, 0.0));
        asteroid.course_changes.push_back((1.0, Vector2::new(0.0, 5.0)));
        asteroid.set_assessed(true);

        asteroid.apply_course_changes(0.5);
        assert!(asteroid.is_assessed());

        asteroid.apply_course_changes(1.0);
        assert!(!asteroid.is_assessed());
        assert_eq!(asteroid.velocity, Vector2::new(0.0, 5.0));
        assert!(asteroid.course_changes.is_empty());
    }

    #[test]
    fn test_field_query_filters_radius_layer_and_status() {
        let mut field = AsteroidField::new();
        field.add(spawned("near", Vector2::new(10.0, 0.0), Vector2::new(-1.0, 0.0)));
        field.add(spawned("far", Vector2::new(60.0, 0.0), Vector2::new(-1.0, 0.0)));
        field.add(Asteroid::new("pending".to_string(), Vector2::new(5.0, 0.0), Vector2::new(-1.0, 0.0), "G".to_string(), 10.0));

        let found: Vec<String> = field
            .query_within_radius(Vector2::ZERO, 35.0, LayerMask::ASTEROID)
            .iter()
            .map(|t| t.get_id())
            .collect();
        assert_eq!(found, vec!["near".to_string()]);

        assert!(field.query_within_radius(Vector2::ZERO, 35.0, LayerMask::TORPEDO).is_empty());
    }

    #[test]
    fn test_remove_finished() {
        let mut field = AsteroidField::new();
        field.add(spawned("a", Vector2::new(10.0, 0.0), Vector2::new(-1.0, 0.0)));
        field.add(spawned("b", Vector2::new(20.0, 0.0), Vector2::new(-1.0, 0.0)));
        field.asteroids[0].destroy();
        field.remove_finished();
        assert_eq!(field.asteroids.len(), 1);
        assert_eq!(field.active_count(), 1);
    }

    #[test]
    fn test_wave_generation_is_deterministic_and_bounded() {
        let wave = wave();
        let first = wave.generate_asteroids(&mut ChaCha8Rng::seed_from_u64(42));
        let second = wave.generate_asteroids(&mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(first.len(), 20);

        for (index, (a, b)) in first.iter().zip(second.iter()).enumerate() {
            assert_eq!(a.position, b.position);
            assert_eq!(a.velocity, b.velocity);
            assert_eq!(a.id, format!("W1_A{:03}", index + 1));
            assert_relative_eq!(a.spawn_time, 5.0 + 2.0 * index as f64);

            assert_relative_eq!(a.position.magnitude(), 50.0, epsilon = 1e-9);
            let speed = a.velocity.magnitude();
            assert!((3.0 - 1e-9..=10.0 + 1e-9).contains(&speed));
            let angle = trajectory_angle(Vector2::ZERO, a.position, a.velocity).unwrap();
            assert!(angle <= 35.0 + 1e-6, "heading off by {} degrees", angle);
        }
    }
}
