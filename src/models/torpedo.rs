use tracing::{debug, info};
use crate::models::{
    traits::{IAgent, ICollision, IMovable},
    common::{AgentStatus, Vector2},
};

/// 魚雷エージェント（迎撃体）
///
/// ステーションから発射され、発射時の速度のまま等速直線運動します。
/// 誘導は行わないため、命中するかどうかは発射時の射撃諸元だけで決まります。
#[derive(Debug, Clone)]
pub struct Torpedo {
    pub id: String,
    pub launcher_id: String,
    pub position: Vector2,
    pub velocity: Vector2,
    pub status: AgentStatus,
    pub flight_time: f64,     // 飛翔時間[s]
    pub max_flight_time: f64, // 自爆までの時間[s]
    pub hit_radius: f64,      // 命中判定距離[m]
}

impl Torpedo {
    pub fn new(id: String, launcher_id: String, position: Vector2, velocity: Vector2) -> Self {
        Self {
            id,
            launcher_id,
            position,
            velocity,
            status: AgentStatus::Active,
            flight_time: 0.0,
            max_flight_time: 10.0,
            hit_radius: 1.0,
        }
    }

    /// 命中処理
    pub fn register_hit(&mut self, asteroid_id: &str, asteroid_position: Vector2) {
        info!(
            torpedo_id = %self.id,
            asteroid_id = %asteroid_id,
            hit_position_x = self.position.x,
            hit_position_y = self.position.y,
            flight_time = self.flight_time,
            miss_distance = self.calculate_miss_distance(asteroid_position),
            "TORPEDO_HIT: 魚雷が小惑星に命中しました"
        );
        self.status = AgentStatus::Destroyed;
    }
}

impl IAgent for Torpedo {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        self.hit_radius = scenario_config.launcher.hit_radius_m;
        self.max_flight_time = scenario_config.launcher.max_flight_time_s;
    }

    fn tick(&mut self, dt: f64) {
        if self.status != AgentStatus::Active {
            return;
        }

        self.move_agent(dt);
        self.flight_time += dt;

        if self.flight_time >= self.max_flight_time {
            debug!(
                torpedo_id = %self.id,
                flight_time = self.flight_time,
                "TORPEDO_EXPIRED: 魚雷が飛翔時間の上限に達しました"
            );
            self.status = AgentStatus::Inactive;
        }
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

impl IMovable for Torpedo {
    fn move_agent(&mut self, dt: f64) {
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
        self.velocity = velocity;
    }
}

impl ICollision for Torpedo {
    fn check_collision(&self, target_position: Vector2) -> bool {
        self.position.distance(&target_position) <= self.hit_radius
    }

    fn calculate_miss_distance(&self, target_position: Vector2) -> f64 {
        self.position.distance(&target_position)
    }

    fn check_swept_collision(
        &self,
        previous_position: Vector2,
        target_previous: Vector2,
        target_position: Vector2,
    ) -> bool {
        if self.check_collision(target_position) {
            return true;
        }

        // 目標から見た相対位置の線分と原点との最短距離
        let start = previous_position - target_previous;
        let end = self.position - target_position;
        let segment = end - start;
        let length_sq = segment.sqr_magnitude();
        if length_sq <= 0.0 {
            return start.magnitude() <= self.hit_radius;
        }

        let s = (-start.dot(&segment) / length_sq).clamp(0.0, 1.0);
        (start + segment * s).magnitude() <= self.hit_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_velocity_flight_and_expiry() {
        let mut torpedo = Torpedo::new("L001_T001".to_string(), "L001".to_string(), Vector2::ZERO, Vector2::new(0.0, 15.0));
        torpedo.max_flight_time = 1.0;

        torpedo.tick(0.5);
        assert_relative_eq!(torpedo.position.y, 7.5);
        assert!(torpedo.is_active());

        torpedo.tick(0.5);
        assert!(!torpedo.is_active());
        assert_eq!(torpedo.status, AgentStatus::Inactive);

        torpedo.tick(0.5);
        assert_relative_eq!(torpedo.position.y, 15.0);
    }

    #[test]
    fn test_collision_within_hit_radius() {
        let mut torpedo = Torpedo::new("T".to_string(), "L".to_string(), Vector2::new(0.0, 10.0), Vector2::ZERO);
        assert!(torpedo.check_collision(Vector2::new(0.0, 11.0)));
        assert!(!torpedo.check_collision(Vector2::new(0.0, 11.5)));

        torpedo.register_hit("A001", Vector2::new(0.0, 10.5));
        assert_eq!(torpedo.status, AgentStatus::Destroyed);
    }

    #[test]
    fn test_swept_collision_catches_pass_through() {
        // 1ステップで10m進む魚雷が、静止目標の横0.5mを通り抜ける
        let mut torpedo = Torpedo::new("T".to_string(), "L".to_string(), Vector2::ZERO, Vector2::new(0.0, 10.0));
        torpedo.tick(1.0);
        let target = Vector2::new(0.5, 5.0);

        assert!(!torpedo.check_collision(target));
        assert!(torpedo.check_swept_collision(Vector2::ZERO, target, target));

        let far = Vector2::new(3.0, 5.0);
        assert!(!torpedo.check_swept_collision(Vector2::ZERO, far, far));
    }

    #[test]
    fn test_swept_collision_head_on_closing() {
        // 正面から互いに接近し、ステップ途中ですれ違う
        let mut torpedo = Torpedo::new("T".to_string(), "L".to_string(), Vector2::ZERO, Vector2::new(0.0, 15.0));
        torpedo.tick(0.4);
        let target_previous = Vector2::new(0.0, 8.0);
        let target_position = Vector2::new(0.0, 4.0);

        assert!(!torpedo.check_collision(target_position));
        assert!(torpedo.check_swept_collision(Vector2::ZERO, target_previous, target_position));

        // 横にずれた平行な相対運動は当たらない
        let offset = Vector2::new(2.0, 0.0);
        assert!(!torpedo.check_swept_collision(Vector2::ZERO, target_previous + offset, target_position + offset));
    }
}
