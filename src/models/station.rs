use tracing::warn;
use crate::models::{
    traits::IAgent,
    common::{AgentStatus, InstallationState, Vector2},
};

/// 表示領域（可視判定用の矩形）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min: Vector2,
    pub max: Vector2,
}

impl Viewport {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// 点が領域内にあるか（境界を含む）
    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }
}

/// 宇宙ステーションエージェント
///
/// 防護対象となる固定施設です。安全圏半径はレーダーの脅威判定に、
/// 船体半径は小惑星の衝突判定に使用されます。
#[derive(Debug)]
pub struct SpaceStation {
    /// ステーションの一意識別子
    pub id: String,
    /// 位置と安全圏半径
    pub state: InstallationState,
    /// 船体半径（メートル）
    pub hull_radius: f64,
    /// 観測者の表示領域
    pub viewport: Viewport,
    /// ステーションの現在状態
    pub status: AgentStatus,
    /// 衝突した小惑星IDの記録
    pub impacts: Vec<String>,
}

impl SpaceStation {
    pub fn new(id: String, state: InstallationState, hull_radius: f64, viewport: Viewport) -> Self {
        Self {
            id,
            state,
            hull_radius,
            viewport,
            status: AgentStatus::Active,
            impacts: Vec::new(),
        }
    }

    /// シナリオ設定からステーションを作成
    pub fn from_config(id: String, scenario_config: &crate::scenario::ScenarioConfig) -> Self {
        let mut station = Self::new(
            id,
            InstallationState::new(Vector2::ZERO, 0.0),
            0.0,
            Viewport::new(Vector2::ZERO, Vector2::ZERO),
        );
        station.initialize(scenario_config);
        station
    }

    pub fn position(&self) -> Vector2 {
        self.state.position
    }

    /// 船体への衝突判定
    ///
    /// 衝突した場合は記録し、trueを返します。
    pub fn check_impact(&mut self, asteroid_id: &str, asteroid_position: Vector2) -> bool {
        if self.state.position.distance(&asteroid_position) > self.hull_radius {
            return false;
        }

        warn!(
            station_id = %self.id,
            asteroid_id = %asteroid_id,
            position_x = asteroid_position.x,
            position_y = asteroid_position.y,
            "STATION_IMPACT: 小惑星がステーションに衝突しました"
        );
        self.impacts.push(asteroid_id.to_string());
        true
    }
}

impl IAgent for SpaceStation {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        let station = &scenario_config.station;
        self.state = InstallationState::new(
            Vector2::new(station.position.x_m, station.position.y_m),
            station.safety_radius_m,
        );
        self.hull_radius = station.hull_radius_m;
        self.viewport = Viewport::new(
            Vector2::new(station.viewport.xmin_m, station.viewport.ymin_m),
            Vector2::new(station.viewport.xmax_m, station.viewport.ymax_m),
        );
        self.status = AgentStatus::Active;
        self.impacts.clear();
    }

    fn tick(&mut self, _dt: f64) {
        // 固定施設のため状態変化なし
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}
