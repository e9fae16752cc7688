use tracing::{debug, info};
use crate::models::{
    traits::{IAgent, ILaunchFacility},
    common::{AgentStatus, Vector2},
    torpedo::Torpedo,
};

/// 発射記録
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub timestamp: f64,
    pub torpedo_id: String,
    pub velocity: Vector2,
}

/// 魚雷発射機エージェント（発射設備）
///
/// レーダーからの発射要求を受け取り、要求どおりの速度で魚雷を生成します。
/// 生成された魚雷は `take_launched` でシミュレーションエンジンに引き渡されます。
#[derive(Debug)]
pub struct TorpedoLauncher {
    pub id: String,
    pub position: Vector2,
    pub status: AgentStatus,
    pub torpedo_speed: f64,          // 魚雷速度[m/s]
    pub torpedo_hit_radius: f64,     // 命中判定距離[m]
    pub torpedo_max_flight_time: f64, // 飛翔時間上限[s]
    pub torpedo_counter: u32,        // 魚雷ID生成用カウンタ
    pub ignored_requests: u32,       // 速度ゼロで無視した要求数
    pub current_time: f64,
    pub launch_history: Vec<LaunchRecord>,
    pub launched: Vec<Torpedo>,      // エンジンへの引き渡し待ち
}

impl TorpedoLauncher {
    pub fn new(id: String, position: Vector2) -> Self {
        Self {
            id,
            position,
            status: AgentStatus::Active,
            torpedo_speed: 15.0,
            torpedo_hit_radius: 1.0,
            torpedo_max_flight_time: 10.0,
            torpedo_counter: 0,
            ignored_requests: 0,
            current_time: 0.0,
            launch_history: Vec::new(),
            launched: Vec::new(),
        }
    }

    /// シナリオ設定から発射機を作成（ステーション位置に設置）
    pub fn from_config(scenario_config: &crate::scenario::ScenarioConfig) -> Self {
        let station = &scenario_config.station.position;
        let mut launcher = Self::new(
            scenario_config.launcher.id.clone(),
            Vector2::new(station.x_m, station.y_m),
        );
        launcher.initialize(scenario_config);
        launcher
    }

    /// 発射済みで未引き渡しの魚雷を取り出す
    pub fn take_launched(&mut self) -> Vec<Torpedo> {
        std::mem::take(&mut self.launched)
    }

    /// 最近の発射記録を取得
    pub fn get_recent_launches(&self, count: usize) -> Vec<&LaunchRecord> {
        let start_index = self.launch_history.len().saturating_sub(count);
        self.launch_history[start_index..].iter().collect()
    }

    /// 発射統計の取得
    pub fn get_launch_stats(&self) -> LaunchStats {
        LaunchStats {
            total_launches: self.launch_history.len(),
            ignored_requests: self.ignored_requests,
            pending_handover: self.launched.len(),
        }
    }
}

/// 発射統計情報
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchStats {
    pub total_launches: usize,
    pub ignored_requests: u32,
    pub pending_handover: usize,
}

impl ILaunchFacility for TorpedoLauncher {
    fn request_launch(&mut self, velocity: Vector2) {
        if self.status != AgentStatus::Active {
            return;
        }

        if velocity.sqr_magnitude() <= 0.0 {
            debug!(launcher_id = %self.id, "LAUNCH_IGNORED: 速度ゼロの発射要求を無視しました");
            self.ignored_requests += 1;
            return;
        }

        self.torpedo_counter += 1;
        let torpedo_id = format!("{}_T{:03}", self.id, self.torpedo_counter);

        let mut torpedo = Torpedo::new(torpedo_id.clone(), self.id.clone(), self.position, velocity);
        torpedo.hit_radius = self.torpedo_hit_radius;
        torpedo.max_flight_time = self.torpedo_max_flight_time;

        info!(
            launcher_id = %self.id,
            torpedo_id = %torpedo_id,
            velocity_x = velocity.x,
            velocity_y = velocity.y,
            timestamp = self.current_time,
            "TORPEDO_LAUNCHED: 魚雷が発射されました"
        );

        self.launch_history.push(LaunchRecord {
            timestamp: self.current_time,
            torpedo_id,
            velocity,
        });
        self.launched.push(torpedo);
    }
}

impl IAgent for TorpedoLauncher {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        self.status = AgentStatus::Active;
        self.launch_history.clear();
        self.launched.clear();
        self.torpedo_counter = 0;
        self.ignored_requests = 0;
        self.current_time = 0.0;

        let launcher_config = &scenario_config.launcher;
        self.torpedo_speed = launcher_config.torpedo_speed_mps;
        self.torpedo_hit_radius = launcher_config.hit_radius_m;
        self.torpedo_max_flight_time = launcher_config.max_flight_time_s;
    }

    fn tick(&mut self, dt: f64) {
        self.current_time += dt;
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioConfig;

    #[test]
    fn test_request_launch_creates_torpedo() {
        let mut launcher = TorpedoLauncher::from_config(&ScenarioConfig::demo());
        launcher.tick(1.5);
        launcher.request_launch(Vector2::new(0.0, 15.0));

        let torpedoes = launcher.take_launched();
        assert_eq!(torpedoes.len(), 1);
        assert_eq!(torpedoes[0].id, "L001_T001");
        assert_eq!(torpedoes[0].velocity, Vector2::new(0.0, 15.0));
        assert_eq!(torpedoes[0].position, Vector2::ZERO);
        assert_eq!(launcher.launch_history[0].timestamp, 1.5);
        assert!(launcher.take_launched().is_empty());
    }

    #[test]
    fn test_zero_velocity_request_is_ignored() {
        let mut launcher = TorpedoLauncher::new("L001".to_string(), Vector2::ZERO);
        launcher.request_launch(Vector2::ZERO);

        let stats = launcher.get_launch_stats();
        assert_eq!(stats.total_launches, 0);
        assert_eq!(stats.ignored_requests, 1);
        assert_eq!(stats.pending_handover, 0);
    }

    #[test]
    fn test_recent_launches() {
        let mut launcher = TorpedoLauncher::new("L001".to_string(), Vector2::ZERO);
        for i in 1..=4 {
            launcher.request_launch(Vector2::new(i as f64, 0.0));
        }
        let recent = launcher.get_recent_launches(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].torpedo_id, "L001_T004");
    }
}
