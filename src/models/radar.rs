use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::models::{
    common::{InstallationState, Vector2},
    intercept::{self, InterceptResult},
    traits::{ILaunchFacility, ISpatialQuery, IThreat, LayerMask},
};

/// 評価候補の選択順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// 空間検索が返した順序のまま
    #[default]
    Query,
    /// ステーションに近い順
    Nearest,
}

/// レーダー（脅威スキャナー）
///
/// 一定周期で走査半径内の小惑星を検索し、可視かつ未評価の候補を
/// 1周期あたり `assessments_per_scan` 個だけ評価します。
/// 安全圏に侵入する軌道であれば迎撃速度を計算し、発射設備へ発射を要求します。
#[derive(Debug, Clone)]
pub struct Radar {
    /// レーダーの一意識別子
    pub id: String,
    /// 防護対象の位置と安全圏半径
    pub installation: InstallationState,
    /// 迎撃体（魚雷）の速度 [m/s]
    pub interceptor_speed: f64,
    /// 走査周期 [s]
    pub scanning_interval: f64,
    /// 走査半径 [m]
    pub scanning_radius: f64,
    /// 1周期あたりの最大評価数
    pub assessments_per_scan: u32,
    /// 候補の選択順序
    pub scan_order: ScanOrder,
    /// 前回走査からの経過時間 [s]
    pub time_since_scan: f64,
    /// レーダーの内部時計 [s]
    pub current_time: f64,
    /// 評価イベントの履歴
    pub scan_history: Vec<ScanEvent>,
}

/// 評価イベント
#[derive(Debug, Clone)]
pub struct ScanEvent {
    /// 評価時刻（秒）
    pub timestamp: f64,
    /// 評価した脅威のID
    pub threat_id: String,
    /// 評価時の脅威位置
    pub threat_position: Vector2,
    /// 安全圏に侵入する軌道だったか
    pub threatening: bool,
    /// 脅威と判定した場合の迎撃計算結果
    pub solution: Option<InterceptResult>,
}

impl ScanEvent {
    /// 発射要求を出したかどうか
    pub fn launched(&self) -> bool {
        self.solution.is_some_and(|s| s.will_intercept)
    }
}

/// 評価統計情報
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// 総評価数
    pub scans: usize,
    /// 脅威と判定した数
    pub threats_flagged: usize,
    /// 発射を要求した数
    pub launches_requested: usize,
    /// 脅威だが迎撃解がなかった数
    pub no_solution: usize,
}

impl Radar {
    /// 新しいレーダーを作成します
    ///
    /// 走査設定は既定値（周期 1秒、半径 35m、1周期1評価、検索順）で初期化されます。
    pub fn new(id: String, installation: InstallationState, interceptor_speed: f64) -> Self {
        Self {
            id,
            installation,
            interceptor_speed,
            scanning_interval: 1.0,
            scanning_radius: 35.0,
            assessments_per_scan: 1,
            scan_order: ScanOrder::Query,
            time_since_scan: 0.0,
            current_time: 0.0,
            scan_history: Vec::new(),
        }
    }

    /// シナリオ設定からレーダーを作成
    pub fn from_config(id: String, scenario_config: &crate::scenario::ScenarioConfig) -> Self {
        let station = &scenario_config.station;
        let installation = InstallationState::new(
            Vector2::new(station.position.x_m, station.position.y_m),
            station.safety_radius_m,
        );

        let mut radar = Self::new(id, installation, scenario_config.launcher.torpedo_speed_mps);
        radar.scanning_interval = scenario_config.radar.scanning_interval_s;
        radar.scanning_radius = scenario_config.radar.scanning_radius_m;
        radar.assessments_per_scan = scenario_config.radar.assessments_per_scan;
        radar.scan_order = scenario_config.radar.scan_order;
        radar
    }

    /// スケジューラ用: 経過時間を進め、走査周期に達したら true を返す
    ///
    /// 1回の呼び出しで周期を複数回またいでも走査は1回のみで、残りは持ち越しません。
    pub fn advance(&mut self, dt: f64) -> bool {
        self.current_time += dt;
        self.time_since_scan += dt;

        if self.time_since_scan >= self.scanning_interval {
            self.time_since_scan %= self.scanning_interval;
            true
        } else {
            false
        }
    }

    /// 1走査周期の処理
    ///
    /// 走査半径内の候補から可視かつ未評価のものを選び、評価します。
    ///
    /// # 戻り値
    ///
    /// この周期で評価した候補数（候補がなければ0で、何も変更しない）
    pub fn tick(&mut self, spatial: &mut dyn ISpatialQuery, launcher: &mut dyn ILaunchFacility) -> usize {
        let center = self.installation.position;
        let mut eligible: Vec<&mut dyn IThreat> = spatial
            .query_within_radius(center, self.scanning_radius, LayerMask::ASTEROID)
            .into_iter()
            .filter(|threat| threat.is_visible() && !threat.is_assessed())
            .collect();

        if eligible.is_empty() {
            trace!("走査 t={:.2}: 評価対象なし", self.current_time);
            return 0;
        }

        if self.scan_order == ScanOrder::Nearest {
            eligible.sort_by(|a, b| {
                let da = a.get_motion_state().position.distance(&center);
                let db = b.get_motion_state().position.distance(&center);
                da.total_cmp(&db)
            });
        }

        let mut assessed = 0;
        for candidate in eligible.into_iter().take(self.assessments_per_scan as usize) {
            self.assess(candidate, launcher);
            assessed += 1;
        }
        assessed
    }

    /// 個別の脅威を評価
    ///
    /// 安全圏に侵入する軌道であれば迎撃解を計算し、解があれば発射を要求します。
    /// 結果に関わらず、候補は評価済みになります。
    pub fn assess(&mut self, candidate: &mut dyn IThreat, launcher: &mut dyn ILaunchFacility) -> ScanEvent {
        let motion = candidate.get_motion_state();
        let threat_id = candidate.get_id();

        let threatening = intercept::enters_safety_zone(
            self.installation.position,
            self.installation.safety_radius,
            motion.position,
            motion.velocity,
        );

        let solution = if threatening {
            let result = intercept::compute_intercept_velocity(
                self.installation.position,
                self.interceptor_speed,
                motion.position,
                motion.velocity,
            );

            if result.will_intercept {
                info!(
                    radar_id = %self.id,
                    threat_id = %threat_id,
                    velocity_x = result.velocity.x,
                    velocity_y = result.velocity.y,
                    time_to_impact = result.time_to_impact,
                    timestamp = self.current_time,
                    "THREAT_ENGAGED: 脅威に対して迎撃を要求しました"
                );
                launcher.request_launch(result.velocity);
            } else {
                info!(
                    radar_id = %self.id,
                    threat_id = %threat_id,
                    timestamp = self.current_time,
                    "THREAT_UNINTERCEPTABLE: 安全圏に侵入しますが迎撃解がありません"
                );
            }
            Some(result)
        } else {
            debug!(threat_id = %threat_id, "THREAT_CLEARED: 安全圏外を通過します");
            None
        };

        candidate.set_assessed(true);

        let event = ScanEvent {
            timestamp: self.current_time,
            threat_id,
            threat_position: motion.position,
            threatening,
            solution,
        };
        self.scan_history.push(event.clone());
        event
    }

    /// 最近の評価記録を取得
    pub fn get_recent_scans(&self, count: usize) -> Vec<&ScanEvent> {
        let start_index = self.scan_history.len().saturating_sub(count);
        self.scan_history[start_index..].iter().collect()
    }

    /// 評価統計の計算
    pub fn get_scan_stats(&self) -> ScanStats {
        let threats_flagged = self.scan_history.iter().filter(|e| e.threatening).count();
        let launches_requested = self.scan_history.iter().filter(|e| e.launched()).count();

        ScanStats {
            scans: self.scan_history.len(),
            threats_flagged,
            launches_requested,
            no_solution: threats_flagged - launches_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::MotionState;
    use approx::assert_relative_eq;

    struct MockThreat {
        id: String,
        motion: MotionState,
        visible: bool,
        assessed: bool,
    }

    impl MockThreat {
        fn new(id: &str, position: Vector2, velocity: Vector2) -> Self {
            Self {
                id: id.to_string(),
                motion: MotionState::new(position, velocity),
                visible: true,
                assessed: false,
            }
        }
    }

    impl IThreat for MockThreat {
        fn get_motion_state(&self) -> MotionState {
            self.motion
        }

        fn is_visible(&self) -> bool {
            self.visible
        }

        fn is_assessed(&self) -> bool {
            self.assessed
        }

        fn set_assessed(&mut self, assessed: bool) {
            self.assessed = assessed;
        }

        fn get_id(&self) -> String {
            self.id.clone()
        }
    }

    #[derive(Default)]
    struct MockField {
        threats: Vec<MockThreat>,
    }

    impl ISpatialQuery for MockField {
        fn query_within_radius(&mut self, center: Vector2, radius: f64, _layer: LayerMask) -> Vec<&mut dyn IThreat> {
            self.threats
                .iter_mut()
                .filter(|t| t.motion.position.distance(&center) <= radius)
                .map(|t| t as &mut dyn IThreat)
                .collect()
        }
    }

    #[derive(Default)]
    struct MockLauncher {
        launches: Vec<Vector2>,
    }

    impl ILaunchFacility for MockLauncher {
        fn request_launch(&mut self, velocity: Vector2) {
            self.launches.push(velocity);
        }
    }

    fn radar() -> Radar {
        Radar::new(
            "R001".to_string(),
            InstallationState::new(Vector2::ZERO, 10.0),
            15.0,
        )
    }

    fn incoming(id: &str, y: f64) -> MockThreat {
        MockThreat::new(id, Vector2::new(0.0, y), Vector2::new(0.0, -5.0))
    }

    #[test]
    fn test_no_eligible_candidates_is_noop() {
        let mut radar = radar();
        let mut field = MockField::default();
        let mut hidden = incoming("hidden", 30.0);
        hidden.visible = false;
        let mut done = incoming("done", 20.0);
        done.assessed = true;
        field.threats.push(hidden);
        field.threats.push(done);
        field.threats.push(incoming("far", 100.0)); // 走査半径外
        let mut launcher = MockLauncher::default();

        assert_eq!(radar.tick(&mut field, &mut launcher), 0);
        assert!(launcher.launches.is_empty());
        assert!(!field.threats[0].assessed);
        assert!(field.threats[1].assessed);
        assert!(!field.threats[2].assessed);
        assert!(radar.scan_history.is_empty());
    }

    #[test]
    fn test_threatening_candidate_triggers_launch() {
        let mut radar = radar();
        let mut field = MockField { threats: vec![incoming("A001", 30.0)] };
        let mut launcher = MockLauncher::default();

        assert_eq!(radar.tick(&mut field, &mut launcher), 1);
        assert_eq!(launcher.launches.len(), 1);
        assert_relative_eq!(launcher.launches[0].y, 15.0, epsilon = 1e-9);
        assert!(field.threats[0].assessed);

        let stats = radar.get_scan_stats();
        assert_eq!(stats.scans, 1);
        assert_eq!(stats.threats_flagged, 1);
        assert_eq!(stats.launches_requested, 1);
    }

    #[test]
    fn test_cleared_candidate_is_still_marked_assessed() {
        let mut radar = radar();
        let mut threat = MockThreat::new("A002", Vector2::new(20.0, 0.0), Vector2::new(5.0, 0.0));
        let mut launcher = MockLauncher::default();

        let event = radar.assess(&mut threat, &mut launcher);

        assert!(!event.threatening);
        assert!(!event.launched());
        assert!(threat.assessed);
        assert!(launcher.launches.is_empty());
    }

    #[test]
    fn test_threat_without_solution_is_not_launched_at() {
        let mut radar = radar();
        radar.interceptor_speed = 1.0;
        let mut threat = MockThreat::new("A003", Vector2::new(-30.0, 5.0), Vector2::new(20.0, -1.0));
        let mut launcher = MockLauncher::default();

        let event = radar.assess(&mut threat, &mut launcher);

        assert!(event.threatening);
        assert!(!event.launched());
        assert!(threat.assessed);
        assert!(launcher.launches.is_empty());
        assert_eq!(radar.get_scan_stats().no_solution, 1);
    }

    #[test]
    fn test_one_candidate_per_cycle_in_query_order() {
        let mut radar = radar();
        let mut field = MockField { threats: vec![incoming("first", 30.0), incoming("second", 15.0)] };
        let mut launcher = MockLauncher::default();

        radar.tick(&mut field, &mut launcher);
        assert!(field.threats[0].assessed);
        assert!(!field.threats[1].assessed);

        radar.tick(&mut field, &mut launcher);
        assert!(field.threats[1].assessed);
        assert_eq!(launcher.launches.len(), 2);

        assert_eq!(radar.tick(&mut field, &mut launcher), 0);
        assert_eq!(launcher.launches.len(), 2);
    }

    #[test]
    fn test_nearest_first_order() {
        let mut radar = radar();
        radar.scan_order = ScanOrder::Nearest;
        let mut field = MockField { threats: vec![incoming("far", 30.0), incoming("near", 15.0)] };
        let mut launcher = MockLauncher::default();

        radar.tick(&mut field, &mut launcher);
        assert!(!field.threats[0].assessed);
        assert!(field.threats[1].assessed);
        assert_eq!(radar.scan_history[0].threat_id, "near");
    }

    #[test]
    fn test_multiple_assessments_per_scan() {
        let mut radar = radar();
        radar.assessments_per_scan = 2;
        let mut field = MockField {
            threats: vec![incoming("a", 30.0), incoming("b", 25.0), incoming("c", 20.0)],
        };
        let mut launcher = MockLauncher::default();

        assert_eq!(radar.tick(&mut field, &mut launcher), 2);
        assert!(field.threats[0].assessed && field.threats[1].assessed);
        assert!(!field.threats[2].assessed);
    }

    #[test]
    fn test_reset_assessed_flag_allows_reassessment() {
        let mut radar = radar();
        let mut field = MockField { threats: vec![incoming("A001", 30.0)] };
        let mut launcher = MockLauncher::default();

        radar.tick(&mut field, &mut launcher);
        assert_eq!(radar.tick(&mut field, &mut launcher), 0);

        field.threats[0].motion.velocity = Vector2::new(0.0, -8.0);
        field.threats[0].set_assessed(false);
        assert_eq!(radar.tick(&mut field, &mut launcher), 1);
        assert_eq!(launcher.launches.len(), 2);
    }

    #[test]
    fn test_advance_reports_due_cycles() {
        let mut radar = radar();
        radar.scanning_interval = 0.5;

        let due: Vec<bool> = (0..6).map(|_| radar.advance(0.25)).collect();
        assert_eq!(due, vec![false, true, false, true, false, true]);
        assert_relative_eq!(radar.current_time, 1.5);
    }

    #[test]
    fn test_advance_does_not_accumulate_backlog_with_coarse_steps() {
        let mut radar = radar();
        radar.scanning_interval = 0.5;

        for _ in 0..100 {
            assert!(radar.advance(1.0));
        }
        assert!(radar.time_since_scan < radar.scanning_interval);

        // 細かい刻みに戻しても余分な走査は発生しない
        assert!(!radar.advance(0.25));
        assert!(radar.advance(0.25));
    }

    #[test]
    fn test_recent_scans() {
        let mut radar = radar();
        let mut launcher = MockLauncher::default();
        for i in 0..5 {
            let mut threat = incoming(&format!("A{}", i), 30.0);
            radar.assess(&mut threat, &mut launcher);
        }
        let recent = radar.get_recent_scans(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].threat_id, "A4");
        assert_eq!(radar.get_recent_scans(10).len(), 5);
    }
}
